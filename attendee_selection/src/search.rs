use crate::config::Student;

/// Returns the students whose name, email or class contains `term`, ignoring case.
///
/// An empty term matches every student. The roster is never modified.
pub fn search<'a>(roster: &'a [Student], term: &str) -> Vec<&'a Student> {
    let term = term.to_lowercase();
    roster
        .iter()
        .filter(|s| {
            s.name.to_lowercase().contains(&term)
                || s.email.to_lowercase().contains(&term)
                || s.class.to_lowercase().contains(&term)
        })
        .collect()
}
