pub use crate::config::*;

use std::collections::HashSet;

use chrono::NaiveDate;

/// A builder for assembling a roster.
///
/// The session accepts any roster as-is. The builder is the place where the uniqueness
/// of the user ids is checked.
///
/// ```
/// use attendee_selection::builder::RosterBuilder;
/// # use attendee_selection::ValidationError;
///
/// let mut builder = RosterBuilder::new();
/// builder.add_student_simple("001", "Alice Johnson", "alice@university.edu", "yes")?;
/// builder.add_student_simple("002", "Bob Smith", "bob@university.edu", "no")?;
/// let roster = builder.build();
/// assert_eq!(roster.len(), 2);
///
/// # Ok::<(), ValidationError>(())
/// ```
#[derive(Default)]
pub struct RosterBuilder {
    _students: Vec<Student>,
    _seen_ids: HashSet<String>,
}

impl RosterBuilder {
    pub fn new() -> RosterBuilder {
        RosterBuilder {
            _students: Vec::new(),
            _seen_ids: HashSet::new(),
        }
    }

    /// Adds a student without any attendance history.
    pub fn add_student_simple(
        &mut self,
        user_id: &str,
        name: &str,
        email: &str,
        response: &str,
    ) -> Result<(), ValidationError> {
        self.add_student(Student {
            user_id: user_id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            class: String::new(),
            num_events_attended: 0,
            num_absences: 0,
            num_late_arrivals: 0,
            last_attended_date: None,
            events_attended: Vec::new(),
            response: Response::parse(response),
        })
    }

    /// Adds a student with the full attendance history.
    ///
    /// events_attended: the names of the past events, oldest first. The list is not checked
    /// against the counters.
    #[allow(clippy::too_many_arguments)]
    pub fn add_student_with_history(
        &mut self,
        user_id: &str,
        name: &str,
        email: &str,
        class: &str,
        counters: (u32, u32, u32),
        last_attended_date: Option<NaiveDate>,
        events_attended: &[&str],
        response: &str,
    ) -> Result<(), ValidationError> {
        let (num_events_attended, num_absences, num_late_arrivals) = counters;
        self.add_student(Student {
            user_id: user_id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            class: class.to_string(),
            num_events_attended,
            num_absences,
            num_late_arrivals,
            last_attended_date,
            events_attended: events_attended.iter().map(|e| e.to_string()).collect(),
            response: Response::parse(response),
        })
    }

    pub fn add_student(&mut self, student: Student) -> Result<(), ValidationError> {
        if !self._seen_ids.insert(student.user_id.clone()) {
            return Err(ValidationError::DuplicateUserId(student.user_id));
        }
        self._students.push(student);
        Ok(())
    }

    pub fn build(self) -> Vec<Student> {
        self._students
    }
}
