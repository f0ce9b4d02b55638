//! The roster every session starts from.

use chrono::NaiveDate;

use crate::builder::RosterBuilder;
use crate::config::Student;

/// The built-in student database: five students, four of whom answered yes.
pub fn mock_roster() -> Vec<Student> {
    let mut b = RosterBuilder::new();
    let entries: [(&str, &str, &str, &str, (u32, u32, u32), Option<NaiveDate>, &[&str], &str); 5] = [
        (
            "001",
            "Alice Johnson",
            "alice@university.edu",
            "Computer Science",
            (3, 1, 0),
            NaiveDate::from_ymd_opt(2024, 1, 15),
            &["Tech Talk 2023", "Workshop 2024", "Networking Event"],
            "yes",
        ),
        (
            "002",
            "Bob Smith",
            "bob@university.edu",
            "Engineering",
            (1, 0, 2),
            NaiveDate::from_ymd_opt(2023, 12, 10),
            &["Workshop 2023"],
            "yes",
        ),
        (
            "003",
            "Carol Davis",
            "carol@university.edu",
            "Business",
            (0, 0, 0),
            None,
            &[],
            "yes",
        ),
        (
            "004",
            "David Wilson",
            "david@university.edu",
            "Mathematics",
            (2, 2, 1),
            NaiveDate::from_ymd_opt(2023, 11, 20),
            &["Tech Talk 2023", "Workshop 2023"],
            "no",
        ),
        (
            "005",
            "Eva Martinez",
            "eva@university.edu",
            "Physics",
            (0, 0, 1),
            None,
            &[],
            "yes",
        ),
    ];
    for (id, name, email, class, counters, last, events, response) in entries {
        b.add_student_with_history(id, name, email, class, counters, last, events, response)
            .expect("mock roster ids are distinct");
    }
    b.build()
}
