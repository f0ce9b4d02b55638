// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;
use std::num::NonZeroU32;

use chrono::NaiveDate;

/// The RSVP answer of a student for the current event.
///
/// Only `Yes` makes a student eligible for the draw.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Response {
    Yes,
    No,
    /// No answer was recorded, or the answer could not be understood.
    Unset,
}

impl Response {
    /// Reads a raw RSVP answer. The comparison ignores case and surrounding whitespace.
    pub fn parse(raw: &str) -> Response {
        let normalized = raw.trim().to_lowercase();
        match normalized.as_str() {
            "yes" => Response::Yes,
            "no" => Response::No,
            _ => Response::Unset,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Response::Yes => "yes",
            Response::No => "no",
            Response::Unset => "",
        }
    }
}

impl Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A student of the roster, with the summary of their attendance history.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Student {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub class: String,
    pub num_events_attended: u32,
    pub num_absences: u32,
    pub num_late_arrivals: u32,
    /// None if the student never attended an event.
    pub last_attended_date: Option<NaiveDate>,
    /// Names of the past events, oldest first. Only ever appended to.
    pub events_attended: Vec<String>,
    pub response: Response,
}

impl Student {
    /// The names of the fields, in the order used by the exports.
    pub const FIELD_NAMES: [&'static str; 10] = [
        "user_id",
        "name",
        "email",
        "class",
        "num_events_attended",
        "num_absences",
        "num_late_arrivals",
        "last_attended_date",
        "events_attended",
        "response",
    ];

    pub fn is_eligible(&self) -> bool {
        self.response == Response::Yes
    }

    /// Marks this student as having attended `event_name` on `date`.
    ///
    /// The counter and the history are always updated together here. Nothing else
    /// in this crate changes either of them. The counter stops at `u32::MAX`.
    pub fn record_attendance(&mut self, event_name: &str, date: NaiveDate) {
        self.num_events_attended = self.num_events_attended.saturating_add(1);
        self.events_attended.push(event_name.to_string());
        self.last_attended_date = Some(date);
    }
}

// ********* Configuration **********

/// The parameters of the event, as entered by the organizer.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct EventConfig {
    name: String,
    capacity: NonZeroU32,
    date: Option<NaiveDate>,
}

impl EventConfig {
    /// Validates the event parameters.
    ///
    /// The name is trimmed and must not be empty. The capacity must be strictly positive.
    /// There is no upper bound on the capacity: it may exceed the size of the roster.
    pub fn new(name: &str, capacity: i64) -> Result<EventConfig, ValidationError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyEventName);
        }
        let capacity = u32::try_from(capacity)
            .ok()
            .and_then(NonZeroU32::new)
            .ok_or_else(|| ValidationError::InvalidCapacity(capacity.to_string()))?;
        Ok(EventConfig {
            name: trimmed.to_string(),
            capacity,
            date: None,
        })
    }

    /// Same as `new`, with the capacity as typed in a form field.
    pub fn from_form(name: &str, capacity_text: &str) -> Result<EventConfig, ValidationError> {
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyEventName);
        }
        let capacity = capacity_text
            .trim()
            .parse::<i64>()
            .map_err(|_| ValidationError::InvalidCapacity(capacity_text.to_string()))?;
        EventConfig::new(name, capacity)
    }

    pub fn with_date(self, date: Option<NaiveDate>) -> EventConfig {
        EventConfig { date, ..self }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> NonZeroU32 {
        self.capacity
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }
}

/// How the eligible students are ordered before the list is cut at the capacity.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum SelectionMode {
    /// Every ordering of the eligible students is equally likely.
    Uniform,
    /// Students with less attendance history come first. The random order only breaks ties.
    ///
    /// The history is compared on, in order: events attended, absences, late arrivals and
    /// the date of the last attendance (never attended comes first).
    Priority,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SelectionRules {
    pub mode: SelectionMode,
    /// If set, all the draws of a session can be replayed.
    pub seed: Option<u64>,
}

impl SelectionRules {
    pub const DEFAULT_RULES: SelectionRules = SelectionRules {
        mode: SelectionMode::Uniform,
        seed: None,
    };
}

/// A file picked by the organizer. Only its declared type is ever looked at.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct FileUpload {
    pub name: String,
    pub content_type: String,
}

impl FileUpload {
    pub const CSV_CONTENT_TYPE: &'static str = "text/csv";

    pub fn new(name: &str, content_type: &str) -> FileUpload {
        FileUpload {
            name: name.to_string(),
            content_type: content_type.to_string(),
        }
    }

    pub fn is_csv(&self) -> bool {
        self.content_type == FileUpload::CSV_CONTENT_TYPE
    }
}

// ******** Errors *********

/// Input rejected by one of the steps. The state of the session is left untouched.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ValidationError {
    EmptyEventName,
    /// The capacity, as provided, is not a positive integer.
    InvalidCapacity(String),
    NotCsv {
        file_name: String,
        content_type: String,
    },
    MissingSignupFile,
    MissingEventConfig,
    /// The event cannot change once the attendees have been drawn.
    EventAlreadyConfigured,
    DuplicateUserId(String),
}

impl Error for ValidationError {}

impl Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::EmptyEventName => write!(f, "Please enter an event name"),
            ValidationError::InvalidCapacity(_) => {
                write!(f, "Please enter a valid positive number for event capacity")
            }
            ValidationError::NotCsv { .. } => write!(f, "Please select a valid CSV file"),
            ValidationError::MissingSignupFile => write!(f, "Please upload a sign-up file first"),
            ValidationError::MissingEventConfig => {
                write!(f, "The event must be configured before running the selection")
            }
            ValidationError::EventAlreadyConfigured => {
                write!(f, "The event cannot be changed after the selection has been run")
            }
            ValidationError::DuplicateUserId(id) => {
                write!(f, "The user id {} appears more than once in the roster", id)
            }
        }
    }
}

/// The steps of the workflow, in order.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, PartialOrd, Ord)]
pub enum Step {
    Upload,
    Config,
    Database,
    Selection,
    Results,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum NavigationError {
    /// The action is not available from the current step.
    OutOfOrder { current: Step, requested: Step },
    /// The results cannot be shown before a selection was made.
    SelectionNotRun,
    Validation(ValidationError),
}

impl From<ValidationError> for NavigationError {
    fn from(e: ValidationError) -> NavigationError {
        NavigationError::Validation(e)
    }
}

impl Error for NavigationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            NavigationError::Validation(e) => Some(e),
            _ => None,
        }
    }
}

impl Display for NavigationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NavigationError::OutOfOrder { current, requested } => write!(
                f,
                "Cannot go to step {:?} while on step {:?}",
                requested, current
            ),
            NavigationError::SelectionNotRun => write!(f, "Run the selection first"),
            NavigationError::Validation(e) => write!(f, "{}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_parsing_ignores_case_and_spaces() {
        assert_eq!(Response::parse("yes"), Response::Yes);
        assert_eq!(Response::parse(" YES "), Response::Yes);
        assert_eq!(Response::parse("No"), Response::No);
        assert_eq!(Response::parse(""), Response::Unset);
        assert_eq!(Response::parse("maybe"), Response::Unset);
    }

    #[test]
    fn event_config_validation() {
        assert_eq!(
            EventConfig::new("", 10),
            Err(ValidationError::EmptyEventName)
        );
        assert_eq!(
            EventConfig::new("   ", 10),
            Err(ValidationError::EmptyEventName)
        );
        assert!(matches!(
            EventConfig::new("Gala", 0),
            Err(ValidationError::InvalidCapacity(_))
        ));
        assert!(matches!(
            EventConfig::new("Gala", -3),
            Err(ValidationError::InvalidCapacity(_))
        ));
        let c = EventConfig::new(" Gala ", 5).unwrap();
        assert_eq!(c.name(), "Gala");
        assert_eq!(c.capacity().get(), 5);
        assert_eq!(c.date(), None);
    }

    #[test]
    fn event_config_from_form() {
        assert!(EventConfig::from_form("Gala", " 12 ").is_ok());
        assert!(matches!(
            EventConfig::from_form("Gala", ""),
            Err(ValidationError::InvalidCapacity(_))
        ));
        assert!(matches!(
            EventConfig::from_form("Gala", "twelve"),
            Err(ValidationError::InvalidCapacity(_))
        ));
        // The name is checked before the capacity.
        assert_eq!(
            EventConfig::from_form("", "abc"),
            Err(ValidationError::EmptyEventName)
        );
    }

    #[test]
    fn record_attendance_updates_counter_and_history() {
        let mut s = Student {
            user_id: "1".to_string(),
            name: "A".to_string(),
            email: "a@x.com".to_string(),
            class: "C1".to_string(),
            num_events_attended: 2,
            num_absences: 0,
            num_late_arrivals: 0,
            last_attended_date: None,
            events_attended: vec!["One".to_string()],
            response: Response::Yes,
        };
        let d = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        s.record_attendance("Gala", d);
        assert_eq!(s.num_events_attended, 3);
        assert_eq!(s.events_attended, vec!["One".to_string(), "Gala".to_string()]);
        assert_eq!(s.last_attended_date, Some(d));
    }

    #[test]
    fn csv_detection() {
        assert!(FileUpload::new("a.csv", "text/csv").is_csv());
        assert!(!FileUpload::new("a.xlsx", "application/octet-stream").is_csv());
    }
}
