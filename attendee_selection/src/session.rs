//! The state of one session and the steps that move it forward.
//!
//! All the actions are synchronous and run to completion. A failed action leaves the
//! state as it was, except for the notice shown to the organizer.

use log::{debug, info, warn};

use rand::rngs::StdRng;
use rand::SeedableRng;

use std::time::{Duration, Instant};

use crate::config::*;
use crate::seed::mock_roster;
use crate::{select_attendees, Selection};

/// How long a notice stays on screen.
pub const NOTICE_DURATION: Duration = Duration::from_secs(3);

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A short message for the organizer. It disappears after `NOTICE_DURATION`.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Notice {
    pub message: String,
    pub level: NoticeLevel,
    pub issued_at: Instant,
}

impl Notice {
    fn new(message: String, level: NoticeLevel) -> Notice {
        Notice {
            message,
            level,
            issued_at: Instant::now(),
        }
    }

    pub fn is_visible(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.issued_at) < NOTICE_DURATION
    }
}

/// Everything the workflow knows about, for the lifetime of one session.
pub struct SessionState {
    step: Step,
    signup_file: Option<FileUpload>,
    historical_file: Option<FileUpload>,
    event: Option<EventConfig>,
    roster: Vec<Student>,
    selection: Option<Selection>,
    search_term: String,
    notice: Option<Notice>,
    rules: SelectionRules,
    rng: StdRng,
    initial_roster: Vec<Student>,
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

impl SessionState {
    /// A session on the built-in roster.
    pub fn new(rules: &SelectionRules) -> SessionState {
        SessionState::with_roster(mock_roster(), rules)
    }

    /// A session that starts (and restarts after a reset) from the given roster.
    pub fn with_roster(roster: Vec<Student>, rules: &SelectionRules) -> SessionState {
        info!(
            "Starting session with {} students, rules: {:?}",
            roster.len(),
            rules
        );
        SessionState {
            step: Step::Upload,
            signup_file: None,
            historical_file: None,
            event: None,
            roster: roster.clone(),
            selection: None,
            search_term: String::new(),
            notice: None,
            rules: rules.clone(),
            rng: make_rng(rules.seed),
            initial_roster: roster,
        }
    }

    // ******** Accessors *********

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn roster(&self) -> &[Student] {
        &self.roster
    }

    pub fn event(&self) -> Option<&EventConfig> {
        self.event.as_ref()
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn signup_file(&self) -> Option<&FileUpload> {
        self.signup_file.as_ref()
    }

    pub fn historical_file(&self) -> Option<&FileUpload> {
        self.historical_file.as_ref()
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn rules(&self) -> &SelectionRules {
        &self.rules
    }

    // ******** State store *********

    /// Replaces the roster. Any previous selection refers to the old roster and is dropped.
    pub fn set_roster(&mut self, students: Vec<Student>) {
        info!("set_roster: {} students", students.len());
        self.roster = students;
        self.selection = None;
    }

    /// Sets the event. Fails once the attendees have been drawn.
    pub fn set_event_config(&mut self, name: &str, capacity: i64) -> Result<(), ValidationError> {
        self.check_event_open()?;
        let config = EventConfig::new(name, capacity)?;
        self.store_event(config);
        Ok(())
    }

    fn check_event_open(&self) -> Result<(), ValidationError> {
        if self.selection.is_some() {
            warn!("Rejected event change after the selection");
            return Err(ValidationError::EventAlreadyConfigured);
        }
        Ok(())
    }

    fn store_event(&mut self, config: EventConfig) {
        info!(
            "Event configured: {:?} capacity: {}",
            config.name(),
            config.capacity()
        );
        self.event = Some(config);
    }

    /// Draws the attendees from the current roster. Any previous draw is replaced.
    pub fn run_selection(&mut self) -> Result<&Selection, ValidationError> {
        let capacity = self
            .event
            .as_ref()
            .map(|e| e.capacity())
            .ok_or(ValidationError::MissingEventConfig)?;
        let sel = select_attendees(&self.roster, capacity, self.rules.mode, &mut self.rng);
        Ok(&*self.selection.insert(sel))
    }

    /// Goes back to the state of a fresh session.
    pub fn reset(&mut self) {
        info!("Resetting session");
        *self = SessionState::with_roster(self.initial_roster.clone(), &self.rules);
    }

    pub fn set_search_term(&mut self, term: &str) {
        debug!("set_search_term: {:?}", term);
        self.search_term = term.to_string();
    }

    // ******** Navigation *********

    fn expect_step(&self, expected: Step, requested: Step) -> Result<(), NavigationError> {
        if self.step != expected {
            warn!(
                "Rejected move to step {:?} from step {:?}",
                requested, self.step
            );
            return Err(NavigationError::OutOfOrder {
                current: self.step,
                requested,
            });
        }
        Ok(())
    }

    fn go_to(&mut self, step: Step) {
        info!("Step {:?} -> {:?}", self.step, step);
        self.step = step;
    }

    fn notify_error(&mut self, e: &ValidationError) {
        warn!("Validation failed: {:?}", e);
        self.notice = Some(Notice::new(e.to_string(), NoticeLevel::Error));
    }

    fn check_csv(&mut self, file: &FileUpload) -> Result<(), ValidationError> {
        if file.is_csv() {
            return Ok(());
        }
        let e = ValidationError::NotCsv {
            file_name: file.name.clone(),
            content_type: file.content_type.clone(),
        };
        self.notify_error(&e);
        Err(e)
    }

    /// Attaches the sign-up file. The previous file is kept if the new one is not a CSV file.
    pub fn attach_signup_file(&mut self, file: FileUpload) -> Result<(), NavigationError> {
        self.expect_step(Step::Upload, Step::Upload)?;
        self.check_csv(&file)?;
        info!("Sign-up file attached: {:?}", file.name);
        self.signup_file = Some(file);
        self.notice = Some(Notice::new(
            "Sign-up file loaded successfully".to_string(),
            NoticeLevel::Success,
        ));
        Ok(())
    }

    pub fn attach_historical_file(&mut self, file: FileUpload) -> Result<(), NavigationError> {
        self.expect_step(Step::Upload, Step::Upload)?;
        self.check_csv(&file)?;
        info!("Historical file attached: {:?}", file.name);
        self.historical_file = Some(file);
        self.notice = Some(Notice::new(
            "Historical database file loaded successfully".to_string(),
            NoticeLevel::Success,
        ));
        Ok(())
    }

    pub fn proceed_to_config(&mut self) -> Result<(), NavigationError> {
        self.expect_step(Step::Upload, Step::Config)?;
        if self.signup_file.is_none() {
            let e = ValidationError::MissingSignupFile;
            self.notify_error(&e);
            return Err(e.into());
        }
        self.go_to(Step::Config);
        Ok(())
    }

    pub fn back_to_upload(&mut self) -> Result<(), NavigationError> {
        self.expect_step(Step::Config, Step::Upload)?;
        self.go_to(Step::Upload);
        Ok(())
    }

    /// Validates the event form and moves on to the student database.
    pub fn submit_config(
        &mut self,
        name: &str,
        capacity_text: &str,
        date: Option<chrono::NaiveDate>,
    ) -> Result<(), NavigationError> {
        self.expect_step(Step::Config, Step::Database)?;
        let config = match self
            .check_event_open()
            .and_then(|_| EventConfig::from_form(name, capacity_text))
        {
            Ok(c) => c,
            Err(e) => {
                self.notify_error(&e);
                return Err(e.into());
            }
        };
        self.store_event(config.with_date(date));
        self.go_to(Step::Database);
        Ok(())
    }

    pub fn proceed_to_selection(&mut self) -> Result<(), NavigationError> {
        self.expect_step(Step::Database, Step::Selection)?;
        self.go_to(Step::Selection);
        Ok(())
    }

    /// The "run selection" action of the selection step.
    pub fn run_attendee_selection(&mut self) -> Result<&Selection, NavigationError> {
        self.expect_step(Step::Selection, Step::Selection)?;
        Ok(self.run_selection()?)
    }

    pub fn show_results(&mut self) -> Result<(), NavigationError> {
        self.expect_step(Step::Selection, Step::Results)?;
        if self.selection.is_none() {
            return Err(NavigationError::SelectionNotRun);
        }
        self.go_to(Step::Results);
        Ok(())
    }
}
