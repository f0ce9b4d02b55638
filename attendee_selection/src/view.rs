//! What each step shows, computed from the session state alone.

use std::time::Instant;

use crate::config::*;
use crate::search::search;
use crate::session::{NoticeLevel, SessionState};

/// One line of the student database table.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct StudentRow {
    pub name: String,
    pub email: String,
    pub class: String,
    pub response: String,
    /// True if the response badge is the "yes" one.
    pub response_yes: bool,
    pub num_events_attended: u32,
    pub num_absences: u32,
    pub num_late_arrivals: u32,
    /// The date of the last attendance, or "Never".
    pub last_attended: String,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AttendeeItem {
    pub name: String,
    pub email: String,
    pub class: String,
    /// Rank in the draw, only for the selected students.
    pub rank: Option<usize>,
    pub selected: bool,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ResultStats {
    pub total_signups: usize,
    pub eligible: usize,
    pub selected: usize,
    pub waitlisted: usize,
    /// Selected over eligible, as a rounded percentage. 0 when nobody is eligible.
    pub selection_rate: u32,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum StepView {
    Upload {
        /// The name of the attached sign-up file, if any.
        signup_badge: Option<String>,
        historical_badge: Option<String>,
        can_proceed: bool,
    },
    Config,
    Database {
        info: String,
        rows: Vec<StudentRow>,
    },
    Selection {
        info: String,
        /// None until the selection has been run.
        selected: Option<Vec<AttendeeItem>>,
        eligible: Option<Vec<AttendeeItem>>,
    },
    Results {
        title: String,
        event_name: String,
        capacity: u32,
        stats: ResultStats,
        /// (rank, name, email, class) for each selected student.
        final_list: Vec<(usize, String, String, String)>,
    },
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ViewModel {
    pub step: Step,
    /// The notice still on screen at the time of rendering, with its level.
    pub notice: Option<(String, NoticeLevel)>,
    pub view: StepView,
}

fn event_header(state: &SessionState) -> (String, u32) {
    state
        .event()
        .map(|e| (e.name().to_string(), e.capacity().get()))
        .unwrap_or_default()
}

fn student_row(s: &Student) -> StudentRow {
    StudentRow {
        name: s.name.clone(),
        email: s.email.clone(),
        class: s.class.clone(),
        response: s.response.to_string(),
        response_yes: s.is_eligible(),
        num_events_attended: s.num_events_attended,
        num_absences: s.num_absences,
        num_late_arrivals: s.num_late_arrivals,
        last_attended: s
            .last_attended_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "Never".to_string()),
    }
}

fn attendee_item(state: &SessionState, idx: usize) -> Option<AttendeeItem> {
    let s = state.roster().get(idx)?;
    let rank = state.selection().and_then(|sel| sel.rank_of(idx));
    Some(AttendeeItem {
        name: s.name.clone(),
        email: s.email.clone(),
        class: s.class.clone(),
        rank,
        selected: rank.is_some(),
    })
}

pub fn result_stats(state: &SessionState) -> ResultStats {
    let total_signups = state.roster().len();
    let (eligible, selected, waitlisted) = state
        .selection()
        .map(|sel| (sel.eligible.len(), sel.selected.len(), sel.waitlisted()))
        .unwrap_or((0, 0, 0));
    let selection_rate = if eligible > 0 {
        ((selected as f64 / eligible as f64) * 100.0).round() as u32
    } else {
        0
    };
    ResultStats {
        total_signups,
        eligible,
        selected,
        waitlisted,
        selection_rate,
    }
}

/// Projects the session state onto the view of its current step.
///
/// `now` is only used to decide whether the last notice is still visible.
pub fn render(state: &SessionState, now: Instant) -> ViewModel {
    let (event_name, capacity) = event_header(state);
    let view = match state.step() {
        Step::Upload => StepView::Upload {
            signup_badge: state.signup_file().map(|f| f.name.clone()),
            historical_badge: state.historical_file().map(|f| f.name.clone()),
            can_proceed: state.signup_file().is_some(),
        },
        Step::Config => StepView::Config,
        Step::Database => StepView::Database {
            info: format!(
                "Event: {} | Capacity: {} | Total Students: {}",
                event_name,
                capacity,
                state.roster().len()
            ),
            rows: search(state.roster(), state.search_term())
                .into_iter()
                .map(student_row)
                .collect(),
        },
        Step::Selection => StepView::Selection {
            info: format!("Event: {} | Capacity: {}", event_name, capacity),
            selected: state.selection().map(|sel| {
                sel.selected
                    .iter()
                    .filter_map(|idx| attendee_item(state, *idx))
                    .collect()
            }),
            eligible: state.selection().map(|sel| {
                sel.eligible
                    .iter()
                    .filter_map(|idx| attendee_item(state, *idx))
                    .collect()
            }),
        },
        Step::Results => StepView::Results {
            title: format!("Final list of students selected for {}", event_name),
            event_name: event_name.clone(),
            capacity,
            stats: result_stats(state),
            final_list: state
                .selection()
                .map(|sel| sel.selected_students(state.roster()))
                .unwrap_or_default()
                .into_iter()
                .enumerate()
                .map(|(pos, s)| (pos + 1, s.name.clone(), s.email.clone(), s.class.clone()))
                .collect(),
        },
    };
    ViewModel {
        step: state.step(),
        notice: state
            .notice()
            .filter(|n| n.is_visible(now))
            .map(|n| (n.message.clone(), n.level)),
        view,
    }
}
