mod config;
use log::{debug, info};

use rand::seq::SliceRandom;
use rand::Rng;

use std::num::NonZeroU32;

pub use crate::config::*;

pub mod builder;
pub mod export;
pub mod manual;
pub mod search;
pub mod seed;
pub mod session;
pub mod view;

/// The outcome of one selection pass.
///
/// Both lists hold positions in the roster the selection was computed from. They
/// become meaningless as soon as that roster is replaced.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Selection {
    /// The students who answered yes, in roster order.
    pub eligible: Vec<usize>,
    /// All the eligible students, in draw order (after the priority sort in priority mode).
    pub drawn: Vec<usize>,
    /// The students who got a place: the first `capacity` entries of `drawn`.
    /// The first one has rank 1.
    pub selected: Vec<usize>,
}

impl Selection {
    /// The number of eligible students who did not get a place.
    pub fn waitlisted(&self) -> usize {
        self.eligible.len().saturating_sub(self.selected.len())
    }

    /// The eligible students who did not get a place, in draw order.
    pub fn waitlist(&self) -> &[usize] {
        self.drawn.get(self.selected.len()..).unwrap_or(&[])
    }

    pub fn is_selected(&self, roster_idx: usize) -> bool {
        self.selected.contains(&roster_idx)
    }

    /// The rank (starting at 1) of a student in the draw, if the student was selected.
    pub fn rank_of(&self, roster_idx: usize) -> Option<usize> {
        self.selected
            .iter()
            .position(|idx| *idx == roster_idx)
            .map(|pos| pos + 1)
    }

    pub fn eligible_students<'a>(&'a self, roster: &'a [Student]) -> Vec<&'a Student> {
        self.eligible.iter().filter_map(|idx| roster.get(*idx)).collect()
    }

    pub fn selected_students<'a>(&'a self, roster: &'a [Student]) -> Vec<&'a Student> {
        self.selected.iter().filter_map(|idx| roster.get(*idx)).collect()
    }
}

/// Positions of the students who answered yes, in roster order.
pub fn eligible_indices(roster: &[Student]) -> Vec<usize> {
    roster
        .iter()
        .enumerate()
        .filter(|(_, s)| s.is_eligible())
        .map(|(idx, _)| idx)
        .collect()
}

/// Draws the attendees of an event.
///
/// Arguments:
/// * `roster` the students to draw from. Only the students who answered yes take part.
/// * `capacity` the number of places
/// * `mode` how the eligible students are ordered before taking the first `capacity` of them
/// * `rng` the source of randomness. Every permutation of the eligible students can be drawn.
///
/// No eligible student is not an error: the selection is then empty.
pub fn select_attendees<R: Rng + ?Sized>(
    roster: &[Student],
    capacity: NonZeroU32,
    mode: SelectionMode,
    rng: &mut R,
) -> Selection {
    let eligible = eligible_indices(roster);
    info!(
        "Selecting up to {} attendees among {} eligible students ({} in roster), mode: {:?}",
        capacity,
        eligible.len(),
        roster.len(),
        mode
    );

    let mut ordered = eligible.clone();
    ordered.shuffle(rng);
    if mode == SelectionMode::Priority {
        // Stable sort: students with the same history keep their shuffled order.
        ordered.sort_by_key(|idx| priority_key(&roster[*idx]));
    }
    debug!("select_attendees: draw order: {:?}", ordered);

    let selected: Vec<usize> = ordered
        .iter()
        .take(capacity.get() as usize)
        .cloned()
        .collect();
    let res = Selection {
        eligible,
        drawn: ordered,
        selected,
    };
    info!(
        "Selected {} attendees, {} on the waitlist",
        res.selected.len(),
        res.waitlisted()
    );
    res
}

// A missing date compares as the smallest value, so students who never attended come first.
fn priority_key(s: &Student) -> (u32, u32, u32, Option<chrono::NaiveDate>) {
    (
        s.num_events_attended,
        s.num_absences,
        s.num_late_arrivals,
        s.last_attended_date,
    )
}
