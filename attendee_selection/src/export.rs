//! The CSV artifacts produced at the end of a session.
//!
//! All the functions here are pure: the live roster is never updated, even by the
//! updated-database export.

use log::{debug, info};

use chrono::NaiveDate;

use std::collections::HashMap;
use std::error::Error;
use std::fmt::Display;

use crate::config::*;
use crate::session::SessionState;
use crate::Selection;

/// Extra attendance information about one student, applied by the updated-database export.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct AttendanceAdjustment {
    pub absent: bool,
    pub late: bool,
}

/// Adjustments, by user id.
pub type Adjustments = HashMap<String, AttendanceAdjustment>;

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum ArtifactKind {
    SelectedAttendees,
    AllEligible,
    UpdatedDatabase,
    Ranking,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ExportArtifact {
    pub kind: ArtifactKind,
    pub file_name: String,
    pub content: String,
}

#[derive(Debug)]
pub enum ExportError {
    MissingEventConfig,
    MissingSelection,
    Csv(csv::Error),
    Encoding(std::string::FromUtf8Error),
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ExportError::Csv(e) => Some(e),
            ExportError::Encoding(e) => Some(e),
            _ => None,
        }
    }
}

impl Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::MissingEventConfig => write!(f, "No event has been configured"),
            ExportError::MissingSelection => write!(f, "The selection has not been run"),
            ExportError::Csv(e) => write!(f, "Failed to write CSV: {}", e),
            ExportError::Encoding(e) => write!(f, "CSV output is not valid UTF-8: {}", e),
        }
    }
}

impl From<csv::Error> for ExportError {
    fn from(e: csv::Error) -> ExportError {
        ExportError::Csv(e)
    }
}

/// The event name, with every run of whitespace replaced by an underscore.
pub fn file_name_stem(event_name: &str) -> String {
    let mut res = String::with_capacity(event_name.len());
    let mut in_space = false;
    for c in event_name.chars() {
        if c.is_whitespace() {
            if !in_space {
                res.push('_');
            }
            in_space = true;
        } else {
            res.push(c);
            in_space = false;
        }
    }
    res
}

fn student_record(s: &Student) -> Vec<String> {
    vec![
        s.user_id.clone(),
        s.name.clone(),
        s.email.clone(),
        s.class.clone(),
        s.num_events_attended.to_string(),
        s.num_absences.to_string(),
        s.num_late_arrivals.to_string(),
        format_date(s.last_attended_date),
        s.events_attended.join(", "),
        s.response.to_string(),
    ]
}

fn format_date(d: Option<NaiveDate>) -> String {
    d.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

// Records are separated by a newline, without one after the last record.
fn write_table(header: &[&str], rows: &[Vec<String>]) -> Result<String, ExportError> {
    if rows.is_empty() {
        return Ok(String::new());
    }
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(vec![]);
    wtr.write_record(header)?;
    for row in rows {
        wtr.write_record(row)?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| ExportError::Csv(csv::Error::from(e.into_error())))?;
    let mut text = String::from_utf8(bytes).map_err(ExportError::Encoding)?;
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

/// The students as a CSV table, using the roster fields as columns.
///
/// Fields containing a comma, a double quote or a line break are quoted, and quotes
/// inside them are doubled. No students gives an empty string.
pub fn students_csv(students: &[&Student]) -> Result<String, ExportError> {
    let rows: Vec<Vec<String>> = students.iter().map(|s| student_record(s)).collect();
    write_table(&Student::FIELD_NAMES, &rows)
}

pub fn selected_csv(roster: &[Student], selection: &Selection) -> Result<String, ExportError> {
    students_csv(&selection.selected_students(roster))
}

pub fn eligible_csv(roster: &[Student], selection: &Selection) -> Result<String, ExportError> {
    students_csv(&selection.eligible_students(roster))
}

/// A copy of the roster in which the selected students attended the event on `date`.
///
/// `date` is written as `last_attended_date` of every selected student. `eventraffle`
/// passes the event date when the event has one, and the day of the export otherwise.
/// The counters stop at `u32::MAX`.
pub fn updated_roster(
    roster: &[Student],
    selection: &Selection,
    event_name: &str,
    date: NaiveDate,
    adjustments: &Adjustments,
) -> Vec<Student> {
    roster
        .iter()
        .enumerate()
        .map(|(idx, s)| {
            let mut s = s.clone();
            if selection.is_selected(idx) {
                s.record_attendance(event_name, date);
            }
            if let Some(adj) = adjustments.get(&s.user_id) {
                debug!("updated_roster: adjusting {:?}: {:?}", s.user_id, adj);
                if adj.absent {
                    s.num_absences = s.num_absences.saturating_add(1);
                }
                if adj.late {
                    s.num_late_arrivals = s.num_late_arrivals.saturating_add(1);
                }
            }
            s
        })
        .collect()
}

pub fn updated_database_csv(
    roster: &[Student],
    selection: &Selection,
    event_name: &str,
    date: NaiveDate,
    adjustments: &Adjustments,
) -> Result<String, ExportError> {
    let updated = updated_roster(roster, selection, event_name, date, adjustments);
    let refs: Vec<&Student> = updated.iter().collect();
    students_csv(&refs)
}

const RANKING_FIELD_NAMES: [&str; 10] = [
    "rank",
    "selected",
    "user_id",
    "name",
    "email",
    "class",
    "num_events_attended",
    "num_absences",
    "num_late_arrivals",
    "last_attended_date",
];

/// All the eligible students with their rank: the selected ones first, then the
/// waitlist, both in draw order. In priority mode the waitlist follows the priority order.
pub fn ranking_csv(roster: &[Student], selection: &Selection) -> Result<String, ExportError> {
    let rows: Vec<Vec<String>> = selection
        .selected
        .iter()
        .chain(selection.waitlist())
        .filter_map(|idx| roster.get(*idx).map(|s| (*idx, s)))
        .enumerate()
        .map(|(pos, (idx, s))| {
            vec![
                (pos + 1).to_string(),
                if selection.is_selected(idx) { "yes" } else { "no" }.to_string(),
                s.user_id.clone(),
                s.name.clone(),
                s.email.clone(),
                s.class.clone(),
                s.num_events_attended.to_string(),
                s.num_absences.to_string(),
                s.num_late_arrivals.to_string(),
                format_date(s.last_attended_date),
            ]
        })
        .collect();
    write_table(&RANKING_FIELD_NAMES, &rows)
}

/// Builds the four artifacts of a finished session.
///
/// Arguments:
/// * `state` the session. The event must be configured and the selection run.
/// * `date` the attendance date recorded in the updated database
/// * `adjustments` absences and late arrivals to record in the updated database
pub fn build_artifacts(
    state: &SessionState,
    date: NaiveDate,
    adjustments: &Adjustments,
) -> Result<Vec<ExportArtifact>, ExportError> {
    let event = state.event().ok_or(ExportError::MissingEventConfig)?;
    let selection = state.selection().ok_or(ExportError::MissingSelection)?;
    let roster = state.roster();
    let stem = file_name_stem(event.name());
    info!(
        "Building exports for {:?}: {} selected, {} eligible",
        event.name(),
        selection.selected.len(),
        selection.eligible.len()
    );
    Ok(vec![
        ExportArtifact {
            kind: ArtifactKind::SelectedAttendees,
            file_name: format!("{}_selected_attendees.csv", stem),
            content: selected_csv(roster, selection)?,
        },
        ExportArtifact {
            kind: ArtifactKind::AllEligible,
            file_name: format!("{}_all_eligible.csv", stem),
            content: eligible_csv(roster, selection)?,
        },
        ExportArtifact {
            kind: ArtifactKind::UpdatedDatabase,
            file_name: "updated_student_database.csv".to_string(),
            content: updated_database_csv(roster, selection, event.name(), date, adjustments)?,
        },
        ExportArtifact {
            kind: ArtifactKind::Ranking,
            file_name: format!("{}_ranking.csv", stem),
            content: ranking_csv(roster, selection)?,
        },
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::mock_roster;
    use crate::select_attendees;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::num::NonZeroU32;

    fn student(name: &str) -> Student {
        Student {
            user_id: "1".to_string(),
            name: name.to_string(),
            email: "a@x.com".to_string(),
            class: "C1".to_string(),
            num_events_attended: 0,
            num_absences: 0,
            num_late_arrivals: 0,
            last_attended_date: None,
            events_attended: vec![],
            response: Response::Yes,
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 4).unwrap()
    }

    #[test]
    fn quotes_fields_with_commas() {
        let s = student("A,B");
        let text = students_csv(&[&s]).unwrap();
        let lines: Vec<&str> = text.split('\n').collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "user_id,name,email,class,num_events_attended,num_absences,num_late_arrivals,last_attended_date,events_attended,response"
        );
        assert_eq!(lines[1], "1,\"A,B\",a@x.com,C1,0,0,0,,,yes");

        // Reading it back gives as many fields in the row as in the header.
        let mut rdr = csv::ReaderBuilder::new().from_reader(text.as_bytes());
        let header_len = rdr.headers().unwrap().len();
        let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), header_len);
        assert_eq!(&rows[0][1], "A,B");
    }

    #[test]
    fn doubles_embedded_quotes() {
        let s = student("The \"Ace\"");
        let text = students_csv(&[&s]).unwrap();
        assert!(text.contains("\"The \"\"Ace\"\"\""));
    }

    #[test]
    fn empty_export_is_empty() {
        assert_eq!(students_csv(&[]).unwrap(), "");
    }

    #[test]
    fn history_and_dates_are_formatted() {
        let roster = mock_roster();
        let text = students_csv(&[&roster[0]]).unwrap();
        assert!(text.ends_with(
            "001,Alice Johnson,alice@university.edu,Computer Science,3,1,0,2024-01-15,\"Tech Talk 2023, Workshop 2024, Networking Event\",yes"
        ));
    }

    #[test]
    fn file_names() {
        assert_eq!(file_name_stem("Spring  Gala\t2024"), "Spring_Gala_2024");
        assert_eq!(file_name_stem("Gala"), "Gala");
    }

    #[test]
    fn updated_database_does_not_touch_roster() {
        let roster = mock_roster();
        let selection = Selection {
            eligible: vec![0, 1, 2, 4],
            drawn: vec![2, 0, 4, 1],
            selected: vec![2, 0],
        };
        let mut adjustments = Adjustments::new();
        adjustments.insert(
            "004".to_string(),
            AttendanceAdjustment {
                absent: true,
                late: false,
            },
        );
        let updated = updated_roster(&roster, &selection, "Gala", day(), &adjustments);
        assert_eq!(roster, mock_roster());

        assert_eq!(updated[2].num_events_attended, 1);
        assert_eq!(updated[2].events_attended, vec!["Gala".to_string()]);
        assert_eq!(updated[2].last_attended_date, Some(day()));
        assert_eq!(updated[0].num_events_attended, 4);
        assert_eq!(updated[0].events_attended.last().unwrap(), "Gala");
        // Not selected: unchanged apart from the adjustment.
        assert_eq!(updated[1], roster[1]);
        assert_eq!(updated[3].num_absences, roster[3].num_absences + 1);
        assert_eq!(updated[3].num_events_attended, roster[3].num_events_attended);

        let text =
            updated_database_csv(&roster, &selection, "Gala", day(), &adjustments).unwrap();
        assert_eq!(text.split('\n').count(), 6);
    }

    #[test]
    fn ranking_lists_selected_first() {
        let roster = mock_roster();
        let selection = Selection {
            eligible: vec![0, 1, 2, 4],
            drawn: vec![4, 1, 2, 0],
            selected: vec![4, 1],
        };
        let text = ranking_csv(&roster, &selection).unwrap();
        let lines: Vec<&str> = text.split('\n').collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("rank,selected,user_id"));
        assert!(lines[1].starts_with("1,yes,005,"));
        assert!(lines[2].starts_with("2,yes,002,"));
        assert!(lines[3].starts_with("3,no,003,"));
        assert!(lines[4].starts_with("4,no,001,"));
    }

    #[test]
    fn priority_ranking_follows_history() {
        let roster = mock_roster();
        let mut rng = StdRng::seed_from_u64(3);
        let selection = select_attendees(
            &roster,
            NonZeroU32::new(1).unwrap(),
            SelectionMode::Priority,
            &mut rng,
        );
        let text = ranking_csv(&roster, &selection).unwrap();
        let lines: Vec<&str> = text.split('\n').collect();
        assert_eq!(lines.len(), 5);
        // Carol and Eva never attended, Carol was never late. Alice attended most.
        assert!(lines[1].starts_with("1,yes,003,"));
        assert!(lines[2].starts_with("2,no,005,"));
        assert!(lines[3].starts_with("3,no,002,"));
        assert!(lines[4].starts_with("4,no,001,"));
    }

    #[test]
    fn counters_stop_at_the_maximum() {
        let mut s = student("Max");
        s.num_events_attended = u32::MAX;
        s.num_absences = u32::MAX;
        s.num_late_arrivals = u32::MAX;
        let roster = vec![s];
        let selection = Selection {
            eligible: vec![0],
            drawn: vec![0],
            selected: vec![0],
        };
        let mut adjustments = Adjustments::new();
        adjustments.insert(
            "1".to_string(),
            AttendanceAdjustment {
                absent: true,
                late: true,
            },
        );
        let updated = updated_roster(&roster, &selection, "Gala", day(), &adjustments);
        assert_eq!(updated[0].num_events_attended, u32::MAX);
        assert_eq!(updated[0].num_absences, u32::MAX);
        assert_eq!(updated[0].num_late_arrivals, u32::MAX);
        assert_eq!(updated[0].events_attended, vec!["Gala".to_string()]);
    }

    #[test]
    fn artifacts_need_a_selection() {
        let mut state = SessionState::new(&SelectionRules {
            mode: SelectionMode::Uniform,
            seed: Some(1),
        });
        assert!(matches!(
            build_artifacts(&state, day(), &Adjustments::new()),
            Err(ExportError::MissingEventConfig)
        ));
        state.set_event_config("Spring Gala", 2).unwrap();
        assert!(matches!(
            build_artifacts(&state, day(), &Adjustments::new()),
            Err(ExportError::MissingSelection)
        ));
        state.run_selection().unwrap();
        let artifacts = build_artifacts(&state, day(), &Adjustments::new()).unwrap();
        let names: Vec<&str> = artifacts.iter().map(|a| a.file_name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Spring_Gala_selected_attendees.csv",
                "Spring_Gala_all_eligible.csv",
                "updated_student_database.csv",
                "Spring_Gala_ranking.csv",
            ]
        );
        // Header and two selected students.
        assert_eq!(artifacts[0].content.split('\n').count(), 3);
        assert_eq!(artifacts[1].content.split('\n').count(), 5);
        // The live roster still has the original counters.
        assert_eq!(state.roster(), mock_roster().as_slice());
    }
}
