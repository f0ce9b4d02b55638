use log::{debug, info, warn};

use attendee_selection::export::{build_artifacts, Adjustments, ArtifactKind, ExportArtifact, ExportError};
use attendee_selection::session::SessionState;
use attendee_selection::view::{render, StepView, ViewModel};
use attendee_selection::*;
use chrono::NaiveDate;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::Path;
use std::time::Instant;

use text_diff::print_diff;

use crate::args::Args;
use crate::raffle::config_reader::*;
use crate::raffle::io_common::*;

pub mod config_reader;
pub mod io_common;

#[derive(Debug, Snafu)]
pub enum RaffleError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the JSON content of {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Expected a number, found {value}"))]
    ParsingJsonNumber { value: String },
    #[snafu(display("Invalid date {value:?}, expected YYYY-MM-DD"))]
    ParsingDate {
        source: chrono::ParseError,
        value: String,
    },
    #[snafu(display("Invalid roster in {path}: {source}"))]
    InvalidRoster {
        source: ValidationError,
        path: String,
    },
    #[snafu(display("{source}"))]
    Workflow { source: NavigationError },
    #[snafu(display("Export failed: {source}"))]
    Export { source: ExportError },
    #[snafu(display("Error writing {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("The export {path} differs from the reference"))]
    ReferenceMismatch { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type RaffleResult<T> = Result<T, RaffleError>;

/// Everything needed to run one session, once the command line and the configuration
/// file have been merged.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SessionSettings {
    pub roster_file: Option<String>,
    pub signup_file: Option<String>,
    pub historical_file: Option<String>,
    pub event_name: String,
    pub capacity_text: String,
    pub event_date: Option<NaiveDate>,
    pub rules: SelectionRules,
    pub search: Option<String>,
    pub out: Option<String>,
    pub reference: Option<String>,
    pub adjustments: Adjustments,
}

/// Merges the command line arguments with the configuration file, if any.
/// The command line takes precedence.
pub fn session_settings(args: &Args) -> RaffleResult<SessionSettings> {
    let (config, root) = match &args.config {
        Some(p) => {
            let config = read_config(p)?;
            info!("config: {:?}", config);
            let root = Path::new(p).parent().map(|r| r.to_path_buf());
            (Some(config), root)
        }
        None => (None, None),
    };
    let root = root.as_deref();
    let event = config.as_ref().and_then(|c| c.event.clone());
    let from_config = |f: fn(&RaffleConfig) -> Option<String>| -> Option<String> {
        config
            .as_ref()
            .and_then(f)
            .map(|p| resolve_path(root, p.as_str()))
    };

    let event_name = match (&args.event_name, &event) {
        (Some(n), _) => n.clone(),
        (None, Some(e)) => e.name.clone(),
        (None, None) => String::new(),
    };
    let capacity_text = match (&args.capacity, &event) {
        (Some(c), _) => c.clone(),
        (None, Some(e)) => e.capacity_text()?,
        (None, None) => String::new(),
    };
    let event_date = match args
        .event_date
        .clone()
        .or_else(|| event.as_ref().and_then(|e| e.date.clone()))
    {
        Some(d) => Some(parse_date(&d)?),
        None => None,
    };
    let mode = match args
        .mode
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.selection_mode.clone()))
    {
        Some(m) => parse_selection_mode(&m)?,
        None => SelectionMode::Uniform,
    };
    let rules = SelectionRules {
        mode,
        seed: args
            .seed
            .or_else(|| config.as_ref().and_then(|c| c.random_seed)),
    };

    Ok(SessionSettings {
        roster_file: args
            .roster
            .clone()
            .or_else(|| from_config(|c| c.roster_file.clone())),
        signup_file: args
            .signup
            .clone()
            .or_else(|| from_config(|c| c.signup_file.clone())),
        historical_file: args
            .historical
            .clone()
            .or_else(|| from_config(|c| c.historical_file.clone())),
        event_name,
        capacity_text,
        event_date,
        rules,
        search: args.search.clone(),
        out: args
            .out
            .clone()
            .or_else(|| from_config(|c| c.output_directory.clone())),
        reference: args.reference.clone(),
        adjustments: config.as_ref().map(|c| c.adjustments()).unwrap_or_default(),
    })
}

fn print_view(vm: &ViewModel) {
    if let Some((message, level)) = &vm.notice {
        println!("[{:?}] {}", level, message);
    }
    match &vm.view {
        StepView::Database { info, rows } => {
            println!("{}", info);
            for r in rows {
                println!(
                    "  {:<20} {:<28} {:<18} {:<4} attended:{} absences:{} late:{} last:{}",
                    r.name,
                    r.email,
                    r.class,
                    r.response,
                    r.num_events_attended,
                    r.num_absences,
                    r.num_late_arrivals,
                    r.last_attended
                );
            }
        }
        StepView::Results {
            title,
            event_name,
            capacity,
            stats,
            final_list,
        } => {
            println!("Event: {} | Capacity: {}", event_name, capacity);
            println!(
                "Total sign-ups: {} | Eligible: {} | Selected: {} | Waitlisted: {} | Selection rate: {}%",
                stats.total_signups,
                stats.eligible,
                stats.selected,
                stats.waitlisted,
                stats.selection_rate
            );
            println!("{}", title);
            for (rank, name, email, class) in final_list {
                println!("  #{:<3} {:<20} {:<28} {}", rank, name, email, class);
            }
        }
        v => debug!("print_view: nothing to print for {:?}", v),
    }
}

fn check_reference(reference_path: &str, artifact: &ExportArtifact) -> RaffleResult<()> {
    let reference = fs::read_to_string(reference_path).context(OpeningJsonSnafu {
        path: reference_path,
    })?;
    info!("Comparing {:?} with {:?}", artifact.file_name, reference_path);
    let reference = reference.trim_end_matches('\n');
    if reference != artifact.content {
        warn!("Found differences with the reference file");
        print_diff(reference, artifact.content.as_str(), "\n");
        return ReferenceMismatchSnafu {
            path: artifact.file_name.clone(),
        }
        .fail();
    }
    Ok(())
}

/// Runs one session from the upload step to the exports.
///
/// Returns the exports that were produced.
pub fn run_session(settings: &SessionSettings) -> RaffleResult<Vec<ExportArtifact>> {
    let mut state = match &settings.roster_file {
        Some(p) => SessionState::with_roster(read_roster(p)?, &settings.rules),
        None => SessionState::new(&settings.rules),
    };

    // Upload
    let signup = match &settings.signup_file {
        Some(p) => p,
        None => whatever!("A sign-up file is required (--signup or signupFile)"),
    };
    state
        .attach_signup_file(file_upload(signup))
        .context(WorkflowSnafu {})?;
    if let Some(p) = &settings.historical_file {
        state
            .attach_historical_file(file_upload(p))
            .context(WorkflowSnafu {})?;
    }
    print_view(&render(&state, Instant::now()));
    state.proceed_to_config().context(WorkflowSnafu {})?;

    // Event configuration
    state
        .submit_config(
            &settings.event_name,
            &settings.capacity_text,
            settings.event_date,
        )
        .context(WorkflowSnafu {})?;

    // Student database
    if let Some(term) = &settings.search {
        state.set_search_term(term);
    }
    print_view(&render(&state, Instant::now()));
    state.proceed_to_selection().context(WorkflowSnafu {})?;

    // Selection and results
    state.run_attendee_selection().context(WorkflowSnafu {})?;
    state.show_results().context(WorkflowSnafu {})?;
    print_view(&render(&state, Instant::now()));

    let date = settings
        .event_date
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    let artifacts = build_artifacts(&state, date, &settings.adjustments).context(ExportSnafu {})?;

    match settings.out.as_deref() {
        Some("stdout") => {
            for a in artifacts.iter() {
                println!("{}:\n{}\n", a.file_name, a.content);
            }
        }
        Some(dir) => {
            for a in artifacts.iter() {
                let p = write_artifact(dir, a)?;
                println!("Wrote {}", p);
            }
        }
        None => info!("No output location given, exports are not written"),
    }

    if let Some(reference_path) = &settings.reference {
        let selected = artifacts
            .iter()
            .find(|a| a.kind == ArtifactKind::SelectedAttendees);
        match selected {
            Some(a) => check_reference(reference_path, a)?,
            None => whatever!("No selected attendees export to compare"),
        }
    }

    Ok(artifacts)
}

pub fn run(args: &Args) -> RaffleResult<()> {
    let settings = session_settings(args)?;
    debug!("run: settings: {:?}", settings);
    run_session(&settings)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn settings(dir: &Path) -> SessionSettings {
        SessionSettings {
            roster_file: None,
            signup_file: Some("signups.csv".to_string()),
            historical_file: None,
            event_name: "Spring Gala".to_string(),
            capacity_text: "2".to_string(),
            event_date: NaiveDate::from_ymd_opt(2024, 5, 4),
            rules: SelectionRules {
                mode: SelectionMode::Uniform,
                seed: Some(42),
            },
            search: None,
            out: Some(dir.display().to_string()),
            reference: None,
            adjustments: Adjustments::new(),
        }
    }

    #[test]
    fn writes_all_exports() {
        let dir = tempfile::tempdir().unwrap();
        let artifacts = run_session(&settings(dir.path())).unwrap();
        assert_eq!(artifacts.len(), 4);
        for a in artifacts.iter() {
            let written = fs::read_to_string(dir.path().join(&a.file_name)).unwrap();
            assert_eq!(written, a.content);
        }
        let updated = fs::read_to_string(dir.path().join("updated_student_database.csv")).unwrap();
        assert_eq!(updated.matches("2024-05-04").count(), 2);
    }

    #[test]
    fn seeded_runs_match_reference() {
        let dir = tempfile::tempdir().unwrap();
        let first = run_session(&settings(dir.path())).unwrap();
        let reference = dir.path().join("reference.csv");
        fs::write(&reference, &first[0].content).unwrap();

        let mut s = settings(dir.path());
        s.reference = Some(reference.display().to_string());
        assert!(run_session(&s).is_ok());

        fs::write(&reference, "user_id\nnobody").unwrap();
        assert!(matches!(
            run_session(&s),
            Err(RaffleError::ReferenceMismatch { .. })
        ));
    }

    #[test]
    fn rejects_bad_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = settings(dir.path());
        s.signup_file = Some("signups.xlsx".to_string());
        assert!(matches!(
            run_session(&s),
            Err(RaffleError::Workflow {
                source: NavigationError::Validation(ValidationError::NotCsv { .. })
            })
        ));

        let mut s = settings(dir.path());
        s.capacity_text = "0".to_string();
        assert!(matches!(
            run_session(&s),
            Err(RaffleError::Workflow {
                source: NavigationError::Validation(ValidationError::InvalidCapacity(_))
            })
        ));

        let mut s = settings(dir.path());
        s.signup_file = None;
        assert!(matches!(run_session(&s), Err(RaffleError::Whatever { .. })));
    }

    #[test]
    fn settings_from_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        let mut f = fs::File::create(&config_path).unwrap();
        write!(
            f,
            r#"{{
                "event": {{"name": "Spring Gala", "capacity": "3"}},
                "signupFile": "signups.csv",
                "randomSeed": 9,
                "selectionMode": "priority",
                "outputDirectory": "out"
            }}"#
        )
        .unwrap();

        let args = Args {
            config: Some(config_path.display().to_string()),
            capacity: Some("2".to_string()),
            ..Args::default()
        };
        let s = session_settings(&args).unwrap();
        assert_eq!(s.event_name, "Spring Gala");
        assert_eq!(s.capacity_text, "2");
        assert_eq!(s.rules.seed, Some(9));
        assert_eq!(s.rules.mode, SelectionMode::Priority);
        assert_eq!(
            s.signup_file,
            Some(dir.path().join("signups.csv").display().to_string())
        );
        assert_eq!(s.out, Some(dir.path().join("out").display().to_string()));
    }

    #[test]
    fn roster_file_with_duplicates_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let roster_path = dir.path().join("roster.json");
        fs::write(
            &roster_path,
            r#"[{"user_id": "1", "name": "A", "response": "yes"},
                {"user_id": "1", "name": "B", "response": "yes"}]"#,
        )
        .unwrap();
        let mut s = settings(dir.path());
        s.roster_file = Some(roster_path.display().to_string());
        assert!(matches!(
            run_session(&s),
            Err(RaffleError::InvalidRoster { .. })
        ));
    }

    #[test]
    fn roster_file_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let roster_path = dir.path().join("roster.json");
        fs::write(
            &roster_path,
            r#"[{"user_id": "1", "name": "A", "email": "a@x.com", "response": "yes"},
                {"user_id": "2", "name": "B", "email": "b@x.com", "response": "no"},
                {"user_id": "3", "name": "C", "email": "c@x.com", "response": "yes"},
                {"user_id": "4", "name": "D", "email": "d@x.com", "response": ""},
                {"user_id": "5", "name": "E", "email": "e@x.com", "response": "YES"}]"#,
        )
        .unwrap();
        let mut s = settings(dir.path());
        s.roster_file = Some(roster_path.display().to_string());
        let artifacts = run_session(&s).unwrap();
        // Header, then 2 selected and 3 eligible.
        assert_eq!(artifacts[0].content.split('\n').count(), 3);
        assert_eq!(artifacts[1].content.split('\n').count(), 4);
        assert!(!artifacts[0].content.contains(",no"));
    }
}
