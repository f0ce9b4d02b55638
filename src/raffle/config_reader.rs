use crate::raffle::*;

use attendee_selection::builder::RosterBuilder;
use attendee_selection::export::{Adjustments, AttendanceAdjustment};
use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use std::collections::HashMap;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct EventSettings {
    pub name: String,
    // A number, or a string as typed in a form.
    #[serde(rename = "capacity")]
    _capacity: Option<JSValue>,
    pub date: Option<String>,
}

impl EventSettings {
    /// The capacity as form text. Validation happens when the form is submitted.
    pub fn capacity_text(&self) -> RaffleResult<String> {
        match &self._capacity {
            Some(JSValue::Number(n)) => Ok(n.to_string()),
            Some(JSValue::String(s)) => Ok(s.clone()),
            None => Ok(String::new()),
            Some(x) => ParsingJsonNumberSnafu {
                value: x.to_string(),
            }
            .fail(),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct AdjustmentSettings {
    pub absent: Option<bool>,
    pub late: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RaffleConfig {
    pub event: Option<EventSettings>,
    #[serde(rename = "signupFile")]
    pub signup_file: Option<String>,
    #[serde(rename = "historicalFile")]
    pub historical_file: Option<String>,
    #[serde(rename = "rosterFile")]
    pub roster_file: Option<String>,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "randomSeed")]
    pub random_seed: Option<u64>,
    #[serde(rename = "selectionMode")]
    pub selection_mode: Option<String>,
    pub adjustments: Option<HashMap<String, AdjustmentSettings>>,
}

impl RaffleConfig {
    pub fn adjustments(&self) -> Adjustments {
        self.adjustments
            .iter()
            .flatten()
            .map(|(user_id, a)| {
                (
                    user_id.clone(),
                    AttendanceAdjustment {
                        absent: a.absent.unwrap_or(false),
                        late: a.late.unwrap_or(false),
                    },
                )
            })
            .collect()
    }
}

/// A student, as stored in a roster file.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct StudentRecord {
    pub user_id: JSValue,
    pub name: String,
    pub email: Option<String>,
    pub class: Option<String>,
    pub num_events_attended: Option<u32>,
    pub num_absences: Option<u32>,
    pub num_late_arrivals: Option<u32>,
    pub last_attended_date: Option<String>,
    pub events_attended: Option<Vec<String>>,
    pub response: Option<String>,
}

impl StudentRecord {
    pub fn to_student(&self) -> RaffleResult<Student> {
        let user_id = match &self.user_id {
            JSValue::String(s) => s.clone(),
            JSValue::Number(n) => n.to_string(),
            x => whatever!("user_id must be a string or a number, found {}", x),
        };
        let last_attended_date = match self.last_attended_date.as_deref() {
            None | Some("") => None,
            Some(d) => Some(parse_date(d)?),
        };
        Ok(Student {
            user_id,
            name: self.name.clone(),
            email: self.email.clone().unwrap_or_default(),
            class: self.class.clone().unwrap_or_default(),
            num_events_attended: self.num_events_attended.unwrap_or(0),
            num_absences: self.num_absences.unwrap_or(0),
            num_late_arrivals: self.num_late_arrivals.unwrap_or(0),
            last_attended_date,
            events_attended: self.events_attended.clone().unwrap_or_default(),
            response: Response::parse(self.response.as_deref().unwrap_or("")),
        })
    }
}

pub fn parse_date(value: &str) -> RaffleResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").context(ParsingDateSnafu {
        value: value.to_string(),
    })
}

pub fn parse_selection_mode(value: &str) -> RaffleResult<SelectionMode> {
    match value {
        "uniform" => Ok(SelectionMode::Uniform),
        "priority" => Ok(SelectionMode::Priority),
        _ => whatever!("unknown selection mode: {}", value),
    }
}

pub fn read_config(path: &str) -> RaffleResult<RaffleConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    debug!("read_config: content: {:?}", contents);
    serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })
}

pub fn read_roster(path: &str) -> RaffleResult<Vec<Student>> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let records: Vec<StudentRecord> =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    info!("Read {} students from {:?}", records.len(), path);
    let mut builder = RosterBuilder::new();
    for r in records.iter() {
        builder
            .add_student(r.to_student()?)
            .context(InvalidRosterSnafu { path })?;
    }
    Ok(builder.build())
}
