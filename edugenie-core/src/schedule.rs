//! Study schedule planning
//!
//! The model proposes study sessions as JSON; sessions are kept only when
//! their date and times parse and fall inside the requested range.

use crate::config::ValidationError;
use crate::extract::extract_json;
use crate::protocol::{CompletionRequest, ConversationTurn};
use crate::providers::{CompletionService, ProviderError};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

const SCHEDULE_INSTRUCTIONS: &str = "You are a study planner. Reply with JSON only, no prose and no markdown. \
The JSON must be an object of the form {\"events\": [{\"title\": string, \"date\": \"YYYY-MM-DD\", \
\"startTime\": \"HH:MM\", \"endTime\": \"HH:MM\", \"subject\": string, \"description\": string}]}. \
Use 24-hour times and stay within the requested dates and daily hours.";

/// Errors from schedule planning
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("model returned malformed schedule: {0}")]
    MalformedOutput(String),
}

fn default_max_output_tokens() -> u32 {
    2500
}
fn default_temperature() -> f32 {
    0.4
}
fn default_max_days() -> i64 {
    60
}

/// Settings for schedule generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleSettings {
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Longest inclusive date range accepted
    #[serde(default = "default_max_days")]
    pub max_days: i64,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            max_output_tokens: default_max_output_tokens(),
            temperature: default_temperature(),
            max_days: default_max_days(),
        }
    }
}

impl ScheduleSettings {
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.max_output_tokens == 0 {
            return Err(ValidationError::out_of_range(
                format!("{}.max_output_tokens", path),
                "Must be greater than 0",
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ValidationError::out_of_range(
                format!("{}.temperature", path),
                "Must be between 0.0 and 2.0",
            ));
        }
        if self.max_days < 1 {
            return Err(ValidationError::out_of_range(
                format!("{}.max_days", path),
                "Must be at least 1",
            ));
        }
        Ok(())
    }
}

fn default_hours_per_day() -> f32 {
    2.0
}

/// A request for a study plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRequest {
    #[serde(default)]
    pub subjects: Vec<String>,

    /// ISO date, `YYYY-MM-DD`
    #[serde(default)]
    pub start_date: String,

    #[serde(default)]
    pub end_date: String,

    #[serde(default = "default_hours_per_day")]
    pub hours_per_day: f32,

    /// Free-form constraints such as "mornings only"
    #[serde(default)]
    pub preferences: Option<String>,
}

/// Validated date range of a request, inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of days covered, counting both ends
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl ScheduleRequest {
    fn subjects(&self) -> Vec<&str> {
        self.subjects
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Check the request and return its date range
    pub fn validate(&self, max_days: i64) -> Result<DateRange, ScheduleError> {
        if self.subjects().is_empty() {
            return Err(ScheduleError::Validation(
                "at least one subject is required".to_string(),
            ));
        }

        let parse = |field: &str, value: &str| {
            NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
                ScheduleError::Validation(format!("{} must be a date in YYYY-MM-DD format", field))
            })
        };
        let range = DateRange {
            start: parse("startDate", &self.start_date)?,
            end: parse("endDate", &self.end_date)?,
        };

        if range.end < range.start {
            return Err(ScheduleError::Validation(
                "endDate must not be before startDate".to_string(),
            ));
        }
        if range.days() > max_days {
            return Err(ScheduleError::Validation(format!(
                "date range must not exceed {} days",
                max_days
            )));
        }
        if !(self.hours_per_day > 0.0 && self.hours_per_day <= 12.0) {
            return Err(ScheduleError::Validation(
                "hoursPerDay must be greater than 0 and at most 12".to_string(),
            ));
        }

        Ok(range)
    }
}

/// One planned study session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyEvent {
    pub title: String,

    pub date: NaiveDate,

    #[serde(with = "hh_mm")]
    pub start_time: NaiveTime,

    #[serde(with = "hh_mm")]
    pub end_time: NaiveTime,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

mod hh_mm {
    use super::{parse_time, TIME_FORMAT};
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(TIME_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_time(&raw).ok_or_else(|| de::Error::custom(format!("invalid time '{}'", raw)))
    }
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

fn field<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| object.get(*key))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|s| !s.is_empty())
}

fn normalize_event(value: &Value, range: &DateRange) -> Option<StudyEvent> {
    let object = value.as_object()?;

    // Dates may arrive with a time suffix: "2026-03-01T09:00:00"
    let date_raw = field(object, &["date", "day"])?;
    let date = NaiveDate::parse_from_str(date_raw.get(..10)?, DATE_FORMAT).ok()?;
    if !range.contains(date) {
        return None;
    }

    let start_time = parse_time(field(object, &["startTime", "start_time", "start"])?)?;
    let end_time = parse_time(field(object, &["endTime", "end_time", "end"])?)?;
    if end_time <= start_time {
        return None;
    }

    let subject = field(object, &["subject"]).map(str::to_string);
    let title = field(object, &["title", "name", "summary"])
        .map(str::to_string)
        .or_else(|| subject.clone())?;

    Some(StudyEvent {
        title,
        date,
        start_time,
        end_time,
        subject,
        description: field(object, &["description", "notes", "details"]).map(str::to_string),
    })
}

/// Normalize the model's events, dropping any that are unusable or out of range
pub fn normalize_events(value: &Value, range: &DateRange) -> Vec<StudyEvent> {
    let items = match value {
        Value::Array(items) => items.as_slice(),
        Value::Object(object) => ["events", "schedule", "sessions"]
            .iter()
            .find_map(|key| object.get(*key).and_then(Value::as_array))
            .map(Vec::as_slice)
            .unwrap_or_default(),
        _ => &[],
    };

    let mut events: Vec<StudyEvent> = items
        .iter()
        .filter_map(|item| normalize_event(item, range))
        .collect();
    events.sort_by_key(|event| (event.date, event.start_time));
    events
}

/// Build the user turn for a schedule request
pub fn schedule_prompt(request: &ScheduleRequest, range: &DateRange) -> String {
    let mut prompt = format!(
        "Plan study sessions for these subjects: {}.\nDates: {} to {} ({} days).\nStudy at most {} hours per day.",
        request.subjects().join(", "),
        range.start.format(DATE_FORMAT),
        range.end.format(DATE_FORMAT),
        range.days(),
        request.hours_per_day
    );
    if let Some(preferences) = request.preferences.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        prompt.push_str(&format!("\nPreferences: {}", preferences));
    }
    prompt
}

/// Plans study schedules through a completion service
pub struct ScheduleGenerator<'a> {
    service: &'a dyn CompletionService,
    settings: &'a ScheduleSettings,
    request_id: Option<Uuid>,
}

impl<'a> ScheduleGenerator<'a> {
    pub fn new(service: &'a dyn CompletionService, settings: &'a ScheduleSettings) -> Self {
        Self {
            service,
            settings,
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub async fn generate(&self, request: &ScheduleRequest) -> Result<Vec<StudyEvent>, ScheduleError> {
        let range = request.validate(self.settings.max_days)?;

        let turns = vec![
            ConversationTurn::system(SCHEDULE_INSTRUCTIONS),
            ConversationTurn::user(schedule_prompt(request, &range)),
        ];
        let completion = CompletionRequest::new(self.service.default_model(), turns)
            .with_temperature(self.settings.temperature)
            .with_max_tokens(self.settings.max_output_tokens)
            .with_request_id(self.request_id);

        let result = self.service.complete(completion).await?;
        let value = extract_json(&result.text)
            .into_result()
            .map_err(ScheduleError::MalformedOutput)?;

        let events = normalize_events(&value, &range);
        if events.is_empty() {
            return Err(ScheduleError::MalformedOutput(
                "no usable events in model output".to_string(),
            ));
        }

        debug!("Kept {} event(s) between {} and {}", events.len(), range.start, range.end);
        info!("Planned {} study session(s)", events.len());
        Ok(events)
    }
}
