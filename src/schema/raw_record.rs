//! Loosely typed mood-log record as delivered by the record store
//!
//! Store payloads carry optional fields that may be missing, `null`, or
//! encoded in more than one way (factors arrive as a JSON array or as a
//! comma-separated string). [`RawMoodRecord::validate`] is the single place
//! where such a payload becomes a strict [`MoodEntry`].

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::types::{EntryId, Factor, Mood, MoodEntry, TobaccoUrge, UserId};

/// Current record schema version
pub const SCHEMA_VERSION: &str = "mood.log_record.v1";

const NAIVE_TIMESTAMP_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Record payload before validation
///
/// Every field tolerates a wrong JSON type so one malformed record never
/// fails the batch it arrives in; [`RawMoodRecord::validate`] decides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMoodRecord {
    #[serde(default, deserialize_with = "lenient_integer", skip_serializing_if = "Option::is_none")]
    pub id: Option<EntryId>,
    #[serde(default, deserialize_with = "lenient_integer", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    /// Array of factor names, comma-separated string, or null
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub factors: Option<Value>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub tobacco_urge: Option<String>,
    #[serde(default, deserialize_with = "lenient_text", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Integer given as a JSON number or numeric string; anything else is absent
fn lenient_integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Text field; numbers and booleans keep their JSON spelling, other shapes are absent
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => Some(v.to_string()),
        _ => None,
    })
}

impl From<&MoodEntry> for RawMoodRecord {
    fn from(entry: &MoodEntry) -> Self {
        RawMoodRecord {
            id: entry.id,
            user_id: Some(entry.user_id),
            timestamp: Some(entry.timestamp.format("%Y-%m-%dT%H:%M:%S").to_string()),
            date: Some(entry.date.format("%Y-%m-%d").to_string()),
            mood: Some(entry.mood.as_str().to_string()),
            factors: Some(Value::Array(
                entry
                    .factors
                    .iter()
                    .map(|f| Value::String(f.as_str().to_string()))
                    .collect(),
            )),
            tobacco_urge: Some(entry.tobacco_urge.as_str().to_string()),
            notes: entry.notes.clone(),
        }
    }
}

impl RawMoodRecord {
    /// Validate required fields and produce the strict entry shape.
    ///
    /// Missing optional fields default (no factors, no urge, no notes);
    /// unrecognised factor or urge values are dropped rather than rejected.
    pub fn validate(&self) -> Result<MoodEntry, ValidationError> {
        let user_id = self.user_id.ok_or(ValidationError::MissingField("user_id"))?;

        let raw_timestamp = non_empty(self.timestamp.as_deref())
            .ok_or(ValidationError::MissingField("timestamp"))?;
        let timestamp = parse_timestamp(raw_timestamp)
            .ok_or_else(|| ValidationError::InvalidTimestamp(raw_timestamp.to_string()))?;

        let raw_date =
            non_empty(self.date.as_deref()).ok_or(ValidationError::MissingField("date"))?;
        let date = NaiveDate::parse_from_str(raw_date.trim(), "%Y-%m-%d")
            .map_err(|_| ValidationError::InvalidDate(raw_date.to_string()))?;

        let raw_mood =
            non_empty(self.mood.as_deref()).ok_or(ValidationError::MissingField("mood"))?;
        let mood = raw_mood
            .parse::<Mood>()
            .map_err(|_| ValidationError::InvalidMood(raw_mood.to_string()))?;

        let tobacco_urge = match self.tobacco_urge.as_deref() {
            Some(raw) => raw.parse::<TobaccoUrge>().unwrap_or_else(|e| {
                debug!(record_id = ?self.id, error = %e, "defaulting tobacco urge");
                TobaccoUrge::None
            }),
            None => TobaccoUrge::None,
        };

        let notes = self
            .notes
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .map(str::to_string);

        Ok(MoodEntry {
            id: self.id,
            user_id,
            timestamp,
            date,
            mood,
            factors: self.parse_factors(),
            tobacco_urge,
            notes,
        })
    }

    fn parse_factors(&self) -> Vec<Factor> {
        let names: Vec<String> = match &self.factors {
            None | Some(Value::Null) => return Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            Some(Value::String(joined)) => {
                // Some stores hand back the JSON array as text
                match serde_json::from_str::<Vec<String>>(joined) {
                    Ok(list) => list,
                    Err(_) => joined.split(',').map(str::to_string).collect(),
                }
            }
            Some(other) => {
                debug!(record_id = ?self.id, value = %other, "ignoring unsupported factors payload");
                return Vec::new();
            }
        };

        names
            .iter()
            .filter(|n| !n.trim().is_empty())
            .filter_map(|name| match name.parse::<Factor>() {
                Ok(factor) => Some(factor),
                Err(e) => {
                    debug!(record_id = ?self.id, error = %e, "dropping factor");
                    None
                }
            })
            .collect()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Parse a timestamp into local wall-clock time.
///
/// Offset-qualified timestamps keep the wall-clock reading of their own
/// offset; naive timestamps are taken as-is.
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// Validation errors for raw records
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid mood: {0}")]
    InvalidMood(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid date (expected YYYY-MM-DD): {0}")]
    InvalidDate(String),
}
