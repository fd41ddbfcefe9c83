//! Adapter for turning store payloads into validated mood entries
//!
//! Parses JSON arrays or NDJSON of [`RawMoodRecord`]s and runs every record
//! through validation. Invalid records are reported, never allowed to abort
//! the valid remainder of a snapshot.

use tracing::warn;

use crate::error::EngineError;
use crate::schema::raw_record::{RawMoodRecord, ValidationError};
use crate::types::{EntryId, MoodEntry};

/// Adapter for converting raw records to strict entries
pub struct RecordAdapter;

impl RecordAdapter {
    /// Parse a JSON string containing an array of records
    pub fn parse_array(json: &str) -> Result<Vec<RawMoodRecord>, EngineError> {
        let records: Vec<RawMoodRecord> = serde_json::from_str(json)?;
        Ok(records)
    }

    /// Parse NDJSON (one record per line)
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<RawMoodRecord>, EngineError> {
        let mut records = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<RawMoodRecord>(trimmed) {
                Ok(record) => records.push(record),
                Err(e) => {
                    return Err(EngineError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(records)
    }

    /// Convert raw records to entries, skipping the ones that fail validation
    pub fn to_entries(records: &[RawMoodRecord]) -> Vec<MoodEntry> {
        records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| match record.validate() {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(index, record_id = ?record.id, error = %e, "rejecting mood record");
                    None
                }
            })
            .collect()
    }

    /// Validate a batch of records, returning only the failures
    pub fn validate_records(records: &[RawMoodRecord]) -> Vec<ValidationResult> {
        records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| {
                record.validate().err().map(|error| ValidationResult {
                    index,
                    record_id: record.id,
                    error,
                })
            })
            .collect()
    }
}

/// A record that failed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub index: usize,
    pub record_id: Option<EntryId>,
    pub error: ValidationError,
}
