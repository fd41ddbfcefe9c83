//! Tabular export of a snapshot
//!
//! One CSV row per entry with the fixed columns
//! `Date, Time, Mood, Factors, Tobacco Urge, Notes`.

use chrono::NaiveDate;
use std::io;

use crate::error::EngineError;
use crate::types::MoodEntry;

/// Export column headers
pub const EXPORT_HEADER: [&str; 6] = ["Date", "Time", "Mood", "Factors", "Tobacco Urge", "Notes"];

/// File name for an export produced on `export_date`
pub fn export_filename(export_date: NaiveDate) -> String {
    format!("mood-logs-{}.csv", export_date.format("%Y-%m-%d"))
}

/// Write entries as CSV to `writer`
pub fn write_csv<W: io::Write>(entries: &[MoodEntry], writer: W) -> Result<(), EngineError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    csv_writer.write_record(EXPORT_HEADER)?;
    for entry in entries {
        let factors = entry
            .factors
            .iter()
            .map(|f| f.as_str())
            .collect::<Vec<_>>()
            .join(",");
        csv_writer.write_record([
            entry.date.format("%Y-%m-%d").to_string(),
            entry.timestamp.format("%H:%M").to_string(),
            entry.mood.as_str().to_string(),
            factors,
            entry.tobacco_urge.as_str().to_string(),
            entry.notes.clone().unwrap_or_default(),
        ])?;
    }

    csv_writer
        .flush()
        .map_err(|e| EngineError::ExportError(e.to_string()))
}

/// Render entries as a CSV string
pub fn to_csv_string(entries: &[MoodEntry]) -> Result<String, EngineError> {
    let mut buffer = Vec::new();
    write_csv(entries, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| EngineError::ExportError(e.to_string()))
}
