//! Error types for moodlens

use thiserror::Error;

use crate::types::{EntryId, UserId};

/// Errors that can occur while loading, deriving or exporting mood data
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to parse record payload: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Export error: {0}")]
    ExportError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Failures reported by the record store and wellness feed collaborators
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Network or backend failure; callers treat it as "no data this cycle"
    #[error("Transient I/O failure: {0}")]
    Transient(String),

    #[error("Credentials rejected by record store")]
    Unauthorized,

    #[error("Record {id} not found for user {user_id}")]
    NotFound { id: EntryId, user_id: UserId },

    #[error("Collaborator not configured")]
    NotConfigured,
}
