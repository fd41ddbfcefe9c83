//! moodlens - Mood insight engine for self-reported mood logs
//!
//! moodlens turns a user's mood log into deterministic derivations over an
//! immutable snapshot: record validation → day aggregation → timeline
//! projection → insight generation → escalation detection → distribution.
//!
//! ## Modules
//!
//! - **Engine**: Pure derivations over a [`Snapshot`] assembled by [`MoodEngine`]
//! - **Collaborators**: Record store, wellness feed and translation seams
//! - **Export**: CSV rendering of a snapshot

pub mod config;
pub mod day;
pub mod distribution;
pub mod error;
pub mod escalation;
pub mod export;
pub mod insights;
pub mod logger;
pub mod pipeline;
pub mod schema;
pub mod store;
pub mod timeline;
pub mod translate;
pub mod types;

pub use config::EngineConfig;
pub use error::{EngineError, StoreError};
pub use pipeline::{MoodEngine, MoodReport, Snapshot};
pub use types::{DailyScore, EntryDetails, Factor, Mood, MoodEntry, TobaccoUrge};

// Schema exports
pub use schema::{RawMoodRecord, RecordAdapter, SCHEMA_VERSION};

// Collaborator exports
pub use logger::MoodLogger;
pub use store::{RecordStore, SnapshotProvider, WellnessFeed};
pub use translate::{TranslationCache, Translator};

/// Engine version embedded in every report
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports and exports
pub const PRODUCER_NAME: &str = "moodlens";
