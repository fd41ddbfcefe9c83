//! Mood record schema
//!
//! This module defines the loosely typed record payload delivered by the
//! record store and the validating boundary that turns it into
//! [`crate::types::MoodEntry`].

mod adapter;
mod raw_record;

pub use adapter::*;
pub use raw_record::*;
