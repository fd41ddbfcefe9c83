//! Core types for the moodlens engine
//!
//! This module defines the strict record shape every derivation works on,
//! together with the closed enumerations a record is built from. Records
//! reach this shape only through the validating boundary in [`crate::schema`].

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Persisted record identifier
pub type EntryId = i64;

/// Owning user identifier
pub type UserId = i64;

/// Mood category, ordered from most to least positive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Great,
    Good,
    Okay,
    Low,
    Difficult,
}

impl Mood {
    /// Canonical display order
    pub const ALL: [Mood; 5] = [
        Mood::Great,
        Mood::Good,
        Mood::Okay,
        Mood::Low,
        Mood::Difficult,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Great => "great",
            Mood::Good => "good",
            Mood::Okay => "okay",
            Mood::Low => "low",
            Mood::Difficult => "difficult",
        }
    }

    /// Human-facing label
    pub fn label(&self) -> &'static str {
        match self {
            Mood::Great => "Great",
            Mood::Good => "Good",
            Mood::Okay => "Okay",
            Mood::Low => "Low",
            Mood::Difficult => "Difficult",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Mood::Great => "😄",
            Mood::Good => "🙂",
            Mood::Okay => "😐",
            Mood::Low => "😟",
            Mood::Difficult => "😣",
        }
    }

    /// Chart colour for distribution bars and calendar cells
    pub fn hex_color(&self) -> &'static str {
        match self {
            Mood::Great => "#4ade80",
            Mood::Good => "#60a5fa",
            Mood::Okay => "#9ca3af",
            Mood::Low => "#fbbf24",
            Mood::Difficult => "#f87171",
        }
    }

    /// Great or good
    pub fn is_positive(&self) -> bool {
        matches!(self, Mood::Great | Mood::Good)
    }

    /// Low or difficult
    pub fn is_negative(&self) -> bool {
        matches!(self, Mood::Low | Mood::Difficult)
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mood {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "great" => Ok(Mood::Great),
            "good" => Ok(Mood::Good),
            "okay" => Ok(Mood::Okay),
            "low" => Ok(Mood::Low),
            "difficult" => Ok(Mood::Difficult),
            other => Err(format!("unknown mood '{}'", other)),
        }
    }
}

/// Contributing factor attached to an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Factor {
    Work,
    Sleep,
    Health,
    Relationships,
    Recovery,
    Other,
}

impl Factor {
    pub const ALL: [Factor; 6] = [
        Factor::Work,
        Factor::Sleep,
        Factor::Health,
        Factor::Relationships,
        Factor::Recovery,
        Factor::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Factor::Work => "Work",
            Factor::Sleep => "Sleep",
            Factor::Health => "Health",
            Factor::Relationships => "Relationships",
            Factor::Recovery => "Recovery",
            Factor::Other => "Other",
        }
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Factor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Factor::ALL
            .iter()
            .copied()
            .find(|f| f.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| format!("unknown factor '{}'", trimmed))
    }
}

/// Self-reported tobacco urge level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TobaccoUrge {
    #[default]
    None,
    Mild,
    Strong,
}

impl TobaccoUrge {
    pub fn as_str(&self) -> &'static str {
        match self {
            TobaccoUrge::None => "none",
            TobaccoUrge::Mild => "mild",
            TobaccoUrge::Strong => "strong",
        }
    }
}

impl FromStr for TobaccoUrge {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Ok(TobaccoUrge::None),
            "mild" => Ok(TobaccoUrge::Mild),
            "strong" => Ok(TobaccoUrge::Strong),
            other => Err(format!("unknown tobacco urge '{}'", other)),
        }
    }
}

/// One logged mood observation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodEntry {
    /// Store identifier, present once persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntryId>,
    pub user_id: UserId,
    /// Wall-clock moment of logging
    pub timestamp: NaiveDateTime,
    /// Calendar day the entry belongs to; fixed at creation
    pub date: NaiveDate,
    pub mood: Mood,
    #[serde(default)]
    pub factors: Vec<Factor>,
    #[serde(default)]
    pub tobacco_urge: TobaccoUrge,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl MoodEntry {
    /// Create an entry with no details attached, dated from its timestamp
    pub fn new(user_id: UserId, timestamp: NaiveDateTime, mood: Mood) -> Self {
        Self {
            id: None,
            user_id,
            timestamp,
            date: timestamp.date(),
            mood,
            factors: Vec::new(),
            tobacco_urge: TobaccoUrge::None,
            notes: None,
        }
    }

    /// Attach follow-up details
    pub fn with_details(mut self, details: EntryDetails) -> Self {
        self.factors = details.factors;
        self.tobacco_urge = details.tobacco_urge;
        self.notes = details.notes;
        self
    }
}

/// Optional details attached to an entry after the initial mood tap
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDetails {
    #[serde(default)]
    pub factors: Vec<Factor>,
    #[serde(default)]
    pub tobacco_urge: TobaccoUrge,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Secondary daily wellness score (e.g. sleep quality, 0-100)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyScore {
    pub date: NaiveDate,
    pub score: f64,
}

/// Round `100 * part / whole` half-up to an integer percentage.
///
/// Returns 0 when `whole` is zero.
pub fn rounded_percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((200 * part + whole) / (2 * whole)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mood_order_and_parse() {
        assert!(Mood::Great < Mood::Difficult);
        assert_eq!("Difficult".parse::<Mood>().unwrap(), Mood::Difficult);
        assert!("meh".parse::<Mood>().is_err());
        assert_eq!(Mood::ALL.len(), 5);
    }

    #[test]
    fn test_factor_parse_is_case_insensitive() {
        assert_eq!("work".parse::<Factor>().unwrap(), Factor::Work);
        assert_eq!(" Relationships ".parse::<Factor>().unwrap(), Factor::Relationships);
        assert!("Weather".parse::<Factor>().is_err());
    }

    #[test]
    fn test_rounded_percent_half_up() {
        assert_eq!(rounded_percent(2, 3), 67);
        assert_eq!(rounded_percent(1, 3), 33);
        assert_eq!(rounded_percent(1, 8), 13); // 12.5 rounds up
        assert_eq!(rounded_percent(6, 10), 60);
        assert_eq!(rounded_percent(0, 0), 0);
    }

    #[test]
    fn test_entry_serde_defaults_optional_fields() {
        let json = r#"{
            "user_id": 7,
            "timestamp": "2024-03-01T09:15:00",
            "date": "2024-03-01",
            "mood": "good"
        }"#;
        let entry: MoodEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.id, None);
        assert!(entry.factors.is_empty());
        assert_eq!(entry.tobacco_urge, TobaccoUrge::None);
        assert_eq!(entry.notes, None);
    }
}
