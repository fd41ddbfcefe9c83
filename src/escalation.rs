//! Escalation detection
//!
//! Decides whether to surface a counselling referral: the most recent
//! recorded days must all contain a difficult entry, and at least one entry
//! in that window must report a strong tobacco urge. Logging gaps are skipped
//! over; the window is the last N days that have entries, not the last N
//! calendar days.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::EscalationConfig;
use crate::types::{Mood, MoodEntry, TobaccoUrge};

/// Referral affordance shown when the detector fires
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Referral {
    pub headline: String,
    pub body: String,
    pub action_label: String,
    pub url: String,
}

impl Referral {
    pub fn new(window_days: usize, url: impl Into<String>) -> Self {
        Self {
            headline: format!(
                "You've had {} difficult days in a row. This is worth discussing with someone.",
                window_days
            ),
            body: "Speaking with a counsellor can make a real difference.".to_string(),
            action_label: "Talk to a counsellor".to_string(),
            url: url.into(),
        }
    }
}

/// Trailing-window escalation predicate
pub struct EscalationDetector<'a> {
    config: &'a EscalationConfig,
}

impl<'a> EscalationDetector<'a> {
    pub fn new(config: &'a EscalationConfig) -> Self {
        Self { config }
    }

    /// True when every day in the recent window had a difficult entry and
    /// the window contains a strong urge
    pub fn should_escalate(&self, entries: &[MoodEntry]) -> bool {
        if entries.len() < self.config.min_entries {
            return false;
        }

        let mut by_date: BTreeMap<NaiveDate, Vec<&MoodEntry>> = BTreeMap::new();
        for entry in entries {
            by_date.entry(entry.date).or_default().push(entry);
        }

        let window: Vec<&Vec<&MoodEntry>> =
            by_date.values().rev().take(self.config.window_days).collect();
        if window.len() < self.config.window_days {
            return false;
        }

        let all_difficult = window
            .iter()
            .all(|day| day.iter().any(|e| e.mood == Mood::Difficult));
        let strong_urge = window
            .iter()
            .flat_map(|day| day.iter())
            .any(|e| e.tobacco_urge == TobaccoUrge::Strong);

        all_difficult && strong_urge
    }

    /// Referral to surface, if the pattern holds
    pub fn referral(&self, entries: &[MoodEntry], url: &str) -> Option<Referral> {
        self.should_escalate(entries)
            .then(|| Referral::new(self.config.window_days, url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDateTime};

    fn day(n: i64, hour: i64, mood: Mood) -> MoodEntry {
        let start = NaiveDateTime::parse_from_str("2024-04-01T00:00", "%Y-%m-%dT%H:%M").unwrap();
        MoodEntry::new(1, start + Duration::days(n) + Duration::hours(hour), mood)
    }

    fn detect(entries: &[MoodEntry]) -> bool {
        let config = EscalationConfig::default();
        EscalationDetector::new(&config).should_escalate(entries)
    }

    fn five_difficult_days() -> Vec<MoodEntry> {
        (0..5).map(|n| day(n, 20, Mood::Difficult)).collect()
    }

    #[test]
    fn test_five_difficult_days_with_strong_urge() {
        let mut entries = five_difficult_days();
        entries[2].tobacco_urge = TobaccoUrge::Strong;
        assert!(detect(&entries));
    }

    #[test]
    fn test_one_day_without_difficult_entry() {
        let mut entries = five_difficult_days();
        entries[2].tobacco_urge = TobaccoUrge::Strong;
        entries[4].mood = Mood::Okay;
        assert!(!detect(&entries));
    }

    #[test]
    fn test_no_strong_urge_in_window() {
        let mut entries = five_difficult_days();
        entries[1].tobacco_urge = TobaccoUrge::Mild;
        // strong urge outside the window does not count
        let mut old = day(-3, 9, Mood::Difficult);
        old.tobacco_urge = TobaccoUrge::Strong;
        entries.push(old);
        assert!(!detect(&entries));
    }

    #[test]
    fn test_fewer_than_five_distinct_days() {
        let mut entries: Vec<MoodEntry> = (0..4).map(|n| day(n, 20, Mood::Difficult)).collect();
        entries.push(day(3, 22, Mood::Difficult));
        entries.push(day(2, 22, Mood::Difficult));
        entries[0].tobacco_urge = TobaccoUrge::Strong;
        assert_eq!(entries.len(), 6);
        assert!(!detect(&entries));
    }

    #[test]
    fn test_difficult_entry_anywhere_in_the_day_counts() {
        let mut entries = five_difficult_days();
        entries.push(day(0, 23, Mood::Great));
        entries.push(day(3, 6, Mood::Good));
        entries[4].tobacco_urge = TobaccoUrge::Strong;
        assert!(detect(&entries));
    }

    #[test]
    fn test_window_skips_logging_gaps_and_ignores_older_days() {
        // Older good day, then five difficult days spread over two weeks
        let mut entries = vec![day(0, 9, Mood::Great)];
        for n in [2, 5, 6, 10, 13] {
            entries.push(day(n, 21, Mood::Difficult));
        }
        entries[3].tobacco_urge = TobaccoUrge::Strong;
        assert!(detect(&entries));
    }

    #[test]
    fn test_referral_text() {
        let mut entries = five_difficult_days();
        entries[0].tobacco_urge = TobaccoUrge::Strong;
        let config = EscalationConfig::default();
        let referral = EscalationDetector::new(&config)
            .referral(&entries, "https://example.org/book")
            .unwrap();
        assert_eq!(
            referral.headline,
            "You've had 5 difficult days in a row. This is worth discussing with someone."
        );
        assert_eq!(referral.url, "https://example.org/book");

        assert!(EscalationDetector::new(&config)
            .referral(&entries[..4], "https://example.org/book")
            .is_none());
    }
}
