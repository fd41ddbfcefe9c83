//! Mood distribution summary for the aggregate bar chart

use serde::{Deserialize, Serialize};

use crate::types::{Mood, MoodEntry};

/// Count for one mood category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodCount {
    pub mood: Mood,
    pub label: String,
    pub emoji: String,
    pub color: String,
    pub count: usize,
}

/// Counts for every mood category in canonical order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodDistribution {
    pub buckets: Vec<MoodCount>,
    pub total_entries: usize,
}

impl MoodDistribution {
    /// Summarize a snapshot; categories with no entries are kept with zero
    pub fn summarize(entries: &[MoodEntry]) -> Self {
        let buckets = Mood::ALL
            .iter()
            .map(|mood| MoodCount {
                mood: *mood,
                label: mood.label().to_string(),
                emoji: mood.emoji().to_string(),
                color: mood.hex_color().to_string(),
                count: entries.iter().filter(|e| e.mood == *mood).count(),
            })
            .collect();

        MoodDistribution {
            buckets,
            total_entries: entries.len(),
        }
    }

    pub fn count(&self, mood: Mood) -> usize {
        self.buckets
            .iter()
            .find(|b| b.mood == mood)
            .map_or(0, |b| b.count)
    }
}
