//! Daily timeline projection
//!
//! Places each of today's entries on a fixed 06:00-23:00 axis as a
//! percentage position. Entries outside the window are clamped to the edge,
//! never dropped.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::config::TimelineConfig;
use crate::types::{EntryId, Mood, MoodEntry};

/// Hours that carry an axis label
pub const LABEL_HOURS: [u32; 6] = [6, 9, 12, 15, 18, 21];

/// A single entry placed on the axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelinePoint {
    pub entry_id: Option<EntryId>,
    pub mood: Mood,
    pub time: NaiveTime,
    /// Horizontal position in percent of the axis width
    pub position: f64,
}

/// Hour label under the axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisLabel {
    pub hour: u32,
    pub label: String,
    pub position: f64,
}

/// Projection of one day's entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    /// False when there are too few entries to draw a timeline
    pub visible: bool,
    pub points: Vec<TimelinePoint>,
}

/// Projects entries onto the visible time axis
pub struct TimelineProjector<'a> {
    config: &'a TimelineConfig,
}

impl<'a> TimelineProjector<'a> {
    pub fn new(config: &'a TimelineConfig) -> Self {
        Self { config }
    }

    /// Project the given same-day entries, keeping input order.
    ///
    /// A day with fewer than `min_entries` entries yields an invisible,
    /// empty timeline.
    pub fn project(&self, entries: &[&MoodEntry]) -> Timeline {
        if entries.len() < self.config.min_entries {
            return Timeline {
                visible: false,
                points: Vec::new(),
            };
        }

        let points = entries
            .iter()
            .map(|entry| {
                let time = entry.timestamp.time();
                TimelinePoint {
                    entry_id: entry.id,
                    mood: entry.mood,
                    time,
                    position: self.position(time),
                }
            })
            .collect();

        Timeline {
            visible: true,
            points,
        }
    }

    /// Clamped axis position for a time of day
    pub fn position(&self, time: NaiveTime) -> f64 {
        let hour = time.hour() as f64 + time.minute() as f64 / 60.0;
        self.raw_position(hour)
            .max(self.config.min_position)
            .min(self.config.max_position)
    }

    fn raw_position(&self, hour: f64) -> f64 {
        let span = self.config.end_hour - self.config.start_hour;
        ((hour - self.config.start_hour) / span) * 100.0
    }

    /// Unclamped labels for the axis hours
    pub fn axis_labels(&self) -> Vec<AxisLabel> {
        LABEL_HOURS
            .iter()
            .map(|&hour| AxisLabel {
                hour,
                label: hour_label(hour),
                position: self.raw_position(hour as f64),
            })
            .collect()
    }
}

/// Compact 12-hour label: "6a", "12p", "3p"
fn hour_label(hour: u32) -> String {
    match hour {
        0 => "12a".to_string(),
        h if h < 12 => format!("{}a", h),
        12 => "12p".to_string(),
        h => format!("{}p", h - 12),
    }
}
