//! Day aggregation
//!
//! Groups entries by their recorded `date` and resolves the representative
//! mood of a day: the mood of its latest entry. Calendar months are built on
//! top of the same resolution.

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::types::{Mood, MoodEntry};

/// Most dots drawn under a calendar cell
pub const MAX_DAY_MARKERS: usize = 3;

/// Day aggregator over a snapshot
pub struct DayAggregator;

impl DayAggregator {
    /// Entries whose recorded date equals `date`, in input order
    pub fn entries_for(entries: &[MoodEntry], date: NaiveDate) -> Vec<&MoodEntry> {
        entries.iter().filter(|e| e.date == date).collect()
    }

    /// Mood of the latest entry on `date`, or `None` when nothing was logged.
    ///
    /// Equal timestamps resolve to the earliest of them in input order.
    pub fn representative_mood(entries: &[MoodEntry], date: NaiveDate) -> Option<Mood> {
        latest(entries.iter().filter(|e| e.date == date)).map(|e| e.mood)
    }

    /// Entries and representative mood for one day
    pub fn summarize(entries: &[MoodEntry], date: NaiveDate) -> DaySummary {
        let day_entries = Self::entries_for(entries, date);
        let representative = latest(day_entries.iter().copied()).map(|e| e.mood);
        DaySummary {
            date,
            entry_count: day_entries.len(),
            representative,
        }
    }

    /// A day's entries newest first, for the day detail sheet
    pub fn detail(entries: &[MoodEntry], date: NaiveDate) -> DayDetail {
        let mut day_entries: Vec<MoodEntry> =
            Self::entries_for(entries, date).into_iter().cloned().collect();
        day_entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        DayDetail {
            date,
            entries: day_entries,
        }
    }
}

fn latest<'a>(entries: impl Iterator<Item = &'a MoodEntry>) -> Option<&'a MoodEntry> {
    entries.fold(None, |best: Option<&MoodEntry>, entry| match best {
        Some(current) if entry.timestamp <= current.timestamp => Some(current),
        _ => Some(entry),
    })
}

/// Aggregate of a single calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub entry_count: usize,
    /// Absent when nothing was logged that day
    pub representative: Option<Mood>,
}

/// A day's entries ordered newest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayDetail {
    pub date: NaiveDate,
    pub entries: Vec<MoodEntry>,
}

/// One cell of a calendar month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarCell {
    pub date: NaiveDate,
    pub mood: Option<Mood>,
    pub entry_count: usize,
    /// Dots under the day number; zero unless the day has several entries
    pub markers: usize,
    pub is_today: bool,
}

/// A month laid out as a Sunday-first grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    /// Empty cells before the 1st (Sunday = 0)
    pub leading_padding: u32,
    pub days: Vec<CalendarCell>,
}

impl CalendarMonth {
    /// Build the month containing `year`/`month`; `None` for an invalid month
    pub fn build(
        entries: &[MoodEntry],
        year: i32,
        month: u32,
        today: Option<NaiveDate>,
    ) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next_month = first.checked_add_months(Months::new(1))?;

        let days = first
            .iter_days()
            .take_while(|d| *d < next_month)
            .map(|date| {
                let summary = DayAggregator::summarize(entries, date);
                CalendarCell {
                    date,
                    mood: summary.representative,
                    entry_count: summary.entry_count,
                    markers: if summary.entry_count > 1 {
                        summary.entry_count.min(MAX_DAY_MARKERS)
                    } else {
                        0
                    },
                    is_today: today == Some(date),
                }
            })
            .collect();

        Some(CalendarMonth {
            year,
            month,
            leading_padding: first.weekday().num_days_from_sunday(),
            days,
        })
    }

    /// The month of `today` and the `count - 1` months before it, newest first
    pub fn trailing(entries: &[MoodEntry], today: NaiveDate, count: u32) -> Vec<Self> {
        (0..count)
            .filter_map(|back| today.checked_sub_months(Months::new(back)))
            .filter_map(|d| Self::build(entries, d.year(), d.month(), Some(today)))
            .collect()
    }

    /// Human-readable month title, e.g. "March 2024"
    pub fn title(&self) -> String {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .map(|d| d.format("%B %Y").to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn entry(ts: &str, date: &str, mood: Mood) -> MoodEntry {
        let timestamp = NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M").unwrap();
        MoodEntry {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            ..MoodEntry::new(1, timestamp, mood)
        }
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_latest_entry_wins() {
        let entries = vec![
            entry("2024-03-05T08:00", "2024-03-05", Mood::Great),
            entry("2024-03-05T21:30", "2024-03-05", Mood::Low),
            entry("2024-03-05T12:00", "2024-03-05", Mood::Okay),
            entry("2024-03-06T07:00", "2024-03-06", Mood::Good),
        ];

        assert_eq!(
            DayAggregator::representative_mood(&entries, d("2024-03-05")),
            Some(Mood::Low)
        );
        assert_eq!(DayAggregator::entries_for(&entries, d("2024-03-05")).len(), 3);
    }

    #[test]
    fn test_empty_day_has_no_mood() {
        let entries = vec![entry("2024-03-05T08:00", "2024-03-05", Mood::Great)];
        assert_eq!(DayAggregator::representative_mood(&entries, d("2024-03-04")), None);
        assert_eq!(DayAggregator::representative_mood(&[], d("2024-03-05")), None);
    }

    #[test]
    fn test_recorded_date_is_authoritative() {
        // Logged just after midnight but recorded against the previous day
        let entries = vec![entry("2024-03-06T00:20", "2024-03-05", Mood::Difficult)];
        assert_eq!(
            DayAggregator::representative_mood(&entries, d("2024-03-05")),
            Some(Mood::Difficult)
        );
        assert_eq!(DayAggregator::representative_mood(&entries, d("2024-03-06")), None);
    }

    #[test]
    fn test_timestamp_tie_is_stable() {
        let entries = vec![
            entry("2024-03-05T09:00", "2024-03-05", Mood::Good),
            entry("2024-03-05T09:00", "2024-03-05", Mood::Low),
        ];
        for _ in 0..3 {
            assert_eq!(
                DayAggregator::representative_mood(&entries, d("2024-03-05")),
                Some(Mood::Good)
            );
        }
    }

    #[test]
    fn test_detail_sorted_newest_first() {
        let entries = vec![
            entry("2024-03-05T08:00", "2024-03-05", Mood::Great),
            entry("2024-03-05T21:30", "2024-03-05", Mood::Low),
            entry("2024-03-05T12:00", "2024-03-05", Mood::Okay),
        ];
        let detail = DayAggregator::detail(&entries, d("2024-03-05"));
        let moods: Vec<Mood> = detail.entries.iter().map(|e| e.mood).collect();
        assert_eq!(moods, vec![Mood::Low, Mood::Okay, Mood::Great]);
    }

    #[test]
    fn test_calendar_month_layout() {
        let entries = vec![
            entry("2024-03-05T08:00", "2024-03-05", Mood::Great),
            entry("2024-03-05T10:00", "2024-03-05", Mood::Good),
            entry("2024-03-05T11:00", "2024-03-05", Mood::Okay),
            entry("2024-03-05T12:00", "2024-03-05", Mood::Low),
            entry("2024-03-09T12:00", "2024-03-09", Mood::Difficult),
        ];

        let month = CalendarMonth::build(&entries, 2024, 3, Some(d("2024-03-09"))).unwrap();
        assert_eq!(month.days.len(), 31);
        // 1 March 2024 was a Friday
        assert_eq!(month.leading_padding, 5);
        assert_eq!(month.title(), "March 2024");

        let fifth = &month.days[4];
        assert_eq!(fifth.mood, Some(Mood::Low));
        assert_eq!(fifth.entry_count, 4);
        assert_eq!(fifth.markers, MAX_DAY_MARKERS);

        let ninth = &month.days[8];
        assert_eq!(ninth.markers, 0);
        assert!(ninth.is_today);
        assert_eq!(month.days[0].mood, None);
    }

    #[test]
    fn test_trailing_months() {
        let months = CalendarMonth::trailing(&[], d("2024-01-31"), 3);
        let keys: Vec<(i32, u32)> = months.iter().map(|m| (m.year, m.month)).collect();
        assert_eq!(keys, vec![(2024, 1), (2023, 12), (2023, 11)]);
        assert_eq!(months[1].days.len(), 31);
        assert_eq!(months[2].days.len(), 30);
    }

    #[test]
    fn test_invalid_month() {
        assert!(CalendarMonth::build(&[], 2024, 13, None).is_none());
    }
}
