//! Insight generation
//!
//! Four independent observations over a user's full history, each emitted
//! only when its confidence threshold is met:
//!
//! 1. Positivity rate (share of great/good entries)
//! 2. Strong tobacco urge vs. low/difficult mood
//! 3. Dominant contributing factor
//! 4. Mood on days with a high secondary wellness score
//!
//! Derivations are evaluated lazily as the [`Insights`] iterator is advanced.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::config::InsightConfig;
use crate::types::{rounded_percent, DailyScore, Factor, Mood, MoodEntry, TobaccoUrge};

/// A single derived observation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Insight {
    /// Most entries are great or good
    PositiveRate { percent: u32 },
    /// Few entries are great or good
    LowPositiveRate { percent: u32 },
    /// Strong urges cluster around low or difficult moods
    UrgeMoodCorrelation { percent: u32 },
    /// Most frequent contributing factor
    TopFactor { factor: Factor, count: usize },
    /// Share of great/good entries on well-rested days
    RestedDayMood { percent: u32 },
}

impl Insight {
    /// Canonical English sentence for this insight
    pub fn message(&self) -> String {
        match self {
            Insight::PositiveRate { percent } => {
                format!("{}% of your entries are Good or Great. Keep it up!", percent)
            }
            Insight::LowPositiveRate { percent } => format!(
                "Only {}% of entries are positive. Consider speaking with a counsellor.",
                percent
            ),
            Insight::UrgeMoodCorrelation { percent } => format!(
                "{}% of strong tobacco urges happen during low or difficult moods.",
                percent
            ),
            Insight::TopFactor { factor, count } => {
                format!("\"{}\" is your top mood factor ({} times).", factor, count)
            }
            Insight::RestedDayMood { percent } => format!(
                "On well-rested days, your mood is Good or Great {}% of the time.",
                percent
            ),
        }
    }
}

impl fmt::Display for Insight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Positivity,
    UrgeCorrelation,
    TopFactor,
    RestedDays,
    Done,
}

/// Lazy sequence of insights over one snapshot.
///
/// Each call to [`InsightGenerator::generate`] starts a fresh sequence; a
/// sequence is not restartable once consumed.
pub struct Insights<'a> {
    entries: &'a [MoodEntry],
    wellness: Option<&'a [DailyScore]>,
    config: &'a InsightConfig,
    stage: Stage,
}

impl<'a> Iterator for Insights<'a> {
    type Item = Insight;

    fn next(&mut self) -> Option<Insight> {
        loop {
            let found = match self.stage {
                Stage::Positivity => {
                    self.stage = Stage::UrgeCorrelation;
                    positivity(self.entries, self.config)
                }
                Stage::UrgeCorrelation => {
                    self.stage = Stage::TopFactor;
                    urge_correlation(self.entries, self.config)
                }
                Stage::TopFactor => {
                    self.stage = Stage::RestedDays;
                    top_factor(self.entries, self.config)
                }
                Stage::RestedDays => {
                    self.stage = Stage::Done;
                    self.wellness
                        .and_then(|scores| rested_day_mood(self.entries, scores, self.config))
                }
                Stage::Done => return None,
            };
            if found.is_some() {
                return found;
            }
        }
    }
}

/// Builds insight sequences from a snapshot
pub struct InsightGenerator<'a> {
    config: &'a InsightConfig,
}

impl<'a> InsightGenerator<'a> {
    pub fn new(config: &'a InsightConfig) -> Self {
        Self { config }
    }

    /// Start an insight sequence.
    ///
    /// `wellness` carries the secondary daily scores; pass `None` when the
    /// feed is absent or failed and the cross-metric insight is skipped.
    /// Fewer than `min_entries` entries yield an empty sequence.
    pub fn generate(
        &self,
        entries: &'a [MoodEntry],
        wellness: Option<&'a [DailyScore]>,
    ) -> Insights<'a> {
        let stage = if entries.len() < self.config.min_entries {
            Stage::Done
        } else {
            Stage::Positivity
        };
        Insights {
            entries,
            wellness,
            config: self.config,
            stage,
        }
    }
}

fn positivity(entries: &[MoodEntry], config: &InsightConfig) -> Option<Insight> {
    let positive = entries.iter().filter(|e| e.mood.is_positive()).count();
    let percent = rounded_percent(positive, entries.len());

    if percent > config.positive_rate_high {
        Some(Insight::PositiveRate { percent })
    } else if percent < config.positive_rate_low {
        Some(Insight::LowPositiveRate { percent })
    } else {
        None
    }
}

fn urge_correlation(entries: &[MoodEntry], config: &InsightConfig) -> Option<Insight> {
    let strong: Vec<&MoodEntry> = entries
        .iter()
        .filter(|e| e.tobacco_urge == TobaccoUrge::Strong)
        .collect();
    if strong.len() < config.min_strong_urges {
        return None;
    }

    let low = strong.iter().filter(|e| e.mood.is_negative()).count();
    let percent = rounded_percent(low, strong.len());
    (percent > config.urge_correlation_pct).then_some(Insight::UrgeMoodCorrelation { percent })
}

fn top_factor(entries: &[MoodEntry], config: &InsightConfig) -> Option<Insight> {
    // Tally in first-encountered order so ties resolve deterministically
    let mut tally: Vec<(Factor, usize)> = Vec::new();
    for factor in entries.iter().flat_map(|e| e.factors.iter()) {
        match tally.iter_mut().find(|(f, _)| f == factor) {
            Some((_, count)) => *count += 1,
            None => tally.push((*factor, 1)),
        }
    }

    let (factor, count) = tally
        .into_iter()
        .fold(None, |best: Option<(Factor, usize)>, (f, c)| match best {
            Some((_, best_count)) if c <= best_count => best,
            _ => Some((f, c)),
        })?;

    (count >= config.min_factor_count).then_some(Insight::TopFactor { factor, count })
}

fn rested_day_mood(
    entries: &[MoodEntry],
    scores: &[DailyScore],
    config: &InsightConfig,
) -> Option<Insight> {
    let threshold = config.wellness_score_threshold as f64;
    let qualifying: HashSet<NaiveDate> = scores
        .iter()
        .filter(|s| s.score >= threshold)
        .map(|s| s.date)
        .collect();
    if qualifying.len() <= config.min_qualifying_dates {
        return None;
    }

    // Denominator is every entry on a qualifying date, not the date count
    let on_qualifying: Vec<&MoodEntry> = entries
        .iter()
        .filter(|e| qualifying.contains(&e.date))
        .collect();
    if on_qualifying.is_empty() {
        return None;
    }

    let positive = on_qualifying
        .iter()
        .filter(|e| matches!(e.mood, Mood::Great | Mood::Good))
        .count();
    Some(Insight::RestedDayMood {
        percent: rounded_percent(positive, on_qualifying.len()),
    })
}
