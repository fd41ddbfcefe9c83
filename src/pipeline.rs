//! Engine orchestration
//!
//! This module provides the public entry points of moodlens. A [`Snapshot`]
//! holds one user's fully loaded history; [`MoodEngine`] runs every
//! derivation over it and assembles a serializable [`MoodReport`].
//!
//! Derivations:
//! 1. DayAggregator - representative mood and entries for a day
//! 2. TimelineProjector - today's entries on the 6am-11pm axis
//! 3. InsightGenerator - statistical insight sentences
//! 4. EscalationDetector - counselling referral trigger
//! 5. MoodDistribution - per-mood counts

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::day::{CalendarMonth, DayAggregator, DayDetail, DaySummary};
use crate::distribution::MoodDistribution;
use crate::error::EngineError;
use crate::escalation::{EscalationDetector, Referral};
use crate::insights::{Insight, InsightGenerator, Insights};
use crate::schema::RecordAdapter;
use crate::timeline::{AxisLabel, Timeline, TimelineProjector};
use crate::types::{DailyScore, MoodEntry, UserId};

/// Immutable view of one user's entries, newest first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    user_id: UserId,
    entries: Vec<MoodEntry>,
}

impl Snapshot {
    /// Build a snapshot, keeping only the user's entries ordered newest first
    pub fn new(user_id: UserId, mut entries: Vec<MoodEntry>) -> Self {
        entries.retain(|e| e.user_id == user_id);
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Self { user_id, entries }
    }

    /// The "no data" snapshot
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            entries: Vec::new(),
        }
    }

    /// Parse and validate store records (JSON array) into a snapshot
    pub fn from_json(user_id: UserId, json: &str) -> Result<Self, EngineError> {
        let records = RecordAdapter::parse_array(json)?;
        Ok(Self::new(user_id, RecordAdapter::to_entries(&records)))
    }

    /// Parse and validate store records (NDJSON) into a snapshot
    pub fn from_ndjson(user_id: UserId, ndjson: &str) -> Result<Self, EngineError> {
        let records = RecordAdapter::parse_ndjson(ndjson)?;
        Ok(Self::new(user_id, RecordAdapter::to_entries(&records)))
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn entries(&self) -> &[MoodEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The first `limit` entries, newest first
    pub fn recent(&self, limit: usize) -> &[MoodEntry] {
        &self.entries[..limit.min(self.entries.len())]
    }
}

/// Today's section of the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodayReport {
    pub summary: DaySummary,
    pub timeline: Timeline,
    pub axis: Vec<AxisLabel>,
}

/// Insight with its rendered sentence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightView {
    #[serde(flatten)]
    pub insight: Insight,
    pub message: String,
}

impl From<Insight> for InsightView {
    fn from(insight: Insight) -> Self {
        let message = insight.message();
        Self { insight, message }
    }
}

/// Every derivation over one snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodReport {
    pub engine_version: String,
    pub user_id: UserId,
    pub generated_for: NaiveDate,
    pub total_entries: usize,
    pub today: TodayReport,
    pub insights: Vec<InsightView>,
    pub distribution: MoodDistribution,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referral: Option<Referral>,
    pub recent: Vec<MoodEntry>,
}

/// Runs derivations with a fixed configuration
#[derive(Debug, Clone, Default)]
pub struct MoodEngine {
    config: EngineConfig,
}

impl MoodEngine {
    /// Build an engine, rejecting configurations the derivations cannot run with
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Summary of one calendar day
    pub fn day(&self, snapshot: &Snapshot, date: NaiveDate) -> DaySummary {
        DayAggregator::summarize(snapshot.entries(), date)
    }

    /// A day's entries newest first
    pub fn day_detail(&self, snapshot: &Snapshot, date: NaiveDate) -> DayDetail {
        DayAggregator::detail(snapshot.entries(), date)
    }

    /// Timeline of the entries recorded on `today`
    pub fn timeline(&self, snapshot: &Snapshot, today: NaiveDate) -> Timeline {
        let todays = DayAggregator::entries_for(snapshot.entries(), today);
        TimelineProjector::new(&self.config.timeline).project(&todays)
    }

    /// Lazy insight sequence; `wellness` is `None` when the feed is unavailable
    pub fn insights<'a>(
        &'a self,
        snapshot: &'a Snapshot,
        wellness: Option<&'a [DailyScore]>,
    ) -> Insights<'a> {
        InsightGenerator::new(&self.config.insights).generate(snapshot.entries(), wellness)
    }

    pub fn should_escalate(&self, snapshot: &Snapshot) -> bool {
        EscalationDetector::new(&self.config.escalation).should_escalate(snapshot.entries())
    }

    pub fn referral(&self, snapshot: &Snapshot) -> Option<Referral> {
        EscalationDetector::new(&self.config.escalation)
            .referral(snapshot.entries(), &self.config.referral_url.0)
    }

    pub fn distribution(&self, snapshot: &Snapshot) -> MoodDistribution {
        MoodDistribution::summarize(snapshot.entries())
    }

    /// Calendar grids for the month of `today` and the months before it
    pub fn calendar(
        &self,
        snapshot: &Snapshot,
        today: NaiveDate,
        months: u32,
    ) -> Vec<CalendarMonth> {
        CalendarMonth::trailing(snapshot.entries(), today, months)
    }

    /// Run every derivation and assemble a report
    pub fn report(
        &self,
        snapshot: &Snapshot,
        today: NaiveDate,
        wellness: Option<&[DailyScore]>,
    ) -> MoodReport {
        let projector = TimelineProjector::new(&self.config.timeline);

        MoodReport {
            engine_version: crate::ENGINE_VERSION.to_string(),
            user_id: snapshot.user_id(),
            generated_for: today,
            total_entries: snapshot.len(),
            today: TodayReport {
                summary: self.day(snapshot, today),
                timeline: self.timeline(snapshot, today),
                axis: projector.axis_labels(),
            },
            insights: self
                .insights(snapshot, wellness)
                .map(InsightView::from)
                .collect(),
            distribution: self.distribution(snapshot),
            referral: self.referral(snapshot),
            recent: snapshot.recent(self.config.recent_limit.0).to_vec(),
        }
    }

    /// Report encoded as JSON
    pub fn report_json(
        &self,
        snapshot: &Snapshot,
        today: NaiveDate,
        wellness: Option<&[DailyScore]>,
    ) -> Result<String, EngineError> {
        Ok(serde_json::to_string(&self.report(snapshot, today, wellness))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Mood, TobaccoUrge};

    fn sample_records() -> &'static str {
        r#"[
            {"id": 1, "user_id": 5, "timestamp": "2024-04-01T21:00:00", "date": "2024-04-01", "mood": "difficult", "tobacco_urge": "strong", "factors": ["Work"]},
            {"id": 2, "user_id": 5, "timestamp": "2024-04-02T20:00:00", "date": "2024-04-02", "mood": "difficult", "factors": ["Work", "Sleep"]},
            {"id": 3, "user_id": 5, "timestamp": "2024-04-03T19:00:00", "date": "2024-04-03", "mood": "difficult", "tobacco_urge": "strong", "factors": ["Work"]},
            {"id": 4, "user_id": 5, "timestamp": "2024-04-04T22:00:00", "date": "2024-04-04", "mood": "difficult", "tobacco_urge": "strong"},
            {"id": 5, "user_id": 5, "timestamp": "2024-04-05T07:30:00", "date": "2024-04-05", "mood": "okay"},
            {"id": 6, "user_id": 5, "timestamp": "2024-04-05T18:00:00", "date": "2024-04-05", "mood": "difficult", "notes": "rough evening"},
            {"id": 7, "user_id": 6, "timestamp": "2024-04-05T18:00:00", "date": "2024-04-05", "mood": "great"},
            {"id": 8, "user_id": 5, "timestamp": "2024-04-05T12:00:00", "date": "2024-04-05", "mood": "sideways"}
        ]"#
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 5).unwrap()
    }

    #[test]
    fn test_snapshot_scopes_and_orders() {
        let snapshot = Snapshot::from_json(5, sample_records()).unwrap();
        assert_eq!(snapshot.len(), 6);
        assert_eq!(snapshot.entries()[0].id, Some(6));
        assert!(snapshot.entries().iter().all(|e| e.user_id == 5));
        assert_eq!(snapshot.recent(2).len(), 2);
        assert_eq!(snapshot.recent(100).len(), 6);
    }

    #[test]
    fn test_full_report() {
        let snapshot = Snapshot::from_json(5, sample_records()).unwrap();
        let engine = MoodEngine::default();
        let report = engine.report(&snapshot, today(), None);

        assert_eq!(report.total_entries, 6);
        assert_eq!(report.today.summary.representative, Some(Mood::Difficult));
        assert_eq!(report.today.summary.entry_count, 2);
        assert!(report.today.timeline.visible);
        assert_eq!(report.today.timeline.points.len(), 2);

        let kinds: Vec<&Insight> = report.insights.iter().map(|v| &v.insight).collect();
        assert_eq!(
            kinds,
            vec![
                &Insight::LowPositiveRate { percent: 0 },
                &Insight::UrgeMoodCorrelation { percent: 100 },
                &Insight::TopFactor {
                    factor: crate::types::Factor::Work,
                    count: 3
                },
            ]
        );
        assert!(report.referral.is_some());
        assert_eq!(report.distribution.count(Mood::Difficult), 5);
    }

    #[test]
    fn test_report_is_idempotent() {
        let snapshot = Snapshot::from_json(5, sample_records()).unwrap();
        let engine = MoodEngine::default();
        let first = engine.report_json(&snapshot, today(), None).unwrap();
        let second = engine.report_json(&snapshot, today(), None).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_report_json_shape() {
        let snapshot = Snapshot::from_json(5, sample_records()).unwrap();
        let json = MoodEngine::default()
            .report_json(&snapshot, today(), None)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["generated_for"], "2024-04-05");
        assert_eq!(value["insights"][1]["kind"], "urge_mood_correlation");
        assert_eq!(
            value["insights"][1]["message"],
            "100% of strong tobacco urges happen during low or difficult moods."
        );
        assert_eq!(value["distribution"]["buckets"][4]["mood"], "difficult");
        assert_eq!(value["referral"]["url"], "https://mantracare.com/book");
    }

    #[test]
    fn test_engine_rejects_inverted_timeline_clamp() {
        let mut config = EngineConfig::default();
        config.timeline.min_position = 98.0;
        config.timeline.max_position = 2.0;
        assert!(matches!(
            MoodEngine::new(config),
            Err(EngineError::ConfigError(_))
        ));
        assert!(MoodEngine::new(EngineConfig::default()).is_ok());
    }

    #[test]
    fn test_wrongly_typed_record_keeps_the_rest() {
        let json = r#"[
            {"id": 1, "user_id": 9, "timestamp": "2024-04-05T08:00:00", "date": "2024-04-05", "mood": "good"},
            {"id": 2, "user_id": 9, "timestamp": "2024-04-05T09:00:00", "date": "2024-04-05", "mood": "low", "tobacco_urge": 2, "notes": 5}
        ]"#;
        let snapshot = Snapshot::from_json(9, json).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.entries()[0].tobacco_urge, TobaccoUrge::None);
    }

    #[test]
    fn test_empty_snapshot_report() {
        let engine = MoodEngine::default();
        let report = engine.report(&Snapshot::empty(5), today(), None);
        assert_eq!(report.today.summary.representative, None);
        assert!(!report.today.timeline.visible);
        assert!(report.insights.is_empty());
        assert!(report.referral.is_none());
        assert_eq!(report.distribution.buckets.len(), 5);
    }

    #[test]
    fn test_empty_record_batch_gives_empty_report_and_export() {
        let snapshot = Snapshot::from_json(5, "[]").unwrap();
        assert!(snapshot.is_empty());
        let report = MoodEngine::default().report(&snapshot, today(), None);
        assert_eq!(report.total_entries, 0);
        assert!(report.recent.is_empty());
        assert_eq!(
            crate::export::to_csv_string(snapshot.entries()).unwrap(),
            "Date,Time,Mood,Factors,Tobacco Urge,Notes\n"
        );
    }

    #[test]
    fn test_strong_urge_outside_today_does_not_affect_timeline() {
        let snapshot = Snapshot::from_json(5, sample_records()).unwrap();
        let engine = MoodEngine::default();
        let timeline = engine.timeline(&snapshot, NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
        assert!(!timeline.visible);
        assert!(snapshot
            .entries()
            .iter()
            .any(|e| e.tobacco_urge == TobaccoUrge::Strong));
    }
}
