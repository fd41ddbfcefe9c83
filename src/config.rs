//! Engine configuration
//!
//! Every threshold used by the derivations lives here. The defaults reproduce
//! the product behaviour; a JSON file may override any subset of fields.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Default counsellor booking link shown with the referral affordance
pub const DEFAULT_REFERRAL_URL: &str = "https://mantracare.com/book";

/// Top-level engine configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub insights: InsightConfig,
    pub timeline: TimelineConfig,
    pub escalation: EscalationConfig,
    pub referral_url: ReferralUrl,
    /// Number of entries listed as "recent"
    pub recent_limit: RecentLimit,
}

/// Thresholds for the insight derivations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightConfig {
    /// Entries required before any insight is produced
    pub min_entries: usize,
    /// Positivity rate strictly above this emits reinforcement
    pub positive_rate_high: u32,
    /// Positivity rate strictly below this emits a concern
    pub positive_rate_low: u32,
    /// Strong-urge entries required for the urge correlation
    pub min_strong_urges: usize,
    /// Urge correlation percentage strictly above this is reported
    pub urge_correlation_pct: u32,
    /// Minimum tally for the dominant factor
    pub min_factor_count: usize,
    /// Wellness score at or above which a date qualifies
    pub wellness_score_threshold: u32,
    /// Qualifying dates must strictly exceed this count
    pub min_qualifying_dates: usize,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            min_entries: 5,
            positive_rate_high: 50,
            positive_rate_low: 30,
            min_strong_urges: 3,
            urge_correlation_pct: 40,
            min_factor_count: 3,
            wellness_score_threshold: 75,
            min_qualifying_dates: 3,
        }
    }
}

/// Visible time axis of the daily timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// First visible hour (inclusive)
    pub start_hour: f64,
    /// Last visible hour
    pub end_hour: f64,
    /// Lower clamp for positions (percent)
    pub min_position: f64,
    /// Upper clamp for positions (percent)
    pub max_position: f64,
    /// Entries required before the timeline is shown
    pub min_entries: usize,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            start_hour: 6.0,
            end_hour: 23.0,
            min_position: 2.0,
            max_position: 98.0,
            min_entries: 2,
        }
    }
}

/// Escalation rule parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationConfig {
    pub min_entries: usize,
    /// Number of most recent distinct dates inspected
    pub window_days: usize,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            min_entries: 5,
            window_days: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferralUrl(pub String);

impl Default for ReferralUrl {
    fn default() -> Self {
        ReferralUrl(DEFAULT_REFERRAL_URL.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecentLimit(pub usize);

impl Default for RecentLimit {
    fn default() -> Self {
        RecentLimit(20)
    }
}

impl EngineConfig {
    /// Load configuration from JSON, defaulting absent fields
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Reject configurations the derivations cannot work with
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.timeline.end_hour <= self.timeline.start_hour {
            return Err(EngineError::ConfigError(format!(
                "timeline end_hour ({}) must be after start_hour ({})",
                self.timeline.end_hour, self.timeline.start_hour
            )));
        }
        if self.timeline.min_position > self.timeline.max_position {
            return Err(EngineError::ConfigError(
                "timeline min_position exceeds max_position".to_string(),
            ));
        }
        if self.escalation.window_days == 0 {
            return Err(EngineError::ConfigError(
                "escalation window_days must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_product_rules() {
        let config = EngineConfig::default();
        assert_eq!(config.insights.min_entries, 5);
        assert_eq!(config.insights.wellness_score_threshold, 75);
        assert_eq!(config.escalation.window_days, 5);
        assert_eq!(config.timeline.start_hour, 6.0);
        assert_eq!(config.timeline.end_hour, 23.0);
        assert_eq!(config.referral_url.0, DEFAULT_REFERRAL_URL);
        assert_eq!(config.recent_limit.0, 20);
    }

    #[test]
    fn test_partial_json_overrides() {
        let config =
            EngineConfig::from_json(r#"{"insights": {"min_entries": 10}, "recent_limit": 5}"#)
                .unwrap();
        assert_eq!(config.insights.min_entries, 10);
        assert_eq!(config.insights.positive_rate_high, 50);
        assert_eq!(config.recent_limit.0, 5);
    }

    #[test]
    fn test_invalid_timeline_rejected() {
        let result = EngineConfig::from_json(r#"{"timeline": {"start_hour": 20, "end_hour": 8}}"#);
        assert!(matches!(result, Err(EngineError::ConfigError(_))));
    }

    #[test]
    fn test_round_trip() {
        let config = EngineConfig::default();
        let json = config.to_json().unwrap();
        assert_eq!(EngineConfig::from_json(&json).unwrap(), config);
    }
}
