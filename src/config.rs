//! Engine configuration
//!
//! Every threshold the engine applies lives here so a host can tune the rule set
//! without touching the analysis code. Defaults reproduce the reference rule set.

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::types::Period;

/// Default upper bound for any confidence value
pub const DEFAULT_CONFIDENCE_CAP: f64 = 0.95;

/// Default retention for the resident history cache, in days
pub const DEFAULT_HISTORY_RETENTION_DAYS: i64 = 90;

/// Minimum current-period record counts behind a full-confidence report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequiredSamples {
    pub daily: usize,
    pub weekly: usize,
    pub monthly: usize,
    pub quarterly: usize,
}

impl Default for RequiredSamples {
    fn default() -> Self {
        Self {
            daily: 5,
            weekly: 10,
            monthly: 20,
            quarterly: 30,
        }
    }
}

impl RequiredSamples {
    pub fn for_period(&self, period: Period) -> usize {
        match period {
            Period::Daily => self.daily,
            Period::Weekly => self.weekly,
            Period::Monthly => self.monthly,
            Period::Quarterly => self.quarterly,
        }
    }
}

/// Thresholds and windows used by every analysis stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Percent change beyond which a trend is improving or declining
    pub trend_threshold_pct: f64,
    pub confidence_cap: f64,
    /// Sample count at which trend confidence reaches 1.0 before the cap
    pub confidence_sample_divisor: f64,
    /// Paired samples must exceed this count before correlating
    pub correlation_min_samples: usize,
    /// Correlations at or below this |r| are discarded
    pub correlation_min_abs_r: f64,
    pub correlation_significance: f64,
    /// σ multiple for a high-severity statistical anomaly
    pub anomaly_high_sigma: f64,
    /// σ multiple for a critical statistical anomaly
    pub anomaly_critical_sigma: f64,
    pub seizure_lookback_days: i64,
    pub history_retention_days: i64,
    pub required_samples: RequiredSamples,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            trend_threshold_pct: 5.0,
            confidence_cap: DEFAULT_CONFIDENCE_CAP,
            confidence_sample_divisor: 10.0,
            correlation_min_samples: 10,
            correlation_min_abs_r: 0.3,
            correlation_significance: 0.05,
            anomaly_high_sigma: 2.0,
            anomaly_critical_sigma: 3.0,
            seizure_lookback_days: 30,
            history_retention_days: DEFAULT_HISTORY_RETENTION_DAYS,
            required_samples: RequiredSamples::default(),
        }
    }
}

impl AnalysisConfig {
    /// Check internal consistency of the thresholds
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_cap) {
            return Err(AnalysisError::InvalidConfig(format!(
                "confidence_cap must be within 0-1, got {}",
                self.confidence_cap
            )));
        }
        if self.confidence_sample_divisor <= 0.0 {
            return Err(AnalysisError::InvalidConfig(
                "confidence_sample_divisor must be positive".to_string(),
            ));
        }
        if self.anomaly_high_sigma <= 0.0 || self.anomaly_critical_sigma < self.anomaly_high_sigma {
            return Err(AnalysisError::InvalidConfig(format!(
                "anomaly sigmas must satisfy 0 < high ({}) <= critical ({})",
                self.anomaly_high_sigma, self.anomaly_critical_sigma
            )));
        }
        if self.seizure_lookback_days <= 0 || self.history_retention_days <= 0 {
            return Err(AnalysisError::InvalidConfig(
                "lookback and retention windows must be positive".to_string(),
            ));
        }
        let required = &self.required_samples;
        if [required.daily, required.weekly, required.monthly, required.quarterly].contains(&0) {
            return Err(AnalysisError::InvalidConfig(
                "required sample counts must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Sample-size confidence: `min(cap, n / divisor)`
    pub fn sample_confidence(&self, samples: usize) -> f64 {
        (samples as f64 / self.confidence_sample_divisor).min(self.confidence_cap)
    }

    /// Load configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
