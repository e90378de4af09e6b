//! Cross-metric correlation
//!
//! Pairs metrics recorded on the same day and reports the Pearson correlations
//! that are both well-sampled and non-trivial.

use tracing::debug;

use crate::config::AnalysisConfig;
use crate::stats;
use crate::types::{CorrelationDirection, CorrelationResult, CorrelationStrength, LogRecord};

type Extractor = fn(&LogRecord) -> Option<f64>;

fn seizure_count(record: &LogRecord) -> Option<f64> {
    Some(record.seizure_count() as f64)
}

/// Metric pairs evaluated on every report
const METRIC_PAIRS: &[(&str, Extractor, &str, Extractor)] = &[
    ("temperature", LogRecord::temperature, "pulse", LogRecord::pulse),
    ("spo2", LogRecord::spo2, "pulse", LogRecord::pulse),
    ("temperature", LogRecord::temperature, "seizure_count", seizure_count),
    ("sleep_duration", LogRecord::sleep_duration, "seizure_count", seizure_count),
    ("sleep_duration", LogRecord::sleep_duration, "mood", LogRecord::mood_score),
    ("intake_volume", LogRecord::intake_volume, "seizure_count", seizure_count),
    ("participation", LogRecord::participation_count, "mood", LogRecord::mood_score),
];

/// Computes correlations over the current-period slice
pub struct CorrelationAnalyzer<'a> {
    config: &'a AnalysisConfig,
}

impl<'a> CorrelationAnalyzer<'a> {
    pub fn new(config: &'a AnalysisConfig) -> Self {
        Self { config }
    }

    /// Evaluate every configured metric pair
    pub fn analyze(&self, records: &[&LogRecord]) -> Vec<CorrelationResult> {
        METRIC_PAIRS
            .iter()
            .filter_map(|(name_a, extract_a, name_b, extract_b)| {
                let (xs, ys): (Vec<f64>, Vec<f64>) = records
                    .iter()
                    .filter_map(|r| Some((extract_a(r)?, extract_b(r)?)))
                    .unzip();
                self.correlate(name_a, name_b, &xs, &ys)
            })
            .collect()
    }

    /// Correlate one pair of aligned series
    ///
    /// Returns `None` when the paired sample is too small or |r| does not exceed
    /// the reporting threshold.
    pub fn correlate(&self, metric_a: &str, metric_b: &str, xs: &[f64], ys: &[f64]) -> Option<CorrelationResult> {
        if xs.len() != ys.len() || xs.len() <= self.config.correlation_min_samples {
            debug!(metric_a, metric_b, samples = xs.len(), "too few paired samples to correlate");
            return None;
        }

        let r = stats::pearson(xs, ys);
        if r.abs() <= self.config.correlation_min_abs_r {
            return None;
        }

        Some(CorrelationResult {
            metric_a: metric_a.to_string(),
            metric_b: metric_b.to_string(),
            r,
            strength: strength_of(r),
            direction: if r >= 0.0 {
                CorrelationDirection::Positive
            } else {
                CorrelationDirection::Negative
            },
            significance: self.config.correlation_significance,
            sample_size: xs.len(),
        })
    }
}

fn strength_of(r: f64) -> CorrelationStrength {
    let magnitude = r.abs();
    if magnitude > 0.7 {
        CorrelationStrength::Strong
    } else if magnitude > 0.5 {
        CorrelationStrength::Moderate
    } else {
        CorrelationStrength::Weak
    }
}
