//! Period-over-period trend aggregation
//!
//! For each clinical dimension this module extracts the numeric series from the
//! current and previous windows and classifies the change between their averages.

use crate::config::AnalysisConfig;
use crate::stats;
use crate::types::{
    ActivityTrends, LogRecord, NutritionTrends, SeizureTrends, SleepTrends, TrendClassification,
    TrendMetric, VitalTrends, Vitals,
};

/// Builds [`TrendMetric`]s for every dimension
pub struct TrendAggregator<'a> {
    config: &'a AnalysisConfig,
}

impl<'a> TrendAggregator<'a> {
    pub fn new(config: &'a AnalysisConfig) -> Self {
        Self { config }
    }

    /// Compare two samples
    ///
    /// Returns the neutral [`TrendMetric::insufficient`] sentinel when either
    /// sample is empty.
    pub fn metric(&self, current: &[f64], previous: &[f64]) -> TrendMetric {
        let (Some(current_avg), Some(previous_avg)) = (stats::mean(current), stats::mean(previous))
        else {
            return TrendMetric::insufficient();
        };

        let change = current_avg - previous_avg;
        let change_percent = if previous_avg != 0.0 {
            change / previous_avg * 100.0
        } else {
            0.0
        };
        let (min, max) = stats::min_max(current).unwrap_or((0.0, 0.0));

        TrendMetric {
            current: current_avg,
            previous: previous_avg,
            change,
            change_percent,
            classification: self.classify(change_percent),
            confidence: self.config.sample_confidence(current.len()),
            min,
            max,
            average: current_avg,
            stddev: stats::std_dev(current).unwrap_or(0.0),
            sample_size: current.len(),
        }
    }

    /// Uniform sign convention: a rise beyond the threshold is "improving"
    /// for every metric.
    fn classify(&self, change_percent: f64) -> TrendClassification {
        let threshold = self.config.trend_threshold_pct;
        if change_percent > threshold {
            TrendClassification::Improving
        } else if change_percent < -threshold {
            TrendClassification::Declining
        } else {
            TrendClassification::Stable
        }
    }

    fn metric_of<F>(&self, current: &[&LogRecord], previous: &[&LogRecord], extract: F) -> TrendMetric
    where
        F: Fn(&LogRecord) -> Option<f64>,
    {
        self.metric(&series(current, &extract), &series(previous, &extract))
    }

    pub fn vitals(&self, current: &[&LogRecord], previous: &[&LogRecord]) -> VitalTrends {
        VitalTrends {
            temperature: self.metric_of(current, previous, LogRecord::temperature),
            pulse: self.metric_of(current, previous, LogRecord::pulse),
            spo2: self.metric_of(current, previous, LogRecord::spo2),
            systolic: self.metric_of(current, previous, LogRecord::systolic),
            diastolic: self.metric_of(current, previous, LogRecord::diastolic),
            health_score: self.metric_of(current, previous, |r| {
                r.vitals.as_ref().and_then(vital_health_score)
            }),
        }
    }

    pub fn seizures(&self, current: &[&LogRecord], previous: &[&LogRecord]) -> SeizureTrends {
        let durations = |records: &[&LogRecord]| -> Vec<f64> {
            records
                .iter()
                .flat_map(|r| r.seizures.iter().map(|s| s.duration_sec))
                .collect()
        };

        SeizureTrends {
            // Every recorded day counts, including seizure-free ones
            frequency: self.metric_of(current, previous, |r| Some(r.seizure_count() as f64)),
            duration: self.metric(&durations(current), &durations(previous)),
        }
    }

    pub fn nutrition(&self, current: &[&LogRecord], previous: &[&LogRecord]) -> NutritionTrends {
        NutritionTrends {
            intake_volume: self.metric_of(current, previous, LogRecord::intake_volume),
            meal_completion: self.metric_of(current, previous, LogRecord::meal_completion),
        }
    }

    pub fn sleep(&self, current: &[&LogRecord], previous: &[&LogRecord]) -> SleepTrends {
        SleepTrends {
            duration: self.metric_of(current, previous, LogRecord::sleep_duration),
            quality: self.metric_of(current, previous, LogRecord::sleep_quality_score),
        }
    }

    pub fn activity(&self, current: &[&LogRecord], previous: &[&LogRecord]) -> ActivityTrends {
        ActivityTrends {
            participation: self.metric_of(current, previous, LogRecord::participation_count),
            mood: self.metric_of(current, previous, LogRecord::mood_score),
        }
    }
}

/// Collect the values `extract` yields across `records`
pub fn series<F>(records: &[&LogRecord], extract: F) -> Vec<f64>
where
    F: Fn(&LogRecord) -> Option<f64>,
{
    records.iter().filter_map(|r| extract(r)).collect()
}

/// Composite 0-100 score from the vital-sign penalty rubric
///
/// Each vital contributes the penalty of the widest band it falls outside of.
/// Returns `None` when no vital sign was measured.
pub fn vital_health_score(vitals: &Vitals) -> Option<f64> {
    let systolic = vitals.blood_pressure.map(|bp| bp.systolic);
    if vitals.temperature.is_none() && vitals.pulse.is_none() && vitals.spo2.is_none() && systolic.is_none() {
        return None;
    }

    let mut score = 100.0;

    if let Some(temp) = vitals.temperature {
        score -= band_penalty(temp, (36.0, 37.5), (35.0, 38.0));
    }
    if let Some(pulse) = vitals.pulse {
        score -= band_penalty(pulse, (60.0, 100.0), (50.0, 120.0));
    }
    if let Some(spo2) = vitals.spo2 {
        if spo2 < 90.0 {
            score -= 30.0;
        } else if spo2 < 95.0 {
            score -= 15.0;
        }
    }
    if let Some(systolic) = systolic {
        score -= band_penalty(systolic, (100.0, 160.0), (90.0, 180.0));
    }

    Some(f64::clamp(score, 0.0, 100.0))
}

fn band_penalty(value: f64, normal: (f64, f64), tolerable: (f64, f64)) -> f64 {
    if value < tolerable.0 || value > tolerable.1 {
        20.0
    } else if value < normal.0 || value > normal.1 {
        10.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BloodPressure, SeizureEvent, SeizureType};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn with_temperature(day: u32, temperature: f64) -> LogRecord {
        let mut record = LogRecord::new(NaiveDate::from_ymd_opt(2024, 5, day).unwrap());
        record.vitals = Some(Vitals {
            temperature: Some(temperature),
            ..Default::default()
        });
        record
    }

    #[test]
    fn test_empty_series_is_neutral() {
        let config = AnalysisConfig::default();
        let aggregator = TrendAggregator::new(&config);

        let metric = aggregator.metric(&[], &[]);
        assert_eq!(metric, TrendMetric::insufficient());

        let metric = aggregator.metric(&[37.0], &[]);
        assert!(metric.is_insufficient());
    }

    #[test]
    fn test_relative_threshold_not_absolute() {
        let config = AnalysisConfig::default();
        let aggregator = TrendAggregator::new(&config);

        let metric = aggregator.metric(&[37.0, 37.2, 37.4], &[36.0, 36.0, 36.0]);

        assert!((metric.change - 1.2).abs() < 1e-9);
        assert!((metric.change_percent - 3.333).abs() < 0.01);
        assert_eq!(metric.classification, TrendClassification::Stable);
        assert!((metric.confidence - 0.3).abs() < 1e-9);
        assert_eq!(metric.min, 37.0);
        assert_eq!(metric.max, 37.4);
        assert_eq!(metric.sample_size, 3);
    }

    #[test]
    fn test_classification_thresholds() {
        let config = AnalysisConfig::default();
        let aggregator = TrendAggregator::new(&config);

        assert_eq!(
            aggregator.metric(&[106.0], &[100.0]).classification,
            TrendClassification::Improving
        );
        assert_eq!(
            aggregator.metric(&[94.0], &[100.0]).classification,
            TrendClassification::Declining
        );
        // Exactly 5% is not beyond the threshold
        assert_eq!(
            aggregator.metric(&[105.0], &[100.0]).classification,
            TrendClassification::Stable
        );
    }

    #[test]
    fn test_zero_previous_average() {
        let config = AnalysisConfig::default();
        let aggregator = TrendAggregator::new(&config);

        let metric = aggregator.metric(&[2.0, 1.0], &[0.0, 0.0]);
        assert_eq!(metric.change_percent, 0.0);
        assert_eq!(metric.classification, TrendClassification::Stable);
        assert!(!metric.is_insufficient());
    }

    #[test]
    fn test_confidence_caps() {
        let config = AnalysisConfig::default();
        let aggregator = TrendAggregator::new(&config);
        let current = vec![1.0; 50];

        assert_eq!(aggregator.metric(&current, &[1.0]).confidence, 0.95);
    }

    #[test]
    fn test_health_score_rubric() {
        let healthy = Vitals {
            temperature: Some(36.6),
            pulse: Some(72.0),
            spo2: Some(98.0),
            blood_pressure: Some(BloodPressure {
                systolic: 120.0,
                diastolic: 78.0,
            }),
        };
        assert_eq!(vital_health_score(&healthy), Some(100.0));

        let mild = Vitals {
            temperature: Some(37.8),
            pulse: Some(105.0),
            spo2: Some(93.0),
            ..healthy.clone()
        };
        // -10 temperature, -10 pulse, -15 spo2
        assert_eq!(vital_health_score(&mild), Some(65.0));

        let severe = Vitals {
            temperature: Some(39.0),
            pulse: Some(130.0),
            spo2: Some(85.0),
            blood_pressure: Some(BloodPressure {
                systolic: 190.0,
                diastolic: 110.0,
            }),
        };
        // -20 -20 -30 -20
        assert_eq!(vital_health_score(&severe), Some(10.0));

        assert_eq!(vital_health_score(&Vitals::default()), None);
    }

    #[test]
    fn test_vital_trends_from_records() {
        let config = AnalysisConfig::default();
        let aggregator = TrendAggregator::new(&config);

        let current = vec![with_temperature(10, 37.0), with_temperature(11, 37.4)];
        let previous = vec![with_temperature(3, 36.5)];
        let current_refs: Vec<&LogRecord> = current.iter().collect();
        let previous_refs: Vec<&LogRecord> = previous.iter().collect();

        let vitals = aggregator.vitals(&current_refs, &previous_refs);
        assert!((vitals.temperature.current - 37.2).abs() < 1e-9);
        assert!(vitals.pulse.is_insufficient());
        assert_eq!(vitals.health_score.current, 100.0);
    }

    #[test]
    fn test_seizure_frequency_counts_seizure_free_days() {
        let config = AnalysisConfig::default();
        let aggregator = TrendAggregator::new(&config);

        let mut busy = LogRecord::new(NaiveDate::from_ymd_opt(2024, 5, 10).unwrap());
        busy.seizures = vec![
            SeizureEvent {
                seizure_type: SeizureType::Tonic,
                duration_sec: 30.0,
                detail_tags: vec![],
                notes: String::new(),
                occurred_at: busy.timestamp(),
            };
            2
        ];
        let quiet = LogRecord::new(NaiveDate::from_ymd_opt(2024, 5, 11).unwrap());
        let previous = LogRecord::new(NaiveDate::from_ymd_opt(2024, 5, 3).unwrap());

        let trends = aggregator.seizures(&[&busy, &quiet], &[&previous]);
        assert_eq!(trends.frequency.current, 1.0);
        assert_eq!(trends.frequency.previous, 0.0);
        // No seizures in the previous window means no duration comparison
        assert!(trends.duration.is_insufficient());
    }
}
