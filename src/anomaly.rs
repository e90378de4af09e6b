//! Anomaly detection
//!
//! Two independent rule families run over the current-period slice:
//! - statistical outliers relative to the slice's own mean and σ
//! - fixed clinical thresholds that fire regardless of the resident's baseline
//!
//! Both families may flag the same observation; each produces its own event.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::AnalysisConfig;
use crate::stats;
use crate::types::{AnomalyEvent, AnomalyRule, Dimension, ExpectedRange, LogRecord, Severity};

/// Confidence attached to clinical threshold events
const CLINICAL_CONFIDENCE: f64 = 0.9;

/// Observable metrics the detector inspects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Temperature,
    Pulse,
    Spo2,
    Systolic,
    Diastolic,
    IntakeVolume,
    MealCompletion,
    BristolScale,
    SleepDuration,
    SeizureDuration,
}

impl Metric {
    pub fn name(&self) -> &'static str {
        match self {
            Metric::Temperature => "temperature",
            Metric::Pulse => "pulse",
            Metric::Spo2 => "spo2",
            Metric::Systolic => "systolic",
            Metric::Diastolic => "diastolic",
            Metric::IntakeVolume => "intake_volume",
            Metric::MealCompletion => "meal_completion",
            Metric::BristolScale => "bristol_scale",
            Metric::SleepDuration => "sleep_duration",
            Metric::SeizureDuration => "seizure_duration",
        }
    }

    pub fn dimension(&self) -> Dimension {
        match self {
            Metric::Temperature | Metric::Pulse | Metric::Spo2 | Metric::Systolic | Metric::Diastolic => {
                Dimension::Vitals
            }
            Metric::IntakeVolume | Metric::MealCompletion => Dimension::Nutrition,
            Metric::BristolScale => Dimension::Excretion,
            Metric::SleepDuration => Dimension::Sleep,
            Metric::SeizureDuration => Dimension::Seizures,
        }
    }

    /// Timestamped observations of this metric
    pub fn samples(&self, records: &[&LogRecord]) -> Vec<(DateTime<Utc>, f64)> {
        if *self == Metric::SeizureDuration {
            return records
                .iter()
                .flat_map(|r| r.seizures.iter().map(|s| (s.occurred_at, s.duration_sec)))
                .collect();
        }

        records
            .iter()
            .filter_map(|r| {
                let value = match self {
                    Metric::Temperature => r.temperature(),
                    Metric::Pulse => r.pulse(),
                    Metric::Spo2 => r.spo2(),
                    Metric::Systolic => r.systolic(),
                    Metric::Diastolic => r.diastolic(),
                    Metric::IntakeVolume => r.intake_volume(),
                    Metric::MealCompletion => r.meal_completion(),
                    Metric::BristolScale => r.bristol_scale().map(f64::from),
                    Metric::SleepDuration => r.sleep_duration(),
                    Metric::SeizureDuration => None,
                }?;
                Some((r.timestamp(), value))
            })
            .collect()
    }
}

/// Metrics checked for statistical outliers
const STATISTICAL_METRICS: &[Metric] = &[
    Metric::Temperature,
    Metric::Pulse,
    Metric::Spo2,
    Metric::Systolic,
    Metric::Diastolic,
    Metric::IntakeVolume,
    Metric::SleepDuration,
    Metric::SeizureDuration,
];

/// Trigger condition of a clinical rule
#[derive(Debug, Clone, Copy)]
enum Bound {
    Below(f64),
    Above(f64),
    AtLeast(f64),
}

impl Bound {
    fn breached_by(&self, value: f64) -> bool {
        match *self {
            Bound::Below(limit) => value < limit,
            Bound::Above(limit) => value > limit,
            Bound::AtLeast(limit) => value >= limit,
        }
    }
}

/// Fixed clinical threshold
struct ClinicalRule {
    metric: Metric,
    bound: Bound,
    severity: Severity,
    normal: ExpectedRange,
    recommendations: &'static [&'static str],
}

const fn range(min: f64, max: f64) -> ExpectedRange {
    ExpectedRange { min, max }
}

const CLINICAL_RULES: &[ClinicalRule] = &[
    ClinicalRule {
        metric: Metric::Spo2,
        bound: Bound::Below(90.0),
        severity: Severity::Critical,
        normal: range(95.0, 100.0),
        recommendations: &[
            "Check airway and positioning immediately",
            "Start continuous SpO2 monitoring",
        ],
    },
    ClinicalRule {
        metric: Metric::Temperature,
        bound: Bound::AtLeast(38.0),
        severity: Severity::High,
        normal: range(36.0, 37.5),
        recommendations: &[
            "Recheck temperature within one hour",
            "Begin fever care and notify the nurse",
        ],
    },
    ClinicalRule {
        metric: Metric::Temperature,
        bound: Bound::Below(35.0),
        severity: Severity::High,
        normal: range(36.0, 37.5),
        recommendations: &["Warm the resident and recheck temperature"],
    },
    ClinicalRule {
        metric: Metric::Pulse,
        bound: Bound::Above(120.0),
        severity: Severity::High,
        normal: range(60.0, 100.0),
        recommendations: &["Recheck pulse at rest and notify the nurse"],
    },
    ClinicalRule {
        metric: Metric::Pulse,
        bound: Bound::Below(50.0),
        severity: Severity::High,
        normal: range(60.0, 100.0),
        recommendations: &["Recheck pulse and observe for signs of bradycardia"],
    },
    ClinicalRule {
        metric: Metric::Systolic,
        bound: Bound::Above(180.0),
        severity: Severity::High,
        normal: range(100.0, 160.0),
        recommendations: &["Recheck blood pressure and notify the physician"],
    },
    ClinicalRule {
        metric: Metric::Systolic,
        bound: Bound::Below(90.0),
        severity: Severity::High,
        normal: range(100.0, 160.0),
        recommendations: &["Check for signs of shock and recheck blood pressure"],
    },
    ClinicalRule {
        metric: Metric::SeizureDuration,
        bound: Bound::AtLeast(300.0),
        severity: Severity::Critical,
        normal: range(0.0, 300.0),
        recommendations: &[
            "Follow the prolonged seizure protocol",
            "Administer rescue medication as prescribed",
        ],
    },
    ClinicalRule {
        metric: Metric::BristolScale,
        bound: Bound::Below(2.0),
        severity: Severity::Low,
        normal: range(3.0, 5.0),
        recommendations: &["Review hydration and bowel care plan"],
    },
    ClinicalRule {
        metric: Metric::BristolScale,
        bound: Bound::Above(6.0),
        severity: Severity::Low,
        normal: range(3.0, 5.0),
        recommendations: &["Monitor for dehydration and review bowel care plan"],
    },
    ClinicalRule {
        metric: Metric::MealCompletion,
        bound: Bound::Below(30.0),
        severity: Severity::Medium,
        normal: range(70.0, 100.0),
        recommendations: &["Review meal form and feeding support"],
    },
];

/// Flags outliers in the current-period slice
pub struct AnomalyDetector<'a> {
    config: &'a AnalysisConfig,
}

impl<'a> AnomalyDetector<'a> {
    pub fn new(config: &'a AnalysisConfig) -> Self {
        Self { config }
    }

    /// Run both rule families; statistical events come first
    pub fn detect(&self, records: &[&LogRecord]) -> Vec<AnomalyEvent> {
        let mut events = Vec::new();

        for metric in STATISTICAL_METRICS {
            events.extend(self.statistical(*metric, &metric.samples(records)));
        }
        for rule in CLINICAL_RULES {
            events.extend(clinical(rule, &rule.metric.samples(records)));
        }

        debug!(records = records.len(), anomalies = events.len(), "anomaly detection complete");
        events
    }

    /// Statistical outliers for one metric's samples
    pub fn statistical(&self, metric: Metric, samples: &[(DateTime<Utc>, f64)]) -> Vec<AnomalyEvent> {
        let values: Vec<f64> = samples.iter().map(|(_, v)| *v).collect();
        let (Some(mean), Some(std_dev)) = (stats::mean(&values), stats::std_dev(&values)) else {
            return Vec::new();
        };

        let band = self.config.anomaly_high_sigma * std_dev;
        let expected_range = ExpectedRange {
            min: mean - band,
            max: mean + band,
        };
        let confidence = self.config.sample_confidence(values.len());

        samples
            .iter()
            .filter_map(|&(at, value)| {
                let severity = self.deviation_severity(value, mean, std_dev)?;
                Some(AnomalyEvent {
                    dimension: metric.dimension(),
                    metric: metric.name().to_string(),
                    rule: AnomalyRule::Statistical,
                    severity,
                    observed_value: value,
                    expected_range,
                    detected_at: at,
                    confidence,
                    recommendations: statistical_recommendations(metric, severity),
                })
            })
            .collect()
    }

    /// Severity of a deviation from the mean, `None` when within the band
    ///
    /// Comparisons are strict: a value exactly at `mean + kσ` is not escalated.
    pub fn deviation_severity(&self, value: f64, mean: f64, std_dev: f64) -> Option<Severity> {
        let deviation = (value - mean).abs();
        if deviation > self.config.anomaly_critical_sigma * std_dev {
            Some(Severity::Critical)
        } else if deviation > self.config.anomaly_high_sigma * std_dev {
            Some(Severity::High)
        } else {
            None
        }
    }
}

fn clinical(rule: &ClinicalRule, samples: &[(DateTime<Utc>, f64)]) -> Vec<AnomalyEvent> {
    samples
        .iter()
        .filter(|(_, value)| rule.bound.breached_by(*value))
        .map(|&(at, value)| AnomalyEvent {
            dimension: rule.metric.dimension(),
            metric: rule.metric.name().to_string(),
            rule: AnomalyRule::ClinicalThreshold,
            severity: rule.severity,
            observed_value: value,
            expected_range: rule.normal,
            detected_at: at,
            confidence: CLINICAL_CONFIDENCE,
            recommendations: rule.recommendations.iter().map(|s| s.to_string()).collect(),
        })
        .collect()
}

fn statistical_recommendations(metric: Metric, severity: Severity) -> Vec<String> {
    let label = metric.name().replace('_', " ");
    let mut recommendations = vec![format!(
        "Re-measure {label} and compare with the resident's usual range"
    )];
    if severity == Severity::Critical {
        recommendations.push(format!("Report the unusual {label} reading to the nurse in charge"));
    }
    recommendations
}
