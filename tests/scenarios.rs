//! End-to-end reports built from JSON care logs

use care_trends::types::{
    AnomalyRule, CorrelationStrength, Dimension, Period, RiskLevel, Severity, TrendClassification, TriggerKind,
};
use care_trends::{HealthTrendAnalyzer, LogRecord, RecordAdapter};
use chrono::{DateTime, Days, TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap()
}

fn date(offset: u64) -> String {
    (now().date_naive() - Days::new(offset)).format("%Y-%m-%d").to_string()
}

/// Parse and validate a JSON array, failing the test on any rejected record
fn records(value: serde_json::Value) -> Vec<LogRecord> {
    let raw = RecordAdapter::parse_array(&value.to_string()).unwrap();
    let mut batch = RecordAdapter::to_records(&raw);
    assert!(batch.issues.is_empty(), "unexpected issues: {:?}", batch.issues);
    batch.sort_by_date();
    batch.records
}

#[test]
fn test_empty_windows_give_neutral_metric() {
    let report = HealthTrendAnalyzer::new()
        .generate_report("resident-a", &[], Period::Weekly, now())
        .unwrap();

    let temperature = &report.vitals.temperature;
    assert_eq!(temperature.current, 0.0);
    assert_eq!(temperature.previous, 0.0);
    assert_eq!(temperature.confidence, 0.0);
    assert_eq!(temperature.classification, TrendClassification::Stable);
    assert!(report.recommendations.is_empty());
}

#[test]
fn test_relative_threshold_not_absolute_delta() {
    let log = records(json!([
        {"date": date(9), "vitals": {"temperature": 36.0}},
        {"date": date(8), "vitals": {"temperature": 36.0}},
        {"date": date(7), "vitals": {"temperature": 36.0}},
        {"date": date(2), "vitals": {"temperature": 37.0}},
        {"date": date(1), "vitals": {"temperature": 37.2}},
        {"date": date(0), "vitals": {"temperature": 37.4}},
    ]));

    let report = HealthTrendAnalyzer::new()
        .generate_report("resident-b", &log, Period::Weekly, now())
        .unwrap();

    let temperature = &report.vitals.temperature;
    assert!((temperature.change - 1.2).abs() < 1e-9);
    assert!((temperature.change_percent - 3.333).abs() < 0.01);
    assert_eq!(temperature.classification, TrendClassification::Stable);
    assert_eq!(temperature.sample_size, 3);
}

fn febrile_seizure_log(extra_same_day_seizure: bool) -> Vec<LogRecord> {
    let days: Vec<serde_json::Value> = (0..15u64)
        .rev()
        .map(|i| {
            let mut seizures = vec![json!({"type": "tonic", "duration_sec": 45, "time": "10:00"})];
            if extra_same_day_seizure && i == 0 {
                seizures.push(json!({"type": "clonic", "duration_sec": 30, "time": "11:30"}));
            }
            json!({
                "date": date(i * 2),
                "vitals": {"temperature": 38.0},
                "seizures": seizures,
            })
        })
        .collect();
    records(serde_json::Value::Array(days))
}

#[test]
fn test_febrile_seizures_at_risk_boundary() {
    let analyzer = HealthTrendAnalyzer::new();

    // The product's worked example for this case scores 0.5/day as +3 and
    // reaches critical. The frequency rule itself is strict (> 0.5), which gives +2 here,
    // so 15 seizures with fever score 4 (high). Product owners should settle which
    // of the two is intended; the rule as written is applied.
    // 15 / 30 = 0.5 per day does not exceed 0.5 (+2); fever +2 → 4
    let risk = analyzer
        .predict_seizure_risk("resident-c", &febrile_seizure_log(false), now())
        .unwrap();
    assert_eq!(risk.seizure_count, 15);
    assert_eq!(risk.risk_score, 4);
    assert_eq!(risk.risk_level, RiskLevel::High);
    assert_eq!(risk.triggers[0].kind, TriggerKind::Fever);
    assert_eq!(risk.triggers[0].occurrences, 15);
    assert_eq!(risk.peak_hours[0], 10);

    // 16 / 30 exceeds 0.5 (+3); fever +2 → 5
    let risk = analyzer
        .predict_seizure_risk("resident-c", &febrile_seizure_log(true), now())
        .unwrap();
    assert_eq!(risk.seizure_count, 16);
    assert_eq!(risk.risk_score, 5);
    assert_eq!(risk.risk_level, RiskLevel::Critical);
}

#[test]
fn test_clinical_threshold_independent_of_spread() {
    let log = records(json!([
        {"date": date(3), "vitals": {"spO2": 97}},
        {"date": date(2), "vitals": {"spO2": 98}},
        {"date": date(1), "vitals": {"spO2": 96}},
        {"date": date(0), "vitals": {"spO2": 60}},
    ]));

    let report = HealthTrendAnalyzer::new()
        .generate_report("resident-d", &log, Period::Weekly, now())
        .unwrap();

    assert_eq!(report.anomalies.len(), 1);
    let event = &report.anomalies[0];
    assert_eq!(event.dimension, Dimension::Vitals);
    assert_eq!(event.metric, "spo2");
    assert_eq!(event.rule, AnomalyRule::ClinicalThreshold);
    assert_eq!(event.severity, Severity::Critical);
    assert_eq!(event.observed_value, 60.0);

    // Anomaly recommendations close the list
    let last = report.recommendations.last().unwrap();
    assert!(event.recommendations.contains(last));
}

#[test]
fn test_weak_correlation_is_reported() {
    let pulse_steps = [3, 1, 4, 1, 5, 9, 2, 6, 5, 3, 5];
    let log = records(serde_json::Value::Array(
        pulse_steps
            .iter()
            .enumerate()
            .map(|(i, step)| {
                let offset = (pulse_steps.len() - 1 - i) as u64;
                json!({
                    "date": date(offset),
                    "vitals": {
                        "temperature": 36.0 + (i as f64 + 1.0) / 10.0,
                        "pulse": 70 + 3 * step,
                    },
                })
            })
            .collect(),
    ));

    let report = HealthTrendAnalyzer::new()
        .generate_report("resident-e", &log, Period::Monthly, now())
        .unwrap();

    let correlation = report
        .correlations
        .iter()
        .find(|c| c.metric_a == "temperature" && c.metric_b == "pulse")
        .unwrap();
    assert!((correlation.r - 0.3568).abs() < 0.001, "r = {}", correlation.r);
    assert_eq!(correlation.strength, CorrelationStrength::Weak);
    assert_eq!(correlation.sample_size, 11);
}

#[test]
fn test_malformed_records_are_skipped() {
    let raw = RecordAdapter::parse_array(
        &json!([
            {"date": date(8), "vitals": {"pulse": 76}},
            {"date": date(1), "vitals": {"pulse": 80}},
            {"date": "yesterday", "vitals": {"pulse": 82}},
            {"date": date(0), "seizures": [{"type": "unheard-of"}]},
            {"date": date(0), "vitals": {"pulse": 84}},
        ])
        .to_string(),
    )
    .unwrap();

    let batch = RecordAdapter::to_records(&raw);
    assert_eq!(batch.records.len(), 3);
    assert_eq!(batch.issues.iter().map(|i| i.index).collect::<Vec<_>>(), vec![2, 3]);

    let report = HealthTrendAnalyzer::new()
        .generate_report("resident-f", &batch.records, Period::Weekly, now())
        .unwrap();
    assert_eq!(report.current_record_count, 2);
    assert_eq!(report.previous_record_count, 1);
    assert_eq!(report.vitals.pulse.current, 82.0);
    assert_eq!(report.vitals.pulse.previous, 76.0);
}
