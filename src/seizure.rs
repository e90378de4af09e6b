//! Seizure risk prediction
//!
//! Scores the near-term seizure risk for a resident from the recent seizure
//! history and the context recorded on seizure days:
//!
//! 1. Frequency over the lookback window (seizures per day)
//! 2. Trigger inference from vitals, sleep, mood and free-text notes
//! 3. Hour-of-day onset pattern
//! 4. Next-window estimate from the mean inter-seizure interval
//! 5. Additive risk score mapped to a risk level, plus a bounded probability
//!
//! The scoring is a fixed, explainable rule set; no model is trained.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Timelike, Utc};
use tracing::debug;

use crate::config::AnalysisConfig;
use crate::filter::RecordFilter;
use crate::types::{
    LogRecord, Mood, RiskLevel, SeizureRiskAssessment, TimeWindow, TriggerFactor, TriggerKind,
};

/// Probability reported when there is no seizure history
pub const NO_HISTORY_PROBABILITY: f64 = 0.05;

/// Interval assumed when fewer than two seizures are on record
pub const DEFAULT_INTERVAL_HOURS: f64 = 24.0;

/// Fever threshold for trigger inference (°C)
const FEVER_TEMPERATURE: f64 = 37.5;
/// Hypoxia threshold for trigger inference (%)
const HYPOXIA_SPO2: f64 = 95.0;
/// Tachycardia threshold for trigger inference (bpm)
const TACHYCARDIA_PULSE: f64 = 100.0;
/// Sleep shorter than this counts as sleep deprivation (minutes)
const SHORT_SLEEP_MINUTES: f64 = 300.0;

const PEAK_HOUR_COUNT: usize = 3;

const ASPIRATION_KEYWORDS: &[&str] = &["choking", "choke", "aspiration", "aspirated", "むせ", "誤嚥"];
const SLEEP_DEPRIVATION_KEYWORDS: &[&str] = &[
    "sleep deprivation",
    "sleep-deprived",
    "sleepless",
    "insomnia",
    "awake all night",
    "不眠",
    "睡眠不足",
];
const AGITATION_KEYWORDS: &[&str] = &["agitat", "irritab", "restless", "crying", "興奮", "不穏"];

const GENERIC_MEASURE: &str = "Continue routine observation";

/// Predicts near-term seizure risk
pub struct SeizureRiskPredictor<'a> {
    config: &'a AnalysisConfig,
}

impl<'a> SeizureRiskPredictor<'a> {
    pub fn new(config: &'a AnalysisConfig) -> Self {
        Self { config }
    }

    /// Assess risk from `history` (ascending by date) as of `now`
    pub fn predict(&self, resident_id: &str, history: &[LogRecord], now: DateTime<Utc>) -> SeizureRiskAssessment {
        let lookback_days = self.config.seizure_lookback_days;
        let start = now - Duration::days(lookback_days);
        let counted = |onset: &DateTime<Utc>| *onset > start && *onset <= now;

        // Onsets after `now` belong to a later replay and are not counted
        let recent: Vec<&LogRecord> = RecordFilter::lookback(history, lookback_days, now)
            .into_iter()
            .filter(|r| r.seizures.iter().any(|s| counted(&s.occurred_at)))
            .collect();
        let mut onsets: Vec<DateTime<Utc>> = recent
            .iter()
            .flat_map(|r| r.seizures.iter().map(|s| s.occurred_at))
            .filter(|onset| counted(onset))
            .collect();
        if onsets.is_empty() {
            debug!(resident_id, "no seizures in lookback window");
            return self.no_history(resident_id, now);
        }
        onsets.sort();

        let seizure_count = onsets.len();
        let frequency = seizure_count as f64 / lookback_days as f64;
        let triggers = infer_triggers(&recent);
        let trigger_kinds: Vec<TriggerKind> = triggers.iter().map(|t| t.kind).collect();

        let mean_interval_hours = mean_interval_hours(&onsets);
        let hours_since_last = onsets
            .last()
            .map(|last| (now - *last).num_seconds() as f64 / 3600.0);
        let time_window = if seizure_count <= 1 {
            TimeWindow::Within24h
        } else {
            estimate_window(hours_since_last.unwrap_or(0.0), mean_interval_hours)
        };

        let risk_score = risk_score(frequency, &trigger_kinds);
        let risk_level = risk_level_for_score(risk_score);
        let probability = self.probability(frequency, trigger_kinds.len());

        debug!(
            resident_id,
            seizure_count,
            frequency,
            risk_score,
            risk_level = risk_level.as_str(),
            "seizure risk scored"
        );

        SeizureRiskAssessment {
            resident_id: resident_id.to_string(),
            assessed_at: now,
            risk_level,
            risk_score,
            probability,
            time_window,
            time_window_label: time_window.label().to_string(),
            seizure_count,
            frequency_per_day: frequency,
            peak_hours: peak_hours(&onsets),
            mean_interval_hours,
            hours_since_last,
            preventive_measures: preventive_measures(risk_level, &trigger_kinds),
            triggers,
        }
    }

    /// `min(cap, frequency * 0.3 + 0.1 * distinct_triggers)`
    pub fn probability(&self, frequency: f64, distinct_triggers: usize) -> f64 {
        (frequency * 0.3 + 0.1 * distinct_triggers as f64).min(self.config.confidence_cap)
    }

    fn no_history(&self, resident_id: &str, now: DateTime<Utc>) -> SeizureRiskAssessment {
        SeizureRiskAssessment {
            resident_id: resident_id.to_string(),
            assessed_at: now,
            risk_level: RiskLevel::Low,
            risk_score: 0,
            probability: NO_HISTORY_PROBABILITY,
            time_window: TimeWindow::Within24h,
            time_window_label: TimeWindow::Within24h.label().to_string(),
            seizure_count: 0,
            frequency_per_day: 0.0,
            peak_hours: Vec::new(),
            mean_interval_hours: DEFAULT_INTERVAL_HOURS,
            hours_since_last: None,
            triggers: Vec::new(),
            preventive_measures: vec![GENERIC_MEASURE.to_string()],
        }
    }
}

/// Additive risk score from frequency and triggers
pub fn risk_score(frequency: f64, triggers: &[TriggerKind]) -> u32 {
    let mut score = if frequency > 0.5 {
        3
    } else if frequency > 0.2 {
        2
    } else if frequency > 0.1 {
        1
    } else {
        0
    };

    if triggers.contains(&TriggerKind::Fever) {
        score += 2;
    }
    if triggers.contains(&TriggerKind::Hypoxia) {
        score += 3;
    }
    if triggers.contains(&TriggerKind::Agitation) {
        score += 1;
    }
    score
}

pub fn risk_level_for_score(score: u32) -> RiskLevel {
    match score {
        s if s >= 5 => RiskLevel::Critical,
        s if s >= 3 => RiskLevel::High,
        s if s >= 1 => RiskLevel::Medium,
        _ => RiskLevel::Low,
    }
}

/// Triggers co-occurring with seizure days, most frequent first
///
/// Each trigger counts at most once per record.
pub fn infer_triggers(records: &[&LogRecord]) -> Vec<TriggerFactor> {
    let mut counts: BTreeMap<TriggerKind, u32> = BTreeMap::new();

    for record in records.iter().filter(|r| !r.seizures.is_empty()) {
        for kind in record_triggers(record) {
            *counts.entry(kind).or_insert(0) += 1;
        }
    }

    let mut triggers: Vec<TriggerFactor> = counts
        .into_iter()
        .map(|(kind, occurrences)| TriggerFactor { kind, occurrences })
        .collect();
    // Stable sort keeps kind order among ties
    triggers.sort_by(|a, b| b.occurrences.cmp(&a.occurrences));
    triggers
}

fn record_triggers(record: &LogRecord) -> BTreeSet<TriggerKind> {
    let mut found = BTreeSet::new();

    if record.temperature().is_some_and(|t| t > FEVER_TEMPERATURE) {
        found.insert(TriggerKind::Fever);
    }
    if record.spo2().is_some_and(|s| s < HYPOXIA_SPO2) {
        found.insert(TriggerKind::Hypoxia);
    }
    if record.pulse().is_some_and(|p| p > TACHYCARDIA_PULSE) {
        found.insert(TriggerKind::Tachycardia);
    }
    if record.sleep_duration().is_some_and(|d| d < SHORT_SLEEP_MINUTES) {
        found.insert(TriggerKind::SleepDeprivation);
    }
    if record.mood() == Some(&Mood::Agitated) {
        found.insert(TriggerKind::Agitation);
    }

    for note in record.notes() {
        let note = note.to_lowercase();
        if contains_any(&note, ASPIRATION_KEYWORDS) {
            found.insert(TriggerKind::Aspiration);
        }
        if contains_any(&note, SLEEP_DEPRIVATION_KEYWORDS) {
            found.insert(TriggerKind::SleepDeprivation);
        }
        if contains_any(&note, AGITATION_KEYWORDS) {
            found.insert(TriggerKind::Agitation);
        }
    }

    found
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

/// Up to three most frequent onset hours; ties go to the earlier hour
pub fn peak_hours(onsets: &[DateTime<Utc>]) -> Vec<u32> {
    let mut histogram = [0u32; 24];
    for onset in onsets {
        histogram[onset.hour() as usize] += 1;
    }

    let mut hours: Vec<(u32, u32)> = histogram
        .iter()
        .enumerate()
        .filter(|(_, count)| **count > 0)
        .map(|(hour, count)| (hour as u32, *count))
        .collect();
    hours.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    hours.into_iter().take(PEAK_HOUR_COUNT).map(|(hour, _)| hour).collect()
}

/// Mean gap between consecutive onsets (sorted), in hours
pub fn mean_interval_hours(sorted_onsets: &[DateTime<Utc>]) -> f64 {
    match (sorted_onsets.first(), sorted_onsets.last()) {
        (Some(first), Some(last)) if sorted_onsets.len() > 1 => {
            let span_hours = (*last - *first).num_seconds() as f64 / 3600.0;
            span_hours / (sorted_onsets.len() - 1) as f64
        }
        _ => DEFAULT_INTERVAL_HOURS,
    }
}

/// Next-seizure window from elapsed time relative to the mean interval
pub fn estimate_window(hours_since_last: f64, mean_interval_hours: f64) -> TimeWindow {
    if hours_since_last > 0.8 * mean_interval_hours {
        TimeWindow::Within12h
    } else if hours_since_last > 0.5 * mean_interval_hours {
        TimeWindow::Within24h
    } else {
        TimeWindow::Within48h
    }
}

/// Fixed actions for the risk level followed by trigger-specific actions
pub fn preventive_measures(level: RiskLevel, triggers: &[TriggerKind]) -> Vec<String> {
    let base: &[&str] = match level {
        RiskLevel::Critical => &[
            "Ensure continuous one-to-one observation",
            "Prepare rescue medication according to the seizure action plan",
            "Notify the attending physician immediately",
        ],
        RiskLevel::High => &[
            "Increase observation to every 30 minutes",
            "Confirm rescue medication is available",
            "Review anticonvulsant adherence",
        ],
        RiskLevel::Medium => &[
            "Watch for prodromal signs at every care round",
            "Keep sleep and medication schedules regular",
        ],
        RiskLevel::Low => &[GENERIC_MEASURE],
    };

    let mut measures: Vec<String> = base.iter().map(|s| s.to_string()).collect();
    measures.extend(triggers.iter().map(|t| trigger_measure(*t).to_string()));
    measures
}

fn trigger_measure(kind: TriggerKind) -> &'static str {
    match kind {
        TriggerKind::Fever => "Monitor body temperature and treat fever promptly",
        TriggerKind::Hypoxia => "Continuous SpO2 monitoring",
        TriggerKind::Tachycardia => "Check pulse at every observation round",
        TriggerKind::Aspiration => "Review swallowing support and feeding posture",
        TriggerKind::SleepDeprivation => "Protect the sleep schedule and reduce night-time disturbance",
        TriggerKind::Agitation => "Reduce environmental stimulation and offer calming activities",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Activity, SeizureEvent, SeizureType, Sleep, Vitals};
    use chrono::{NaiveDate, TimeZone};
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap()
    }

    fn seizure_at(onset: DateTime<Utc>) -> SeizureEvent {
        SeizureEvent {
            seizure_type: SeizureType::Tonic,
            duration_sec: 45.0,
            detail_tags: vec![],
            notes: String::new(),
            occurred_at: onset,
        }
    }

    /// One record per day for `days` days ending on `now`, with seizures on the
    /// first `seizure_days` of them at 14:00
    fn history(days: u32, seizure_days: u32, temperature: Option<f64>) -> Vec<LogRecord> {
        let end = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        (0..days)
            .rev()
            .map(|back| {
                let mut record = LogRecord::new(end - chrono::Days::new(back as u64));
                let index = days - 1 - back;
                if index < seizure_days {
                    let onset = record.timestamp() + Duration::hours(14);
                    record.seizures.push(seizure_at(onset));
                    record.vitals = Some(Vitals {
                        temperature,
                        ..Default::default()
                    });
                }
                record
            })
            .collect()
    }

    #[test]
    fn test_no_history() {
        let config = AnalysisConfig::default();
        let predictor = SeizureRiskPredictor::new(&config);

        let assessment = predictor.predict("r-1", &history(10, 0, None), now());

        assert_eq!(assessment.risk_level, RiskLevel::Low);
        assert_eq!(assessment.probability, NO_HISTORY_PROBABILITY);
        assert_eq!(assessment.time_window_label, "within 24h");
        assert!(assessment.triggers.is_empty());
        assert_eq!(assessment.preventive_measures, vec![GENERIC_MEASURE.to_string()]);
    }

    #[test]
    fn test_fifteen_febrile_seizures_is_high() {
        let config = AnalysisConfig::default();
        let predictor = SeizureRiskPredictor::new(&config);

        // 30 days of records, seizures with fever on 15 of them
        let records = history(30, 15, Some(38.2));
        let assessment = predictor.predict("r-1", &records, now());

        assert_eq!(assessment.seizure_count, 15);
        assert!((assessment.frequency_per_day - 0.5).abs() < 1e-12);
        // 0.5/day does not exceed 0.5 (+2), fever (+2)
        assert_eq!(assessment.risk_score, 4);
        assert_eq!(assessment.risk_level, RiskLevel::High);
        assert_eq!(
            assessment.triggers,
            vec![TriggerFactor {
                kind: TriggerKind::Fever,
                occurrences: 15
            }]
        );
        assert!((assessment.probability - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_sixteen_febrile_seizures_is_critical() {
        let config = AnalysisConfig::default();
        let predictor = SeizureRiskPredictor::new(&config);

        let records = history(30, 16, Some(38.2));
        let assessment = predictor.predict("r-1", &records, now());

        assert_eq!(assessment.risk_score, 5);
        assert_eq!(assessment.risk_level, RiskLevel::Critical);
    }

    #[test]
    fn test_score_to_level_boundaries() {
        assert_eq!(risk_level_for_score(0), RiskLevel::Low);
        assert_eq!(risk_level_for_score(1), RiskLevel::Medium);
        assert_eq!(risk_level_for_score(3), RiskLevel::High);
        assert_eq!(risk_level_for_score(4), RiskLevel::High);
        assert_eq!(risk_level_for_score(5), RiskLevel::Critical);
    }

    #[test]
    fn test_risk_score_components() {
        assert_eq!(risk_score(0.05, &[]), 0);
        assert_eq!(risk_score(0.15, &[]), 1);
        assert_eq!(risk_score(0.3, &[]), 2);
        assert_eq!(risk_score(0.6, &[]), 3);
        assert_eq!(risk_score(0.0, &[TriggerKind::Hypoxia]), 3);
        assert_eq!(risk_score(0.0, &[TriggerKind::Agitation, TriggerKind::Tachycardia]), 1);
    }

    #[test]
    fn test_probability_capped() {
        let config = AnalysisConfig::default();
        let predictor = SeizureRiskPredictor::new(&config);

        assert!((predictor.probability(0.5, 2) - 0.35).abs() < 1e-9);
        assert_eq!(predictor.probability(3.0, 6), 0.95);
    }

    #[test]
    fn test_trigger_inference_from_context() {
        let mut record = LogRecord::new(NaiveDate::from_ymd_opt(2024, 3, 20).unwrap());
        let onset = record.timestamp();
        record.seizures.push(SeizureEvent {
            notes: "Choking during lunch before onset".to_string(),
            ..seizure_at(onset)
        });
        record.vitals = Some(Vitals {
            temperature: Some(37.0),
            pulse: Some(112.0),
            spo2: Some(93.0),
            blood_pressure: None,
        });
        record.sleep = Some(Sleep {
            duration_minutes: Some(240.0),
            quality: None,
            notes: String::new(),
        });
        record.activity = Some(Activity {
            participation_tags: vec![],
            mood: None,
            notes: "Restless all afternoon".to_string(),
        });

        let quiet_day = {
            let mut r = LogRecord::new(NaiveDate::from_ymd_opt(2024, 3, 21).unwrap());
            r.vitals = Some(Vitals {
                temperature: Some(39.0),
                ..Default::default()
            });
            r
        };

        let triggers = infer_triggers(&[&record, &quiet_day]);
        let kinds: Vec<TriggerKind> = triggers.iter().map(|t| t.kind).collect();

        // Fever only appears on a seizure-free day, so it is not a trigger
        assert_eq!(
            kinds,
            vec![
                TriggerKind::Hypoxia,
                TriggerKind::Tachycardia,
                TriggerKind::Aspiration,
                TriggerKind::SleepDeprivation,
                TriggerKind::Agitation,
            ]
        );
    }

    #[test]
    fn test_peak_hours() {
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let onsets: Vec<DateTime<Utc>> = [6, 6, 6, 14, 14, 22, 3]
            .iter()
            .enumerate()
            .map(|(day, hour)| base + Duration::days(day as i64) + Duration::hours(*hour))
            .collect();

        assert_eq!(peak_hours(&onsets), vec![6, 14, 3]);
    }

    #[test]
    fn test_window_estimate() {
        assert_eq!(estimate_window(20.0, 24.0), TimeWindow::Within12h);
        assert_eq!(estimate_window(15.0, 24.0), TimeWindow::Within24h);
        assert_eq!(estimate_window(12.0, 24.0), TimeWindow::Within48h);
    }

    #[test]
    fn test_single_seizure_uses_default_interval() {
        let config = AnalysisConfig::default();
        let predictor = SeizureRiskPredictor::new(&config);

        let records = history(30, 1, None);
        let assessment = predictor.predict("r-1", &records, now());

        assert_eq!(assessment.mean_interval_hours, DEFAULT_INTERVAL_HOURS);
        assert_eq!(assessment.time_window, TimeWindow::Within24h);
        assert!(assessment.hours_since_last.unwrap() > 24.0 * 28.0);
    }

    #[test]
    fn test_hypoxia_adds_spo2_monitoring() {
        let measures = preventive_measures(RiskLevel::High, &[TriggerKind::Hypoxia]);
        assert_eq!(measures.last().unwrap(), "Continuous SpO2 monitoring");
        assert_eq!(measures.len(), 4);
    }

    #[test]
    fn test_seizure_later_today_not_counted() {
        let config = AnalysisConfig::default();
        let predictor = SeizureRiskPredictor::new(&config);
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 9, 0, 0).unwrap();

        let records: Vec<LogRecord> = [(29, 8), (30, 8), (31, 20)]
            .iter()
            .map(|(d, hour)| {
                let mut record = LogRecord::new(NaiveDate::from_ymd_opt(2024, 3, *d).unwrap());
                let onset = record.timestamp() + Duration::hours(*hour);
                record.seizures.push(seizure_at(onset));
                record
            })
            .collect();

        let assessment = predictor.predict("r-1", &records, now);
        assert_eq!(assessment.seizure_count, 2);
        assert_eq!(assessment.hours_since_last, Some(25.0));
        assert_eq!(assessment.mean_interval_hours, 24.0);
        // 25h since last exceeds 0.8 * 24h
        assert_eq!(assessment.time_window, TimeWindow::Within12h);
    }

    #[test]
    fn test_old_seizures_ignored() {
        let config = AnalysisConfig::default();
        let predictor = SeizureRiskPredictor::new(&config);

        // 60 days of history; seizures only on the first 20, all older than 30 days
        let records = history(60, 20, None);
        let assessment = predictor.predict("r-1", &records, now());
        assert_eq!(assessment.seizure_count, 0);
        assert_eq!(assessment.risk_level, RiskLevel::Low);
    }
}
