//! Core types for the care-trends engine
//!
//! This module defines the validated care-observation records the engine reads and
//! the structured report types it produces: trend metrics, correlations, anomaly
//! events and seizure risk assessments.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AnalysisError;

// ============================================================================
// Observation records
// ============================================================================

/// Blood pressure reading (mmHg)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BloodPressure {
    pub systolic: f64,
    pub diastolic: f64,
}

/// Vital signs taken during the day
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    /// Body temperature (°C)
    pub temperature: Option<f64>,
    /// Pulse (bpm)
    pub pulse: Option<f64>,
    /// Peripheral oxygen saturation (%)
    pub spo2: Option<f64>,
    pub blood_pressure: Option<BloodPressure>,
}

/// Seizure classification as recorded by care staff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SeizureType {
    Tonic,
    Clonic,
    TonicClonic,
    Atonic,
    Myoclonic,
    Spasm,
    AtypicalAbsence,
    FocalImpaired,
    Other,
}

impl SeizureType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeizureType::Tonic => "tonic",
            SeizureType::Clonic => "clonic",
            SeizureType::TonicClonic => "tonic-clonic",
            SeizureType::Atonic => "atonic",
            SeizureType::Myoclonic => "myoclonic",
            SeizureType::Spasm => "spasm",
            SeizureType::AtypicalAbsence => "atypical-absence",
            SeizureType::FocalImpaired => "focal-impaired",
            SeizureType::Other => "other",
        }
    }

    /// Parse a seizure type label, accepting `-`, `_` or space as separators
    pub fn parse(label: &str) -> Option<Self> {
        let normalized = label.trim().to_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "tonic" => Some(SeizureType::Tonic),
            "clonic" => Some(SeizureType::Clonic),
            "tonic-clonic" => Some(SeizureType::TonicClonic),
            "atonic" => Some(SeizureType::Atonic),
            "myoclonic" => Some(SeizureType::Myoclonic),
            "spasm" | "spasms" => Some(SeizureType::Spasm),
            "atypical-absence" => Some(SeizureType::AtypicalAbsence),
            "focal-impaired" => Some(SeizureType::FocalImpaired),
            "other" => Some(SeizureType::Other),
            _ => None,
        }
    }
}

/// A single seizure observed during the day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeizureEvent {
    #[serde(rename = "type")]
    pub seizure_type: SeizureType,
    pub duration_sec: f64,
    /// Observed details (e.g. eye-deviation, cyanosis)
    #[serde(default)]
    pub detail_tags: Vec<String>,
    #[serde(default)]
    pub notes: String,
    /// Onset time; the parent record's date at 00:00 UTC when no finer time was given
    pub occurred_at: DateTime<Utc>,
}

/// Meal and fluid intake
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Intake {
    pub volume_ml: Option<f64>,
    pub meal_completion_pct: Option<f64>,
    #[serde(default)]
    pub notes: String,
}

/// Excretion observation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Excretion {
    /// Bristol stool form scale (1-7)
    pub bristol_scale: Option<u8>,
    #[serde(default)]
    pub notes: String,
}

/// Sleep quality label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepQuality {
    Good,
    Fair,
    Poor,
    /// Free-text labels that have no numeric score
    #[serde(untagged)]
    Other(String),
}

impl SleepQuality {
    pub fn parse(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "good" | "deep" | "well" => SleepQuality::Good,
            "fair" | "normal" | "light" => SleepQuality::Fair,
            "poor" | "bad" | "restless" => SleepQuality::Poor,
            other => SleepQuality::Other(other.to_string()),
        }
    }

    /// Numeric score used for trend computation (higher is better)
    pub fn score(&self) -> Option<f64> {
        match self {
            SleepQuality::Good => Some(3.0),
            SleepQuality::Fair => Some(2.0),
            SleepQuality::Poor => Some(1.0),
            SleepQuality::Other(_) => None,
        }
    }
}

/// Sleep observation for the night preceding the record date
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sleep {
    pub duration_minutes: Option<f64>,
    pub quality: Option<SleepQuality>,
    #[serde(default)]
    pub notes: String,
}

/// Mood label recorded during activities
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    VeryGood,
    Good,
    Neutral,
    Poor,
    Agitated,
    /// Free-text labels that have no numeric score
    #[serde(untagged)]
    Other(String),
}

impl Mood {
    pub fn parse(label: &str) -> Self {
        let normalized = label.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "very_good" | "excellent" | "happy" => Mood::VeryGood,
            "good" | "calm" | "content" => Mood::Good,
            "neutral" | "normal" => Mood::Neutral,
            "poor" | "low" | "sad" => Mood::Poor,
            "agitated" | "irritable" | "upset" => Mood::Agitated,
            _ => Mood::Other(label.trim().to_string()),
        }
    }

    /// Numeric score used for trend computation (higher is better)
    pub fn score(&self) -> Option<f64> {
        match self {
            Mood::VeryGood => Some(5.0),
            Mood::Good => Some(4.0),
            Mood::Neutral => Some(3.0),
            Mood::Poor => Some(2.0),
            Mood::Agitated => Some(1.0),
            Mood::Other(_) => None,
        }
    }
}

/// Activity participation and mood
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(default)]
    pub participation_tags: Vec<String>,
    pub mood: Option<Mood>,
    #[serde(default)]
    pub notes: String,
}

/// One day of care observations for one resident
///
/// Records are validated once at the boundary (see [`crate::schema`]); inside the
/// engine every field is either present and well-formed or `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub date: NaiveDate,
    pub vitals: Option<Vitals>,
    #[serde(default)]
    pub seizures: Vec<SeizureEvent>,
    pub intake: Option<Intake>,
    pub excretion: Option<Excretion>,
    pub sleep: Option<Sleep>,
    pub activity: Option<Activity>,
}

impl LogRecord {
    /// Create an empty record for the given date
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            vitals: None,
            seizures: Vec::new(),
            intake: None,
            excretion: None,
            sleep: None,
            activity: None,
        }
    }

    /// Start of the record's day in UTC
    pub fn timestamp(&self) -> DateTime<Utc> {
        day_start(self.date)
    }

    pub fn temperature(&self) -> Option<f64> {
        self.vitals.as_ref().and_then(|v| v.temperature)
    }

    pub fn pulse(&self) -> Option<f64> {
        self.vitals.as_ref().and_then(|v| v.pulse)
    }

    pub fn spo2(&self) -> Option<f64> {
        self.vitals.as_ref().and_then(|v| v.spo2)
    }

    pub fn systolic(&self) -> Option<f64> {
        self.vitals
            .as_ref()
            .and_then(|v| v.blood_pressure)
            .map(|bp| bp.systolic)
    }

    pub fn diastolic(&self) -> Option<f64> {
        self.vitals
            .as_ref()
            .and_then(|v| v.blood_pressure)
            .map(|bp| bp.diastolic)
    }

    pub fn intake_volume(&self) -> Option<f64> {
        self.intake.as_ref().and_then(|i| i.volume_ml)
    }

    pub fn meal_completion(&self) -> Option<f64> {
        self.intake.as_ref().and_then(|i| i.meal_completion_pct)
    }

    pub fn bristol_scale(&self) -> Option<u8> {
        self.excretion.as_ref().and_then(|e| e.bristol_scale)
    }

    pub fn sleep_duration(&self) -> Option<f64> {
        self.sleep.as_ref().and_then(|s| s.duration_minutes)
    }

    pub fn sleep_quality_score(&self) -> Option<f64> {
        self.sleep
            .as_ref()
            .and_then(|s| s.quality.as_ref())
            .and_then(SleepQuality::score)
    }

    pub fn mood(&self) -> Option<&Mood> {
        self.activity.as_ref().and_then(|a| a.mood.as_ref())
    }

    pub fn mood_score(&self) -> Option<f64> {
        self.mood().and_then(Mood::score)
    }

    /// Number of participation tags, if activity was recorded
    pub fn participation_count(&self) -> Option<f64> {
        self.activity
            .as_ref()
            .map(|a| a.participation_tags.len() as f64)
    }

    pub fn seizure_count(&self) -> usize {
        self.seizures.len()
    }

    /// All free-text notes attached to the record
    pub fn notes(&self) -> impl Iterator<Item = &str> {
        let seizure_notes = self.seizures.iter().map(|s| s.notes.as_str());
        let section_notes = [
            self.intake.as_ref().map(|i| i.notes.as_str()),
            self.excretion.as_ref().map(|e| e.notes.as_str()),
            self.sleep.as_ref().map(|s| s.notes.as_str()),
            self.activity.as_ref().map(|a| a.notes.as_str()),
        ];
        seizure_notes
            .chain(section_notes.into_iter().flatten())
            .filter(|n| !n.is_empty())
    }
}

/// Start of a calendar day in UTC
pub fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

// ============================================================================
// Reporting period
// ============================================================================

/// Reporting period for a trend report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
}

impl Period {
    /// Length of one period window in days
    pub fn window_days(&self) -> i64 {
        match self {
            Period::Daily => 1,
            Period::Weekly => 7,
            Period::Monthly => 30,
            Period::Quarterly => 90,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Daily => "daily",
            Period::Weekly => "weekly",
            Period::Monthly => "monthly",
            Period::Quarterly => "quarterly",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Period::Daily),
            "weekly" => Ok(Period::Weekly),
            "monthly" => Ok(Period::Monthly),
            "quarterly" => Ok(Period::Quarterly),
            other => Err(AnalysisError::ParseError(format!("unknown period: {other}"))),
        }
    }
}

// ============================================================================
// Trends
// ============================================================================

/// Direction of a period-over-period change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendClassification {
    Improving,
    Stable,
    Declining,
}

/// Current-vs-previous comparison of one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendMetric {
    /// Current period average
    pub current: f64,
    /// Previous period average
    pub previous: f64,
    pub change: f64,
    pub change_percent: f64,
    pub classification: TrendClassification,
    /// Sample-size confidence (0-0.95)
    pub confidence: f64,
    pub min: f64,
    pub max: f64,
    pub average: f64,
    pub stddev: f64,
    /// Number of current-period samples
    pub sample_size: usize,
}

impl TrendMetric {
    /// Neutral metric used when either period has no samples
    pub fn insufficient() -> Self {
        Self {
            current: 0.0,
            previous: 0.0,
            change: 0.0,
            change_percent: 0.0,
            classification: TrendClassification::Stable,
            confidence: 0.0,
            min: 0.0,
            max: 0.0,
            average: 0.0,
            stddev: 0.0,
            sample_size: 0,
        }
    }

    /// True for the insufficient-data sentinel, as opposed to a genuine zero change
    pub fn is_insufficient(&self) -> bool {
        self.confidence == 0.0 && self.current == 0.0 && self.previous == 0.0
    }

    pub fn is_declining(&self) -> bool {
        self.classification == TrendClassification::Declining
    }
}

/// Vital-sign trends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalTrends {
    pub temperature: TrendMetric,
    pub pulse: TrendMetric,
    pub spo2: TrendMetric,
    pub systolic: TrendMetric,
    pub diastolic: TrendMetric,
    /// Composite 0-100 score from the vital-sign penalty rubric
    pub health_score: TrendMetric,
}

/// Seizure trends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeizureTrends {
    /// Seizures per recorded day
    pub frequency: TrendMetric,
    /// Seizure duration (seconds)
    pub duration: TrendMetric,
}

/// Nutrition trends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionTrends {
    pub intake_volume: TrendMetric,
    pub meal_completion: TrendMetric,
}

/// Sleep trends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepTrends {
    pub duration: TrendMetric,
    pub quality: TrendMetric,
}

/// Activity and mood trends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityTrends {
    pub participation: TrendMetric,
    pub mood: TrendMetric,
}

// ============================================================================
// Correlations
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationStrength {
    Weak,
    Moderate,
    Strong,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationDirection {
    Positive,
    Negative,
}

/// Pearson correlation between two metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResult {
    pub metric_a: String,
    pub metric_b: String,
    pub r: f64,
    pub strength: CorrelationStrength,
    pub direction: CorrelationDirection,
    /// Fixed significance label; no hypothesis test is performed
    pub significance: f64,
    pub sample_size: usize,
}

// ============================================================================
// Anomalies
// ============================================================================

/// Severity shared by anomaly events
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Clinical dimension an anomaly belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Vitals,
    Seizures,
    Nutrition,
    Excretion,
    Sleep,
    Activity,
}

/// Rule family that produced an anomaly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyRule {
    Statistical,
    ClinicalThreshold,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpectedRange {
    pub min: f64,
    pub max: f64,
}

/// A flagged observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyEvent {
    pub dimension: Dimension,
    pub metric: String,
    pub rule: AnomalyRule,
    pub severity: Severity,
    pub observed_value: f64,
    pub expected_range: ExpectedRange,
    pub detected_at: DateTime<Utc>,
    pub confidence: f64,
    pub recommendations: Vec<String>,
}

// ============================================================================
// Seizure risk
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

/// Estimated window until the next seizure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeWindow {
    Within12h,
    Within24h,
    Within48h,
}

impl TimeWindow {
    pub fn label(&self) -> &'static str {
        match self {
            TimeWindow::Within12h => "within 12h",
            TimeWindow::Within24h => "within 24h",
            TimeWindow::Within48h => "within 48h",
        }
    }
}

/// Heuristic seizure trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    Fever,
    Hypoxia,
    Tachycardia,
    Aspiration,
    SleepDeprivation,
    Agitation,
}

impl TriggerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerKind::Fever => "fever",
            TriggerKind::Hypoxia => "hypoxia",
            TriggerKind::Tachycardia => "tachycardia",
            TriggerKind::Aspiration => "aspiration",
            TriggerKind::SleepDeprivation => "sleep_deprivation",
            TriggerKind::Agitation => "agitation",
        }
    }
}

/// A trigger and how many seizure days it co-occurred with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerFactor {
    pub kind: TriggerKind,
    pub occurrences: u32,
}

/// Forward-looking seizure risk for one resident
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeizureRiskAssessment {
    pub resident_id: String,
    pub assessed_at: DateTime<Utc>,
    pub risk_level: RiskLevel,
    /// Additive risk score behind `risk_level`
    pub risk_score: u32,
    /// Bounded heuristic (0-0.95), not a calibrated probability
    pub probability: f64,
    pub time_window: TimeWindow,
    pub time_window_label: String,
    pub seizure_count: usize,
    pub frequency_per_day: f64,
    /// Up to three most frequent onset hours (UTC)
    pub peak_hours: Vec<u32>,
    pub mean_interval_hours: f64,
    pub hours_since_last: Option<f64>,
    pub triggers: Vec<TriggerFactor>,
    pub preventive_measures: Vec<String>,
}

// ============================================================================
// Report
// ============================================================================

/// Time bounds of the compared windows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportWindow {
    pub current_start: DateTime<Utc>,
    pub current_end: DateTime<Utc>,
    pub previous_start: DateTime<Utc>,
}

/// Full trend report for one resident and period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthTrendReport {
    pub report_id: uuid::Uuid,
    pub engine_version: String,
    pub resident_id: String,
    pub period: Period,
    pub generated_at: DateTime<Utc>,
    pub window: ReportWindow,
    pub current_record_count: usize,
    pub previous_record_count: usize,
    pub vitals: VitalTrends,
    pub seizures: SeizureTrends,
    pub nutrition: NutritionTrends,
    pub sleep: SleepTrends,
    pub activity: ActivityTrends,
    pub correlations: Vec<CorrelationResult>,
    pub anomalies: Vec<AnomalyEvent>,
    pub seizure_risk: SeizureRiskAssessment,
    pub recommendations: Vec<String>,
    /// Overall confidence from current-period sample size (0-0.95)
    pub confidence: f64,
}
