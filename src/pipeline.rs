//! Report orchestration
//!
//! This module provides the public API of the engine. A report is built in a
//! fixed order: period split, per-dimension trends, correlations and anomalies
//! over the current window, seizure risk over the full history, then
//! recommendations from everything before it.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::info;
use uuid::Uuid;

use crate::anomaly::AnomalyDetector;
use crate::config::AnalysisConfig;
use crate::correlation::CorrelationAnalyzer;
use crate::error::{AnalysisError, Result};
use crate::filter::{ensure_sorted, RecordFilter};
use crate::history::{merge_by_date, ResidentHistoryCache};
use crate::recommendation::{RecommendationEngine, RecommendationInput};
use crate::repository::LogRepository;
use crate::seizure::SeizureRiskPredictor;
use crate::trend::TrendAggregator;
use crate::types::{HealthTrendReport, LogRecord, Period, SeizureRiskAssessment};
use crate::ENGINE_VERSION;

/// Stateless analyzer with injected configuration
///
/// Optionally backed by a [`ResidentHistoryCache`]: when attached, every report
/// appends its input to the resident's rolling history and seizure risk is
/// assessed from that history merged with the call's records.
#[derive(Debug, Clone, Default)]
pub struct HealthTrendAnalyzer {
    config: AnalysisConfig,
    history: Option<Arc<ResidentHistoryCache>>,
}

impl HealthTrendAnalyzer {
    /// Analyzer with default thresholds
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyzer with custom thresholds
    ///
    /// # Errors
    /// Returns [`crate::AnalysisError::InvalidConfig`] when the configuration is
    /// inconsistent.
    pub fn with_config(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, history: None })
    }

    /// Attach a shared resident history cache
    ///
    /// # Errors
    /// Returns [`AnalysisError::InvalidConfig`] when the cache retention differs
    /// from `history_retention_days`.
    pub fn with_history_cache(mut self, cache: Arc<ResidentHistoryCache>) -> Result<Self> {
        if cache.retention_days() != self.config.history_retention_days {
            return Err(AnalysisError::InvalidConfig(format!(
                "history cache retains {} days, configuration expects {}",
                cache.retention_days(),
                self.config.history_retention_days
            )));
        }
        self.history = Some(cache);
        Ok(self)
    }

    /// Attach a fresh history cache sized from the configuration
    pub fn with_rolling_history(mut self) -> Self {
        self.history = Some(Arc::new(ResidentHistoryCache::new(self.config.history_retention_days)));
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn history_cache(&self) -> Option<&Arc<ResidentHistoryCache>> {
        self.history.as_ref()
    }

    /// Build a full trend report for one resident and period
    ///
    /// `records` must be sorted by date. Sparse data never fails: affected
    /// metrics carry `confidence == 0` instead.
    ///
    /// # Example
    /// ```ignore
    /// let analyzer = HealthTrendAnalyzer::new();
    /// let report = analyzer.generate_report("resident-7", &records, Period::Weekly, Utc::now())?;
    /// ```
    pub fn generate_report(
        &self,
        resident_id: &str,
        records: &[LogRecord],
        period: Period,
        now: DateTime<Utc>,
    ) -> Result<HealthTrendReport> {
        let slices = RecordFilter::split(records, period, now)?;
        let current = &slices.current;
        let previous = &slices.previous;

        let trends = TrendAggregator::new(&self.config);
        let vitals = trends.vitals(current, previous);
        let seizures = trends.seizures(current, previous);
        let nutrition = trends.nutrition(current, previous);
        let sleep = trends.sleep(current, previous);
        let activity = trends.activity(current, previous);

        let correlations = CorrelationAnalyzer::new(&self.config).analyze(current);
        let anomalies = AnomalyDetector::new(&self.config).detect(current);
        let seizure_risk = self.assess_risk(resident_id, records, now)?;

        let recommendations = RecommendationEngine::new(&self.config).recommend(&RecommendationInput {
            vitals: &vitals,
            seizures: &seizures,
            activity: &activity,
            nutrition: &nutrition,
            sleep: &sleep,
            seizure_risk: &seizure_risk,
            anomalies: &anomalies,
        });

        let required = self.config.required_samples.for_period(period).max(1);
        let confidence = (current.len() as f64 / required as f64).min(self.config.confidence_cap);

        info!(
            resident_id,
            period = %period,
            current = current.len(),
            previous = previous.len(),
            anomalies = anomalies.len(),
            risk_level = seizure_risk.risk_level.as_str(),
            confidence,
            "generated health trend report"
        );

        Ok(HealthTrendReport {
            report_id: report_id(resident_id, period, now),
            engine_version: ENGINE_VERSION.to_string(),
            resident_id: resident_id.to_string(),
            period,
            generated_at: now,
            window: slices.window.clone(),
            current_record_count: current.len(),
            previous_record_count: previous.len(),
            vitals,
            seizures,
            nutrition,
            sleep,
            activity,
            correlations,
            anomalies,
            seizure_risk,
            recommendations,
            confidence,
        })
    }

    /// Assess seizure risk from a resident's history
    ///
    /// # Errors
    /// Returns [`crate::AnalysisError::UnsortedRecords`] when `history` is not in
    /// date order.
    pub fn predict_seizure_risk(
        &self,
        resident_id: &str,
        history: &[LogRecord],
        now: DateTime<Utc>,
    ) -> Result<SeizureRiskAssessment> {
        ensure_sorted(history)?;
        self.assess_risk(resident_id, history, now)
    }

    /// Fetch enough history from `repository` and build a report
    ///
    /// The fetched range covers both comparison windows plus the seizure
    /// lookback: `[now - 2*window - lookback, now]`.
    pub fn generate_report_from_repository<R: LogRepository + ?Sized>(
        &self,
        repository: &R,
        resident_id: &str,
        period: Period,
        now: DateTime<Utc>,
    ) -> Result<HealthTrendReport> {
        let start = now
            - Duration::days(2 * period.window_days())
            - Duration::days(self.config.seizure_lookback_days);
        // Fetch is half-open; records sit at day start so this includes `now`
        let end = now + Duration::seconds(1);

        let records = repository.fetch(resident_id, start, end)?;
        self.generate_report(resident_id, &records, period, now)
    }

    fn assess_risk(&self, resident_id: &str, records: &[LogRecord], now: DateTime<Utc>) -> Result<SeizureRiskAssessment> {
        let predictor = SeizureRiskPredictor::new(&self.config);

        match &self.history {
            Some(cache) => {
                cache.append(resident_id, records)?;
                let history = merge_by_date(cache.snapshot(resident_id)?, records);
                Ok(predictor.predict(resident_id, &history, now))
            }
            None => Ok(predictor.predict(resident_id, records, now)),
        }
    }
}

/// Deterministic report id for (resident, period, now)
pub fn report_id(resident_id: &str, period: Period, now: DateTime<Utc>) -> Uuid {
    let name = format!("{}:{}:{}", resident_id, period.as_str(), now.to_rfc3339());
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
}
