//! Care recommendations
//!
//! Maps trend classifications, seizure risk and anomaly events to action
//! sentences. Output order is fixed: vitals, seizures, activity, nutrition,
//! sleep, then anomaly-derived recommendations. Nothing is deduplicated.

use crate::config::AnalysisConfig;
use crate::types::{
    ActivityTrends, AnomalyEvent, NutritionTrends, RiskLevel, SeizureRiskAssessment, SeizureTrends,
    SleepTrends, TrendMetric, VitalTrends,
};

/// Everything the engine derives recommendations from
pub struct RecommendationInput<'r> {
    pub vitals: &'r VitalTrends,
    pub seizures: &'r SeizureTrends,
    pub activity: &'r ActivityTrends,
    pub nutrition: &'r NutritionTrends,
    pub sleep: &'r SleepTrends,
    pub seizure_risk: &'r SeizureRiskAssessment,
    pub anomalies: &'r [AnomalyEvent],
}

/// Produces ordered recommendation sentences
pub struct RecommendationEngine<'a> {
    config: &'a AnalysisConfig,
}

impl<'a> RecommendationEngine<'a> {
    pub fn new(config: &'a AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn recommend(&self, input: &RecommendationInput<'_>) -> Vec<String> {
        let mut out = Vec::new();

        // Vitals
        push_if_declining(&mut out, &input.vitals.temperature, "Strengthen continuous temperature monitoring");
        push_if_declining(&mut out, &input.vitals.pulse, "Review pulse trends with the attending physician");
        push_if_declining(
            &mut out,
            &input.vitals.spo2,
            "Check positioning and airway care; consider continuous SpO2 monitoring",
        );
        push_if_declining(&mut out, &input.vitals.systolic, "Review blood pressure trends and medication");
        push_if_declining(
            &mut out,
            &input.vitals.health_score,
            "Schedule a comprehensive review of vital signs",
        );

        // Seizures: a rising frequency is treated as worsening here even though the
        // generic trend classification labels any rise as improving.
        let frequency = &input.seizures.frequency;
        if !frequency.is_insufficient() && frequency.change_percent > self.config.trend_threshold_pct {
            out.push("Seizure frequency is rising; review the anticonvulsant regimen with the physician".to_string());
        }
        let duration = &input.seizures.duration;
        if !duration.is_insufficient() && duration.change_percent > self.config.trend_threshold_pct {
            out.push("Seizures are lasting longer; confirm the rescue medication plan".to_string());
        }
        if input.seizure_risk.risk_level >= RiskLevel::High {
            out.push(format!(
                "Seizure risk is {} ({}); follow the preventive care plan",
                input.seizure_risk.risk_level.as_str(),
                input.seizure_risk.time_window_label
            ));
        }

        // Activity
        push_if_declining(
            &mut out,
            &input.activity.participation,
            "Offer more opportunities for activity participation",
        );
        push_if_declining(
            &mut out,
            &input.activity.mood,
            "Observe mood changes closely and review environmental factors",
        );

        // Nutrition
        push_if_declining(&mut out, &input.nutrition.intake_volume, "Review the hydration and fluid intake plan");
        push_if_declining(
            &mut out,
            &input.nutrition.meal_completion,
            "Consult the dietitian about meal form and feeding support",
        );

        // Sleep
        push_if_declining(&mut out, &input.sleep.duration, "Review the sleep environment and night-time care");
        push_if_declining(&mut out, &input.sleep.quality, "Track night-time awakenings and their causes");

        out.extend(
            input
                .anomalies
                .iter()
                .flat_map(|a| a.recommendations.iter().cloned()),
        );

        out
    }
}

fn push_if_declining(out: &mut Vec<String>, metric: &TrendMetric, sentence: &str) {
    if metric.is_declining() {
        out.push(sentence.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        AnomalyRule, Dimension, ExpectedRange, Severity, TimeWindow, TrendClassification,
    };
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn flat() -> TrendMetric {
        TrendMetric::insufficient()
    }

    fn declining() -> TrendMetric {
        TrendMetric {
            current: 90.0,
            previous: 100.0,
            change: -10.0,
            change_percent: -10.0,
            classification: TrendClassification::Declining,
            confidence: 0.5,
            ..TrendMetric::insufficient()
        }
    }

    fn rising() -> TrendMetric {
        TrendMetric {
            current: 2.0,
            previous: 1.0,
            change: 1.0,
            change_percent: 100.0,
            classification: TrendClassification::Improving,
            confidence: 0.5,
            ..TrendMetric::insufficient()
        }
    }

    fn risk(level: RiskLevel) -> SeizureRiskAssessment {
        SeizureRiskAssessment {
            resident_id: "r-1".to_string(),
            assessed_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            risk_level: level,
            risk_score: 0,
            probability: 0.05,
            time_window: TimeWindow::Within24h,
            time_window_label: "within 24h".to_string(),
            seizure_count: 0,
            frequency_per_day: 0.0,
            peak_hours: vec![],
            mean_interval_hours: 24.0,
            hours_since_last: None,
            triggers: vec![],
            preventive_measures: vec![],
        }
    }

    fn anomaly(recommendation: &str) -> AnomalyEvent {
        AnomalyEvent {
            dimension: Dimension::Vitals,
            metric: "spo2".to_string(),
            rule: AnomalyRule::ClinicalThreshold,
            severity: Severity::Critical,
            observed_value: 85.0,
            expected_range: ExpectedRange { min: 95.0, max: 100.0 },
            detected_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            confidence: 0.9,
            recommendations: vec![recommendation.to_string()],
        }
    }

    fn vitals(temperature: TrendMetric) -> VitalTrends {
        VitalTrends {
            temperature,
            pulse: flat(),
            spo2: flat(),
            systolic: flat(),
            diastolic: flat(),
            health_score: flat(),
        }
    }

    #[test]
    fn test_fixed_order_without_dedup() {
        let config = AnalysisConfig::default();
        let engine = RecommendationEngine::new(&config);

        let vitals = vitals(declining());
        let seizures = SeizureTrends {
            frequency: rising(),
            duration: flat(),
        };
        let activity = ActivityTrends {
            participation: flat(),
            mood: declining(),
        };
        let nutrition = NutritionTrends {
            intake_volume: declining(),
            meal_completion: flat(),
        };
        let sleep = SleepTrends {
            duration: declining(),
            quality: flat(),
        };
        let seizure_risk = risk(RiskLevel::Low);
        let anomalies = vec![anomaly("Start continuous SpO2 monitoring"), anomaly("Start continuous SpO2 monitoring")];

        let recommendations = engine.recommend(&RecommendationInput {
            vitals: &vitals,
            seizures: &seizures,
            activity: &activity,
            nutrition: &nutrition,
            sleep: &sleep,
            seizure_risk: &seizure_risk,
            anomalies: &anomalies,
        });

        assert_eq!(
            recommendations,
            vec![
                "Strengthen continuous temperature monitoring".to_string(),
                "Seizure frequency is rising; review the anticonvulsant regimen with the physician".to_string(),
                "Observe mood changes closely and review environmental factors".to_string(),
                "Review the hydration and fluid intake plan".to_string(),
                "Review the sleep environment and night-time care".to_string(),
                "Start continuous SpO2 monitoring".to_string(),
                "Start continuous SpO2 monitoring".to_string(),
            ]
        );
    }

    #[test]
    fn test_high_risk_sentence() {
        let config = AnalysisConfig::default();
        let engine = RecommendationEngine::new(&config);

        let vitals = vitals(flat());
        let seizures = SeizureTrends {
            frequency: flat(),
            duration: flat(),
        };
        let activity = ActivityTrends {
            participation: flat(),
            mood: flat(),
        };
        let nutrition = NutritionTrends {
            intake_volume: flat(),
            meal_completion: flat(),
        };
        let sleep = SleepTrends {
            duration: flat(),
            quality: flat(),
        };
        let seizure_risk = risk(RiskLevel::Critical);

        let recommendations = engine.recommend(&RecommendationInput {
            vitals: &vitals,
            seizures: &seizures,
            activity: &activity,
            nutrition: &nutrition,
            sleep: &sleep,
            seizure_risk: &seizure_risk,
            anomalies: &[],
        });

        assert_eq!(
            recommendations,
            vec!["Seizure risk is critical (within 24h); follow the preventive care plan".to_string()]
        );
    }
}
