//! Loosely typed record shape accepted from the care-recording system
//!
//! Upstream forms deliver dates as text and numbers as either JSON numbers or
//! numeric strings. This module keeps that shape as-is and validates it once into
//! a [`LogRecord`]; nothing downstream re-checks field presence or type.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RecordError;
use crate::types::{
    day_start, Activity, BloodPressure, Excretion, Intake, LogRecord, Mood, SeizureEvent,
    SeizureType, Sleep, SleepQuality, Vitals,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawBloodPressure {
    #[serde(default)]
    pub systolic: Option<Value>,
    #[serde(default)]
    pub diastolic: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawVitals {
    #[serde(default)]
    pub temperature: Option<Value>,
    #[serde(default)]
    pub pulse: Option<Value>,
    #[serde(default, alias = "spO2", alias = "SpO2")]
    pub spo2: Option<Value>,
    #[serde(default, alias = "bloodPressure")]
    pub blood_pressure: Option<RawBloodPressure>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSeizure {
    #[serde(default, rename = "type")]
    pub seizure_type: Option<String>,
    #[serde(default, alias = "durationSec", alias = "duration")]
    pub duration_sec: Option<Value>,
    #[serde(default, alias = "details", alias = "detailTags")]
    pub detail_tags: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// RFC 3339 timestamp or `HH:MM` on the record date
    #[serde(default, alias = "time", alias = "occurredAt")]
    pub occurred_at: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawIntake {
    #[serde(default, alias = "volumeMl", alias = "volume")]
    pub volume_ml: Option<Value>,
    #[serde(default, alias = "mealCompletionPct", alias = "mealCompletion")]
    pub meal_completion_pct: Option<Value>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawExcretion {
    #[serde(default, alias = "bristolScale", alias = "bristol")]
    pub bristol_scale: Option<Value>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSleep {
    #[serde(default, alias = "durationMinutes", alias = "duration")]
    pub duration_minutes: Option<Value>,
    #[serde(default, alias = "quality_label", alias = "qualityLabel")]
    pub quality: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawActivity {
    #[serde(default, alias = "participationTags", alias = "participation")]
    pub participation_tags: Vec<String>,
    #[serde(default, alias = "mood_label", alias = "moodLabel")]
    pub mood: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// One day of observations as delivered upstream
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLogRecord {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub vitals: Option<RawVitals>,
    #[serde(default)]
    pub seizures: Vec<RawSeizure>,
    #[serde(default)]
    pub intake: Option<RawIntake>,
    #[serde(default)]
    pub excretion: Option<RawExcretion>,
    #[serde(default)]
    pub sleep: Option<RawSleep>,
    #[serde(default)]
    pub activity: Option<RawActivity>,
}

impl RawLogRecord {
    /// Validate into a [`LogRecord`]
    ///
    /// Fails on a missing or unparseable date, a non-numeric or out-of-range
    /// number, or an unrecognised seizure type.
    pub fn validate(&self) -> Result<LogRecord, RecordError> {
        let date = parse_date(self.date.as_deref())?;
        let mut record = LogRecord::new(date);

        if let Some(raw) = &self.vitals {
            let blood_pressure = match &raw.blood_pressure {
                Some(bp) => match (
                    number("systolic", bp.systolic.as_ref(), 0.0, 300.0)?,
                    number("diastolic", bp.diastolic.as_ref(), 0.0, 250.0)?,
                ) {
                    (Some(systolic), Some(diastolic)) => Some(BloodPressure { systolic, diastolic }),
                    _ => None,
                },
                None => None,
            };
            record.vitals = Some(Vitals {
                temperature: number("temperature", raw.temperature.as_ref(), 25.0, 45.0)?,
                pulse: number("pulse", raw.pulse.as_ref(), 0.0, 300.0)?,
                spo2: number("spo2", raw.spo2.as_ref(), 0.0, 100.0)?,
                blood_pressure,
            });
        }

        record.seizures = self
            .seizures
            .iter()
            .map(|raw| raw.validate(date))
            .collect::<Result<_, _>>()?;

        if let Some(raw) = &self.intake {
            record.intake = Some(Intake {
                volume_ml: number("intake.volume_ml", raw.volume_ml.as_ref(), 0.0, f64::MAX)?,
                meal_completion_pct: number(
                    "intake.meal_completion_pct",
                    raw.meal_completion_pct.as_ref(),
                    0.0,
                    100.0,
                )?,
                notes: raw.notes.clone().unwrap_or_default(),
            });
        }

        if let Some(raw) = &self.excretion {
            let bristol = number("excretion.bristol_scale", raw.bristol_scale.as_ref(), 1.0, 7.0)?;
            if let Some(value) = bristol {
                if value.fract() != 0.0 {
                    return Err(RecordError::OutOfRange {
                        field: "excretion.bristol_scale".to_string(),
                        value,
                    });
                }
            }
            record.excretion = Some(Excretion {
                bristol_scale: bristol.map(|v| v as u8),
                notes: raw.notes.clone().unwrap_or_default(),
            });
        }

        if let Some(raw) = &self.sleep {
            record.sleep = Some(Sleep {
                duration_minutes: number("sleep.duration_minutes", raw.duration_minutes.as_ref(), 0.0, 1440.0)?,
                quality: non_empty(raw.quality.as_deref()).map(SleepQuality::parse),
                notes: raw.notes.clone().unwrap_or_default(),
            });
        }

        if let Some(raw) = &self.activity {
            record.activity = Some(Activity {
                participation_tags: raw.participation_tags.clone(),
                mood: non_empty(raw.mood.as_deref()).map(Mood::parse),
                notes: raw.notes.clone().unwrap_or_default(),
            });
        }

        Ok(record)
    }
}

impl RawSeizure {
    fn validate(&self, date: NaiveDate) -> Result<SeizureEvent, RecordError> {
        let seizure_type = match non_empty(self.seizure_type.as_deref()) {
            Some(label) => {
                SeizureType::parse(label).ok_or_else(|| RecordError::UnknownSeizureType(label.to_string()))?
            }
            None => SeizureType::Other,
        };

        Ok(SeizureEvent {
            seizure_type,
            duration_sec: number("seizure.duration_sec", self.duration_sec.as_ref(), 0.0, 86_400.0)?
                .unwrap_or(0.0),
            detail_tags: self.detail_tags.clone(),
            notes: self.notes.clone().unwrap_or_default(),
            occurred_at: parse_onset(date, self.occurred_at.as_deref())?,
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp (its UTC date is used)
pub fn parse_date(value: Option<&str>) -> Result<NaiveDate, RecordError> {
    let text = non_empty(value).ok_or(RecordError::MissingDate)?;

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .map_err(|_| RecordError::InvalidDate(text.to_string()))
}

fn parse_onset(date: NaiveDate, value: Option<&str>) -> Result<DateTime<Utc>, RecordError> {
    let Some(text) = non_empty(value) else {
        return Ok(day_start(date));
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveTime::parse_from_str(text, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
        .map(|time| date.and_time(time).and_utc())
        .map_err(|_| RecordError::InvalidSeizureTime(text.to_string()))
}

/// Read an optional numeric field
///
/// JSON null, absent fields and blank strings are `None`; numeric strings are
/// accepted. Anything else, or a value outside `[min, max]`, is an error.
fn number(field: &str, value: Option<&Value>, min: f64, max: f64) -> Result<Option<f64>, RecordError> {
    let parsed = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    let Some(number) = parsed.filter(|n| n.is_finite()) else {
        return Err(RecordError::NonNumeric {
            field: field.to_string(),
            value: value.map(Value::to_string).unwrap_or_default(),
        });
    };

    if number < min || number > max {
        return Err(RecordError::OutOfRange {
            field: field.to_string(),
            value: number,
        });
    }
    Ok(Some(number))
}
