//! Error types for care-trends

use chrono::NaiveDate;
use thiserror::Error;

/// Convenience alias used throughout the engine
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors that can occur during analysis
///
/// Insufficient history is not an error: it is reported through
/// `confidence == 0` on the affected metrics.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Failed to parse record payload: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid record: {0}")]
    InvalidRecord(#[from] RecordError),

    #[error("Records are not sorted by date: {current} follows {previous} at index {index}")]
    UnsortedRecords {
        index: usize,
        previous: NaiveDate,
        current: NaiveDate,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("History cache error: {0}")]
    Cache(String),
}

/// Data-quality problem with a single record
///
/// Raised at the record boundary; the offending record is skipped and the rest
/// of the batch is processed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("Missing date")]
    MissingDate,

    #[error("Unparseable date: {0}")]
    InvalidDate(String),

    #[error("Non-numeric value for {field}: {value}")]
    NonNumeric { field: String, value: String },

    #[error("Value out of range for {field}: {value}")]
    OutOfRange { field: String, value: f64 },

    #[error("Unknown seizure type: {0}")]
    UnknownSeizureType(String),

    #[error("Unparseable seizure time: {0}")]
    InvalidSeizureTime(String),
}
