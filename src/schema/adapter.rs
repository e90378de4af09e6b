//! Adapter from upstream payloads to validated records
//!
//! Malformed records are skipped and reported as [`RecordIssue`]s; the rest of
//! the batch is kept. Only a payload that is not JSON at all fails the batch.

use serde::Serialize;
use tracing::warn;

use crate::error::{AnalysisError, RecordError, Result};
use crate::schema::raw_record::RawLogRecord;
use crate::types::LogRecord;

/// Adapter for converting raw records into validated [`LogRecord`]s
pub struct RecordAdapter;

impl RecordAdapter {
    /// Parse a JSON string containing an array of records
    pub fn parse_array(json: &str) -> Result<Vec<RawLogRecord>> {
        let records: Vec<RawLogRecord> = serde_json::from_str(json)?;
        Ok(records)
    }

    /// Parse NDJSON (one record per line, blank lines ignored)
    ///
    /// A line that is not a record fails the whole payload; the error names the
    /// line and, when it can be read, the record date.
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<RawLogRecord>> {
        ndjson
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                serde_json::from_str::<RawLogRecord>(line.trim()).map_err(|e| {
                    let line_number = index + 1;
                    let date = line_date(line);
                    warn!(line = line_number, date = ?date, error = %e, "unreadable NDJSON line");
                    AnalysisError::ParseError(match date {
                        Some(date) => format!("line {line_number} (date {date}): {e}"),
                        None => format!("line {line_number}: {e}"),
                    })
                })
            })
            .collect()
    }

    /// Validate every raw record, keeping the good ones
    ///
    /// Input order is preserved; sorting is left to the caller.
    pub fn to_records(raw: &[RawLogRecord]) -> ValidatedBatch {
        let mut batch = ValidatedBatch::default();

        for (index, record) in raw.iter().enumerate() {
            match record.validate() {
                Ok(valid) => batch.records.push(valid),
                Err(error) => {
                    warn!(index, date = ?record.date, %error, "skipping malformed record");
                    batch.issues.push(RecordIssue {
                        index,
                        date: record.date.clone(),
                        error,
                    });
                }
            }
        }

        batch
    }

    /// Validate a batch and return only the problems found
    pub fn validate_records(raw: &[RawLogRecord]) -> Vec<RecordIssue> {
        raw.iter()
            .enumerate()
            .filter_map(|(index, record)| {
                record.validate().err().map(|error| RecordIssue {
                    index,
                    date: record.date.clone(),
                    error,
                })
            })
            .collect()
    }
}

/// Records that passed validation and the ones that did not
#[derive(Debug, Default)]
pub struct ValidatedBatch {
    pub records: Vec<LogRecord>,
    pub issues: Vec<RecordIssue>,
}

impl ValidatedBatch {
    /// Sort the valid records by date (stable)
    pub fn sort_by_date(&mut self) {
        self.records.sort_by_key(|r| r.date);
    }
}

/// A record rejected at the boundary
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordIssue {
    pub index: usize,
    pub date: Option<String>,
    #[serde(serialize_with = "serialize_error")]
    pub error: RecordError,
}

fn serialize_error<S: serde::Serializer>(error: &RecordError, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// Best-effort `date` field of a line that failed to parse as a record
fn line_date(line: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(line.trim()).ok()?;
    value.get("date")?.as_str().map(str::to_string)
}
