//! Period windowing
//!
//! Splits a chronological record list into the current reporting window and the
//! equally long window immediately before it.

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::error::{AnalysisError, Result};
use crate::types::{LogRecord, Period, ReportWindow};

/// Records falling in the current and previous windows
#[derive(Debug, Clone)]
pub struct PeriodSlices<'a> {
    pub window: ReportWindow,
    pub current: Vec<&'a LogRecord>,
    pub previous: Vec<&'a LogRecord>,
}

/// Splits records into comparable period windows
pub struct RecordFilter;

impl RecordFilter {
    /// Split `records` for `period` relative to `now`
    ///
    /// current = `[now - window, now]`, previous = `[now - 2*window, now - window)`,
    /// with each record placed at the start of its day (UTC). Records dated after
    /// `now` fall in neither slice.
    ///
    /// # Errors
    /// Returns [`AnalysisError::UnsortedRecords`] when records are not in
    /// ascending date order.
    pub fn split(records: &[LogRecord], period: Period, now: DateTime<Utc>) -> Result<PeriodSlices<'_>> {
        ensure_sorted(records)?;

        let window = Duration::days(period.window_days());
        let current_start = now - window;
        let previous_start = now - window - window;

        let mut current = Vec::new();
        let mut previous = Vec::new();

        for record in records {
            let ts = record.timestamp();
            if ts >= current_start && ts <= now {
                current.push(record);
            } else if ts >= previous_start && ts < current_start {
                previous.push(record);
            }
        }

        debug!(
            period = %period,
            current = current.len(),
            previous = previous.len(),
            "split records into period windows"
        );

        Ok(PeriodSlices {
            window: ReportWindow {
                current_start,
                current_end: now,
                previous_start,
            },
            current,
            previous,
        })
    }

    /// Records dated within `(now - days, now]`
    pub fn lookback(records: &[LogRecord], days: i64, now: DateTime<Utc>) -> Vec<&LogRecord> {
        let start = now - Duration::days(days);
        records
            .iter()
            .filter(|r| {
                let ts = r.timestamp();
                ts > start && ts <= now
            })
            .collect()
    }
}

/// Verify records are in ascending (non-decreasing) date order
pub fn ensure_sorted(records: &[LogRecord]) -> Result<()> {
    for (index, pair) in records.windows(2).enumerate() {
        if pair[1].date < pair[0].date {
            return Err(AnalysisError::UnsortedRecords {
                index: index + 1,
                previous: pair[0].date,
                current: pair[1].date,
            });
        }
    }
    Ok(())
}
