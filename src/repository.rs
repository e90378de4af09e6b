//! Record source abstraction
//!
//! The engine does not talk to storage directly; callers supply a
//! [`LogRepository`] implementation backed by whatever store holds the care log.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::error::{AnalysisError, Result};
use crate::types::LogRecord;

/// Source of care-log records
pub trait LogRepository {
    /// Records for `resident_id` whose day start lies in `[start, end)`, sorted by date
    fn fetch(&self, resident_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<LogRecord>>;
}

/// Repository held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryLogRepository {
    residents: HashMap<String, Vec<LogRecord>>,
}

impl InMemoryLogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store records for a resident, keeping them in date order
    pub fn insert(&mut self, resident_id: &str, records: impl IntoIterator<Item = LogRecord>) {
        let held = self.residents.entry(resident_id.to_string()).or_default();
        held.extend(records);
        held.sort_by_key(|r| r.date);
    }

    pub fn len(&self, resident_id: &str) -> usize {
        self.residents.get(resident_id).map_or(0, Vec::len)
    }
}

impl LogRepository for InMemoryLogRepository {
    fn fetch(&self, resident_id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<LogRecord>> {
        if start > end {
            return Err(AnalysisError::Repository(format!(
                "invalid range: start {start} is after end {end}"
            )));
        }

        Ok(self
            .residents
            .get(resident_id)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| {
                        let ts = r.timestamp();
                        ts >= start && ts < end
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn record(day: u32) -> LogRecord {
        LogRecord::new(NaiveDate::from_ymd_opt(2024, 5, day).unwrap())
    }

    #[test]
    fn test_fetch_half_open_range() {
        let mut repo = InMemoryLogRepository::new();
        repo.insert("r-1", [record(3), record(1), record(2), record(4)]);

        let start = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 5, 4, 0, 0, 0).unwrap();
        let fetched = repo.fetch("r-1", start, end).unwrap();

        let days: Vec<NaiveDate> = fetched.iter().map(|r| r.date).collect();
        assert_eq!(days, vec![record(2).date, record(3).date]);
    }

    #[test]
    fn test_unknown_resident() {
        let repo = InMemoryLogRepository::new();
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        assert!(repo.fetch("nobody", start, start).unwrap().is_empty());
        assert_eq!(repo.len("nobody"), 0);
    }

    #[test]
    fn test_inverted_range() {
        let repo = InMemoryLogRepository::new();
        let start = Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        assert!(matches!(repo.fetch("r-1", start, end), Err(AnalysisError::Repository(_))));
    }
}
