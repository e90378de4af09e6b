//! Per-resident rolling history
//!
//! Keeps a bounded window of recent records for each resident so seizure risk can
//! be assessed without re-fetching the full log. Residents are independent: the
//! map is sharded by resident and each history has its own lock.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{Duration, NaiveDate};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::DEFAULT_HISTORY_RETENTION_DAYS;
use crate::error::{AnalysisError, Result};
use crate::types::LogRecord;

/// Rolling history for one resident, oldest first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResidentHistory {
    records: VecDeque<LogRecord>,
    retention_days: i64,
}

impl Default for ResidentHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_RETENTION_DAYS)
    }
}

impl ResidentHistory {
    pub fn new(retention_days: i64) -> Self {
        Self {
            records: VecDeque::new(),
            retention_days,
        }
    }

    /// Append records dated after the newest held record
    ///
    /// Records at or before the newest date are ignored, so replaying a batch is
    /// harmless. Returns the number of records appended.
    pub fn append(&mut self, records: &[LogRecord]) -> usize {
        let mut appended = 0;

        for record in records {
            if self.newest().is_some_and(|newest| record.date <= newest.date) {
                continue;
            }
            self.records.push_back(record.clone());
            appended += 1;
        }

        self.evict();
        appended
    }

    /// Drop records older than the retention window, measured from the newest date
    fn evict(&mut self) {
        let Some(newest) = self.newest().map(|r| r.date) else {
            return;
        };
        let cutoff = newest - Duration::days(self.retention_days);
        while self.records.front().is_some_and(|r| r.date <= cutoff) {
            self.records.pop_front();
        }
    }

    pub fn newest(&self) -> Option<&LogRecord> {
        self.records.back()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Owned copy of the records in date order
    pub fn to_vec(&self) -> Vec<LogRecord> {
        self.records.iter().cloned().collect()
    }
}

/// Concurrent map of resident histories
#[derive(Debug)]
pub struct ResidentHistoryCache {
    residents: DashMap<String, Arc<Mutex<ResidentHistory>>>,
    retention_days: i64,
}

impl Default for ResidentHistoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_RETENTION_DAYS)
    }
}

impl ResidentHistoryCache {
    pub fn new(retention_days: i64) -> Self {
        Self {
            residents: DashMap::new(),
            retention_days,
        }
    }

    fn entry(&self, resident_id: &str) -> Arc<Mutex<ResidentHistory>> {
        self.residents
            .entry(resident_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(ResidentHistory::new(self.retention_days))))
            .clone()
    }

    /// Append new records for a resident; see [`ResidentHistory::append`]
    ///
    /// Only the resident's own lock is held while appending.
    pub fn append(&self, resident_id: &str, records: &[LogRecord]) -> Result<usize> {
        let history = self.entry(resident_id);
        let mut guard = lock(&history)?;
        let appended = guard.append(records);
        debug!(resident_id, appended, held = guard.len(), "appended to resident history");
        Ok(appended)
    }

    /// Cloned history for a resident (empty when unknown)
    pub fn snapshot(&self, resident_id: &str) -> Result<Vec<LogRecord>> {
        let Some(history) = self.residents.get(resident_id).map(|h| Arc::clone(h.value())) else {
            return Ok(Vec::new());
        };
        let guard = lock(&history)?;
        Ok(guard.to_vec())
    }

    pub fn remove(&self, resident_id: &str) -> bool {
        self.residents.remove(resident_id).is_some()
    }

    pub fn retention_days(&self) -> i64 {
        self.retention_days
    }

    pub fn resident_count(&self) -> usize {
        self.residents.len()
    }

    pub fn resident_ids(&self) -> Vec<String> {
        self.residents.iter().map(|r| r.key().clone()).collect()
    }

    /// Serialize every resident's history to JSON
    pub fn to_json(&self) -> Result<String> {
        let mut state = CacheState {
            retention_days: self.retention_days,
            residents: BTreeMap::new(),
        };
        for entry in self.residents.iter() {
            let history = lock(entry.value())?.clone();
            state.residents.insert(entry.key().clone(), history);
        }
        Ok(serde_json::to_string(&state)?)
    }

    /// Load a cache previously saved with [`ResidentHistoryCache::to_json`]
    pub fn from_json(json: &str) -> Result<Self> {
        let state: CacheState = serde_json::from_str(json)?;
        let cache = Self::new(state.retention_days);
        for (resident_id, history) in state.residents {
            cache.residents.insert(resident_id, Arc::new(Mutex::new(history)));
        }
        Ok(cache)
    }
}

/// Union of a cached history and a caller batch, one record per date
///
/// Both inputs must be in date order. A batch record replaces the cached
/// record for the same date.
pub fn merge_by_date(cached: Vec<LogRecord>, batch: &[LogRecord]) -> Vec<LogRecord> {
    let mut merged: BTreeMap<NaiveDate, LogRecord> = cached.into_iter().map(|r| (r.date, r)).collect();
    for record in batch {
        merged.insert(record.date, record.clone());
    }
    merged.into_values().collect()
}

#[derive(Serialize, Deserialize)]
struct CacheState {
    retention_days: i64,
    residents: BTreeMap<String, ResidentHistory>,
}

fn lock(history: &Mutex<ResidentHistory>) -> Result<MutexGuard<'_, ResidentHistory>> {
    history
        .lock()
        .map_err(|e| AnalysisError::Cache(format!("resident history lock poisoned: {e}")))
}
