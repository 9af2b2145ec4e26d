//! Append-only per-task ledger.
//!
//! Holds three maps keyed by task id: time spent, progress samples and
//! productivity samples. The timer is the only writer during a session;
//! analyzers borrow the ledger read-only.
//!
//! Reads for unknown task ids return empty records instead of failing.

mod records;

pub use records::{
    clamp_percent, ProductivitySample, ProgressLog, ProgressSample, TimeEntry, TimeLedgerRecord,
};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Store key for the time-spent map.
pub const TIME_SPENT_KEY: &str = "time_spent";
/// Store key for the progress map.
pub const PROGRESS_KEY: &str = "task_progress";
/// Store key for the productivity map.
pub const PRODUCTIVITY_KEY: &str = "productivity_data";

static EMPTY_RECORD: TimeLedgerRecord = TimeLedgerRecord {
    total: 0,
    sessions: Vec::new(),
};
static EMPTY_PRODUCTIVITY: ProductivitySample = ProductivitySample {
    sessions: Vec::new(),
    average: 0,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    #[serde(default)]
    time_spent: BTreeMap<String, TimeLedgerRecord>,
    #[serde(default)]
    progress: BTreeMap<String, ProgressLog>,
    #[serde(default)]
    productivity: BTreeMap<String, ProductivitySample>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Writes ───────────────────────────────────────────────────────

    pub fn record_session(&mut self, task_id: &str, entry: TimeEntry) {
        let record = self.time_spent.entry(task_id.to_string()).or_default();
        record.push(entry);
    }

    /// Upsert the progress for `session_id`. Out-of-range values are clamped.
    pub fn record_progress(&mut self, task_id: &str, session_id: &str, percent: i64) {
        self.progress
            .entry(task_id.to_string())
            .or_default()
            .upsert(session_id, clamp_percent(percent));
    }

    /// Append a productivity sample and refresh the task's average.
    pub fn record_productivity(&mut self, task_id: &str, percent: i64) {
        self.productivity
            .entry(task_id.to_string())
            .or_default()
            .push(clamp_percent(percent));
    }

    /// Drop every record held for a task.
    pub fn forget(&mut self, task_id: &str) {
        self.time_spent.remove(task_id);
        self.progress.remove(task_id);
        self.productivity.remove(task_id);
    }

    pub fn clear(&mut self) {
        self.time_spent.clear();
        self.progress.clear();
        self.productivity.clear();
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn time_spent(&self, task_id: &str) -> &TimeLedgerRecord {
        self.time_spent.get(task_id).unwrap_or(&EMPTY_RECORD)
    }

    pub fn progress(&self, task_id: &str) -> &[ProgressSample] {
        self.progress
            .get(task_id)
            .map(ProgressLog::samples)
            .unwrap_or(&[])
    }

    pub fn latest_progress(&self, task_id: &str) -> Option<u8> {
        self.progress.get(task_id).and_then(ProgressLog::latest)
    }

    pub fn productivity(&self, task_id: &str) -> &ProductivitySample {
        self.productivity
            .get(task_id)
            .unwrap_or(&EMPTY_PRODUCTIVITY)
    }

    pub fn time_spent_map(&self) -> &BTreeMap<String, TimeLedgerRecord> {
        &self.time_spent
    }

    pub fn progress_map(&self) -> &BTreeMap<String, ProgressLog> {
        &self.progress
    }

    pub fn productivity_map(&self) -> &BTreeMap<String, ProductivitySample> {
        &self.productivity
    }

    /// True when no productivity sample has been recorded for any task.
    pub fn has_productivity_samples(&self) -> bool {
        self.productivity.values().any(|p| !p.sessions.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.time_spent.is_empty() && self.progress.is_empty() && self.productivity.is_empty()
    }

    // ── Persistence ──────────────────────────────────────────────────

    /// Encode the three maps as JSON blobs under their stable keys.
    pub fn to_blobs(&self) -> Result<Vec<(&'static str, String)>, serde_json::Error> {
        Ok(vec![
            (TIME_SPENT_KEY, serde_json::to_string(&self.time_spent)?),
            (PROGRESS_KEY, serde_json::to_string(&self.progress)?),
            (PRODUCTIVITY_KEY, serde_json::to_string(&self.productivity)?),
        ])
    }

    /// Rebuild a ledger from stored blobs.
    ///
    /// `fetch` returns the raw blob for a key, if one exists. Missing or
    /// malformed blobs yield empty maps. Totals and averages are recomputed
    /// from their session lists.
    pub fn from_blobs<F>(mut fetch: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut time_spent: BTreeMap<String, TimeLedgerRecord> =
            decode_or_default(TIME_SPENT_KEY, fetch(TIME_SPENT_KEY));
        let mut progress: BTreeMap<String, ProgressLog> =
            decode_or_default(PROGRESS_KEY, fetch(PROGRESS_KEY));
        let mut productivity: BTreeMap<String, ProductivitySample> =
            decode_or_default(PRODUCTIVITY_KEY, fetch(PRODUCTIVITY_KEY));

        time_spent.values_mut().for_each(TimeLedgerRecord::recompute_total);
        progress.values_mut().for_each(ProgressLog::clamp_all);
        productivity
            .values_mut()
            .for_each(ProductivitySample::recompute_average);

        Self {
            time_spent,
            progress,
            productivity,
        }
    }
}

fn decode_or_default<T>(key: &str, raw: Option<String>) -> T
where
    T: DeserializeOwned + Default,
{
    let Some(raw) = raw else {
        return T::default();
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(key, error = %e, "malformed ledger blob, starting empty");
            T::default()
        }
    }
}
