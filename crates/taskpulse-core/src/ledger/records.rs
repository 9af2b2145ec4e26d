use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Clamp an arbitrary percentage into `0..=100`.
pub fn clamp_percent(value: i64) -> u8 {
    value.clamp(0, 100) as u8
}

/// Rounded arithmetic mean, half away from zero. 0 for an empty slice.
pub(crate) fn rounded_mean(values: &[u8]) -> u8 {
    if values.is_empty() {
        return 0;
    }
    let sum: u64 = values.iter().map(|&v| u64::from(v)).sum();
    (sum as f64 / values.len() as f64).round() as u8
}

/// One completed (or stopped) stretch of work on a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub date: DateTime<Utc>,
    pub duration_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TimeEntry {
    pub fn new(date: DateTime<Utc>, duration_minutes: u32) -> Self {
        Self {
            date,
            duration_minutes,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Accumulated time for a single task.
///
/// `total` is the sum of `sessions[].duration_minutes`; only the ledger
/// appends to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeLedgerRecord {
    pub total: u64,
    #[serde(default)]
    pub sessions: Vec<TimeEntry>,
}

impl TimeLedgerRecord {
    pub(crate) fn push(&mut self, entry: TimeEntry) {
        self.total = self.total.saturating_add(u64::from(entry.duration_minutes));
        self.sessions.push(entry);
    }

    pub(crate) fn recompute_total(&mut self) {
        self.total = self
            .sessions
            .iter()
            .map(|s| u64::from(s.duration_minutes))
            .sum();
    }

    /// Mean session length in minutes, if any session was recorded.
    pub fn average_session_minutes(&self) -> Option<u32> {
        if self.sessions.is_empty() {
            return None;
        }
        Some((self.total as f64 / self.sessions.len() as f64).round() as u32)
    }
}

/// Progress logged for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSample {
    pub session_id: String,
    pub percent: u8,
}

/// Progress history for a task, in insertion order.
///
/// Persists as a JSON object mapping session id to percent. Keys are
/// written and read back in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressLog {
    samples: Vec<ProgressSample>,
}

impl ProgressLog {
    /// Insert or overwrite the sample for `session_id`, keeping its original
    /// position in the history.
    pub(crate) fn upsert(&mut self, session_id: &str, percent: u8) {
        match self.samples.iter_mut().find(|s| s.session_id == session_id) {
            Some(existing) => existing.percent = percent,
            None => self.samples.push(ProgressSample {
                session_id: session_id.to_string(),
                percent,
            }),
        }
    }

    pub fn samples(&self) -> &[ProgressSample] {
        &self.samples
    }

    pub fn get(&self, session_id: &str) -> Option<u8> {
        self.samples
            .iter()
            .find(|s| s.session_id == session_id)
            .map(|s| s.percent)
    }

    pub fn latest(&self) -> Option<u8> {
        self.samples.last().map(|s| s.percent)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub(crate) fn clamp_all(&mut self) {
        for sample in &mut self.samples {
            sample.percent = sample.percent.min(100);
        }
    }
}

impl Serialize for ProgressLog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.samples.len()))?;
        for sample in &self.samples {
            map.serialize_entry(&sample.session_id, &sample.percent)?;
        }
        map.end()
    }
}

struct ProgressLogVisitor;

impl<'de> Visitor<'de> for ProgressLogVisitor {
    type Value = ProgressLog;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of session id to percent")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut log = ProgressLog::default();
        while let Some((session_id, percent)) = access.next_entry::<String, i64>()? {
            log.upsert(&session_id, clamp_percent(percent));
        }
        Ok(log)
    }
}

impl<'de> Deserialize<'de> for ProgressLog {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ProgressLogVisitor)
    }
}

/// Productivity history for a task.
///
/// `average` is `round(mean(sessions))` and stays within `0..=100`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductivitySample {
    #[serde(default)]
    pub sessions: Vec<u8>,
    #[serde(default)]
    pub average: u8,
}

impl ProductivitySample {
    pub(crate) fn push(&mut self, percent: u8) {
        self.sessions.push(percent.min(100));
        self.recompute_average();
    }

    pub(crate) fn recompute_average(&mut self) {
        for value in &mut self.sessions {
            *value = (*value).min(100);
        }
        self.average = rounded_mean(&self.sessions);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_percent_bounds() {
        assert_eq!(clamp_percent(-20), 0);
        assert_eq!(clamp_percent(55), 55);
        assert_eq!(clamp_percent(250), 100);
    }

    #[test]
    fn rounded_mean_rounds_half_up() {
        assert_eq!(rounded_mean(&[]), 0);
        assert_eq!(rounded_mean(&[85, 60, 40]), 62);
        assert_eq!(rounded_mean(&[70, 71]), 71);
    }

    #[test]
    fn progress_upsert_keeps_position() {
        let mut log = ProgressLog::default();
        log.upsert("s1", 20);
        log.upsert("s2", 40);
        log.upsert("s1", 90);
        let ids: Vec<_> = log.samples().iter().map(|s| s.session_id.as_str()).collect();
        assert_eq!(ids, vec!["s1", "s2"]);
        assert_eq!(log.get("s1"), Some(90));
        assert_eq!(log.latest(), Some(40));
    }

    #[test]
    fn progress_log_persists_as_session_map() {
        let mut log = ProgressLog::default();
        log.upsert("z-session", 80);
        log.upsert("a-session", 90);
        let json = serde_json::to_string(&log).unwrap();
        assert_eq!(json, r#"{"z-session":80,"a-session":90}"#);

        let restored: ProgressLog = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, log);
        assert_eq!(restored.latest(), Some(90));
    }

    #[test]
    fn progress_log_clamps_on_load() {
        let log: ProgressLog = serde_json::from_str(r#"{"s1":140,"s2":-3}"#).unwrap();
        assert_eq!(log.get("s1"), Some(100));
        assert_eq!(log.get("s2"), Some(0));
        assert!(serde_json::from_str::<ProgressLog>("[1,2]").is_err());
    }

    #[test]
    fn average_session_minutes() {
        let mut record = TimeLedgerRecord::default();
        assert_eq!(record.average_session_minutes(), None);
        let now = Utc::now();
        record.push(TimeEntry::new(now, 25));
        record.push(TimeEntry::new(now, 10));
        assert_eq!(record.total, 35);
        assert_eq!(record.average_session_minutes(), Some(18));
    }
}
