//! Per-plugin timing records and the shared timing log

use crate::plugin::types::Disposition;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use strum_macros::Display;

/// Final state of a plugin as seen by the timing log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TimingStatus {
    /// Never executed (initial state; kept by deadlocked plugins)
    Skipped,
    /// Availability check failed, run was not invoked
    Unavailable,
    /// Construction, run or post-processing raised an error
    Failed,
    /// Plugin reported success
    Success,
    /// Plugin reported a failure without raising
    Fail,
}

impl From<Disposition> for TimingStatus {
    fn from(disposition: Disposition) -> Self {
        match disposition {
            Disposition::Success => TimingStatus::Success,
            Disposition::Fail => TimingStatus::Fail,
        }
    }
}

/// When a plugin ran and how it ended
///
/// Built up by the engine while the plugin moves through availability check,
/// start and end; frozen once appended to the [`TimingLog`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingRecord {
    pub plugin_name: String,
    pub start_timestamp: Option<DateTime<Utc>>,
    pub end_timestamp: Option<DateTime<Utc>>,
    pub duration_seconds: Option<f64>,
    pub status: TimingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TimingRecord {
    pub fn new(plugin_name: impl Into<String>) -> Self {
        Self {
            plugin_name: plugin_name.into(),
            start_timestamp: None,
            end_timestamp: None,
            duration_seconds: None,
            status: TimingStatus::Skipped,
            error: None,
        }
    }

    pub(crate) fn mark_unavailable(&mut self, at: DateTime<Utc>) {
        self.end_timestamp = Some(at);
        self.status = TimingStatus::Unavailable;
    }

    pub(crate) fn mark_started(&mut self, at: DateTime<Utc>) {
        self.start_timestamp = Some(at);
    }

    pub(crate) fn mark_finished(
        &mut self,
        at: DateTime<Utc>,
        elapsed: Duration,
        disposition: Disposition,
    ) {
        self.end_timestamp = Some(at);
        self.duration_seconds = Some(elapsed.as_secs_f64());
        self.status = disposition.into();
    }

    /// Duration stays `None` when the failure happened before start
    pub(crate) fn mark_failed(
        &mut self,
        at: DateTime<Utc>,
        elapsed: Option<Duration>,
        error: impl Into<String>,
    ) {
        self.end_timestamp = Some(at);
        self.duration_seconds = elapsed.map(|d| d.as_secs_f64());
        self.status = TimingStatus::Failed;
        self.error = Some(error.into());
    }
}

/// Timing records shared between the scheduler and its worker tasks
///
/// The lock is held only for the push or copy itself, never while a plugin
/// is executing.
#[derive(Debug, Clone, Default)]
pub struct TimingLog {
    records: Arc<Mutex<Vec<TimingRecord>>>,
}

impl TimingLog {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave a half-pushed Vec behind
    fn lock(&self) -> MutexGuard<'_, Vec<TimingRecord>> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn append(&self, record: TimingRecord) {
        self.lock().push(record);
    }

    pub fn snapshot(&self) -> Vec<TimingRecord> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub(crate) fn clear(&self) {
        self.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_skipped() {
        let record = TimingRecord::new("subfinder");
        assert_eq!(record.status, TimingStatus::Skipped);
        assert!(record.start_timestamp.is_none());
        assert!(record.duration_seconds.is_none());
    }

    #[test]
    fn test_finished_record_takes_disposition() {
        let mut record = TimingRecord::new("httpx");
        let start = Utc::now();
        record.mark_started(start);
        record.mark_finished(start, Duration::from_millis(1500), Disposition::Fail);

        assert_eq!(record.status, TimingStatus::Fail);
        assert_eq!(record.duration_seconds, Some(1.5));
        assert!(record.error.is_none());
    }

    #[test]
    fn test_failed_without_start_has_no_duration() {
        let mut record = TimingRecord::new("katana");
        record.mark_failed(Utc::now(), None, "constructor panicked");
        assert_eq!(record.status, TimingStatus::Failed);
        assert!(record.duration_seconds.is_none());
        assert_eq!(record.error.as_deref(), Some("constructor panicked"));
    }

    #[test]
    fn test_status_wire_form() {
        let mut record = TimingRecord::new("wafw00f");
        record.mark_unavailable(Utc::now());
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["status"], "unavailable");
        assert!(value["duration_seconds"].is_null());
        assert!(value.get("error").is_none());
        assert_eq!(TimingStatus::Skipped.to_string(), "skipped");
    }

    #[test]
    fn test_log_is_shared_between_clones() {
        let log = TimingLog::new();
        let worker_view = log.clone();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let log = worker_view.clone();
                std::thread::spawn(move || log.append(TimingRecord::new(format!("p{}", i))))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(log.len(), 8);
        log.clear();
        assert!(log.is_empty());
    }
}
