//! Time provider abstraction for testable timing records

use chrono::{DateTime, Utc};
#[cfg(test)]
use std::sync::{Arc, Mutex};
#[cfg(test)]
use std::time::Duration;
use std::time::Instant;

/// Source of wall-clock timestamps and monotonic instants
pub trait TimeProvider: Send + Sync {
    /// Monotonic time, used for measuring durations
    fn now(&self) -> Instant;

    /// Wall-clock time, used for record timestamps
    fn utc_now(&self) -> DateTime<Utc>;
}

/// Production time provider backed by the system clocks
#[derive(Debug, Default, Clone)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for deterministic duration tests
#[derive(Clone)]
#[cfg(test)]
pub struct MockTimeProvider {
    current_instant: Arc<Mutex<Instant>>,
    current_utc: Arc<Mutex<DateTime<Utc>>>,
}

#[cfg(test)]
impl MockTimeProvider {
    pub fn new() -> Self {
        Self {
            current_instant: Arc::new(Mutex::new(Instant::now())),
            current_utc: Arc::new(Mutex::new(Utc::now())),
        }
    }

    /// Advance both clocks by the given duration
    pub fn advance_time(&self, duration: Duration) {
        *self.current_instant.lock().unwrap() += duration;
        let mut utc = self.current_utc.lock().unwrap();
        *utc += chrono::Duration::from_std(duration).unwrap();
    }
}

#[cfg(test)]
impl TimeProvider for MockTimeProvider {
    fn now(&self) -> Instant {
        *self.current_instant.lock().unwrap()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        *self.current_utc.lock().unwrap()
    }
}
