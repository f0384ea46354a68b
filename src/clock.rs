//! Wall-clock access.
//!
//! Capture timestamps, rotation decisions and relative time specs (`now-1h`) all read the
//! current local time through [`Clock`] so tests can pin or advance it.

use chrono::{DateTime, Local, TimeDelta};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Source of the current local time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// The process wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock that only moves when told to. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
    epoch_ms: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(epoch_ms: i64) -> Self {
        Self {
            epoch_ms: Arc::new(AtomicI64::new(epoch_ms)),
        }
    }

    pub fn set(&self, epoch_ms: i64) {
        self.epoch_ms.store(epoch_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, delta: TimeDelta) {
        self.epoch_ms
            .fetch_add(delta.num_milliseconds(), Ordering::SeqCst);
    }

    pub fn epoch_ms(&self) -> i64 {
        self.epoch_ms.load(Ordering::SeqCst)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        // Out-of-range values are clamped to the epoch rather than panicking.
        DateTime::from_timestamp_millis(self.epoch_ms())
            .unwrap_or_default()
            .with_timezone(&Local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances_shared_instant() {
        let clock = ManualClock::new(1_700_000_000_000);
        let other = clock.clone();

        clock.advance(TimeDelta::seconds(90));

        assert_eq!(other.epoch_ms(), 1_700_000_090_000);
        assert_eq!(other.now().timestamp_millis(), 1_700_000_090_000);
    }
}
