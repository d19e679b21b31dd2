//! Injectable time source.
//!
//! Production code uses [`SystemClock`]; tests drive a [`FakeClock`] that
//! only moves when explicitly advanced, so cache expiry and run timestamps
//! are deterministic.

use std::sync::Mutex;
use std::time::{Duration, SystemTime};

/// A source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
}

/// Wall-clock time.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// A simulated clock that stands still until advanced.
///
/// Time can only move forward.
pub struct FakeClock {
    now: Mutex<SystemTime>,
}

impl FakeClock {
    /// Create a fake clock starting at the given instant.
    pub fn new(start: SystemTime) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Move time forward by `duration`.
    pub fn advance(&self, duration: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += duration;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new(SystemTime::now())
    }
}

impl Clock for FakeClock {
    fn now(&self) -> SystemTime {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}
