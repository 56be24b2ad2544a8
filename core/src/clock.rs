//! Time source: owns "now" for record timestamps and progress stamping.
//!
//! Services never call `Utc::now()` directly; they ask the clock they were
//! built with so tests can pin time.

use crate::types::Timestamp;
use chrono::Utc;
use std::sync::Mutex;

pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}

/// A clock that only moves when told to. Used in tests.
#[derive(Debug)]
pub struct FixedClock {
    current: Mutex<Timestamp>,
}

impl FixedClock {
    pub fn new(at: Timestamp) -> Self {
        Self { current: Mutex::new(at) }
    }

    /// Move the clock forward by `secs` seconds. Returns the new time.
    pub fn advance(&self, secs: i64) -> Timestamp {
        let mut guard = self.current.lock().unwrap_or_else(|p| p.into_inner());
        *guard += chrono::Duration::seconds(secs);
        *guard
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        *self.current.lock().unwrap_or_else(|p| p.into_inner())
    }
}
