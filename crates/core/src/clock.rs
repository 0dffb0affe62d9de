// SPDX-License-Identifier: MIT

//! Clock abstraction so heartbeat/TTL/decay logic is deterministically
//! testable without real sleeps.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A source of the current wall-clock time.
pub trait Clock: Send + Sync {
    /// Seconds since the Unix epoch.
    fn unix_secs(&self) -> u64;

    /// The current instant as an RFC 3339 / ISO-8601 UTC timestamp.
    fn now_iso8601(&self) -> String {
        #[allow(clippy::unwrap_used)]
        let dt = DateTime::<Utc>::from_timestamp(self.unix_secs() as i64, 0).unwrap();
        dt.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    }
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn unix_secs(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs()
    }
}

/// A manually-advanced clock for deterministic tests.
#[derive(Clone)]
pub struct FakeClock {
    secs: Arc<Mutex<u64>>,
}

impl FakeClock {
    pub fn new(start_unix_secs: u64) -> Self {
        Self {
            secs: Arc::new(Mutex::new(start_unix_secs)),
        }
    }

    pub fn advance(&self, duration: Duration) {
        *self.secs.lock() += duration.as_secs();
    }

    pub fn set(&self, unix_secs: u64) {
        *self.secs.lock() = unix_secs;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new(1_700_000_000)
    }
}

impl Clock for FakeClock {
    fn unix_secs(&self) -> u64 {
        *self.secs.lock()
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
