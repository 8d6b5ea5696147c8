//! Wall-clock time source.

use onelane_core::Clock;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::time::Instant;

/// Monotonic clock anchored to the UNIX time captured at construction.
///
/// Reported times are UNIX durations, so timestamps in vehicle records read
/// as epoch milliseconds over the API, but they never jump backwards when
/// the system clock is adjusted. Built on tokio's `Instant`, so paused-time
/// tests move it too.
#[derive(Debug, Clone)]
pub struct SystemClock {
    epoch_offset: Duration,
    started: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch_offset: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default(),
            started: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.epoch_offset + self.started.elapsed()
    }
}
