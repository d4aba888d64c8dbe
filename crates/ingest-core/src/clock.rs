// SPDX-License-Identifier: MIT

//! Clock abstraction for testable time handling.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A clock that provides the current time as milliseconds since the epoch.
///
/// Indirecting through this trait lets the watcher's age check and the
/// session descriptor's date-prefix capture be driven by a [`FakeClock`] in
/// tests instead of racing real wall-clock time.
pub trait Clock: Clone + Send + Sync + 'static {
    fn epoch_ms(&self) -> u64;
}

/// Real system clock.
#[derive(Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn epoch_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Fake clock for testing with controllable time.
#[derive(Clone)]
pub struct FakeClock {
    epoch_ms: Arc<AtomicU64>,
}

impl FakeClock {
    pub fn new(epoch_ms: u64) -> Self {
        Self { epoch_ms: Arc::new(AtomicU64::new(epoch_ms)) }
    }

    pub fn advance(&self, duration: Duration) {
        self.epoch_ms.fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn set_epoch_ms(&self, ms: u64) {
        self.epoch_ms.store(ms, Ordering::SeqCst);
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new(1_700_000_000_000)
    }
}

impl Clock for FakeClock {
    fn epoch_ms(&self) -> u64 {
        self.epoch_ms.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_clock_advances() {
        let clock = FakeClock::new(1000);
        assert_eq!(clock.epoch_ms(), 1000);
        clock.advance(Duration::from_secs(5));
        assert_eq!(clock.epoch_ms(), 6000);
    }

    #[test]
    fn system_clock_is_plausible() {
        let now = SystemClock.epoch_ms();
        assert!(now > 1_700_000_000_000);
    }
}
