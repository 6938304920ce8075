//! Clock sources.
//!
//! Everything in the engine that needs "now" goes through [`ClockSource`] so
//! tests can pin time with [`ManualClock`]. Timestamps are wall-clock local
//! times without an offset: a reminder set for 08:00 fires at 08:00 on the
//! device's clock, whatever zone the device is in.

use chrono::{Duration, Local, NaiveDateTime};
use parking_lot::Mutex;

/// Wall-clock timestamp used throughout the engine.
pub type Timestamp = NaiveDateTime;

/// Source of the current time.
pub trait ClockSource: Send + Sync {
    /// Current wall-clock time.
    fn now(&self) -> Timestamp;
}

/// Clock backed by the host's local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn now(&self) -> Timestamp {
        Local::now().naive_local()
    }
}

/// Manually driven clock for tests and simulations.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Timestamp>,
}

impl ManualClock {
    /// Create a clock frozen at `start`.
    pub const fn new(start: Timestamp) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Jump to an absolute time.
    pub fn set(&self, to: Timestamp) {
        *self.now.lock() = to;
    }

    /// Move the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl ClockSource for ManualClock {
    fn now(&self) -> Timestamp {
        *self.now.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> Timestamp {
        NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_manual_clock_set_and_advance() {
        let clock = ManualClock::new(at(8, 0));
        assert_eq!(clock.now(), at(8, 0));

        clock.advance(Duration::minutes(90));
        assert_eq!(clock.now(), at(9, 30));

        clock.set(at(7, 15));
        assert_eq!(clock.now(), at(7, 15));
    }

    #[test]
    fn test_system_clock_moves_forward() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
