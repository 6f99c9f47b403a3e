//! # Clock Abstraction
//!
//! velorent-core takes `now` as an argument everywhere; this is where `now`
//! comes from. Production uses [`SystemClock`]; tests use [`FixedClock`] so
//! late-fee and restamp behavior is reproducible down to the second.

use chrono::{DateTime, Utc};
use std::sync::Mutex;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The real wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A controllable clock for tests.
///
/// ## Example
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use velorent_engine::clock::{Clock, FixedClock};
///
/// let clock = FixedClock::new(Utc.with_ymd_and_hms(2026, 1, 1, 10, 0, 0).unwrap());
/// clock.advance_hours(24);
/// assert_eq!(clock.now(), Utc.with_ymd_and_hms(2026, 1, 2, 10, 0, 0).unwrap());
/// ```
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    /// Creates a clock frozen at the given instant.
    pub fn new(now: DateTime<Utc>) -> Self {
        FixedClock {
            now: Mutex::new(now),
        }
    }

    /// Jumps the clock to a new instant.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }

    /// Moves the clock forward by whole hours.
    pub fn advance_hours(&self, hours: i64) {
        let mut guard = self.now.lock().unwrap();
        *guard += chrono::Duration::hours(hours);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}
