//! FILENAME: engine/src/clock.rs
//! PURPOSE: Injectable wall-clock for seasonal lookups and cache expiry.
//! CONTEXT: Seasonal adjustment depends on the current calendar month and
//! cache entries expire against "now". Both read time through `Clock` so
//! tests can pin the date instead of depending on the machine clock.

use chrono::{DateTime, Datelike, Duration, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    /// Current calendar month, 1 = January.
    fn current_month(&self) -> u32 {
        self.now().month()
    }
}

/// Reads the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
/// Clones share the same instant, so a test can keep a handle and advance
/// the clock owned by an executor.
#[derive(Debug, Clone)]
pub struct ManualClock {
    millis: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        ManualClock {
            millis: Arc::new(AtomicI64::new(at.timestamp_millis())),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        self.millis.store(at.timestamp_millis(), Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.millis.fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(self.millis.load(Ordering::SeqCst)).unwrap_or_default()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_manual_clock_shares_state_between_clones() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 5, 31, 23, 0, 0).unwrap());
        let handle = clock.clone();
        assert_eq!(clock.current_month(), 5);

        handle.advance(Duration::hours(2));
        assert_eq!(clock.current_month(), 6);
    }

    #[test]
    fn test_set_replaces_instant() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let target = Utc.with_ymd_and_hms(2024, 12, 24, 18, 30, 0).unwrap();
        clock.set(target);
        assert_eq!(clock.now(), target);
        assert_eq!(clock.current_month(), 12);
    }
}
