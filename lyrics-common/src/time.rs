//! Timestamp utilities
//!
//! Song records carry whole Unix seconds. Handlers read the time through the
//! [`Clock`] trait so tests can pin it.

use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Current time as Unix seconds (UTC)
pub fn now_unix() -> i64 {
    Utc::now().timestamp()
}

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> std::time::Duration {
    std::time::Duration::from_millis(millis)
}

/// Source of "now" for record timestamps
pub trait Clock: Send + Sync {
    /// Current time in Unix seconds
    fn now(&self) -> i64;
}

/// Wall clock backed by [`now_unix`]
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        now_unix()
    }
}

/// Clock that only moves when told to
///
/// Used by tests that need exact `created`/`updated` values.
#[derive(Debug, Default)]
pub struct ManualClock {
    seconds: AtomicI64,
}

impl ManualClock {
    pub fn new(start: i64) -> Self {
        Self {
            seconds: AtomicI64::new(start),
        }
    }

    /// Jump to an absolute time
    pub fn set(&self, seconds: i64) {
        self.seconds.store(seconds, Ordering::SeqCst);
    }

    /// Move forward by `seconds`
    pub fn advance(&self, seconds: i64) {
        self.seconds.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.seconds.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_now_unix_returns_valid_timestamp() {
        let timestamp = now_unix();
        // Should be a reasonable timestamp (after year 2000)
        assert!(timestamp > 946_684_800); // 2000-01-01 00:00:00 UTC
        // Should be reasonably recent (before year 2100)
        assert!(timestamp < 4_102_444_800); // 2100-01-01 00:00:00 UTC
    }

    #[test]
    fn test_system_clock_matches_now_unix() {
        let before = now_unix();
        let clock_value = SystemClock.now();
        let after = now_unix();
        assert!(before <= clock_value && clock_value <= after);
    }

    #[test]
    fn test_manual_clock_set_and_advance() {
        let clock = ManualClock::new(1_700_000_000);
        assert_eq!(clock.now(), 1_700_000_000);

        clock.advance(5);
        assert_eq!(clock.now(), 1_700_000_005);

        clock.set(42);
        assert_eq!(clock.now(), 42);
    }

    #[test]
    fn test_millis_to_duration_one_second() {
        let duration = millis_to_duration(1000);
        assert_eq!(duration, Duration::from_secs(1));
        assert_eq!(duration.as_millis(), 1000);
    }

    #[test]
    fn test_millis_to_duration_zero() {
        assert_eq!(millis_to_duration(0), Duration::ZERO);
    }
}
