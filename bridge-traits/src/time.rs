//! Time Abstraction
//!
//! Injectable time source. Session expiry is computed and checked in epoch
//! milliseconds against whatever [`Clock`] the host provides.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Mutex;

/// Time source trait
///
/// Abstracts system time so expiry checks can be driven deterministically in
/// tests.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::time::Clock;
///
/// fn is_expired(clock: &dyn Clock, expires_at_ms: i64) -> bool {
///     clock.unix_timestamp_millis() >= expires_at_ms
/// }
/// ```
pub trait Clock: Send + Sync {
    /// Get current UTC time
    fn now(&self) -> DateTime<Utc>;

    /// Get current Unix timestamp in seconds
    fn unix_timestamp(&self) -> i64 {
        self.now().timestamp()
    }

    /// Get current Unix timestamp in milliseconds
    fn unix_timestamp_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

/// System clock implementation using actual system time
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Start at the given epoch-millisecond instant.
    ///
    /// Out-of-range values fall back to the Unix epoch.
    pub fn at_millis(epoch_ms: i64) -> Self {
        let now = Utc
            .timestamp_millis_opt(epoch_ms)
            .single()
            .unwrap_or_default();
        Self::new(now)
    }

    pub fn set_millis(&self, epoch_ms: i64) {
        if let Some(now) = Utc.timestamp_millis_opt(epoch_ms).single() {
            *self.lock() = now;
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.lock();
        *now += by;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        // A poisoned lock still holds a valid timestamp
        self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock() {
        let clock = SystemClock;
        let now = clock.now();
        let timestamp = clock.unix_timestamp();

        assert!(timestamp > 0);
        assert!(now.timestamp() <= timestamp);
    }

    #[test]
    fn test_manual_clock_moves_only_on_request() {
        let clock = ManualClock::at_millis(1_000_000);
        assert_eq!(clock.unix_timestamp_millis(), 1_000_000);
        assert_eq!(clock.unix_timestamp(), 1_000);

        clock.advance(Duration::milliseconds(3_600_000));
        assert_eq!(clock.unix_timestamp_millis(), 4_600_000);

        clock.set_millis(4_600_001);
        assert_eq!(clock.unix_timestamp_millis(), 4_600_001);
    }
}
