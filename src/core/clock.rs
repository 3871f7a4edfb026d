/*!
 * Clock
 *
 * Injected time source, per the source-pattern guidance: timestamps via wall
 * clock in the original are replaced with a `Clock` interface so tests can
 * drive virtual time deterministically instead of sleeping real seconds.
 */

use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// A monotonic time source.
///
/// The scheduler only ever needs `now()` for ordering and deadline
/// comparisons; wall-clock timestamps for persisted detail records are
/// produced separately at the `DetailRecorder` boundary via
/// `time::OffsetDateTime::now_utc()`, which is not mocked — only the
/// scheduler's internal notion of "now" needs to be deterministic in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Production clock backed by the real monotonic clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Test clock that only advances when told to.
pub struct ManualClock {
    current: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(Instant::now()),
        }
    }

    /// Advance the clock by `dur` and return the new instant.
    pub fn advance(&self, dur: Duration) -> Instant {
        let mut guard = self.current.lock();
        *guard += dur;
        *guard
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.current.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances_monotonically() {
        let clock = ManualClock::new();
        let t0 = clock.now();
        clock.advance(Duration::from_secs(1));
        let t1 = clock.now();
        assert!(t1 > t0);
        assert_eq!(t1 - t0, Duration::from_secs(1));
    }
}
