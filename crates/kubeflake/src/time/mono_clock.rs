use core::time::Duration;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use crate::time::TimeSource;

/// A monotonic time source aligned to the wall clock once, at construction.
///
/// This avoids wall-clock adjustments (e.g., NTP or daylight savings changes)
/// while still reporting time relative to the Unix epoch, so it can be used
/// with any configured generator epoch.
///
/// Internally, the clock captures `SystemTime::now()` and `Instant::now()`
/// together and afterwards only adds the elapsed monotonic time to the
/// captured wall-clock anchor. Readings never go backward, but they drift
/// from the system clock if it is corrected after construction.
///
/// # Example
///
/// ```
/// use kubeflake::{MonotonicClock, TimeSource};
///
/// let clock = MonotonicClock::new();
/// let first = clock.now();
/// std::thread::sleep(std::time::Duration::from_millis(2));
/// assert!(clock.now() > first);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    anchor: Duration,
    start: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    /// Anchors a new clock to the current wall-clock time.
    pub fn new() -> Self {
        let start = Instant::now();
        let anchor = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self { anchor, start }
    }
}

impl TimeSource for MonotonicClock {
    fn now(&self) -> Duration {
        self.anchor + self.start.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readings_never_go_backward() {
        let clock = MonotonicClock::new();
        let mut last = clock.now();
        for _ in 0..10_000 {
            let now = clock.now();
            assert!(now >= last);
            last = now;
        }
    }

    #[test]
    fn anchored_near_wall_clock() {
        let clock = MonotonicClock::new();
        let wall = SystemTime::now().duration_since(UNIX_EPOCH).unwrap();
        let diff = if wall > clock.now() {
            wall - clock.now()
        } else {
            clock.now() - wall
        };
        assert!(diff < Duration::from_secs(1), "drift too large: {diff:?}");
    }
}
