use core::time::Duration;
use std::sync::Arc;

use portable_atomic::{AtomicU64, Ordering};

use crate::time::{SleepProvider, TimeSource};

/// A synthetic clock that advances by a fixed step on every reading.
///
/// Each call to [`TimeSource::now`] moves the clock forward by `step` and
/// returns the new instant. Sleeping through [`SleepProvider::sleep`] advances
/// the clock by the requested duration instead of blocking, so generators
/// driven by a `StepClock` never wait on real time.
///
/// Clones share the same underlying instant, which lets one handle be passed
/// to a generator as its time source and another as its sleeper.
///
/// # Example
///
/// ```
/// use core::time::Duration;
/// use kubeflake::{SleepProvider, StepClock, TimeSource};
///
/// let clock = StepClock::new(Duration::from_secs(10), Duration::from_millis(1));
/// assert_eq!(clock.now(), Duration::from_millis(10_001));
/// assert_eq!(clock.now(), Duration::from_millis(10_002));
///
/// clock.sleep(Duration::from_millis(5));
/// assert_eq!(clock.peek(), Duration::from_millis(10_007));
/// ```
#[derive(Clone, Debug)]
pub struct StepClock {
    nanos: Arc<AtomicU64>,
    step: u64,
}

impl StepClock {
    /// Creates a clock positioned at `start` (since the Unix epoch) that
    /// advances by `step` per reading.
    pub fn new(start: Duration, step: Duration) -> Self {
        Self {
            nanos: Arc::new(AtomicU64::new(to_nanos(start))),
            step: to_nanos(step),
        }
    }

    /// Returns the current instant without advancing the clock.
    pub fn peek(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::Acquire))
    }

    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        self.nanos.fetch_add(to_nanos(by), Ordering::AcqRel);
    }

    /// Moves the clock to `to`, which may be earlier than the current
    /// instant.
    pub fn set(&self, to: Duration) {
        self.nanos.store(to_nanos(to), Ordering::Release);
    }
}

impl TimeSource for StepClock {
    fn now(&self) -> Duration {
        let prev = self.nanos.fetch_add(self.step, Ordering::AcqRel);
        Duration::from_nanos(prev.saturating_add(self.step))
    }
}

impl SleepProvider for StepClock {
    fn sleep(&self, dur: Duration) {
        self.advance(dur);
    }
}

fn to_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}
