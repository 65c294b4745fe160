use core::time::Duration;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::time::{SleepProvider, TimeSource};

/// The default time source: reads [`SystemTime::now`] on every call.
///
/// The wall clock can move backward (NTP corrections, manual changes). The
/// generator tolerates that by continuing from its last issued tick, but IDs
/// minted while the clock is behind consume sequence space and may force
/// overflow waits.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&self) -> Duration {
        // A system clock set before 1970 reads as the Unix epoch itself.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
    }
}

/// The default sleeper: blocks the calling thread with
/// [`std::thread::sleep`].
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadSleep;

impl SleepProvider for ThreadSleep {
    fn sleep(&self, dur: Duration) {
        std::thread::sleep(dur);
    }
}
