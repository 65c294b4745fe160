use core::time::Duration;

/// Default epoch: Wednesday, January 1, 2025 00:00:00 UTC
pub const DEFAULT_EPOCH: Duration = Duration::from_millis(1_735_689_600_000);

/// A trait for time sources that return the current wall-clock instant.
///
/// This abstraction allows you to plug in the system clock, a monotonic
/// clock, or a synthetic clock in tests. The returned value is the time
/// elapsed since the Unix epoch (1970-01-01 UTC); the generator subtracts its
/// own configured epoch.
///
/// # Example
///
/// ```
/// use core::time::Duration;
/// use kubeflake::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn now(&self) -> Duration {
///         Duration::from_millis(1234)
///     }
/// }
///
/// assert_eq!(FixedTime.now(), Duration::from_millis(1234));
/// ```
pub trait TimeSource {
    /// Returns the current time as a duration since the Unix epoch.
    fn now(&self) -> Duration;
}

/// A trait that abstracts over how the generator blocks while it waits for
/// the clock to catch up after a sequence overflow.
///
/// The generator calls [`SleepProvider::sleep`] while holding its lock, so
/// implementations must not call back into the same generator.
pub trait SleepProvider {
    /// Blocks the caller for `dur`, or until the time source has advanced by
    /// at least that much.
    fn sleep(&self, dur: Duration);
}
