use core::time::Duration;
use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    Error, IdProvider, Layout, Parts, Result, Settings,
    generator::Mutex,
    time::{SleepProvider, SystemClock, ThreadSleep, TimeSource},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct State {
    pub(crate) elapsed: u64,
    pub(crate) sequence: u64,
}

/// A lock-based kubeflake generator.
///
/// The generator resolves its cluster id and machine id once, at
/// construction, then issues IDs under a single lock. Clones share the same
/// state, so a generator can be handed to many threads.
///
/// IDs from one generator are strictly increasing as long as the clock does
/// not jump backward by more than the generator has already run ahead. When
/// the sequence space of a tick is exhausted, the generator borrows the next
/// tick and blocks the caller, through the [`SleepProvider`], until the clock
/// catches up. The lock is held for the whole call, including that wait.
///
/// # Example
///
/// ```
/// use kubeflake::{KubeflakeGenerator, Settings, StaticId};
///
/// let generator = KubeflakeGenerator::new(Settings::new(StaticId(2), StaticId(7))).unwrap();
///
/// let a = generator.next_id().unwrap();
/// let b = generator.next_id().unwrap();
/// assert!(a < b);
///
/// let parts = generator.decompose(b);
/// assert_eq!(parts.cluster_id, 2);
/// assert_eq!(parts.machine_id, 7);
/// ```
pub struct KubeflakeGenerator<T = SystemClock, S = ThreadSleep>
where
    T: TimeSource,
    S: SleepProvider,
{
    layout: Layout,
    cluster_id: u64,
    machine_id: u64,
    #[cfg(feature = "cache-padded")]
    state: Arc<crossbeam_utils::CachePadded<Mutex<State>>>,
    #[cfg(not(feature = "cache-padded"))]
    state: Arc<Mutex<State>>,
    time: T,
    sleep: S,
}

impl KubeflakeGenerator {
    /// Creates a generator reading the wall clock and sleeping the current
    /// thread on overflow.
    ///
    /// # Errors
    ///
    /// See [`KubeflakeGenerator::with_clock`].
    pub fn new(settings: Settings) -> Result<Self> {
        Self::with_clock(settings, SystemClock, ThreadSleep)
    }
}

impl<T, S> KubeflakeGenerator<T, S>
where
    T: TimeSource,
    S: SleepProvider,
{
    /// Creates a generator with an explicit clock and sleeper.
    ///
    /// The settings are validated against `time`, then the cluster-id
    /// provider and the machine-id provider are each invoked exactly once, in
    /// that order.
    ///
    /// # Errors
    ///
    /// - any validation error from [`Settings::validate_at`]
    /// - [`Error::ProviderFailure`] if a provider fails; the provider's error
    ///   is the source
    /// - [`Error::InvalidClusterRange`] or [`Error::InvalidMachineRange`] if a
    ///   provider returns a value that does not fit in its field
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all))]
    pub fn with_clock(settings: Settings, time: T, sleep: S) -> Result<Self> {
        let layout = settings.validate_at(time.now())?;

        let cluster_id = resolve(settings.cluster_id_provider())?;
        if cluster_id > layout.max_cluster_id() {
            return Err(Error::InvalidClusterRange { cluster_id });
        }
        let machine_id = resolve(settings.machine_id_provider())?;
        if machine_id > layout.max_machine_id() {
            return Err(Error::InvalidMachineRange { machine_id });
        }

        #[cfg(feature = "tracing")]
        tracing::info!(
            cluster_id,
            machine_id,
            time_bits = layout.time_bits(),
            sequence_bits = layout.sequence_bits(),
            cluster_bits = layout.cluster_bits(),
            machine_bits = layout.machine_bits(),
            time_unit = ?layout.time_unit(),
            codec = %layout.codec(),
            "generator ready"
        );

        let state = Mutex::new(State::default());
        Ok(Self {
            layout,
            cluster_id,
            machine_id,
            #[cfg(feature = "cache-padded")]
            state: Arc::new(crossbeam_utils::CachePadded::new(state)),
            #[cfg(not(feature = "cache-padded"))]
            state: Arc::new(state),
            time,
            sleep,
        })
    }

    /// Issues the next ID.
    ///
    /// May block for up to a few ticks when the sequence of the current tick
    /// is exhausted.
    ///
    /// # Errors
    ///
    /// - [`Error::OverTimeLimit`] once the elapsed time no longer fits in the
    ///   time field. This is terminal: every later call fails the same way.
    /// - [`Error::LockPoisoned`] if another caller panicked while holding the
    ///   lock (without the `parking-lot` feature).
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next_id(&self) -> Result<u64> {
        let mut state = {
            #[cfg(feature = "parking-lot")]
            {
                self.state.lock()
            }
            #[cfg(not(feature = "parking-lot"))]
            {
                self.state.lock()?
            }
        };

        let now = self.time.now();
        let current = self.layout.elapsed_saturating(now);
        if current > state.elapsed {
            state.elapsed = current;
            state.sequence = 0;
        } else {
            #[cfg(feature = "tracing")]
            if current < state.elapsed {
                tracing::debug!(current, stored = state.elapsed, "clock behind issued ticks");
            }
            state.sequence = (state.sequence + 1) & self.layout.max_sequence();
            if state.sequence == 0 {
                state.elapsed = state.elapsed.saturating_add(1);
                // past the limit the call fails below; never wait for it
                if state.elapsed <= self.layout.max_elapsed() {
                    let wait = self.layout.wait_for_overtime(now, state.elapsed - current);
                    self.cold_wait(wait);
                }
            }
        }

        if state.elapsed > self.layout.max_elapsed() {
            #[cfg(feature = "tracing")]
            tracing::error!(elapsed = state.elapsed, "time field exhausted");
            return Err(Error::OverTimeLimit);
        }
        Ok(self
            .layout
            .pack(state.elapsed, state.sequence, self.cluster_id, self.machine_id))
    }

    #[cold]
    #[inline(never)]
    fn cold_wait(&self, wait: Duration) {
        #[cfg(feature = "tracing")]
        tracing::debug!(?wait, "sequence exhausted, waiting for next tick");
        self.sleep.sleep(wait);
    }

    /// Issues the next ID and encodes it with the configured codec.
    ///
    /// # Errors
    ///
    /// Same as [`Self::next_id`].
    pub fn next_key(&self) -> Result<String> {
        let id = self.next_id()?;
        Ok(self.layout.codec().encode(id))
    }

    /// The cluster id resolved at construction.
    pub const fn cluster_id(&self) -> u64 {
        self.cluster_id
    }

    /// The machine id resolved at construction.
    pub const fn machine_id(&self) -> u64 {
        self.machine_id
    }

    /// The validated layout this generator packs IDs with.
    pub const fn layout(&self) -> &Layout {
        &self.layout
    }

    /// See [`Layout::compose`].
    ///
    /// # Errors
    ///
    /// See [`Layout::compose`].
    pub fn compose(
        &self,
        time: Duration,
        sequence: u64,
        machine_id: u64,
        cluster_id: u64,
    ) -> Result<u64> {
        self.layout.compose(time, sequence, machine_id, cluster_id)
    }

    /// See [`Layout::compose_key`].
    ///
    /// # Errors
    ///
    /// See [`Layout::compose`].
    pub fn compose_key(
        &self,
        time: Duration,
        sequence: u64,
        machine_id: u64,
        cluster_id: u64,
    ) -> Result<String> {
        self.layout.compose_key(time, sequence, machine_id, cluster_id)
    }

    /// See [`Layout::decompose`].
    pub const fn decompose(&self, id: u64) -> Parts {
        self.layout.decompose(id)
    }

    /// See [`Layout::decompose_key`].
    ///
    /// # Errors
    ///
    /// Returns the codec's decoding error if the key is malformed.
    pub fn decompose_key(&self, key: &str) -> Result<Parts> {
        self.layout.decompose_key(key)
    }
}

impl<T, S> Clone for KubeflakeGenerator<T, S>
where
    T: TimeSource + Clone,
    S: SleepProvider + Clone,
{
    fn clone(&self) -> Self {
        Self {
            layout: self.layout,
            cluster_id: self.cluster_id,
            machine_id: self.machine_id,
            state: Arc::clone(&self.state),
            time: self.time.clone(),
            sleep: self.sleep.clone(),
        }
    }
}

impl<T, S> core::fmt::Debug for KubeflakeGenerator<T, S>
where
    T: TimeSource,
    S: SleepProvider,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("KubeflakeGenerator")
            .field("layout", &self.layout)
            .field("cluster_id", &self.cluster_id)
            .field("machine_id", &self.machine_id)
            .finish_non_exhaustive()
    }
}

fn resolve(provider: &dyn IdProvider) -> Result<u64> {
    provider.id().map_err(|err| {
        #[cfg(feature = "tracing")]
        tracing::warn!(error = %err, "id provider failed");
        Error::ProviderFailure(err)
    })
}
