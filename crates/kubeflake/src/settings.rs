use core::{fmt, time::Duration};
use std::sync::Arc;

use crate::{
    Codec, Error, IdProvider, Layout, Result, StaticId,
    time::{DEFAULT_EPOCH, SystemClock, TimeSource},
};

/// Smallest supported sequence width.
pub const MIN_SEQUENCE_BITS: u8 = 8;
/// Largest supported sequence width.
pub const MAX_SEQUENCE_BITS: u8 = 30;
/// Smallest supported machine-id width.
pub const MIN_MACHINE_BITS: u8 = 3;
/// Largest supported machine-id width.
pub const MAX_MACHINE_BITS: u8 = 16;
/// Smallest supported cluster-id width.
pub const MIN_CLUSTER_BITS: u8 = 2;
/// Largest supported cluster-id width.
pub const MAX_CLUSTER_BITS: u8 = 8;
/// Smallest elapsed-time width left over by the other three fields.
pub const MIN_TIME_BITS: u8 = 32;

pub const DEFAULT_SEQUENCE_BITS: u8 = 9;
pub const DEFAULT_CLUSTER_BITS: u8 = 3;
pub const DEFAULT_MACHINE_BITS: u8 = 13;
/// Tick length used when the configured time unit is zero.
pub const DEFAULT_TIME_UNIT: Duration = Duration::from_millis(10);
/// Shortest non-zero time unit.
pub const MIN_TIME_UNIT: Duration = Duration::from_millis(1);

/// Configuration for a generator.
///
/// Every option has a default and a chained `with_*` setter. Nothing is
/// checked until [`Settings::validate`] (or generator construction) runs, so
/// setters never fail.
///
/// The defaults give 39 bits of 10 ms ticks (about 174 years from
/// 2025-01-01), 512 ids per tick, 8 clusters and 8192 machines per cluster.
///
/// # Example
///
/// ```
/// use core::time::Duration;
/// use kubeflake::{Codec, Settings, StaticId};
///
/// let settings = Settings::new(StaticId(1), StaticId(42))
///     .with_sequence_bits(12)
///     .with_machine_bits(10)
///     .with_time_unit(Duration::from_millis(1))
///     .with_codec(Codec::Base64);
///
/// let layout = settings.validate().unwrap();
/// assert_eq!(layout.time_bits(), 64 - 12 - 3 - 10);
/// ```
#[derive(Clone)]
pub struct Settings {
    sequence_bits: u8,
    cluster_bits: u8,
    machine_bits: u8,
    time_unit: Duration,
    epoch: Duration,
    codec: Codec,
    cluster_id: Arc<dyn IdProvider>,
    machine_id: Arc<dyn IdProvider>,
}

impl Settings {
    /// Creates settings with default widths, time unit, epoch and codec.
    pub fn new<C, M>(cluster_id: C, machine_id: M) -> Self
    where
        C: IdProvider + 'static,
        M: IdProvider + 'static,
    {
        Self {
            sequence_bits: DEFAULT_SEQUENCE_BITS,
            cluster_bits: DEFAULT_CLUSTER_BITS,
            machine_bits: DEFAULT_MACHINE_BITS,
            time_unit: Duration::ZERO,
            epoch: DEFAULT_EPOCH,
            codec: Codec::default(),
            cluster_id: Arc::new(cluster_id),
            machine_id: Arc::new(machine_id),
        }
    }

    /// Sets the width of the per-tick sequence field.
    #[must_use]
    pub const fn with_sequence_bits(mut self, bits: u8) -> Self {
        self.sequence_bits = bits;
        self
    }

    /// Sets the width of the cluster-id field.
    #[must_use]
    pub const fn with_cluster_bits(mut self, bits: u8) -> Self {
        self.cluster_bits = bits;
        self
    }

    /// Sets the width of the machine-id field.
    #[must_use]
    pub const fn with_machine_bits(mut self, bits: u8) -> Self {
        self.machine_bits = bits;
        self
    }

    /// Sets the tick length. Zero selects [`DEFAULT_TIME_UNIT`].
    #[must_use]
    pub const fn with_time_unit(mut self, unit: Duration) -> Self {
        self.time_unit = unit;
        self
    }

    /// Sets the epoch, as a duration since the Unix epoch.
    #[must_use]
    pub const fn with_epoch(mut self, epoch: Duration) -> Self {
        self.epoch = epoch;
        self
    }

    /// Sets the alphabet used for keys.
    #[must_use]
    pub const fn with_codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }

    /// Replaces the cluster-id provider.
    #[must_use]
    pub fn with_cluster_id<C: IdProvider + 'static>(mut self, provider: C) -> Self {
        self.cluster_id = Arc::new(provider);
        self
    }

    /// Replaces the machine-id provider.
    #[must_use]
    pub fn with_machine_id<M: IdProvider + 'static>(mut self, provider: M) -> Self {
        self.machine_id = Arc::new(provider);
        self
    }

    /// Width of the sequence field, as configured.
    pub const fn sequence_bits(&self) -> u8 {
        self.sequence_bits
    }

    /// Width of the cluster-id field, as configured.
    pub const fn cluster_bits(&self) -> u8 {
        self.cluster_bits
    }

    /// Width of the machine-id field, as configured.
    pub const fn machine_bits(&self) -> u8 {
        self.machine_bits
    }

    /// The configured tick length; zero means [`DEFAULT_TIME_UNIT`].
    pub const fn time_unit(&self) -> Duration {
        self.time_unit
    }

    /// The epoch, as a duration since the Unix epoch.
    pub const fn epoch(&self) -> Duration {
        self.epoch
    }

    /// The key alphabet.
    pub const fn codec(&self) -> Codec {
        self.codec
    }

    pub(crate) fn cluster_id_provider(&self) -> &dyn IdProvider {
        &*self.cluster_id
    }

    pub(crate) fn machine_id_provider(&self) -> &dyn IdProvider {
        &*self.machine_id
    }

    /// Validates the settings against the wall clock.
    ///
    /// See [`Settings::validate_at`].
    ///
    /// # Errors
    ///
    /// See [`Settings::validate_at`].
    pub fn validate(&self) -> Result<Layout> {
        self.validate_at(SystemClock.now())
    }

    /// Validates the settings, treating `now` (a duration since the Unix
    /// epoch) as the current instant, and returns the resulting [`Layout`].
    ///
    /// Providers are not invoked.
    ///
    /// # Errors
    ///
    /// Checks short-circuit in this order:
    /// 1. [`Error::InvalidSequenceBits`]
    /// 2. [`Error::InvalidMachineBits`]
    /// 3. [`Error::InvalidClusterBits`]
    /// 4. [`Error::InvalidTimeUnit`] for a non-zero unit under 1 ms
    /// 5. [`Error::StartTimeAhead`] for an epoch after `now`
    /// 6. [`Error::InvalidDerivedTimeWidth`] if fewer than
    ///    [`MIN_TIME_BITS`] remain for the time field
    pub fn validate_at(&self, now: Duration) -> Result<Layout> {
        if !(MIN_SEQUENCE_BITS..=MAX_SEQUENCE_BITS).contains(&self.sequence_bits) {
            return Err(Error::InvalidSequenceBits {
                bits: self.sequence_bits,
            });
        }
        if !(MIN_MACHINE_BITS..=MAX_MACHINE_BITS).contains(&self.machine_bits) {
            return Err(Error::InvalidMachineBits {
                bits: self.machine_bits,
            });
        }
        if !(MIN_CLUSTER_BITS..=MAX_CLUSTER_BITS).contains(&self.cluster_bits) {
            return Err(Error::InvalidClusterBits {
                bits: self.cluster_bits,
            });
        }
        let time_unit = match self.time_unit {
            Duration::ZERO => DEFAULT_TIME_UNIT,
            unit if unit < MIN_TIME_UNIT => return Err(Error::InvalidTimeUnit { unit }),
            unit => unit,
        };
        if self.epoch > now {
            return Err(Error::StartTimeAhead);
        }
        // widths are bounded above, so this cannot underflow
        let time_bits = 64 - self.sequence_bits - self.cluster_bits - self.machine_bits;
        if time_bits < MIN_TIME_BITS {
            return Err(Error::InvalidDerivedTimeWidth { bits: time_bits });
        }
        Ok(Layout::new(
            self.sequence_bits,
            self.cluster_bits,
            self.machine_bits,
            time_unit,
            self.epoch,
            self.codec,
        ))
    }
}

impl Default for Settings {
    /// Default layout with cluster id and machine id both fixed at zero.
    fn default() -> Self {
        Self::new(StaticId(0), StaticId(0))
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("sequence_bits", &self.sequence_bits)
            .field("cluster_bits", &self.cluster_bits)
            .field("machine_bits", &self.machine_bits)
            .field("time_unit", &self.time_unit)
            .field("epoch", &self.epoch)
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}
