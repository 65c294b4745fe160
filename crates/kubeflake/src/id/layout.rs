use core::time::Duration;

use crate::{Codec, Error, Parts, Result};

/// A validated partition of a 64-bit ID, together with the time unit, epoch
/// and key codec it was configured with.
///
/// A `Layout` is obtained from [`Settings::validate`] and is immutable. All of
/// its operations are pure and lock-free; they do not depend on any
/// generator state, which makes them suitable for tests, migrations and
/// external tooling.
///
/// ```text
///  Bit Index:  63                 S+C+M  S+C+M-1     C+M  C+M-1      M  M-1            0
///              +----------------------+----------------+----------------+---------------+
///  Field:      | elapsed (64-S-C-M)   | sequence (S)   | cluster ID (C) | machine ID (M)|
///              +----------------------+----------------+----------------+---------------+
///              |<----------------- MSB ------- 64 bits ------- LSB -------------------->|
/// ```
///
/// [`Settings::validate`]: crate::Settings::validate
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Layout {
    time_bits: u8,
    sequence_bits: u8,
    cluster_bits: u8,
    machine_bits: u8,
    time_unit: Duration,
    epoch: Duration,
    codec: Codec,
}

impl Layout {
    /// Callers must have validated the widths: they sum to 64 and each is
    /// below 64.
    pub(crate) const fn new(
        sequence_bits: u8,
        cluster_bits: u8,
        machine_bits: u8,
        time_unit: Duration,
        epoch: Duration,
        codec: Codec,
    ) -> Self {
        Self {
            time_bits: 64 - sequence_bits - cluster_bits - machine_bits,
            sequence_bits,
            cluster_bits,
            machine_bits,
            time_unit,
            epoch,
            codec,
        }
    }

    /// Width of the elapsed-time field.
    pub const fn time_bits(&self) -> u8 {
        self.time_bits
    }

    /// Width of the sequence field.
    pub const fn sequence_bits(&self) -> u8 {
        self.sequence_bits
    }

    /// Width of the cluster-id field.
    pub const fn cluster_bits(&self) -> u8 {
        self.cluster_bits
    }

    /// Width of the machine-id field.
    pub const fn machine_bits(&self) -> u8 {
        self.machine_bits
    }

    /// Duration of one tick of the elapsed-time field.
    pub const fn time_unit(&self) -> Duration {
        self.time_unit
    }

    /// The reference instant, as a duration since the Unix epoch.
    pub const fn epoch(&self) -> Duration {
        self.epoch
    }

    /// The codec used for keys.
    pub const fn codec(&self) -> Codec {
        self.codec
    }

    /// Number of bits to shift the elapsed time to its position.
    pub const fn time_shift(&self) -> u32 {
        (self.sequence_bits + self.cluster_bits + self.machine_bits) as u32
    }

    /// Number of bits to shift the sequence to its position.
    pub const fn sequence_shift(&self) -> u32 {
        (self.cluster_bits + self.machine_bits) as u32
    }

    /// Number of bits to shift the cluster id to its position.
    pub const fn cluster_shift(&self) -> u32 {
        self.machine_bits as u32
    }

    /// Largest elapsed-tick value that can be encoded.
    pub const fn max_elapsed(&self) -> u64 {
        mask(self.time_bits)
    }

    /// Largest sequence value that can be encoded.
    pub const fn max_sequence(&self) -> u64 {
        mask(self.sequence_bits)
    }

    /// Largest cluster id that can be encoded.
    pub const fn max_cluster_id(&self) -> u64 {
        mask(self.cluster_bits)
    }

    /// Largest machine id that can be encoded.
    pub const fn max_machine_id(&self) -> u64 {
        mask(self.machine_bits)
    }

    /// Ticks elapsed between the epoch and `time`, or `None` if `time` is
    /// before the epoch.
    ///
    /// The value is not bounded by [`Self::max_elapsed`].
    pub fn elapsed_at(&self, time: Duration) -> Option<u64> {
        time.checked_sub(self.epoch).map(|since| self.ticks(since))
    }

    /// Like [`Self::elapsed_at`], but a time before the epoch counts as tick
    /// zero.
    pub(crate) fn elapsed_saturating(&self, time: Duration) -> u64 {
        self.ticks(time.saturating_sub(self.epoch))
    }

    fn ticks(&self, since_epoch: Duration) -> u64 {
        let ticks = since_epoch.as_nanos() / self.time_unit.as_nanos();
        u64::try_from(ticks).unwrap_or(u64::MAX)
    }

    /// The instant at which tick `elapsed` starts, as a duration since the
    /// Unix epoch.
    pub fn time_of(&self, elapsed: u64) -> Duration {
        let nanos = self
            .time_unit
            .as_nanos()
            .saturating_mul(u128::from(elapsed));
        self.epoch.saturating_add(duration_from_nanos(nanos))
    }

    /// How long to wait, from `now`, until the clock reaches the start of the
    /// tick `overtime` ticks after the current one.
    ///
    /// That is `overtime` full ticks minus the part of the current tick that
    /// has already passed.
    pub(crate) fn wait_for_overtime(&self, now: Duration, overtime: u64) -> Duration {
        let unit = self.time_unit.as_nanos();
        let into_tick = now.saturating_sub(self.epoch).as_nanos() % unit;
        let wait = unit
            .saturating_mul(u128::from(overtime))
            .saturating_sub(into_tick);
        duration_from_nanos(wait)
    }

    /// Packs the four fields. Each value must already fit in its field.
    pub(crate) const fn pack(
        &self,
        elapsed: u64,
        sequence: u64,
        cluster_id: u64,
        machine_id: u64,
    ) -> u64 {
        (elapsed << self.time_shift())
            | (sequence << self.sequence_shift())
            | (cluster_id << self.cluster_shift())
            | machine_id
    }

    /// Builds an ID from explicit components.
    ///
    /// This does not touch any generator state: it is the deterministic
    /// counterpart of `next_id`, used to construct IDs for a known instant.
    ///
    /// # Errors
    ///
    /// Checked in this order:
    /// - [`Error::StartTimeAhead`] if `time` is before the epoch
    /// - [`Error::OverTimeLimit`] if the elapsed ticks do not fit in the time
    ///   field
    /// - [`Error::InvalidSequenceRange`], [`Error::InvalidClusterRange`],
    ///   [`Error::InvalidMachineRange`] if a component does not fit in its
    ///   field
    ///
    /// # Example
    ///
    /// ```
    /// use core::time::Duration;
    /// use kubeflake::{Settings, StaticId};
    ///
    /// let epoch = Duration::from_secs(1_700_000_000);
    /// let layout = Settings::new(StaticId(0), StaticId(0))
    ///     .with_time_unit(Duration::from_millis(1))
    ///     .with_epoch(epoch)
    ///     .validate()
    ///     .unwrap();
    ///
    /// let id = layout
    ///     .compose(epoch + Duration::from_millis(42), 7, 11, 3)
    ///     .unwrap();
    /// let parts = layout.decompose(id);
    /// assert_eq!(parts.elapsed, 42);
    /// assert_eq!(parts.sequence, 7);
    /// assert_eq!(parts.machine_id, 11);
    /// assert_eq!(parts.cluster_id, 3);
    /// ```
    pub fn compose(
        &self,
        time: Duration,
        sequence: u64,
        machine_id: u64,
        cluster_id: u64,
    ) -> Result<u64> {
        let elapsed = self.elapsed_at(time).ok_or(Error::StartTimeAhead)?;
        if elapsed > self.max_elapsed() {
            return Err(Error::OverTimeLimit);
        }
        if sequence > self.max_sequence() {
            return Err(Error::InvalidSequenceRange { sequence });
        }
        if cluster_id > self.max_cluster_id() {
            return Err(Error::InvalidClusterRange { cluster_id });
        }
        if machine_id > self.max_machine_id() {
            return Err(Error::InvalidMachineRange { machine_id });
        }
        Ok(self.pack(elapsed, sequence, cluster_id, machine_id))
    }

    /// [`Self::compose`], rendered as a key with the layout's codec.
    ///
    /// # Errors
    ///
    /// Same as [`Self::compose`].
    pub fn compose_key(
        &self,
        time: Duration,
        sequence: u64,
        machine_id: u64,
        cluster_id: u64,
    ) -> Result<String> {
        let id = self.compose(time, sequence, machine_id, cluster_id)?;
        Ok(self.codec.encode(id))
    }

    /// Splits an ID into its four fields. Never fails.
    pub const fn decompose(&self, id: u64) -> Parts {
        Parts {
            elapsed: id >> self.time_shift(),
            sequence: (id >> self.sequence_shift()) & self.max_sequence(),
            cluster_id: (id >> self.cluster_shift()) & self.max_cluster_id(),
            machine_id: id & self.max_machine_id(),
        }
    }

    /// Decodes a key with the layout's codec, then decomposes it.
    ///
    /// # Errors
    ///
    /// Returns the codec's decoding error if the key is malformed.
    pub fn decompose_key(&self, key: &str) -> Result<Parts> {
        let id = self.codec.decode(key)?;
        Ok(self.decompose(id))
    }
}

const fn mask(bits: u8) -> u64 {
    (1 << bits) - 1
}

fn duration_from_nanos(nanos: u128) -> Duration {
    const NANOS_PER_SEC: u128 = 1_000_000_000;
    let secs = u64::try_from(nanos / NANOS_PER_SEC).unwrap_or(u64::MAX);
    Duration::new(secs, (nanos % NANOS_PER_SEC) as u32)
}
