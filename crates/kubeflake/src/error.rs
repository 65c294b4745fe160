use core::time::Duration;

use crate::settings::{
    MAX_CLUSTER_BITS, MAX_MACHINE_BITS, MAX_SEQUENCE_BITS, MIN_CLUSTER_BITS, MIN_MACHINE_BITS,
    MIN_SEQUENCE_BITS, MIN_TIME_BITS,
};

/// The error type produced by cluster-id and machine-id providers.
///
/// Providers are external collaborators, so their failures are opaque to the
/// generator and are carried through unchanged.
pub type BoxError = Box<dyn core::error::Error + Send + Sync + 'static>;

/// A result type defaulting to this crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All errors that `kubeflake` can produce.
///
/// Every variant except [`Error::OverTimeLimit`] is a configuration or input
/// mistake surfaced synchronously to the caller. [`Error::OverTimeLimit`] is
/// terminal for a generator: the elapsed-time field is exhausted and no
/// further IDs can be issued without changing the epoch or bit widths.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The sequence bit width is outside the supported range.
    #[error(
        "invalid bit length for sequence number: {bits} (expected {}..={})",
        MIN_SEQUENCE_BITS,
        MAX_SEQUENCE_BITS
    )]
    InvalidSequenceBits { bits: u8 },

    /// The machine-id bit width is outside the supported range.
    #[error(
        "invalid bit length for machine id: {bits} (expected {}..={})",
        MIN_MACHINE_BITS,
        MAX_MACHINE_BITS
    )]
    InvalidMachineBits { bits: u8 },

    /// The cluster-id bit width is outside the supported range.
    #[error(
        "invalid bit length for cluster id: {bits} (expected {}..={})",
        MIN_CLUSTER_BITS,
        MAX_CLUSTER_BITS
    )]
    InvalidClusterBits { bits: u8 },

    /// The time unit is non-zero but shorter than one millisecond.
    #[error("invalid time unit: {unit:?} (must be zero or at least 1ms)")]
    InvalidTimeUnit { unit: Duration },

    /// The epoch lies after the instant it was checked against.
    ///
    /// Returned by settings validation when the epoch is in the future, and by
    /// `compose` when the given time is earlier than the epoch.
    #[error("start time is ahead")]
    StartTimeAhead,

    /// The time field left over by the other three widths is too narrow.
    #[error("bit length for time must be {} or more, got {bits}", MIN_TIME_BITS)]
    InvalidDerivedTimeWidth { bits: u8 },

    /// A cluster-id or machine-id provider failed.
    #[error("id provider failed: {0}")]
    ProviderFailure(#[source] BoxError),

    /// The elapsed time no longer fits in the time field.
    #[error("over the time limit")]
    OverTimeLimit,

    /// A sequence value does not fit in the sequence field.
    #[error("invalid sequence number: {sequence}")]
    InvalidSequenceRange { sequence: u64 },

    /// A machine id does not fit in the machine-id field.
    #[error("invalid machine id: {machine_id}")]
    InvalidMachineRange { machine_id: u64 },

    /// A cluster id does not fit in the cluster-id field.
    #[error("invalid cluster id: {cluster_id}")]
    InvalidClusterRange { cluster_id: u64 },

    /// A key contains a byte outside the active alphabet.
    #[error("invalid encoding: byte {byte:#04x} at index {index}")]
    InvalidEncoding { byte: u8, index: usize },

    /// A key decodes to a value larger than `u64::MAX`.
    #[error("key of length {len} overflows a 64-bit id")]
    KeyOverflow { len: usize },

    /// The operation failed because the generator lock was poisoned.
    ///
    /// This happens when a thread panics while holding the lock. With the
    /// `parking-lot` feature, the lock does not poison and this variant does
    /// not exist.
    #[cfg(not(feature = "parking-lot"))]
    #[error("generator lock poisoned")]
    LockPoisoned,
}

impl Error {
    /// Wraps a provider failure.
    pub fn provider(err: impl Into<BoxError>) -> Self {
        Self::ProviderFailure(err.into())
    }
}

#[cfg(not(feature = "parking-lot"))]
use crate::generator::{MutexGuard, PoisonError};
#[cfg(not(feature = "parking-lot"))]
impl<T> From<PoisonError<MutexGuard<'_, T>>> for Error {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}
