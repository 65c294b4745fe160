use core::fmt;

/// The four fields of a decomposed ID.
///
/// Decomposition is total: every `u64` maps to some `Parts` under a given
/// [`Layout`], so this type carries no validity guarantee on its own. Use
/// [`Layout::compose`] to go back to a validated ID.
///
/// [`Layout`]: crate::Layout
/// [`Layout::compose`]: crate::Layout::compose
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Parts {
    /// Ticks elapsed since the layout's epoch.
    pub elapsed: u64,
    /// Per-tick sequence number.
    pub sequence: u64,
    /// Cluster identifier.
    pub cluster_id: u64,
    /// Machine identifier within the cluster.
    pub machine_id: u64,
}

impl fmt::Display for Parts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "elapsed={} sequence={} cluster_id={} machine_id={}",
            self.elapsed, self.sequence, self.cluster_id, self.machine_id
        )
    }
}
