use kubeflake::{BoxError, IdProvider};

use crate::{
    DiscoveryError, Result,
    env::{EnvLookup, first_set, process_env},
};

/// Environment variables holding the pod name, in order of preference.
///
/// `POD_NAME` is usually injected through the downward API; Kubernetes sets
/// `HOSTNAME` to the pod name by default.
pub const POD_NAME_VARS: [&str; 2] = ["POD_NAME", "HOSTNAME"];

/// Reads the system hostname.
pub type HostnameLookup = fn() -> std::io::Result<String>;

/// Machine id from the ordinal of a StatefulSet pod.
///
/// StatefulSet pods are named `<set>-<ordinal>`, and ordinals are unique and
/// stable within the set, which makes them a natural machine id. The pod name
/// comes from [`POD_NAME_VARS`], then from the system hostname; the ordinal
/// is the decimal suffix after the last `-`.
///
/// ```
/// use kubeflake::IdProvider;
/// use kubeflake_discovery::StatefulSetOrdinal;
///
/// let provider = StatefulSetOrdinal::new()
///     .with_lookup(|name| (name == "POD_NAME").then(|| "ids-web-12".to_owned()));
/// assert_eq!(provider.id().unwrap(), 12);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct StatefulSetOrdinal {
    lookup: EnvLookup,
    hostname: HostnameLookup,
}

impl Default for StatefulSetOrdinal {
    fn default() -> Self {
        Self::new()
    }
}

impl StatefulSetOrdinal {
    /// Reads the process environment and the system hostname.
    pub const fn new() -> Self {
        Self {
            lookup: process_env,
            hostname: system_hostname,
        }
    }

    /// Replaces the environment lookup.
    #[must_use]
    pub const fn with_lookup(mut self, lookup: EnvLookup) -> Self {
        self.lookup = lookup;
        self
    }

    /// Replaces the system hostname lookup.
    #[must_use]
    pub const fn with_hostname(mut self, hostname: HostnameLookup) -> Self {
        self.hostname = hostname;
        self
    }

    /// The name of the current pod.
    ///
    /// # Errors
    ///
    /// [`DiscoveryError::PodNameNotFound`] if no variable is set and the
    /// hostname cannot be read.
    pub fn pod_name(&self) -> Result<String> {
        if let Some((var, name)) = first_set(self.lookup, &POD_NAME_VARS) {
            tracing::debug!(var, name = %name, "pod name from environment");
            return Ok(name);
        }
        match (self.hostname)() {
            Ok(name) if !name.trim().is_empty() => Ok(name.trim().to_owned()),
            Ok(_) => Err(DiscoveryError::PodNameNotFound),
            Err(err) => {
                tracing::warn!(error = %err, "cannot read system hostname");
                Err(DiscoveryError::PodNameNotFound)
            }
        }
    }

    /// The ordinal of the current pod.
    ///
    /// # Errors
    ///
    /// [`DiscoveryError::PodNameNotFound`] as for [`Self::pod_name`], or
    /// [`DiscoveryError::OrdinalNotFound`] if the name has no numeric suffix.
    pub fn resolve(&self) -> Result<u64> {
        let name = self.pod_name()?;
        ordinal(&name).ok_or(DiscoveryError::OrdinalNotFound { name })
    }
}

impl IdProvider for StatefulSetOrdinal {
    fn id(&self) -> Result<u64, BoxError> {
        Ok(self.resolve()?)
    }
}

/// The decimal suffix after the last `-` of a pod name.
pub fn ordinal(pod_name: &str) -> Option<u64> {
    let (_, suffix) = pod_name.rsplit_once('-')?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

fn system_hostname() -> std::io::Result<String> {
    std::fs::read_to_string("/proc/sys/kernel/hostname")
        .or_else(|_| std::fs::read_to_string("/etc/hostname"))
}
