use crate::Cloud;

pub type Result<T, E = DiscoveryError> = core::result::Result<T, E>;

/// Why a collaborator could not resolve a cluster id or machine id.
///
/// Converts into [`kubeflake::BoxError`], so a failed lookup surfaces as the
/// source of [`kubeflake::Error::ProviderFailure`] when a generator is built.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DiscoveryError {
    #[error("statefulset pod name not found from environment or hostname")]
    PodNameNotFound,

    #[error("ordinal suffix not found or not numeric in pod name {name:?}")]
    OrdinalNotFound { name: String },

    #[error("zone {zone:?} not found")]
    ZoneNotFound { zone: String },

    #[error("region {region:?} not found")]
    RegionNotFound { region: String },

    #[error("metadata server unavailable at {url}")]
    MetadataUnavailable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("cloud provider {cloud} is not supported")]
    Unsupported { cloud: Cloud },
}
