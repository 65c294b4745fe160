mod aws;
mod gcp;
mod tables;

use core::{fmt, time::Duration};
use std::{panic, sync::Arc, thread};

use kubeflake::{BoxError, IdProvider};

use crate::{
    DiscoveryError, Result,
    env::{EnvLookup, process_env},
};

pub use aws::{AWS_METADATA_ENDPOINT, AWS_REGION_VARS};
pub use gcp::{GCP_METADATA_HOST, GCP_ZONE_VARS};
pub use tables::*;

/// Timeout for each metadata request.
pub const METADATA_TIMEOUT: Duration = Duration::from_secs(2);

/// The cloud a [`CloudZoneProvider`] asks for its location.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cloud {
    /// Google Cloud: the index of the instance's zone.
    Gcp,
    /// Amazon Web Services: the index of the instance's region.
    Aws,
    /// Not supported.
    Azure,
    /// Detect the cloud from the environment. Not supported.
    Detect,
}

impl fmt::Display for Cloud {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Gcp => "gcp",
            Self::Aws => "aws",
            Self::Azure => "azure",
            Self::Detect => "detect",
        })
    }
}

/// Cluster id from the zone (GCP) or region (AWS) the process runs in.
///
/// The location name is read from environment overrides first, then from
/// the cloud's instance metadata server. It is mapped to an id through a
/// [`ZoneIndex`], which defaults to the built-in table for the cloud.
///
/// Lookups are blocking and bounded by [`METADATA_TIMEOUT`] per request.
/// They run once, when the generator is constructed.
///
/// ```
/// use kubeflake::IdProvider;
/// use kubeflake_discovery::{CloudZoneProvider, ZoneIndex};
///
/// let provider = CloudZoneProvider::aws()
///     .with_lookup(|name| (name == "AWS_REGION").then(|| "eu-west-2".to_owned()));
/// assert_eq!(provider.id().unwrap(), ZoneIndex::aws_regions().get("eu-west-2").unwrap());
/// ```
#[derive(Clone, Debug)]
pub struct CloudZoneProvider {
    cloud: Cloud,
    index: Arc<ZoneIndex>,
    lookup: EnvLookup,
    endpoint: Option<String>,
    timeout: Duration,
}

impl CloudZoneProvider {
    /// A provider for `cloud`, using its built-in table.
    ///
    /// Azure and detection have no table; their lookups fail with
    /// [`DiscoveryError::Unsupported`].
    pub fn new(cloud: Cloud) -> Self {
        let index = match cloud {
            Cloud::Gcp => ZoneIndex::gcp_zones(),
            Cloud::Aws => ZoneIndex::aws_regions(),
            Cloud::Azure | Cloud::Detect => ZoneIndex::default(),
        };
        Self {
            cloud,
            index: Arc::new(index),
            lookup: process_env,
            endpoint: None,
            timeout: METADATA_TIMEOUT,
        }
    }

    /// A GCP provider: the index of the instance's zone.
    pub fn gcp() -> Self {
        Self::new(Cloud::Gcp)
    }

    /// An AWS provider: the index of the instance's region.
    pub fn aws() -> Self {
        Self::new(Cloud::Aws)
    }

    /// Replaces the name-to-id table.
    #[must_use]
    pub fn with_index(mut self, index: Arc<ZoneIndex>) -> Self {
        self.index = index;
        self
    }

    /// Replaces the environment lookup.
    #[must_use]
    pub fn with_lookup(mut self, lookup: EnvLookup) -> Self {
        self.lookup = lookup;
        self
    }

    /// Sends metadata requests to `endpoint` (e.g. `http://127.0.0.1:8080`)
    /// instead of the cloud's default or its environment override.
    #[must_use]
    pub fn with_metadata_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Replaces the per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The cloud this provider asks.
    pub const fn cloud(&self) -> Cloud {
        self.cloud
    }

    /// The name-to-id table in use.
    pub fn index(&self) -> &ZoneIndex {
        &self.index
    }

    /// The zone (GCP) or region (AWS) name.
    ///
    /// # Errors
    ///
    /// - [`DiscoveryError::MetadataUnavailable`] if the metadata server
    ///   cannot be reached or answers with an error status
    /// - [`DiscoveryError::ZoneNotFound`] or
    ///   [`DiscoveryError::RegionNotFound`] if it answers with an empty name
    /// - [`DiscoveryError::Unsupported`] for Azure and detection
    ///
    /// The lookup runs on a dedicated thread, so it is safe to call from
    /// within an async runtime; the caller still blocks until it completes.
    pub fn location(&self) -> Result<String> {
        let endpoint = self.endpoint.as_deref();
        match self.cloud {
            Cloud::Gcp => off_runtime(|| gcp::zone(self.lookup, endpoint, self.timeout)),
            Cloud::Aws => off_runtime(|| aws::region(self.lookup, endpoint, self.timeout)),
            cloud @ (Cloud::Azure | Cloud::Detect) => Err(DiscoveryError::Unsupported { cloud }),
        }
    }

    /// The index of the current location.
    ///
    /// # Errors
    ///
    /// Any error from [`Self::location`], or
    /// [`DiscoveryError::ZoneNotFound`] / [`DiscoveryError::RegionNotFound`]
    /// if the name is not in the table.
    #[tracing::instrument(level = "debug", skip(self), fields(cloud = %self.cloud))]
    pub fn resolve(&self) -> Result<u64> {
        let location = self.location()?;
        let Some(index) = self.index.get(&location) else {
            tracing::warn!(location = %location, "location missing from the zone table");
            return Err(match self.cloud {
                Cloud::Aws => DiscoveryError::RegionNotFound { region: location },
                _ => DiscoveryError::ZoneNotFound { zone: location },
            });
        };
        tracing::info!(location = %location, index, "resolved cluster location");
        Ok(index)
    }
}

impl IdProvider for CloudZoneProvider {
    fn id(&self) -> Result<u64, BoxError> {
        Ok(self.resolve()?)
    }
}

/// Runs `lookup` on a scoped thread of its own.
///
/// The blocking HTTP client owns an internal runtime and panics when it is
/// created or dropped on a thread that is driving an async runtime.
fn off_runtime<T: Send>(lookup: impl FnOnce() -> T + Send) -> T {
    thread::scope(|s| s.spawn(lookup).join())
        .unwrap_or_else(|payload| panic::resume_unwind(payload))
}

fn client(timeout: Duration) -> Result<reqwest::blocking::Client, reqwest::Error> {
    reqwest::blocking::Client::builder().timeout(timeout).build()
}

/// `host` as a base URL, defaulting the scheme to `http`.
fn base_url(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_owned()
    } else {
        format!("http://{host}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_adds_scheme() {
        assert_eq!(base_url("metadata.google.internal"), "http://metadata.google.internal");
        assert_eq!(base_url("https://10.0.0.1:8080/"), "https://10.0.0.1:8080");
        assert_eq!(base_url("http://127.0.0.1:1"), "http://127.0.0.1:1");
    }

    #[test]
    fn unsupported_clouds_fail_without_lookups() {
        for cloud in [Cloud::Azure, Cloud::Detect] {
            let p = CloudZoneProvider::new(cloud).with_lookup(|_| None);
            assert!(p.index().is_empty());
            match p.resolve() {
                Err(DiscoveryError::Unsupported { cloud: c }) => assert_eq!(c, cloud),
                other => panic!("unexpected: {other:?}"),
            }
        }
    }

    #[test]
    fn unknown_names_map_to_the_cloud_error() {
        let p = CloudZoneProvider::gcp()
            .with_lookup(|name| (name == "ZONE").then(|| "mars-north1-a".to_owned()));
        assert!(matches!(
            p.resolve(),
            Err(DiscoveryError::ZoneNotFound { zone }) if zone == "mars-north1-a"
        ));

        let p = CloudZoneProvider::aws()
            .with_lookup(|name| (name == "AWS_DEFAULT_REGION").then(|| "moon-1".to_owned()));
        assert!(matches!(
            p.resolve(),
            Err(DiscoveryError::RegionNotFound { region }) if region == "moon-1"
        ));
    }

    #[test]
    fn custom_index_is_used() {
        let index = Arc::new(ZoneIndex::build([], ["lab-a", "lab-b"]));
        let p = CloudZoneProvider::gcp()
            .with_index(index)
            .with_lookup(|name| (name == "GCP_ZONE").then(|| "lab-b".to_owned()));
        assert_eq!(p.resolve().unwrap(), 1);
    }
}
