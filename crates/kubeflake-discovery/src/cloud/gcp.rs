use core::time::Duration;

use crate::{
    DiscoveryError, Result,
    cloud::{base_url, client},
    env::{EnvLookup, first_set},
};

/// Environment variables overriding the GCP zone, in order.
pub const GCP_ZONE_VARS: [&str; 2] = ["GCP_ZONE", "ZONE"];

/// Environment variable overriding the metadata server host.
pub const GCP_METADATA_HOST: &str = "GCE_METADATA_HOST";

const DEFAULT_HOST: &str = "metadata.google.internal";
const ZONE_PATH: &str = "/computeMetadata/v1/instance/zone";

/// Resolves the zone the instance runs in.
///
/// The metadata server answers `projects/<number>/zones/<zone>`; only the
/// last path segment is kept.
pub(crate) fn zone(lookup: EnvLookup, endpoint: Option<&str>, timeout: Duration) -> Result<String> {
    if let Some((var, zone)) = first_set(lookup, &GCP_ZONE_VARS) {
        tracing::debug!(var, zone = %zone, "gcp zone from environment");
        return Ok(zone);
    }

    let host = match endpoint {
        Some(endpoint) => endpoint.to_owned(),
        None => first_set(lookup, &[GCP_METADATA_HOST])
            .map_or_else(|| DEFAULT_HOST.to_owned(), |(_, host)| host),
    };
    let url = format!("{}{ZONE_PATH}", base_url(&host));
    tracing::debug!(url = %url, "querying gcp metadata server");

    let body = client(timeout)
        .and_then(|client| {
            client
                .get(&url)
                .header("Metadata-Flavor", "Google")
                .send()?
                .error_for_status()?
                .text()
        })
        .map_err(|source| DiscoveryError::MetadataUnavailable {
            url: url.clone(),
            source,
        })?;

    let body = body.trim();
    let zone = body.rsplit('/').next().unwrap_or_default();
    if zone.is_empty() {
        return Err(DiscoveryError::ZoneNotFound {
            zone: body.to_owned(),
        });
    }
    Ok(zone.to_owned())
}
