use core::time::Duration;

use crate::{
    DiscoveryError, Result,
    cloud::{base_url, client},
    env::{EnvLookup, first_set},
};

/// Environment variables overriding the AWS region, in order.
pub const AWS_REGION_VARS: [&str; 2] = ["AWS_REGION", "AWS_DEFAULT_REGION"];

/// Environment variable overriding the instance metadata endpoint.
pub const AWS_METADATA_ENDPOINT: &str = "AWS_EC2_METADATA_SERVICE_ENDPOINT";

const DEFAULT_ENDPOINT: &str = "http://169.254.169.254";
const TOKEN_PATH: &str = "/latest/api/token";
const REGION_PATH: &str = "/latest/meta-data/placement/region";
const TOKEN_TTL_HEADER: &str = "X-aws-ec2-metadata-token-ttl-seconds";
const TOKEN_HEADER: &str = "X-aws-ec2-metadata-token";
/// Six hours.
const TOKEN_TTL_SECS: &str = "21600";

/// Resolves the region the instance runs in, through IMDSv2: a session token
/// is requested first, then presented on the region query.
pub(crate) fn region(
    lookup: EnvLookup,
    endpoint: Option<&str>,
    timeout: Duration,
) -> Result<String> {
    if let Some((var, region)) = first_set(lookup, &AWS_REGION_VARS) {
        tracing::debug!(var, region = %region, "aws region from environment");
        return Ok(region);
    }

    let base = match endpoint {
        Some(endpoint) => base_url(endpoint),
        None => first_set(lookup, &[AWS_METADATA_ENDPOINT])
            .map_or_else(|| DEFAULT_ENDPOINT.to_owned(), |(_, host)| base_url(&host)),
    };
    let unavailable = |url: &str| {
        let url = url.to_owned();
        move |source: reqwest::Error| DiscoveryError::MetadataUnavailable { url, source }
    };

    let client = client(timeout).map_err(unavailable(&base))?;

    let token_url = format!("{base}{TOKEN_PATH}");
    tracing::debug!(url = %token_url, "requesting imds session token");
    let token = client
        .put(&token_url)
        .header(TOKEN_TTL_HEADER, TOKEN_TTL_SECS)
        .send()
        .and_then(reqwest::blocking::Response::error_for_status)
        .and_then(reqwest::blocking::Response::text)
        .map_err(unavailable(&token_url))?;

    let region_url = format!("{base}{REGION_PATH}");
    tracing::debug!(url = %region_url, "querying imds region");
    let region = client
        .get(&region_url)
        .header(TOKEN_HEADER, token.trim())
        .send()
        .and_then(reqwest::blocking::Response::error_for_status)
        .and_then(reqwest::blocking::Response::text)
        .map_err(unavailable(&region_url))?;

    let region = region.trim();
    if region.is_empty() {
        return Err(DiscoveryError::RegionNotFound {
            region: String::new(),
        });
    }
    Ok(region.to_owned())
}
