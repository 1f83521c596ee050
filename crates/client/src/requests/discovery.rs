// Copyright 2025, 2026 The oxidc Authors.
//
// SPDX-License-Identifier: MIT
// Please see LICENSE in the repository root for full details.

//! Requests for OpenID Connect Provider [Discovery].
//!
//! [Discovery]: https://openid.net/specs/openid-connect-discovery-1_0.html

use oxidc_types::oidc::{ProviderMetadata, VerifiedProviderMetadata};
use url::Url;

use crate::error::DiscoveryError;

/// Derive the well-known configuration URL for the given issuer.
///
/// # Errors
///
/// Returns an error if the issuer URL cannot be extended.
pub fn configuration_url(issuer: &Url) -> Result<Url, url::ParseError> {
    let mut config_url = issuer.clone();

    // If the path doesn't end with a slash, the last segment is removed
    // when using `join`.
    if !config_url.path().ends_with('/') {
        let mut path = config_url.path().to_owned();
        path.push('/');
        config_url.set_path(&path);
    }

    config_url.join(".well-known/openid-configuration")
}

/// Fetch the provider metadata at the given configuration endpoint and
/// validate it.
///
/// # Errors
///
/// Returns an error if the request fails or if the metadata is invalid.
#[tracing::instrument(skip_all, fields(config_endpoint = %config_endpoint))]
pub async fn fetch_provider_metadata(
    client: &reqwest::Client,
    config_endpoint: &Url,
) -> Result<VerifiedProviderMetadata, DiscoveryError> {
    tracing::debug!("Fetching provider metadata...");

    let response = client
        .get(config_endpoint.as_str())
        .send()
        .await
        .map_err(DiscoveryError::from_reqwest)?;

    let status = response.status();
    if !status.is_success() {
        return Err(DiscoveryError::BadStatus(status));
    }

    let body = response.text().await.map_err(DiscoveryError::from_reqwest)?;
    let metadata: ProviderMetadata = serde_json::from_str(&body).map_err(DiscoveryError::Parse)?;

    tracing::debug!(?metadata);

    Ok(metadata.validate()?)
}
