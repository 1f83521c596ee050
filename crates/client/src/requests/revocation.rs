// Copyright 2025, 2026 The oxidc Authors.
//
// SPDX-License-Identifier: MIT
// Please see LICENSE in the repository root for full details.

//! Requests for [Token Revocation].
//!
//! [Token Revocation]: https://www.rfc-editor.org/rfc/rfc7009

use oxidc_types::requests::IntrospectionRequest;

use crate::{
    error::RevocationError,
    provider::ProviderInfo,
    requests::token::ClientCredentials,
};

/// Revoke a token at the provider's revocation endpoint.
///
/// # Errors
///
/// Returns an error if the provider has no revocation endpoint, the
/// request fails, or the endpoint answers with a non-success status.
#[tracing::instrument(skip_all, fields(provider.id = %info.id))]
pub async fn revoke_token(
    client: &reqwest::Client,
    info: &ProviderInfo,
    token: String,
) -> Result<(), RevocationError> {
    let revocation_endpoint = info
        .revocation_endpoint
        .as_ref()
        .ok_or(RevocationError::NotSupported)?;

    tracing::debug!("Revoking token...");

    let credentials = ClientCredentials::for_provider(info);
    // Same single-field form as introspection, per RFC 7009 §2.1.
    let request = IntrospectionRequest { token };

    let builder = client.post(revocation_endpoint.as_str());
    let builder = credentials.authenticated_form(builder, &request);

    let response = builder.send().await.map_err(RevocationError::from_reqwest)?;

    let status = response.status();
    if !status.is_success() {
        return Err(RevocationError::BadStatus(status));
    }

    Ok(())
}
