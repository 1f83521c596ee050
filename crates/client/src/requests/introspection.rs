// Copyright 2025, 2026 The oxidc Authors.
//
// SPDX-License-Identifier: MIT
// Please see LICENSE in the repository root for full details.

//! Requests for [Token Introspection].
//!
//! [Token Introspection]: https://www.rfc-editor.org/rfc/rfc7662

use oxidc_types::requests::{IntrospectionRequest, IntrospectionResponse};
use reqwest::header::ACCEPT;

use crate::{
    error::IntrospectionError,
    provider::ProviderInfo,
    requests::token::ClientCredentials,
};

/// Introspect a token at the provider's introspection endpoint.
///
/// The request is always authenticated with `client_secret_basic`,
/// regardless of the methods the provider advertises for its token
/// endpoint.
///
/// # Errors
///
/// Returns an error if the provider has no introspection endpoint, the
/// request fails, or the response is invalid.
#[tracing::instrument(skip_all, fields(provider.id = %info.id))]
pub async fn introspect_token(
    client: &reqwest::Client,
    info: &ProviderInfo,
    token: String,
) -> Result<IntrospectionResponse, IntrospectionError> {
    let introspection_endpoint = info
        .introspection_endpoint
        .as_ref()
        .ok_or(IntrospectionError::NotSupported)?;

    tracing::debug!("Introspecting token...");

    let credentials = ClientCredentials::basic(info);
    let request = IntrospectionRequest { token };

    let builder = client
        .post(introspection_endpoint.as_str())
        .header(ACCEPT, "application/json");
    let builder = credentials.authenticated_form(builder, &request);

    let response = builder
        .send()
        .await
        .map_err(IntrospectionError::from_reqwest)?;

    let status = response.status();
    if !status.is_success() {
        return Err(IntrospectionError::BadStatus(status));
    }

    let body = response
        .text()
        .await
        .map_err(IntrospectionError::from_reqwest)?;

    serde_json::from_str(&body).map_err(IntrospectionError::Parse)
}
