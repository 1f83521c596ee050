// Copyright 2025, 2026 The oxidc Authors.
//
// SPDX-License-Identifier: MIT
// Please see LICENSE in the repository root for full details.

//! Requests for obtaining [Claims] about an end-user.
//!
//! [Claims]: https://openid.net/specs/openid-connect-core-1_0.html#Claims

use std::collections::HashMap;

use reqwest::header::ACCEPT;
use serde_json::Value;

use crate::{error::UserInfoError, provider::ProviderInfo};

/// Obtain information about an authenticated end-user.
///
/// Returns the map of claims asserted by the provider. The response must
/// carry a `sub` claim; when `expected_subject` is given, it must match.
///
/// # Errors
///
/// Returns an error if the provider has no user info endpoint, the request
/// fails, the response is invalid, or the subject does not match.
#[tracing::instrument(skip_all, fields(provider.id = %info.id))]
pub async fn fetch_userinfo(
    client: &reqwest::Client,
    info: &ProviderInfo,
    access_token: &str,
    expected_subject: Option<&str>,
) -> Result<HashMap<String, Value>, UserInfoError> {
    let userinfo_endpoint = info
        .userinfo_endpoint
        .as_ref()
        .ok_or(UserInfoError::NotSupported)?;

    tracing::debug!("Obtaining user info...");

    let response = client
        .get(userinfo_endpoint.as_str())
        .bearer_auth(access_token)
        .header(ACCEPT, "application/json")
        .send()
        .await
        .map_err(UserInfoError::from_reqwest)?;

    let status = response.status();
    if !status.is_success() {
        return Err(UserInfoError::BadStatus(status));
    }

    let body = response.text().await.map_err(UserInfoError::from_reqwest)?;
    let claims: HashMap<String, Value> =
        serde_json::from_str(&body).map_err(UserInfoError::Parse)?;

    let subject = claims
        .get("sub")
        .and_then(Value::as_str)
        .ok_or(UserInfoError::BadSubject)?;

    if let Some(expected) = expected_subject {
        if subject != expected {
            return Err(UserInfoError::BadSubject);
        }
    }

    Ok(claims)
}
