// Copyright 2025, 2026 The oxidc Authors.
//
// SPDX-License-Identifier: MIT
// Please see LICENSE in the repository root for full details.

//! Parsing and validation of token endpoint responses.
//!
//! [`TokenBundle::extract`] normalizes the raw body of a token endpoint
//! response, or a bare compact JWS, into one bundle. [`validate_bundle`]
//! then checks the bundled ID token against a provider, per OIDC Core
//! §3.1.3.7.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::Algorithm;
use oxidc_types::scope::Scope;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::ValidationError,
    jose::{self, JwsHeader},
    provider::{ProviderHandle, ProviderInfo},
};

/// The largest tolerated `iat` skew into the future.
const MAX_IAT_SKEW_MINS: i64 = 5;

/// An ID token, decoded but not necessarily verified.
#[derive(Debug, Clone)]
pub struct IdTokenPart {
    /// The compact JWS the token arrived as.
    pub token: String,

    /// The decoded protected header.
    pub header: JwsHeader,

    /// The decoded claims.
    pub claims: HashMap<String, Value>,
}

/// An access token and its expiry.
#[derive(Debug, Clone)]
pub struct AccessTokenPart {
    /// The opaque access token.
    pub token: String,

    /// When the token expires, derived from `expires_in`.
    pub expires_at: Option<DateTime<Utc>>,
}

/// A refresh token.
#[derive(Debug, Clone)]
pub struct RefreshTokenPart {
    /// The opaque refresh token.
    pub token: String,
}

/// The normalized contents of a token endpoint response.
///
/// Every attribute is optional; which ones are present depends on the
/// grant that produced the response.
#[derive(Debug, Clone, Default)]
pub struct TokenBundle {
    /// The ID token, decoded without signature verification.
    pub id: Option<IdTokenPart>,

    /// The access token.
    pub access: Option<AccessTokenPart>,

    /// The refresh token.
    pub refresh: Option<RefreshTokenPart>,

    /// The granted scope, when it differs from the requested one.
    pub scope: Option<Scope>,

    /// The type of the access token.
    pub token_type: Option<String>,
}

/// The permissive shape of a token endpoint body; which fields are present
/// depends on the grant.
#[derive(Deserialize)]
struct TokenEndpointBody {
    access_token: Option<String>,
    token_type: Option<String>,
    expires_in: Option<u64>,
    refresh_token: Option<String>,
    scope: Option<Scope>,
    id_token: Option<String>,
}

impl TokenBundle {
    /// Normalize a raw token endpoint body, or a bare compact JWS, into a
    /// bundle.
    ///
    /// The ID token is decoded here but its signature is not verified yet;
    /// that is [`validate_bundle`]'s job.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is neither a token endpoint JSON
    /// object nor a compact JWS, or if an embedded ID token cannot be
    /// decoded.
    pub fn extract(raw: &str, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        let raw = raw.trim();

        if raw.starts_with('{') {
            let body: TokenEndpointBody =
                serde_json::from_str(raw).map_err(|_| ValidationError::Malformed)?;
            return Self::from_body(body, now);
        }

        // A bare compact JWS is treated as an ID token on its own.
        let (header, claims) = jose::decode_parts(raw)?;
        Ok(Self {
            id: Some(IdTokenPart {
                token: raw.to_owned(),
                header,
                claims,
            }),
            ..Self::default()
        })
    }

    fn from_body(body: TokenEndpointBody, now: DateTime<Utc>) -> Result<Self, ValidationError> {
        let id = body
            .id_token
            .map(|token| {
                let (header, claims) = jose::decode_parts(&token)?;
                Ok(IdTokenPart {
                    token,
                    header,
                    claims,
                })
            })
            .transpose()?;

        let access = body.access_token.map(|token| AccessTokenPart {
            token,
            expires_at: body
                .expires_in
                .and_then(|secs| i64::try_from(secs).ok())
                .map(|secs| now + Duration::seconds(secs)),
        });

        Ok(Self {
            id,
            access,
            refresh: body.refresh_token.map(|token| RefreshTokenPart { token }),
            scope: body.scope,
            token_type: body.token_type,
        })
    }

    /// The subject of the bundled ID token, if any.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.id
            .as_ref()?
            .claims
            .get("sub")
            .and_then(Value::as_str)
    }
}

/// What to check the ID token `nonce` claim against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ExpectedNonce {
    /// Do not check the nonce.
    #[default]
    Ignore,

    /// Any nonce is accepted, but one must be present.
    Any,

    /// The nonce must be present and equal to the given value.
    Equals(String),
}

impl From<Option<&str>> for ExpectedNonce {
    fn from(nonce: Option<&str>) -> Self {
        match nonce {
            Some(nonce) => Self::Equals(nonce.to_owned()),
            None => Self::Ignore,
        }
    }
}

/// Host policy knobs for ID token validation.
#[derive(Debug, Clone)]
pub struct ValidationOptions {
    /// The clock skew tolerated on `exp` and `nbf`.
    pub leeway: Duration,

    /// The `acr` value the token must assert, when demanded by the host.
    pub expected_acr: Option<String>,

    /// The `auth_time` the token must assert, when demanded by the host.
    pub expected_auth_time: Option<i64>,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            leeway: Duration::zero(),
            expected_acr: None,
            expected_auth_time: None,
        }
    }
}

fn claim_str<'c>(claims: &'c HashMap<String, Value>, name: &str) -> Option<&'c str> {
    claims.get(name).and_then(Value::as_str)
}

fn claim_i64(claims: &HashMap<String, Value>, name: &str) -> Option<i64> {
    claims.get(name).and_then(Value::as_i64)
}

/// Check that `aud` contains the client, and that `azp` backs it up when
/// the audience is shared.
fn check_audience(claims: &HashMap<String, Value>, client_id: &str) -> Result<(), ValidationError> {
    match claims.get("aud") {
        Some(Value::String(aud)) => {
            if aud != client_id {
                return Err(ValidationError::BadAudience);
            }
        }
        Some(Value::Array(auds)) => {
            if !auds.iter().any(|aud| aud.as_str() == Some(client_id)) {
                return Err(ValidationError::BadAudience);
            }

            if auds.len() > 1 && claim_str(claims, "azp") != Some(client_id) {
                return Err(ValidationError::BadAudience);
            }
        }
        _ => return Err(ValidationError::BadAudience),
    }

    Ok(())
}

/// Validate the ID token of a bundle against a provider.
///
/// The checks of OIDC Core §3.1.3.7 are applied in order: issuer,
/// audience (with `azp` when the audience is shared), signature against
/// the provider JWKS selected by the header `kid`, signing algorithm,
/// expiry, issuance time, and nonce. When the `kid` is not in the cached
/// key set and a handle is available, the keys are refreshed once and the
/// lookup retried.
///
/// A bundle without an ID token passes through unchanged; refresh
/// responses legitimately omit it.
///
/// This call never retries network operations besides that single key
/// refresh, and surfaces the first failure.
///
/// # Errors
///
/// Returns the first failed check as a [`ValidationError`].
#[tracing::instrument(skip_all, fields(provider.id = %info.id))]
pub async fn validate_bundle(
    bundle: TokenBundle,
    info: &ProviderInfo,
    handle: Option<&ProviderHandle>,
    expected_nonce: &ExpectedNonce,
    options: &ValidationOptions,
    now: DateTime<Utc>,
) -> Result<TokenBundle, ValidationError> {
    let Some(id) = &bundle.id else {
        return Ok(bundle);
    };

    tracing::debug!("Validating ID token...");

    // Issuer must match the provider.
    let issuer = claim_str(&id.claims, "iss").ok_or(ValidationError::Malformed)?;
    if info.issuer.as_deref() != Some(issuer) {
        return Err(ValidationError::BadIssuer);
    }

    // Audience must include this client.
    check_audience(&id.claims, &info.client_id)?;

    // Unsigned tokens are never accepted, and the algorithm must be one
    // the provider declared.
    if id.header.alg.eq_ignore_ascii_case("none") {
        return Err(ValidationError::BadAlgorithm);
    }
    if !info.id_token_signing_alg_values_supported.is_empty()
        && !info
            .id_token_signing_alg_values_supported
            .iter()
            .any(|alg| alg == &id.header.alg)
    {
        return Err(ValidationError::BadAlgorithm);
    }
    let algorithm: Algorithm = id
        .header
        .alg
        .parse()
        .map_err(|_| ValidationError::BadAlgorithm)?;

    // Signature must verify against a provider key, selected by `kid`.
    // An unknown `kid` triggers one key refresh before giving up.
    let kid = id.header.kid.as_deref();
    let key = match jose::find_key(&info.jwks, kid) {
        Some(key) => key.clone(),
        None => {
            let Some(handle) = handle else {
                return Err(ValidationError::UnknownKey);
            };

            tracing::debug!("ID token key not in the cached JWKS, refreshing");
            handle.refresh_keys_and_wait().await;

            let refreshed = handle.info();
            jose::find_key(&refreshed.jwks, kid)
                .cloned()
                .ok_or(ValidationError::UnknownKey)?
        }
    };
    jose::verify_signature(&id.token, &key, algorithm)?;

    // `exp` must be in the future.
    let exp = claim_i64(&id.claims, "exp").ok_or(ValidationError::Malformed)?;
    if exp <= (now - options.leeway).timestamp() {
        return Err(ValidationError::Expired);
    }

    // `iat` must be present, and not too far in the future.
    let iat = claim_i64(&id.claims, "iat").ok_or(ValidationError::Malformed)?;
    if iat > (now + Duration::minutes(MAX_IAT_SKEW_MINS)).timestamp() {
        return Err(ValidationError::NotYetValid);
    }

    // `nbf` is optional but binding when present.
    if let Some(nbf) = claim_i64(&id.claims, "nbf") {
        if nbf > (now + options.leeway).timestamp() {
            return Err(ValidationError::NotYetValid);
        }
    }

    match expected_nonce {
        ExpectedNonce::Ignore => {}
        ExpectedNonce::Any => {
            if claim_str(&id.claims, "nonce").is_none() {
                return Err(ValidationError::BadNonce);
            }
        }
        ExpectedNonce::Equals(expected) => {
            if claim_str(&id.claims, "nonce") != Some(expected.as_str()) {
                return Err(ValidationError::BadNonce);
            }
        }
    }

    if let Some(expected_acr) = &options.expected_acr {
        if claim_str(&id.claims, "acr") != Some(expected_acr.as_str()) {
            return Err(ValidationError::WrongAcr);
        }
    }

    if let Some(expected_auth_time) = options.expected_auth_time {
        if claim_i64(&id.claims, "auth_time") != Some(expected_auth_time) {
            return Err(ValidationError::WrongAuthTime);
        }
    }

    Ok(bundle)
}
