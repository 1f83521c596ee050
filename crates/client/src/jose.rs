// Copyright 2025, 2026 The oxidc Authors.
//
// SPDX-License-Identifier: MIT
// Please see LICENSE in the repository root for full details.

//! Requests and methods related to JSON Object Signing and Encryption.

use std::collections::{HashMap, HashSet};

use base64ct::{Base64UrlUnpadded, Encoding};
use jsonwebtoken::{
    errors::ErrorKind,
    jwk::{Jwk, JwkSet},
    Algorithm, DecodingKey, Validation,
};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::error::{JwksError, ValidationError};

/// Fetch a JWKS at the given URL.
///
/// # Errors
///
/// Returns an error if the request fails, the document is invalid, or the
/// key set is empty.
#[tracing::instrument(skip_all, fields(jwks_uri = %jwks_uri))]
pub async fn fetch_jwks(client: &reqwest::Client, jwks_uri: &Url) -> Result<JwkSet, JwksError> {
    tracing::debug!("Fetching JWKS...");

    let response = client
        .get(jwks_uri.as_str())
        .send()
        .await
        .map_err(JwksError::from_reqwest)?;

    let status = response.status();
    if !status.is_success() {
        return Err(JwksError::BadStatus(status));
    }

    let body = response.text().await.map_err(JwksError::from_reqwest)?;
    let jwks: JwkSet = serde_json::from_str(&body).map_err(JwksError::Parse)?;

    if jwks.keys.is_empty() {
        return Err(JwksError::EmptyKeySet);
    }

    Ok(jwks)
}

/// The protected header of a compact JWS.
///
/// Decoded separately from [`jsonwebtoken::Header`] so that tokens with an
/// unknown or `none` algorithm can still be inspected and rejected with a
/// precise error.
#[derive(Debug, Clone, Deserialize)]
pub struct JwsHeader {
    /// The signing algorithm of the token.
    pub alg: String,

    /// The ID of the key used to sign the token.
    #[serde(default)]
    pub kid: Option<String>,

    /// The media type of the token.
    #[serde(default)]
    pub typ: Option<String>,
}

/// Decode the header and payload of a compact JWS, without verifying its
/// signature.
///
/// # Errors
///
/// Returns [`ValidationError::Malformed`] if the token is not a compact JWS
/// with a JSON object payload.
pub fn decode_parts(token: &str) -> Result<(JwsHeader, HashMap<String, Value>), ValidationError> {
    let mut dots = token.match_indices('.').map(|(at, _)| at);
    let (Some(first), Some(second), None) = (dots.next(), dots.next(), dots.next()) else {
        return Err(ValidationError::Malformed);
    };

    let header = &token[..first];
    let payload = &token[first + 1..second];

    let header = Base64UrlUnpadded::decode_vec(header).map_err(|_| ValidationError::Malformed)?;
    let header: JwsHeader =
        serde_json::from_slice(&header).map_err(|_| ValidationError::Malformed)?;

    let payload = Base64UrlUnpadded::decode_vec(payload).map_err(|_| ValidationError::Malformed)?;
    let claims: HashMap<String, Value> =
        serde_json::from_slice(&payload).map_err(|_| ValidationError::Malformed)?;

    Ok((header, claims))
}

/// Select the key to verify a token with.
///
/// A `kid` selects the matching key. Without a `kid`, the key set must
/// contain exactly one key.
#[must_use]
pub fn find_key<'a>(jwks: &'a JwkSet, kid: Option<&str>) -> Option<&'a Jwk> {
    match kid {
        Some(kid) => jwks.find(kid),
        None if jwks.keys.len() == 1 => jwks.keys.first(),
        None => None,
    }
}

/// Verify the signature of a compact JWS against the given key.
///
/// Only the signature is checked here; claims are validated by the caller.
///
/// # Errors
///
/// Returns an error if the key cannot be used or the signature is invalid.
pub fn verify_signature(token: &str, key: &Jwk, alg: Algorithm) -> Result<(), ValidationError> {
    let decoding_key = DecodingKey::from_jwk(key).map_err(|_| ValidationError::BadSignature)?;

    let mut validation = Validation::new(alg);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::new();

    jsonwebtoken::decode::<HashMap<String, Value>>(token, &decoding_key, &validation)
        .map(|_| ())
        .map_err(|error| match error.kind() {
            ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
                ValidationError::Malformed
            }
            _ => ValidationError::BadSignature,
        })
}
