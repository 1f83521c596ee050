// Copyright 2025, 2026 The oxidc Authors.
//
// SPDX-License-Identifier: MIT
// Please see LICENSE in the repository root for full details.

//! Types for [OpenID Connect Discovery].
//!
//! [OpenID Connect Discovery]: https://openid.net/specs/openid-connect-discovery-1_0.html

use std::ops::Deref;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// All errors that can occur when verifying provider metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProviderMetadataVerificationError {
    /// The issuer is missing.
    #[error("issuer is missing")]
    MissingIssuer,

    /// The authorization endpoint is missing.
    #[error("authorization endpoint is missing")]
    MissingAuthorizationEndpoint,

    /// The token endpoint is missing.
    #[error("token endpoint is missing")]
    MissingTokenEndpoint,

    /// The JWKS URI is missing.
    #[error("JWKS URI is missing")]
    MissingJwksUri,
}

/// The metadata describing an OpenID Provider, as returned by its
/// well-known configuration endpoint.
///
/// All fields are optional at the wire level; [`ProviderMetadata::validate`]
/// enforces the fields this library requires.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderMetadata {
    /// URL using the `https` scheme that the OP asserts as its issuer
    /// identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,

    /// URL of the OP's authorization endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_endpoint: Option<Url>,

    /// URL of the OP's token endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_endpoint: Option<Url>,

    /// URL of the OP's JSON Web Key Set document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwks_uri: Option<Url>,

    /// URL of the OP's user info endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub userinfo_endpoint: Option<Url>,

    /// URL of the OP's RFC 7662 token introspection endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub introspection_endpoint: Option<Url>,

    /// URL of the OP's RFC 7009 token revocation endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revocation_endpoint: Option<Url>,

    /// The scope values this OP supports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scopes_supported: Option<Vec<String>>,

    /// The `response_type` values this OP supports.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_types_supported: Option<Vec<String>>,

    /// The client authentication methods supported by the token endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_endpoint_auth_methods_supported: Option<Vec<String>>,

    /// The JWS signing algorithms supported for the ID token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token_signing_alg_values_supported: Option<Vec<String>>,

    /// The PKCE code challenge methods supported by this OP.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_challenge_methods_supported: Option<Vec<String>>,
}

impl ProviderMetadata {
    /// Validate the metadata, enforcing the fields required by the
    /// authorization code flow.
    ///
    /// # Errors
    ///
    /// Returns an error if the issuer, authorization endpoint, token
    /// endpoint or JWKS URI is missing.
    pub fn validate(self) -> Result<VerifiedProviderMetadata, ProviderMetadataVerificationError> {
        if self.issuer.is_none() {
            return Err(ProviderMetadataVerificationError::MissingIssuer);
        }
        if self.authorization_endpoint.is_none() {
            return Err(ProviderMetadataVerificationError::MissingAuthorizationEndpoint);
        }
        if self.token_endpoint.is_none() {
            return Err(ProviderMetadataVerificationError::MissingTokenEndpoint);
        }
        if self.jwks_uri.is_none() {
            return Err(ProviderMetadataVerificationError::MissingJwksUri);
        }

        Ok(VerifiedProviderMetadata { metadata: self })
    }
}

/// Provider metadata that passed [`ProviderMetadata::validate`].
///
/// Dereferences to [`ProviderMetadata`]; the accessors below expose the
/// fields validation guarantees to be present.
#[derive(Debug, Clone)]
pub struct VerifiedProviderMetadata {
    metadata: ProviderMetadata,
}

impl VerifiedProviderMetadata {
    /// The issuer identifier of this provider.
    #[must_use]
    pub fn issuer(&self) -> &str {
        match &self.issuer {
            Some(issuer) => issuer,
            None => unreachable!(),
        }
    }

    /// The authorization endpoint of this provider.
    #[must_use]
    pub fn authorization_endpoint(&self) -> &Url {
        match &self.authorization_endpoint {
            Some(url) => url,
            None => unreachable!(),
        }
    }

    /// The token endpoint of this provider.
    #[must_use]
    pub fn token_endpoint(&self) -> &Url {
        match &self.token_endpoint {
            Some(url) => url,
            None => unreachable!(),
        }
    }

    /// The JWKS URI of this provider.
    #[must_use]
    pub fn jwks_uri(&self) -> &Url {
        match &self.jwks_uri {
            Some(url) => url,
            None => unreachable!(),
        }
    }
}

impl Deref for VerifiedProviderMetadata {
    type Target = ProviderMetadata;

    fn deref(&self) -> &Self::Target {
        &self.metadata
    }
}
