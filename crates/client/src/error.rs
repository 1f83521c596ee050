// Copyright 2025, 2026 The oxidc Authors.
//
// SPDX-License-Identifier: MIT
// Please see LICENSE in the repository root for full details.

//! The error types used in this crate.

use oxidc_types::{oidc::ProviderMetadataVerificationError, pkce::CodeChallengeError};
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::provider::ProviderId;

/// All possible errors when using this crate.
#[derive(Debug, Error)]
#[error(transparent)]
pub enum Error {
    /// An error occurred in the provider registry.
    Registry(#[from] RegistryError),

    /// An error occurred fetching provider metadata.
    Discovery(#[from] DiscoveryError),

    /// An error occurred fetching the provider JWKS.
    Jwks(#[from] JwksError),

    /// An error occurred building the authorization URL.
    Authorization(#[from] AuthorizationError),

    /// An error occurred talking to the token endpoint.
    Token(#[from] TokenRequestError),

    /// An error occurred parsing or validating a token response.
    Validation(#[from] ValidationError),

    /// An error occurred requesting user info.
    UserInfo(#[from] UserInfoError),

    /// An error occurred introspecting a token.
    Introspection(#[from] IntrospectionError),

    /// An error occurred revoking a token.
    Revocation(#[from] RevocationError),
}

/// All possible errors when operating the provider registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A provider with the given id is already registered.
    #[error("provider id {0} is already used")]
    IdAlreadyUsed(ProviderId),

    /// No provider matches the given id or issuer.
    #[error("provider not found")]
    NotFound,
}

/// All possible errors when fetching provider metadata.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// An error occurred sending the request.
    #[error("fetching provider metadata failed")]
    Transport(#[source] reqwest::Error),

    /// The request timed out.
    #[error("fetching provider metadata timed out")]
    Timeout,

    /// The configuration endpoint returned an unexpected status code.
    #[error("configuration endpoint returned HTTP {0}")]
    BadStatus(StatusCode),

    /// The metadata document could not be parsed.
    #[error("failed to parse provider metadata")]
    Parse(#[source] serde_json::Error),

    /// The metadata document is missing required fields.
    #[error(transparent)]
    Validation(#[from] ProviderMetadataVerificationError),
}

impl DiscoveryError {
    pub(crate) fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(error)
        }
    }
}

/// All possible errors when fetching a provider JWKS.
#[derive(Debug, Error)]
pub enum JwksError {
    /// An error occurred sending the request.
    #[error("fetching the JWKS failed")]
    Transport(#[source] reqwest::Error),

    /// The request timed out.
    #[error("fetching the JWKS timed out")]
    Timeout,

    /// The JWKS URI returned an unexpected status code.
    #[error("JWKS URI returned HTTP {0}")]
    BadStatus(StatusCode),

    /// The JWKS document could not be parsed.
    #[error("failed to parse the JWKS")]
    Parse(#[source] serde_json::Error),

    /// The JWKS document contains no keys.
    #[error("the JWKS contains no keys")]
    EmptyKeySet,
}

impl JwksError {
    pub(crate) fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(error)
        }
    }
}

/// All possible errors when building the authorization URL.
#[derive(Debug, Error)]
pub enum AuthorizationError {
    /// The provider has not finished its bootstrap yet.
    #[error("provider is not ready")]
    ProviderNotReady,

    /// An error occurred constructing the PKCE code challenge.
    #[error(transparent)]
    Pkce(#[from] CodeChallengeError),

    /// An error occurred serializing the request query.
    #[error(transparent)]
    UrlEncoded(#[from] serde_urlencoded::ser::Error),
}

/// An error body returned by the OAuth 2.0 provider, per RFC 6749 §5.2.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuth2ErrorResponse {
    /// The error code.
    pub error: String,

    /// Human-readable text providing additional information.
    pub error_description: Option<String>,
}

impl std::fmt::Display for OAuth2ErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.error)?;

        if let Some(error_description) = &self.error_description {
            write!(f, ": {error_description}")?;
        }

        Ok(())
    }
}

/// All possible errors when requesting the token endpoint.
#[derive(Debug, Error)]
pub enum TokenRequestError {
    /// The provider has not finished its bootstrap yet.
    #[error("provider is not ready")]
    ProviderNotReady,

    /// An error occurred sending the request.
    #[error("request to the token endpoint failed")]
    Transport(#[source] reqwest::Error),

    /// The request timed out.
    #[error("request to the token endpoint timed out")]
    Timeout,

    /// The token endpoint returned an unexpected status code.
    #[error("token endpoint returned HTTP {status}")]
    Http {
        /// The status code of the response.
        status: StatusCode,

        /// The raw response body.
        body: String,

        /// The OAuth 2.0 error body, if the response carried one.
        error: Option<OAuth2ErrorResponse>,
    },
}

impl TokenRequestError {
    pub(crate) fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(error)
        }
    }
}

/// All possible errors when parsing and validating a token response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The ID token issuer does not match the provider issuer.
    #[error("wrong ID token issuer")]
    BadIssuer,

    /// The ID token audience does not include this client.
    #[error("wrong ID token audience")]
    BadAudience,

    /// The ID token signature could not be verified.
    #[error("invalid ID token signature")]
    BadSignature,

    /// No key in the provider JWKS matches the ID token header.
    #[error("no JWKS key matches the ID token key ID")]
    UnknownKey,

    /// The ID token signing algorithm is not allowed.
    #[error("unacceptable ID token signing algorithm")]
    BadAlgorithm,

    /// The ID token has expired.
    #[error("ID token has expired")]
    Expired,

    /// The ID token is not valid yet.
    #[error("ID token is not valid yet")]
    NotYetValid,

    /// The ID token nonce does not match the expected one.
    #[error("wrong ID token nonce")]
    BadNonce,

    /// The token or token response is malformed.
    #[error("malformed token response")]
    Malformed,

    /// The `acr` claim does not match the value demanded by the host.
    #[error("wrong authentication context class reference")]
    WrongAcr,

    /// The `auth_time` claim does not match the value demanded by the host.
    #[error("wrong authentication time")]
    WrongAuthTime,
}

/// All possible errors when requesting user info.
#[derive(Debug, Error)]
pub enum UserInfoError {
    /// The provider does not advertise a user info endpoint.
    #[error("provider has no userinfo endpoint")]
    NotSupported,

    /// The token input carries no access token.
    #[error("no access token to authorize the request with")]
    MissingAccessToken,

    /// An error occurred sending the request.
    #[error("request to the userinfo endpoint failed")]
    Transport(#[source] reqwest::Error),

    /// The request timed out.
    #[error("request to the userinfo endpoint timed out")]
    Timeout,

    /// The userinfo endpoint returned an unexpected status code.
    #[error("userinfo endpoint returned HTTP {0}")]
    BadStatus(StatusCode),

    /// The response body could not be parsed.
    #[error("failed to parse the userinfo response")]
    Parse(#[source] serde_json::Error),

    /// The `sub` of the response is missing or does not match the expected
    /// subject.
    #[error("wrong userinfo subject")]
    BadSubject,
}

impl UserInfoError {
    pub(crate) fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(error)
        }
    }
}

/// All possible errors when introspecting a token.
#[derive(Debug, Error)]
pub enum IntrospectionError {
    /// The provider does not advertise an introspection endpoint.
    #[error("provider has no introspection endpoint")]
    NotSupported,

    /// The token input carries no access token.
    #[error("no access token to introspect")]
    MissingAccessToken,

    /// An error occurred sending the request.
    #[error("request to the introspection endpoint failed")]
    Transport(#[source] reqwest::Error),

    /// The request timed out.
    #[error("request to the introspection endpoint timed out")]
    Timeout,

    /// The introspection endpoint returned an unexpected status code.
    #[error("introspection endpoint returned HTTP {0}")]
    BadStatus(StatusCode),

    /// The response body could not be parsed.
    #[error("failed to parse the introspection response")]
    Parse(#[source] serde_json::Error),
}

impl IntrospectionError {
    pub(crate) fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(error)
        }
    }
}

/// All possible errors when revoking a token.
#[derive(Debug, Error)]
pub enum RevocationError {
    /// The provider does not advertise a revocation endpoint.
    #[error("provider has no revocation endpoint")]
    NotSupported,

    /// An error occurred sending the request.
    #[error("request to the revocation endpoint failed")]
    Transport(#[source] reqwest::Error),

    /// The request timed out.
    #[error("request to the revocation endpoint timed out")]
    Timeout,

    /// The revocation endpoint returned an unexpected status code.
    #[error("revocation endpoint returned HTTP {0}")]
    BadStatus(StatusCode),
}

impl RevocationError {
    pub(crate) fn from_reqwest(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(error)
        }
    }
}
