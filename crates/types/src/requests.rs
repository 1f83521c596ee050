// Copyright 2025, 2026 The oxidc Authors.
//
// SPDX-License-Identifier: MIT
// Please see LICENSE in the repository root for full details.

//! Request and response bodies for the authorization and token endpoints.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::scope::Scope;

/// The query of an authorization request, per RFC 6749 §4.1.1 and OIDC
/// Core §3.1.2.1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    /// The response type expected from the authorization endpoint. Always
    /// `code` for the authorization code flow.
    pub response_type: String,

    /// The ID obtained when registering the client.
    pub client_id: String,

    /// The URI to redirect the end-user to after the authorization.
    pub redirect_uri: Url,

    /// The scope to authorize.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,

    /// An opaque value used to maintain state between the request and the
    /// callback.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    /// A string to associate the ID token with the client session and
    /// mitigate replay attacks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

/// A request to the token endpoint, per RFC 6749 §3.2.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "grant_type", rename_all = "snake_case")]
pub enum AccessTokenRequest {
    /// A request with the `authorization_code` grant, per RFC 6749 §4.1.3.
    AuthorizationCode(AuthorizationCodeGrant),

    /// A request with the `refresh_token` grant, per RFC 6749 §6.
    RefreshToken(RefreshTokenGrant),
}

/// The body of an `authorization_code` grant request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationCodeGrant {
    /// The authorization code received from the authorization endpoint.
    pub code: String,

    /// The `redirect_uri` that was included in the authorization request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<Url>,

    /// The PKCE code verifier, per RFC 7636 §4.5.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_verifier: Option<String>,
}

/// The body of a `refresh_token` grant request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenGrant {
    /// The refresh token issued to the client.
    pub refresh_token: String,

    /// The scope of the access request.
    ///
    /// Must not include any scope not originally granted, and defaults to
    /// the originally granted scope when omitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
}

/// A successful response from the token endpoint, per RFC 6749 §5.1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    /// The access token issued by the authorization server.
    pub access_token: String,

    /// The type of the access token.
    pub token_type: String,

    /// The lifetime of the access token, in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,

    /// The refresh token, if one was issued.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// The scope of the access token, if it differs from the requested one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,

    /// The ID token asserting the end-user's authentication, as a signed
    /// JWT in its compact form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
}

/// The body of a token introspection request, per RFC 7662 §2.1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntrospectionRequest {
    /// The token to introspect.
    pub token: String,
}

/// A token introspection response, per RFC 7662 §2.2.
///
/// Only `active` is guaranteed to be present; everything else is at the
/// discretion of the authorization server, with unrecognized members kept
/// in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntrospectionResponse {
    /// Whether the introspected token is currently active.
    pub active: bool,

    /// The scope associated with the token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,

    /// The identifier of the client the token was issued to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// A human-readable identifier of the resource owner.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// The type of the token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,

    /// When the token expires, as seconds since the Unix epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// When the token was issued, as seconds since the Unix epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// When the token becomes valid, as seconds since the Unix epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    /// The subject of the token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// The intended audience of the token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<Value>,

    /// The issuer of the token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// An identifier for the token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,

    /// Any other members of the response.
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}
