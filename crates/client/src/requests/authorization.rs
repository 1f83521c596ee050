// Copyright 2025, 2026 The oxidc Authors.
//
// SPDX-License-Identifier: MIT
// Please see LICENSE in the repository root for full details.

//! Building the redirect URL for the [Authorization Code flow].
//!
//! [Authorization Code flow]: https://openid.net/specs/openid-connect-core-1_0.html#CodeFlowAuth

use base64ct::{Base64UrlUnpadded, Encoding};
use oxidc_types::{
    pkce::{AuthorizationRequestPkce, CodeChallengeError, CodeChallengeMethod, PkcePair},
    requests::AuthorizationRequest,
    scope::Scope,
};
use rand::Rng;
use serde::Serialize;
use url::Url;

use crate::{
    error::AuthorizationError,
    provider::{ProviderId, ProviderInfo},
};

/// The authorization request with the optional PKCE parameters flattened
/// into its query.
#[derive(Clone, Serialize)]
struct FullAuthorizationRequest<'a> {
    #[serde(flatten)]
    inner: AuthorizationRequest,

    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pkce: Option<&'a AuthorizationRequestPkce>,
}

/// Build the URL to redirect the end-user to for authorization.
///
/// The query carries `response_type=code`, the client id and the redirect
/// URI, plus `state`, `nonce`, `scope` and the PKCE challenge when the
/// corresponding input is non-empty. When no scopes are given, the
/// provider's default request scopes are used.
///
/// # Errors
///
/// Returns an error if the provider snapshot is not ready, or if the query
/// cannot be serialized.
#[tracing::instrument(skip_all, fields(provider.id = %info.id))]
pub fn build_redirect_url(
    info: &ProviderInfo,
    scopes: Option<Scope>,
    state: Option<&str>,
    nonce: Option<&str>,
    pkce: Option<&AuthorizationRequestPkce>,
) -> Result<Url, AuthorizationError> {
    let authorization_endpoint = match &info.authorization_endpoint {
        Some(url) if info.ready => url.clone(),
        _ => return Err(AuthorizationError::ProviderNotReady),
    };

    tracing::debug!(scope = ?scopes, "Authorizing...");

    let scope = scopes.unwrap_or_else(|| info.request_scopes.clone());

    let inner = AuthorizationRequest {
        response_type: "code".to_owned(),
        client_id: info.client_id.clone(),
        redirect_uri: info.local_endpoint.clone(),
        scope: (!scope.is_empty()).then_some(scope),
        state: state.filter(|s| !s.is_empty()).map(ToOwned::to_owned),
        nonce: nonce.filter(|s| !s.is_empty()).map(ToOwned::to_owned),
    };

    let query = serde_urlencoded::to_string(FullAuthorizationRequest { inner, pkce })?;

    let mut authorization_url = authorization_endpoint;

    // Add our parameters to the query, because the URL might already have
    // one.
    let mut full_query = authorization_url
        .query()
        .map(ToOwned::to_owned)
        .unwrap_or_default();
    if !full_query.is_empty() {
        full_query.push('&');
    }
    full_query.push_str(&query);

    authorization_url.set_query(Some(&full_query));

    Ok(authorization_url)
}

/// The session data consumed by
/// [`RelyingParty::create_redirect_for_session`].
///
/// The session id doubles as the `state` parameter, tying the callback
/// back to the session.
///
/// [`RelyingParty::create_redirect_for_session`]: crate::RelyingParty::create_redirect_for_session
pub trait AuthorizationSession {
    /// The provider this session authorizes against.
    fn provider(&self) -> ProviderId;

    /// The session id, sent as the `state` parameter.
    fn session_id(&self) -> &str;

    /// The scopes to authorize, or `None` for the provider defaults.
    fn scopes(&self) -> Option<Scope>;

    /// The nonce to bind the ID token to this session.
    fn nonce(&self) -> Option<String>;

    /// The PKCE pair of this session, if it uses PKCE.
    fn pkce(&self) -> Option<PkcePair>;
}

/// Build the redirect URL from an authorization session.
///
/// # Errors
///
/// Returns an error if the provider snapshot is not ready, or if the query
/// cannot be serialized.
pub fn build_redirect_url_for_session(
    info: &ProviderInfo,
    session: &dyn AuthorizationSession,
) -> Result<Url, AuthorizationError> {
    let pkce = session.pkce();
    let challenge = pkce.as_ref().map(PkcePair::authorization_request);

    build_redirect_url(
        info,
        session.scopes(),
        Some(session.session_id()),
        session.nonce().as_deref(),
        challenge.as_ref(),
    )
}

/// Generate a fresh S256 PKCE pair with a 256-bit random verifier.
///
/// # Errors
///
/// Never fails in practice; the generated verifier always satisfies the
/// RFC 7636 grammar.
pub fn generate_pkce(rng: &mut impl Rng) -> Result<PkcePair, CodeChallengeError> {
    let mut verifier = [0u8; 32];
    rng.fill(&mut verifier);

    let verifier = Base64UrlUnpadded::encode_string(&verifier);
    PkcePair::from_verifier(CodeChallengeMethod::S256, &verifier)
}
