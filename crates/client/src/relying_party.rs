// Copyright 2025, 2026 The oxidc Authors.
//
// SPDX-License-Identifier: MIT
// Please see LICENSE in the repository root for full details.

//! The [`RelyingParty`] facade tying the registry, the endpoint clients
//! and the validators together.

use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use oxidc_types::{
    pkce::AuthorizationRequestPkce, requests::IntrospectionResponse, scope::Scope,
};
use serde_json::Value;
use url::Url;

use crate::{
    error::{Error, IntrospectionError, RegistryError, UserInfoError},
    http,
    modules::{client_modules, ClientModule},
    provider::{ProviderConfig, ProviderHandle, ProviderId, ProviderInfo},
    registry::ProviderRegistry,
    requests::{
        authorization::{self, AuthorizationSession},
        introspection, revocation, token, userinfo,
    },
    tokens::{self, ExpectedNonce, TokenBundle, ValidationOptions},
};

/// A reference to a provider: its id, a handle, or an already-fetched
/// snapshot.
///
/// Operations referencing a provider by snapshot cannot trigger a key
/// refresh; everything else behaves identically.
#[derive(Debug, Clone)]
pub enum ProviderRef {
    /// Reference by opaque id, resolved through the registry.
    Id(ProviderId),

    /// Reference by handle.
    Handle(ProviderHandle),

    /// Reference by snapshot.
    Info(Arc<ProviderInfo>),
}

impl From<ProviderId> for ProviderRef {
    fn from(id: ProviderId) -> Self {
        Self::Id(id)
    }
}

impl From<ProviderHandle> for ProviderRef {
    fn from(handle: ProviderHandle) -> Self {
        Self::Handle(handle)
    }
}

impl From<&ProviderHandle> for ProviderRef {
    fn from(handle: &ProviderHandle) -> Self {
        Self::Handle(handle.clone())
    }
}

impl From<Arc<ProviderInfo>> for ProviderRef {
    fn from(info: Arc<ProviderInfo>) -> Self {
        Self::Info(info)
    }
}

impl From<ProviderInfo> for ProviderRef {
    fn from(info: ProviderInfo) -> Self {
        Self::Info(Arc::new(info))
    }
}

/// A token input: either a full [`TokenBundle`] or a bare access token.
///
/// Inputs are normalized once at the boundary; a bundle contributes its
/// access token and, for user info, the subject of its ID token.
#[derive(Debug, Clone)]
pub enum TokenInput {
    /// A normalized token bundle.
    Bundle(TokenBundle),

    /// A bare access token.
    Bare(String),
}

impl TokenInput {
    /// The access token carried by this input, if any.
    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        match self {
            Self::Bundle(bundle) => bundle.access.as_ref().map(|access| access.token.as_str()),
            Self::Bare(token) => Some(token),
        }
    }

    /// The ID token subject carried by this input, if any.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        match self {
            Self::Bundle(bundle) => bundle.subject(),
            Self::Bare(_) => None,
        }
    }
}

impl From<TokenBundle> for TokenInput {
    fn from(bundle: TokenBundle) -> Self {
        Self::Bundle(bundle)
    }
}

impl From<String> for TokenInput {
    fn from(token: String) -> Self {
        Self::Bare(token)
    }
}

impl From<&str> for TokenInput {
    fn from(token: &str) -> Self {
        Self::Bare(token.to_owned())
    }
}

/// An OpenID Connect relying party.
///
/// Owns the shared HTTP client and the provider registry, and exposes the
/// whole flow: provider registration, redirect URLs, code exchange, token
/// validation, user info, introspection, refresh and revocation.
///
/// End-user calls are single-shot: they do not retry and surface the
/// first outcome. Only the providers' background bootstrap retries, with
/// bounded backoff.
#[derive(Debug, Clone)]
pub struct RelyingParty {
    http_client: reqwest::Client,
    providers: ProviderRegistry,
}

impl Default for RelyingParty {
    fn default() -> Self {
        Self::new()
    }
}

impl RelyingParty {
    /// Create a relying party with the default HTTP client.
    #[must_use]
    pub fn new() -> Self {
        Self::with_client(http::client())
    }

    /// Create a relying party using the given HTTP client for all
    /// provider traffic.
    ///
    /// The client's timeout is the deadline applied to every operation.
    #[must_use]
    pub fn with_client(http_client: reqwest::Client) -> Self {
        Self {
            providers: ProviderRegistry::new(http_client.clone()),
            http_client,
        }
    }

    /// The provider registry of this relying party.
    #[must_use]
    pub fn registry(&self) -> &ProviderRegistry {
        &self.providers
    }

    /// Resolve a provider reference into a snapshot, plus a handle when
    /// the reference allows one.
    async fn resolve(
        &self,
        provider: ProviderRef,
    ) -> Result<(Arc<ProviderInfo>, Option<ProviderHandle>), RegistryError> {
        match provider {
            ProviderRef::Id(id) => {
                let handle = self.providers.get(id).await?;
                Ok((handle.info(), Some(handle)))
            }
            ProviderRef::Handle(handle) => Ok((handle.info(), Some(handle))),
            ProviderRef::Info(info) => Ok((info, None)),
        }
    }

    /// Register a provider and start its bootstrap.
    ///
    /// # Errors
    ///
    /// Returns an error if the given id is already used.
    pub async fn add_provider(
        &self,
        id: Option<ProviderId>,
        config: ProviderConfig,
    ) -> Result<(ProviderId, ProviderHandle), Error> {
        Ok(self.providers.add(id, config).await?)
    }

    /// Remove a provider, shutting its background task down.
    ///
    /// # Errors
    ///
    /// Returns an error if no provider has this id.
    pub async fn remove_provider(&self, id: ProviderId) -> Result<(), Error> {
        Ok(self.providers.remove(id).await?)
    }

    /// Get the current snapshot of a provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot be resolved.
    pub async fn provider_info(
        &self,
        provider: impl Into<ProviderRef>,
    ) -> Result<Arc<ProviderInfo>, Error> {
        let (info, _) = self.resolve(provider.into()).await?;
        Ok(info)
    }

    /// Look up a ready provider by its issuer identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if no ready provider asserts this issuer.
    pub async fn find_by_issuer(&self, issuer: &str) -> Result<ProviderHandle, Error> {
        Ok(self.providers.find_by_issuer(issuer).await?)
    }

    /// Snapshot the registered providers.
    pub async fn list_providers(&self) -> Vec<(ProviderId, ProviderHandle)> {
        self.providers.list().await
    }

    /// Build the URL to redirect the end-user to for authorization.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is not ready.
    pub async fn create_redirect_url(
        &self,
        provider: impl Into<ProviderRef>,
        scopes: Option<Scope>,
        state: Option<&str>,
        nonce: Option<&str>,
        pkce: Option<&AuthorizationRequestPkce>,
    ) -> Result<Url, Error> {
        let (info, _) = self.resolve(provider.into()).await?;
        Ok(authorization::build_redirect_url(
            &info, scopes, state, nonce, pkce,
        )?)
    }

    /// Build the redirect URL for an authorization session.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is not ready.
    pub async fn create_redirect_for_session(
        &self,
        session: &dyn AuthorizationSession,
    ) -> Result<Url, Error> {
        let (info, _) = self.resolve(session.provider().into()).await?;
        Ok(authorization::build_redirect_url_for_session(
            &info, session,
        )?)
    }

    /// Exchange an authorization code for tokens, returning the raw
    /// response body.
    ///
    /// Pass the result to [`RelyingParty::parse_and_validate`] to obtain a
    /// validated [`TokenBundle`].
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the token endpoint answers
    /// with a non-success status.
    pub async fn exchange_code(
        &self,
        provider: impl Into<ProviderRef>,
        code: impl Into<String>,
        code_verifier: Option<String>,
    ) -> Result<String, Error> {
        let (info, _) = self.resolve(provider.into()).await?;
        Ok(token::exchange_code(&self.http_client, &info, code.into(), code_verifier).await?)
    }

    /// Refresh an access token, returning the raw response body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the token endpoint answers
    /// with a non-success status.
    pub async fn refresh_token(
        &self,
        provider: impl Into<ProviderRef>,
        refresh_token: impl Into<String>,
        scopes: Option<Scope>,
    ) -> Result<String, Error> {
        let (info, _) = self.resolve(provider.into()).await?;
        Ok(token::refresh_token(&self.http_client, &info, refresh_token.into(), scopes).await?)
    }

    /// Parse a token endpoint body, or a bare compact JWS, and validate
    /// the embedded ID token against the provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be parsed or a validation
    /// check fails.
    pub async fn parse_and_validate(
        &self,
        provider: impl Into<ProviderRef>,
        raw: &str,
        expected_nonce: ExpectedNonce,
    ) -> Result<TokenBundle, Error> {
        self.parse_and_validate_with_options(
            provider,
            raw,
            expected_nonce,
            &ValidationOptions::default(),
        )
        .await
    }

    /// Like [`RelyingParty::parse_and_validate`], with host policy knobs.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be parsed or a validation
    /// check fails.
    pub async fn parse_and_validate_with_options(
        &self,
        provider: impl Into<ProviderRef>,
        raw: &str,
        expected_nonce: ExpectedNonce,
        options: &ValidationOptions,
    ) -> Result<TokenBundle, Error> {
        let (info, handle) = self.resolve(provider.into()).await?;
        let now = Utc::now();

        let bundle = TokenBundle::extract(raw, now)?;
        let bundle = tokens::validate_bundle(
            bundle,
            &info,
            handle.as_ref(),
            &expected_nonce,
            options,
            now,
        )
        .await?;

        Ok(bundle)
    }

    /// Obtain information about the authenticated end-user.
    ///
    /// When the input is a bundle with an ID token, the response subject
    /// must match the ID token subject; an explicit `expected_subject`
    /// overrides that default.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the response is invalid, or
    /// the subject does not match.
    pub async fn userinfo(
        &self,
        provider: impl Into<ProviderRef>,
        token: impl Into<TokenInput>,
        expected_subject: Option<&str>,
    ) -> Result<HashMap<String, Value>, Error> {
        let token = token.into();
        let access_token = token
            .access_token()
            .ok_or(UserInfoError::MissingAccessToken)?;
        let expected_subject = expected_subject.or_else(|| token.subject());

        let (info, _) = self.resolve(provider.into()).await?;
        Ok(userinfo::fetch_userinfo(&self.http_client, &info, access_token, expected_subject)
            .await?)
    }

    /// Introspect a token at the provider's introspection endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is invalid.
    pub async fn introspect(
        &self,
        provider: impl Into<ProviderRef>,
        token: impl Into<TokenInput>,
    ) -> Result<IntrospectionResponse, Error> {
        let token = token.into();
        let access_token = token
            .access_token()
            .ok_or(IntrospectionError::MissingAccessToken)?
            .to_owned();

        let (info, _) = self.resolve(provider.into()).await?;
        Ok(introspection::introspect_token(&self.http_client, &info, access_token).await?)
    }

    /// Revoke a token at the provider's revocation endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the endpoint answers with
    /// a non-success status.
    pub async fn revoke(
        &self,
        provider: impl Into<ProviderRef>,
        token: impl Into<String>,
    ) -> Result<(), Error> {
        let (info, _) = self.resolve(provider.into()).await?;
        Ok(revocation::revoke_token(&self.http_client, &info, token.into()).await?)
    }

    /// Register a post-authentication module in the process-wide registry.
    ///
    /// Registering a module with an already-used key replaces the prior
    /// binding.
    pub fn register_module(&self, module: Arc<dyn ClientModule>) {
        client_modules().register(module);
    }
}
