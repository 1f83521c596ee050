// Copyright 2025, 2026 The oxidc Authors.
//
// SPDX-License-Identifier: MIT
// Please see LICENSE in the repository root for full details.

//! Per-provider state and its owning background task.
//!
//! Every registered provider is driven by one task that performs discovery,
//! fetches the provider JWKS, and serves key-refresh commands. The task
//! owns the mutable state; everyone else observes it through cheap
//! [`ProviderInfo`] snapshots published on a watch channel. A snapshot with
//! `ready == true` always carries the endpoints and the non-empty key set
//! that produced that readiness.

use std::{fmt, str::FromStr, sync::Arc, time::Instant};

use chrono::{DateTime, Utc};
use jsonwebtoken::jwk::JwkSet;
use oxidc_types::{oidc::VerifiedProviderMetadata, scope::Scope};
use rand::Rng;
use serde::Deserialize;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::Instrument;
use ulid::Ulid;
use url::Url;

use crate::{jose, requests::discovery};

/// The minimum delay between two command-triggered JWKS fetches.
const KEYS_REFRESH_COOLDOWN: std::time::Duration = std::time::Duration::from_secs(10);

/// An opaque, unique identifier for a registered provider.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ProviderId(Ulid);

impl ProviderId {
    /// Generate a fresh provider id.
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for ProviderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for ProviderId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<Ulid> for ProviderId {
    fn from(id: Ulid) -> Self {
        Self(id)
    }
}

/// The host-supplied configuration of a provider.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// A human-readable name for the provider.
    pub name: String,

    /// A human-readable description of the provider.
    #[serde(default)]
    pub description: String,

    /// The ID obtained when registering the client with the provider.
    pub client_id: String,

    /// The secret obtained when registering the client with the provider.
    pub client_secret: String,

    /// The URL of the provider's well-known configuration document.
    pub config_endpoint: Url,

    /// The local endpoint the provider redirects back to after
    /// authorization.
    pub local_endpoint: Url,

    /// The scopes requested by default when none are given explicitly.
    #[serde(default)]
    pub request_scopes: Scope,
}

/// The lifecycle state of a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderState {
    /// The configuration document is being fetched.
    FetchingConfig,

    /// Fetching the configuration document failed; a retry is scheduled.
    ConfigFailed,

    /// The JWKS is being fetched.
    FetchingKeys,

    /// Fetching the JWKS failed; a retry is scheduled.
    KeysFailed,

    /// Discovery and key fetch succeeded; the provider is usable.
    Ready,
}

impl fmt::Display for ProviderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FetchingConfig => f.write_str("fetching-config"),
            Self::ConfigFailed => f.write_str("config-failed"),
            Self::FetchingKeys => f.write_str("fetching-keys"),
            Self::KeysFailed => f.write_str("keys-failed"),
            Self::Ready => f.write_str("ready"),
        }
    }
}

/// A consistent snapshot of a provider's configuration and discovered
/// state.
#[derive(Debug, Clone)]
pub struct ProviderInfo {
    /// The id of the provider.
    pub id: ProviderId,

    /// A human-readable name for the provider.
    pub name: String,

    /// A human-readable description of the provider.
    pub description: String,

    /// The ID obtained when registering the client with the provider.
    pub client_id: String,

    /// The secret obtained when registering the client with the provider.
    pub client_secret: String,

    /// The URL of the provider's well-known configuration document.
    pub config_endpoint: Url,

    /// The local endpoint the provider redirects back to.
    pub local_endpoint: Url,

    /// The scopes requested by default.
    pub request_scopes: Scope,

    /// The lifecycle state of the provider.
    pub state: ProviderState,

    /// Whether discovery and key fetch have completed.
    pub ready: bool,

    /// The issuer identifier asserted by the provider.
    pub issuer: Option<String>,

    /// The provider's authorization endpoint.
    pub authorization_endpoint: Option<Url>,

    /// The provider's token endpoint.
    pub token_endpoint: Option<Url>,

    /// The provider's user info endpoint.
    pub userinfo_endpoint: Option<Url>,

    /// The provider's token introspection endpoint.
    pub introspection_endpoint: Option<Url>,

    /// The provider's token revocation endpoint.
    pub revocation_endpoint: Option<Url>,

    /// The URL of the provider's JWKS document.
    pub jwks_uri: Option<Url>,

    /// The provider's current key set.
    pub jwks: JwkSet,

    /// The client authentication methods supported by the token endpoint.
    pub token_endpoint_auth_methods_supported: Vec<String>,

    /// The JWS signing algorithms the provider may use for ID tokens.
    pub id_token_signing_alg_values_supported: Vec<String>,

    /// The scopes the provider supports.
    pub scopes_supported: Option<Vec<String>>,

    /// When the JWKS was last fetched successfully.
    pub last_refresh: Option<DateTime<Utc>>,
}

impl ProviderInfo {
    fn from_config(id: ProviderId, config: ProviderConfig) -> Self {
        Self {
            id,
            name: config.name,
            description: config.description,
            client_id: config.client_id,
            client_secret: config.client_secret,
            config_endpoint: config.config_endpoint,
            local_endpoint: config.local_endpoint,
            request_scopes: config.request_scopes,
            state: ProviderState::FetchingConfig,
            ready: false,
            issuer: None,
            authorization_endpoint: None,
            token_endpoint: None,
            userinfo_endpoint: None,
            introspection_endpoint: None,
            revocation_endpoint: None,
            jwks_uri: None,
            jwks: JwkSet { keys: Vec::new() },
            token_endpoint_auth_methods_supported: Vec::new(),
            id_token_signing_alg_values_supported: Vec::new(),
            scopes_supported: None,
            last_refresh: None,
        }
    }
}

enum Command {
    RefreshKeys {
        done: Option<oneshot::Sender<()>>,
    },
}

/// A handle to a provider's background task.
///
/// Handles are cheap to clone. The provider task keeps running as long as
/// at least one handle exists.
#[derive(Debug, Clone)]
pub struct ProviderHandle {
    id: ProviderId,
    commands: mpsc::Sender<Command>,
    snapshot: watch::Receiver<Arc<ProviderInfo>>,
}

impl ProviderHandle {
    /// The id of the provider.
    #[must_use]
    pub fn id(&self) -> ProviderId {
        self.id
    }

    /// Get the current snapshot of the provider.
    ///
    /// Never fails; a provider that has not finished its bootstrap returns
    /// a snapshot with `ready == false`.
    #[must_use]
    pub fn info(&self) -> Arc<ProviderInfo> {
        self.snapshot.borrow().clone()
    }

    /// Trigger a JWKS refresh without waiting for it.
    ///
    /// Concurrent triggers coalesce into a single fetch; refreshes within
    /// the cooldown window are skipped. The current key set stays in place
    /// until a replacement is fetched successfully.
    pub fn refresh_keys(&self) {
        let _ = self.commands.try_send(Command::RefreshKeys { done: None });
    }

    /// Trigger a JWKS refresh and wait for the attempt to settle.
    ///
    /// Returns once the provider task processed the command, whether the
    /// fetch succeeded, failed, or was skipped by the cooldown.
    pub async fn refresh_keys_and_wait(&self) {
        let (tx, rx) = oneshot::channel();

        if self
            .commands
            .send(Command::RefreshKeys { done: Some(tx) })
            .await
            .is_ok()
        {
            let _ = rx.await;
        }
    }

    /// Wait until the provider is ready and return the snapshot that
    /// crossed the ready edge.
    ///
    /// Returns `None` if the provider task shut down before becoming
    /// ready. Callers should apply their own deadline.
    pub async fn wait_ready(&self) -> Option<Arc<ProviderInfo>> {
        let mut snapshot = self.snapshot.clone();

        snapshot
            .wait_for(|info| info.ready)
            .await
            .ok()
            .map(|info| info.clone())
    }
}

/// Spawn the background task owning a provider and return a handle to it.
pub(crate) fn spawn(
    id: ProviderId,
    config: ProviderConfig,
    http_client: reqwest::Client,
) -> ProviderHandle {
    let info = ProviderInfo::from_config(id, config);
    let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(info.clone()));
    let (command_tx, command_rx) = mpsc::channel(8);

    let actor = ProviderActor {
        http_client,
        info,
        snapshot: snapshot_tx,
        commands: command_rx,
        last_keys_attempt: None,
    };

    tokio::spawn(
        actor
            .run()
            .instrument(tracing::info_span!("provider", provider.id = %id)),
    );

    ProviderHandle {
        id,
        commands: command_tx,
        snapshot: snapshot_rx,
    }
}

struct ProviderActor {
    http_client: reqwest::Client,
    info: ProviderInfo,
    snapshot: watch::Sender<Arc<ProviderInfo>>,
    commands: mpsc::Receiver<Command>,
    last_keys_attempt: Option<Instant>,
}

impl ProviderActor {
    async fn run(mut self) {
        let Some(metadata) = self.bootstrap_config().await else {
            return;
        };

        self.apply_metadata(&metadata);

        let jwks_uri = metadata.jwks_uri().clone();
        if self.bootstrap_keys(&jwks_uri).await.is_none() {
            return;
        }

        tracing::info!(issuer = ?self.info.issuer, "provider ready");

        while let Some(Command::RefreshKeys { done }) = self.commands.recv().await {
            let mut waiters = vec![done];

            // Coalesce refreshes that queued up behind this one.
            while let Ok(Command::RefreshKeys { done }) = self.commands.try_recv() {
                waiters.push(done);
            }

            self.refresh_keys(&jwks_uri).await;

            for waiter in waiters.into_iter().flatten() {
                let _ = waiter.send(());
            }
        }
    }

    /// Fetch the configuration document, retrying with backoff until it
    /// succeeds or every handle is dropped.
    async fn bootstrap_config(&mut self) -> Option<VerifiedProviderMetadata> {
        let mut backoff = Backoff::new();

        loop {
            self.publish(ProviderState::FetchingConfig);

            match discovery::fetch_provider_metadata(&self.http_client, &self.info.config_endpoint)
                .await
            {
                Ok(metadata) => return Some(metadata),
                Err(error) => {
                    let delay = backoff.next();
                    tracing::warn!(
                        error = &error as &dyn std::error::Error,
                        ?delay,
                        "fetching provider configuration failed, will retry"
                    );
                    self.publish(ProviderState::ConfigFailed);

                    if !self.sleep(delay).await {
                        return None;
                    }
                }
            }
        }
    }

    /// Fetch the JWKS for the first time, retrying with backoff until it
    /// succeeds or every handle is dropped.
    async fn bootstrap_keys(&mut self, jwks_uri: &Url) -> Option<()> {
        let mut backoff = Backoff::new();

        loop {
            self.publish(ProviderState::FetchingKeys);

            match jose::fetch_jwks(&self.http_client, jwks_uri).await {
                Ok(jwks) => {
                    self.info.jwks = jwks;
                    self.info.last_refresh = Some(Utc::now());
                    self.publish(ProviderState::Ready);
                    return Some(());
                }
                Err(error) => {
                    let delay = backoff.next();
                    tracing::warn!(
                        error = &error as &dyn std::error::Error,
                        ?delay,
                        "fetching provider JWKS failed, will retry"
                    );
                    self.publish(ProviderState::KeysFailed);

                    if !self.sleep(delay).await {
                        return None;
                    }
                }
            }
        }
    }

    /// Re-fetch the JWKS of a ready provider.
    ///
    /// The previous key set is swapped out only when the fetch succeeds,
    /// so observers never see an empty or partial key set.
    async fn refresh_keys(&mut self, jwks_uri: &Url) {
        if self
            .last_keys_attempt
            .is_some_and(|at| at.elapsed() < KEYS_REFRESH_COOLDOWN)
        {
            tracing::debug!("skipping JWKS refresh, cooldown in effect");
            return;
        }

        self.last_keys_attempt = Some(Instant::now());

        match jose::fetch_jwks(&self.http_client, jwks_uri).await {
            Ok(jwks) => {
                self.info.jwks = jwks;
                self.info.last_refresh = Some(Utc::now());
                self.publish(ProviderState::Ready);
                tracing::debug!("JWKS refreshed");
            }
            Err(error) => {
                tracing::warn!(
                    error = &error as &dyn std::error::Error,
                    "JWKS refresh failed, keeping the previous key set"
                );
            }
        }
    }

    fn apply_metadata(&mut self, metadata: &VerifiedProviderMetadata) {
        self.info.issuer = Some(metadata.issuer().to_owned());
        self.info.authorization_endpoint = Some(metadata.authorization_endpoint().clone());
        self.info.token_endpoint = Some(metadata.token_endpoint().clone());
        self.info.jwks_uri = Some(metadata.jwks_uri().clone());
        self.info.userinfo_endpoint = metadata.userinfo_endpoint.clone();
        self.info.introspection_endpoint = metadata.introspection_endpoint.clone();
        self.info.revocation_endpoint = metadata.revocation_endpoint.clone();
        self.info.token_endpoint_auth_methods_supported = metadata
            .token_endpoint_auth_methods_supported
            .clone()
            .unwrap_or_default();
        self.info.id_token_signing_alg_values_supported = metadata
            .id_token_signing_alg_values_supported
            .clone()
            .unwrap_or_default();
        self.info.scopes_supported = metadata.scopes_supported.clone();

        self.publish(ProviderState::FetchingKeys);
    }

    /// Publish a new snapshot with the given state.
    ///
    /// The whole snapshot is swapped atomically: a reader that observes
    /// `ready == true` also observes the endpoints and keys it was
    /// published with.
    fn publish(&mut self, state: ProviderState) {
        self.info.state = state;
        self.info.ready = state == ProviderState::Ready;
        self.snapshot.send_replace(Arc::new(self.info.clone()));
    }

    /// Sleep for the given backoff delay.
    ///
    /// Returns `false` if every handle was dropped in the meantime and the
    /// task should stop.
    async fn sleep(&self, delay: std::time::Duration) -> bool {
        tokio::select! {
            () = self.snapshot.closed() => false,
            () = tokio::time::sleep(delay) => true,
        }
    }
}

/// Exponential backoff with jitter for the bootstrap retries.
struct Backoff {
    attempt: u32,
}

impl Backoff {
    const BASE_SECS: f64 = 1.0;
    const CAP_SECS: f64 = 60.0;
    const JITTER: f64 = 0.2;

    fn new() -> Self {
        Self { attempt: 0 }
    }

    fn next(&mut self) -> std::time::Duration {
        let exp = Self::BASE_SECS * 2_f64.powi(i32::try_from(self.attempt.min(16)).unwrap_or(16));
        self.attempt = self.attempt.saturating_add(1);

        let factor = rand::thread_rng().gen_range(1.0 - Self::JITTER..=1.0 + Self::JITTER);

        std::time::Duration::from_secs_f64(exp.min(Self::CAP_SECS) * factor)
    }
}
