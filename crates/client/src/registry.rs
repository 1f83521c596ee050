// Copyright 2025, 2026 The oxidc Authors.
//
// SPDX-License-Identifier: MIT
// Please see LICENSE in the repository root for full details.

//! The registry mapping provider ids to provider handles.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::RwLock;

use crate::{
    error::RegistryError,
    provider::{self, ProviderConfig, ProviderHandle, ProviderId},
};

/// A registry of providers, keyed by their opaque id.
///
/// Registration returns immediately; the provider bootstraps in the
/// background and its handle can be looked up right away, so consumers
/// must check the `ready` flag of the snapshots they observe.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    http_client: reqwest::Client,
    providers: Arc<RwLock<HashMap<ProviderId, ProviderHandle>>>,
}

impl ProviderRegistry {
    /// Create an empty registry using the given HTTP client for all
    /// provider traffic.
    #[must_use]
    pub fn new(http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            providers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a provider and start its bootstrap.
    ///
    /// A fresh id is generated when none is given. The returned handle is
    /// usable immediately, while discovery proceeds asynchronously.
    ///
    /// # Errors
    ///
    /// Returns an error if the given id is already used; the registry is
    /// left untouched in that case.
    #[tracing::instrument(skip_all, fields(provider.name = %config.name))]
    pub async fn add(
        &self,
        id: Option<ProviderId>,
        config: ProviderConfig,
    ) -> Result<(ProviderId, ProviderHandle), RegistryError> {
        let id = id.unwrap_or_default();

        let mut providers = self.providers.write().await;

        if providers.contains_key(&id) {
            return Err(RegistryError::IdAlreadyUsed(id));
        }

        tracing::debug!(provider.id = %id, "registering provider");

        let handle = provider::spawn(id, config, self.http_client.clone());
        providers.insert(id, handle.clone());

        Ok((id, handle))
    }

    /// Look up a provider by id.
    ///
    /// # Errors
    ///
    /// Returns an error if no provider has this id.
    pub async fn get(&self, id: ProviderId) -> Result<ProviderHandle, RegistryError> {
        self.providers
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(RegistryError::NotFound)
    }

    /// Look up a ready provider by its issuer identifier.
    ///
    /// Providers that have not finished their bootstrap are skipped. When
    /// several ready providers assert the same issuer, the first match
    /// wins.
    ///
    /// # Errors
    ///
    /// Returns an error if no ready provider asserts this issuer.
    pub async fn find_by_issuer(&self, issuer: &str) -> Result<ProviderHandle, RegistryError> {
        self.providers
            .read()
            .await
            .values()
            .find(|handle| {
                let info = handle.info();
                info.ready && info.issuer.as_deref() == Some(issuer)
            })
            .cloned()
            .ok_or(RegistryError::NotFound)
    }

    /// Snapshot the registered providers.
    pub async fn list(&self) -> Vec<(ProviderId, ProviderHandle)> {
        self.providers
            .read()
            .await
            .iter()
            .map(|(id, handle)| (*id, handle.clone()))
            .collect()
    }

    /// Remove a provider from the registry.
    ///
    /// The provider task shuts down once the last outstanding handle is
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if no provider has this id.
    pub async fn remove(&self, id: ProviderId) -> Result<(), RegistryError> {
        self.providers
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or(RegistryError::NotFound)
    }
}
