// Copyright 2025, 2026 The oxidc Authors.
//
// SPDX-License-Identifier: MIT
// Please see LICENSE in the repository root for full details.

//! The process-wide registry of host-supplied post-authentication
//! handlers.
//!
//! Modules are only recorded here; the core never invokes their
//! callbacks. The host's web layer looks modules up after a successful
//! code exchange and drives them itself.

use std::{
    collections::HashMap,
    sync::{Arc, LazyLock, RwLock},
};

use crate::{provider::ProviderId, tokens::TokenBundle};

/// A host-supplied handler invoked by the host's web layer after a
/// successful code exchange.
pub trait ClientModule: Send + Sync {
    /// The stable key this module is registered under.
    fn key(&self) -> &str;

    /// Called by the host once a code exchange produced a validated token
    /// bundle.
    fn on_authenticated(&self, provider: ProviderId, tokens: &TokenBundle);
}

/// A registry of [`ClientModule`]s, keyed by [`ClientModule::key`].
#[derive(Default)]
pub struct ClientModuleRegistry {
    modules: RwLock<HashMap<String, Arc<dyn ClientModule>>>,
}

impl ClientModuleRegistry {
    /// Register a module.
    ///
    /// Registering a module with an already-used key replaces the prior
    /// binding.
    pub fn register(&self, module: Arc<dyn ClientModule>) {
        let key = module.key().to_owned();

        tracing::debug!(module.key = %key, "registering client module");

        self.modules
            .write()
            .expect("client module registry lock poisoned")
            .insert(key, module);
    }

    /// Look up a module by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Arc<dyn ClientModule>> {
        self.modules
            .read()
            .expect("client module registry lock poisoned")
            .get(key)
            .cloned()
    }

    /// Remove a module by key.
    ///
    /// Returns the module that was bound to the key, if any.
    pub fn remove(&self, key: &str) -> Option<Arc<dyn ClientModule>> {
        self.modules
            .write()
            .expect("client module registry lock poisoned")
            .remove(key)
    }

    /// The keys of the registered modules.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.modules
            .read()
            .expect("client module registry lock poisoned")
            .keys()
            .cloned()
            .collect()
    }
}

static REGISTRY: LazyLock<ClientModuleRegistry> = LazyLock::new(ClientModuleRegistry::default);

/// The process-wide [`ClientModuleRegistry`].
#[must_use]
pub fn client_modules() -> &'static ClientModuleRegistry {
    &REGISTRY
}
