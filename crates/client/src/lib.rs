// Copyright 2025, 2026 The oxidc Authors.
//
// SPDX-License-Identifier: MIT
// Please see LICENSE in the repository root for full details.

//! An [OpenID Connect] relying-party client.
//!
//! # Scope
//!
//! This crate implements the relying-party side of the OpenID Connect
//! authorization code flow against one or more OpenID Providers:
//!
//! - provider registration by [Discovery], with a background task per
//!   provider that keeps its metadata and [JWKS] fresh
//! - authorization redirect URLs, with optional state, nonce and [PKCE]
//! - authorization code exchange and token refresh per [RFC 6749]
//! - ID token parsing and validation per OIDC Core §3.1.3.7
//! - user info per OIDC Core §5.3, token introspection per [RFC 7662] and
//!   token revocation per [RFC 7009]
//!
//! The entry point is [`RelyingParty`]. It owns a [`ProviderRegistry`]
//! mapping opaque provider ids to [`ProviderHandle`]s; each handle exposes
//! consistent [`ProviderInfo`] snapshots of the provider state.
//!
//! Out of scope: acting as a provider, the implicit and hybrid flows,
//! dynamic client registration, encrypted (JWE) tokens, and session
//! storage, which remain the host's concern.
//!
//! [OpenID Connect]: https://openid.net/connect/
//! [Discovery]: https://openid.net/specs/openid-connect-discovery-1_0.html
//! [JWKS]: https://www.rfc-editor.org/rfc/rfc7517
//! [PKCE]: https://www.rfc-editor.org/rfc/rfc7636
//! [RFC 6749]: https://www.rfc-editor.org/rfc/rfc6749
//! [RFC 7662]: https://www.rfc-editor.org/rfc/rfc7662
//! [RFC 7009]: https://www.rfc-editor.org/rfc/rfc7009

#![deny(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod http;
pub mod jose;
pub mod modules;
pub mod provider;
pub mod registry;
pub mod requests;
pub mod tokens;

mod relying_party;

pub use oxidc_types as types;

pub use self::{
    error::Error,
    modules::{client_modules, ClientModule, ClientModuleRegistry},
    provider::{ProviderConfig, ProviderHandle, ProviderId, ProviderInfo},
    registry::ProviderRegistry,
    relying_party::{ProviderRef, RelyingParty, TokenInput},
    requests::authorization::AuthorizationSession,
    tokens::{ExpectedNonce, TokenBundle, ValidationOptions},
};
