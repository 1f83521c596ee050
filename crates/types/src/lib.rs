// Copyright 2025, 2026 The oxidc Authors.
//
// SPDX-License-Identifier: MIT
// Please see LICENSE in the repository root for full details.

//! [OAuth 2.0] and [OpenID Connect] wire types.
//!
//! This crate holds the serializable types exchanged with an OpenID
//! Provider: scopes, PKCE challenges, the discovery document, and the
//! bodies of token endpoint requests and responses. It performs no I/O;
//! the flow engine lives in `oxidc-client`.
//!
//! [OAuth 2.0]: https://oauth.net/2/
//! [OpenID Connect]: https://openid.net/connect/

#![deny(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod oidc;
pub mod pkce;
pub mod requests;
pub mod scope;

/// Traits intended for blanket imports.
pub mod prelude {
    pub use crate::pkce::CodeChallengeMethodExt;
}
