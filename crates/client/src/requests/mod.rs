// Copyright 2025, 2026 The oxidc Authors.
//
// SPDX-License-Identifier: MIT
// Please see LICENSE in the repository root for full details.

//! Methods to interact with OpenID Connect and OAuth 2.0 endpoints.

pub mod authorization;
pub mod discovery;
pub mod introspection;
pub mod revocation;
pub mod token;
pub mod userinfo;
