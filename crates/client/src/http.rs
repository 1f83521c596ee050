// Copyright 2025, 2026 The oxidc Authors.
//
// SPDX-License-Identifier: MIT
// Please see LICENSE in the repository root for full details.

//! Construction of the shared HTTP client.

use std::time::Duration;

/// The default deadline applied to every HTTP operation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the [`reqwest::Client`] used by this crate.
///
/// The client carries a `oxidc/<version>` user-agent and the
/// [`DEFAULT_TIMEOUT`] deadline. Hosts that need different deadlines or
/// transport settings can build their own client and hand it to
/// [`RelyingParty::with_client`].
///
/// [`RelyingParty::with_client`]: crate::RelyingParty::with_client
#[must_use]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(concat!("oxidc/", env!("CARGO_PKG_VERSION")))
        .timeout(DEFAULT_TIMEOUT)
        .build()
        .expect("failed to build the HTTP client")
}
