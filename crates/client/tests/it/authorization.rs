// Copyright 2025, 2026 The oxidc Authors.
//
// SPDX-License-Identifier: MIT
// Please see LICENSE in the repository root for full details.

use std::collections::HashMap;

use oxidc_client::{AuthorizationSession, ProviderId};
use oxidc_client::types::{
    pkce::{AuthorizationRequestPkce, CodeChallengeMethod, PkcePair},
    scope::Scope,
};

use crate::{ready_mock_provider, relying_party, CLIENT_ID, CODE_VERIFIER, REDIRECT_URI};

fn query_pairs(url: &url::Url) -> HashMap<String, String> {
    url.query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

#[tokio::test]
async fn redirect_url_carries_the_full_query() {
    let relying_party = relying_party();
    let (_server, id, _handle) = ready_mock_provider(&relying_party).await;

    let pkce = AuthorizationRequestPkce {
        code_challenge_method: CodeChallengeMethod::S256,
        code_challenge: "C".to_owned(),
    };

    let url = relying_party
        .create_redirect_url(
            id,
            Some("openid email".parse().unwrap()),
            Some("s1"),
            Some("n1"),
            Some(&pkce),
        )
        .await
        .unwrap();

    assert_eq!(url.path(), "/authorize");

    let pairs = query_pairs(&url);
    assert_eq!(pairs.len(), 8);
    assert_eq!(pairs["response_type"], "code");
    assert_eq!(pairs["client_id"], CLIENT_ID);
    assert_eq!(pairs["redirect_uri"], REDIRECT_URI);
    assert_eq!(pairs["state"], "s1");
    assert_eq!(pairs["nonce"], "n1");
    assert_eq!(pairs["code_challenge"], "C");
    assert_eq!(pairs["code_challenge_method"], "S256");
    // Scope tokens are joined in their stable sorted order.
    assert_eq!(pairs["scope"], "email openid");
}

#[tokio::test]
async fn redirect_url_omits_empty_parameters() {
    let relying_party = relying_party();
    let (_server, id, _handle) = ready_mock_provider(&relying_party).await;

    let url = relying_party
        .create_redirect_url(id, Some(Scope::default()), Some(""), None, None)
        .await
        .unwrap();

    let pairs = query_pairs(&url);
    assert_eq!(pairs.len(), 3);
    assert_eq!(pairs["response_type"], "code");
    assert_eq!(pairs["client_id"], CLIENT_ID);
    assert_eq!(pairs["redirect_uri"], REDIRECT_URI);
}

#[tokio::test]
async fn redirect_url_defaults_to_request_scopes() {
    let relying_party = relying_party();
    let (_server, id, _handle) = ready_mock_provider(&relying_party).await;

    // The test provider is configured with `openid` as request scopes.
    let url = relying_party
        .create_redirect_url(id, None, None, None, None)
        .await
        .unwrap();

    let pairs = query_pairs(&url);
    assert_eq!(pairs["scope"], "openid");
}

#[tokio::test]
async fn plain_pkce_method_is_passed_through() {
    let relying_party = relying_party();
    let (_server, id, _handle) = ready_mock_provider(&relying_party).await;

    let pkce = AuthorizationRequestPkce {
        code_challenge_method: CodeChallengeMethod::Plain,
        code_challenge: CODE_VERIFIER.to_owned(),
    };

    let url = relying_party
        .create_redirect_url(id, None, None, None, Some(&pkce))
        .await
        .unwrap();

    let pairs = query_pairs(&url);
    assert_eq!(pairs["code_challenge_method"], "plain");
    assert_eq!(pairs["code_challenge"], CODE_VERIFIER);
}

struct TestSession {
    provider: ProviderId,
}

impl AuthorizationSession for TestSession {
    fn provider(&self) -> ProviderId {
        self.provider
    }

    fn session_id(&self) -> &str {
        "session-1"
    }

    fn scopes(&self) -> Option<Scope> {
        Some("openid profile".parse().unwrap())
    }

    fn nonce(&self) -> Option<String> {
        Some("session-nonce".to_owned())
    }

    fn pkce(&self) -> Option<PkcePair> {
        Some(PkcePair::from_verifier(CodeChallengeMethod::S256, CODE_VERIFIER).unwrap())
    }
}

#[tokio::test]
async fn redirect_url_for_session() {
    let relying_party = relying_party();
    let (_server, id, _handle) = ready_mock_provider(&relying_party).await;

    let url = relying_party
        .create_redirect_for_session(&TestSession { provider: id })
        .await
        .unwrap();

    let pairs = query_pairs(&url);
    assert_eq!(pairs["state"], "session-1");
    assert_eq!(pairs["nonce"], "session-nonce");
    assert_eq!(pairs["scope"], "openid profile");
    assert_eq!(pairs["code_challenge_method"], "S256");
    // RFC 7636 appendix B test vector.
    assert_eq!(
        pairs["code_challenge"],
        "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
    );
}
