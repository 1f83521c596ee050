// Copyright 2025, 2026 The oxidc Authors.
//
// SPDX-License-Identifier: MIT
// Please see LICENSE in the repository root for full details.

use std::time::Duration;

use assert_matches::assert_matches;
use oxidc_client::{
    error::{AuthorizationError, Error, RegistryError},
    ProviderId,
};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

use crate::{
    mount_discovery, mount_jwks, provider_config, ready_provider, relying_party, CLIENT_ID, KID,
};

#[tokio::test]
async fn provider_becomes_ready_after_discovery() {
    let relying_party = relying_party();
    let server = MockServer::start().await;
    mount_discovery(&server, &["client_secret_basic", "client_secret_post"]).await;
    mount_jwks(&server).await;

    let (id, handle) = ready_provider(&relying_party, &server).await;

    let info = relying_party.provider_info(id).await.unwrap();
    assert!(info.ready);
    assert_eq!(info.issuer.as_deref(), Some(server.uri().as_str()));
    assert_eq!(info.client_id, CLIENT_ID);
    assert!(info.authorization_endpoint.is_some());
    assert!(info.token_endpoint.is_some());
    assert!(info.jwks_uri.is_some());
    assert_eq!(info.jwks.keys.len(), 1);
    assert!(info.jwks.find(KID).is_some());
    assert_eq!(
        info.token_endpoint_auth_methods_supported,
        vec!["client_secret_basic", "client_secret_post"]
    );
    assert!(info.last_refresh.is_some());

    assert_eq!(handle.id(), id);
}

#[tokio::test]
async fn discovery_retries_after_failure() {
    let relying_party = relying_party();
    let server = MockServer::start().await;

    // First configuration fetch fails, the retry succeeds.
    Mock::given(method("GET"))
        .and(path("/.well-known/openid-configuration"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_discovery(&server, &["client_secret_basic"]).await;
    mount_jwks(&server).await;

    let (_id, handle) = relying_party
        .add_provider(None, provider_config(&server))
        .await
        .unwrap();

    let info = tokio::time::timeout(Duration::from_secs(10), handle.wait_ready())
        .await
        .expect("provider did not recover from the failed fetch")
        .unwrap();

    assert!(info.ready);
}

#[tokio::test]
async fn unready_provider_stays_queryable() {
    let relying_party = relying_party();
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/.well-known/openid-configuration"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (id, handle) = relying_party
        .add_provider(None, provider_config(&server))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;

    let info = handle.info();
    assert!(!info.ready);
    assert_eq!(info.issuer, None);

    let error = relying_party
        .create_redirect_url(id, None, Some("s1"), None, None)
        .await
        .unwrap_err();
    assert_matches!(
        error,
        Error::Authorization(AuthorizationError::ProviderNotReady)
    );
}

#[tokio::test]
async fn add_with_used_id_fails_without_mutating() {
    let relying_party = relying_party();
    let server = MockServer::start().await;
    mount_discovery(&server, &["client_secret_basic"]).await;
    mount_jwks(&server).await;

    let id = ProviderId::new();
    let (added_id, _handle) = relying_party
        .add_provider(Some(id), provider_config(&server))
        .await
        .unwrap();
    assert_eq!(added_id, id);

    let error = relying_party
        .add_provider(Some(id), provider_config(&server))
        .await
        .unwrap_err();
    assert_matches!(
        error,
        Error::Registry(RegistryError::IdAlreadyUsed(used)) if used == id
    );

    let providers = relying_party.list_providers().await;
    assert_eq!(providers.len(), 1);
    assert_eq!(providers[0].0, id);
}

#[tokio::test]
async fn find_by_issuer_matches_ready_providers() {
    let relying_party = relying_party();
    let server = MockServer::start().await;
    mount_discovery(&server, &["client_secret_basic"]).await;
    mount_jwks(&server).await;

    let (id, _handle) = ready_provider(&relying_party, &server).await;

    let found = relying_party.find_by_issuer(&server.uri()).await.unwrap();
    assert_eq!(found.id(), id);

    let error = relying_party
        .find_by_issuer("https://unknown.example.com")
        .await
        .unwrap_err();
    assert_matches!(error, Error::Registry(RegistryError::NotFound));
}

#[tokio::test]
async fn failed_key_refresh_keeps_previous_keys() {
    let relying_party = relying_party();
    let server = MockServer::start().await;
    mount_discovery(&server, &["client_secret_basic"]).await;

    // The bootstrap fetch succeeds, any refresh afterwards fails.
    Mock::given(method("GET"))
        .and(path("/jwks"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(crate::jwks_document(&[crate::jwk(KID, crate::RSA_TEST_KEY_N)])),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/jwks"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (_id, handle) = ready_provider(&relying_party, &server).await;

    handle.refresh_keys_and_wait().await;

    // The swap is atomic: the failed refresh left the old key set behind.
    let info = handle.info();
    assert!(info.ready);
    assert_eq!(info.jwks.keys.len(), 1);
    assert!(info.jwks.find(KID).is_some());

    // A second refresh right away is absorbed by the cooldown.
    handle.refresh_keys_and_wait().await;

    let jwks_requests = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|request| request.url.path() == "/jwks")
        .count();
    assert_eq!(jwks_requests, 2);
}

#[tokio::test]
async fn removed_provider_is_gone() {
    let relying_party = relying_party();
    let server = MockServer::start().await;
    mount_discovery(&server, &["client_secret_basic"]).await;
    mount_jwks(&server).await;

    let (id, _handle) = ready_provider(&relying_party, &server).await;

    relying_party.remove_provider(id).await.unwrap();

    let error = relying_party.provider_info(id).await.unwrap_err();
    assert_matches!(error, Error::Registry(RegistryError::NotFound));

    let error = relying_party.remove_provider(id).await.unwrap_err();
    assert_matches!(error, Error::Registry(RegistryError::NotFound));
}
