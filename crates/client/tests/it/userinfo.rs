// Copyright 2025, 2026 The oxidc Authors.
//
// SPDX-License-Identifier: MIT
// Please see LICENSE in the repository root for full details.

use assert_matches::assert_matches;
use chrono::Utc;
use oxidc_client::{
    error::{Error, UserInfoError},
    TokenBundle,
};
use serde_json::{json, Value};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

use crate::{id_token, ready_mock_provider, relying_party, token_response_body, ACCESS_TOKEN, SUBJECT};

async fn mount_userinfo(server: &MockServer, body: Value) {
    Mock::given(method("GET"))
        .and(path("/userinfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// A bundle as produced by a code exchange, with an ID token for SUBJECT.
fn bundle_for_subject(issuer: &str) -> TokenBundle {
    let raw = token_response_body(Some(id_token(issuer, |_| {}))).to_string();
    TokenBundle::extract(&raw, Utc::now()).unwrap()
}

#[tokio::test]
async fn userinfo_returns_the_claims() {
    let relying_party = relying_party();
    let (server, id, _handle) = ready_mock_provider(&relying_party).await;
    mount_userinfo(&server, json!({ "sub": SUBJECT, "email": "user@example.com" })).await;

    let claims = relying_party
        .userinfo(id, bundle_for_subject(&server.uri()), None)
        .await
        .unwrap();

    assert_eq!(claims.get("sub"), Some(&Value::from(SUBJECT)));
    assert_eq!(claims.get("email"), Some(&Value::from("user@example.com")));

    let requests = server.received_requests().await.unwrap();
    let request = requests
        .iter()
        .find(|request| request.url.path() == "/userinfo")
        .unwrap();
    assert_eq!(
        request
            .headers
            .get("authorization")
            .unwrap()
            .to_str()
            .unwrap(),
        format!("Bearer {ACCESS_TOKEN}")
    );
    assert_eq!(
        request.headers.get("accept").unwrap().to_str().unwrap(),
        "application/json"
    );
}

#[tokio::test]
async fn userinfo_rejects_a_subject_mismatch() {
    let relying_party = relying_party();
    let (server, id, _handle) = ready_mock_provider(&relying_party).await;
    // The endpoint claims a different subject than the ID token asserted.
    mount_userinfo(&server, json!({ "sub": "u2" })).await;

    let error = relying_party
        .userinfo(id, bundle_for_subject(&server.uri()), None)
        .await
        .unwrap_err();
    assert_matches!(error, Error::UserInfo(UserInfoError::BadSubject));
}

#[tokio::test]
async fn userinfo_with_a_bare_token_skips_the_subject_check() {
    let relying_party = relying_party();
    let (server, id, _handle) = ready_mock_provider(&relying_party).await;
    mount_userinfo(&server, json!({ "sub": "whoever" })).await;

    let claims = relying_party.userinfo(id, ACCESS_TOKEN, None).await.unwrap();
    assert_eq!(claims.get("sub"), Some(&Value::from("whoever")));
}

#[tokio::test]
async fn userinfo_explicit_subject_overrides_the_bundle() {
    let relying_party = relying_party();
    let (server, id, _handle) = ready_mock_provider(&relying_party).await;
    mount_userinfo(&server, json!({ "sub": "u2" })).await;

    let claims = relying_party
        .userinfo(id, bundle_for_subject(&server.uri()), Some("u2"))
        .await
        .unwrap();
    assert_eq!(claims.get("sub"), Some(&Value::from("u2")));
}

#[tokio::test]
async fn userinfo_requires_a_sub_claim() {
    let relying_party = relying_party();
    let (server, id, _handle) = ready_mock_provider(&relying_party).await;
    mount_userinfo(&server, json!({ "email": "user@example.com" })).await;

    let error = relying_party.userinfo(id, ACCESS_TOKEN, None).await.unwrap_err();
    assert_matches!(error, Error::UserInfo(UserInfoError::BadSubject));
}

#[tokio::test]
async fn userinfo_surfaces_bad_statuses() {
    let relying_party = relying_party();
    let (server, id, _handle) = ready_mock_provider(&relying_party).await;

    Mock::given(method("GET"))
        .and(path("/userinfo"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let error = relying_party.userinfo(id, ACCESS_TOKEN, None).await.unwrap_err();
    assert_matches!(
        error,
        Error::UserInfo(UserInfoError::BadStatus(status)) if status.as_u16() == 401
    );
}
