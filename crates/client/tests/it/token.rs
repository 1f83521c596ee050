// Copyright 2025, 2026 The oxidc Authors.
//
// SPDX-License-Identifier: MIT
// Please see LICENSE in the repository root for full details.

use std::collections::HashMap;

use assert_matches::assert_matches;
use chrono::Utc;
use oxidc_client::{
    error::{Error, TokenRequestError},
    TokenBundle,
};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, Request, ResponseTemplate,
};

use crate::{
    mount_discovery, mount_jwks, ready_provider, relying_party, token_response_body,
    ACCESS_TOKEN, AUTHORIZATION_CODE, BASIC_AUTHORIZATION, CLIENT_ID, CLIENT_SECRET,
    CODE_VERIFIER, REDIRECT_URI, REFRESH_TOKEN,
};

fn form_body(request: &Request) -> HashMap<String, String> {
    form_urlencoded::parse(&request.body)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

#[tokio::test]
async fn exchange_code_authenticates_with_basic() {
    let relying_party = relying_party();
    let server = MockServer::start().await;
    mount_discovery(&server, &["client_secret_basic", "client_secret_post"]).await;
    mount_jwks(&server).await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_response_body(None)))
        .mount(&server)
        .await;

    let (id, _handle) = ready_provider(&relying_party, &server).await;

    let raw = relying_party
        .exchange_code(id, AUTHORIZATION_CODE, None)
        .await
        .unwrap();

    // Round trip: the extracted access token matches the raw field.
    let bundle = TokenBundle::extract(&raw, Utc::now()).unwrap();
    assert_eq!(bundle.access.unwrap().token, ACCESS_TOKEN);
    assert_eq!(bundle.refresh.unwrap().token, REFRESH_TOKEN);

    let requests = server.received_requests().await.unwrap();
    let request = requests
        .iter()
        .find(|request| request.url.path() == "/token")
        .unwrap();

    // Credentials travel in the Authorization header, form-encoded before
    // base64, and not in the body.
    assert_eq!(
        request
            .headers
            .get("authorization")
            .unwrap()
            .to_str()
            .unwrap(),
        BASIC_AUTHORIZATION
    );

    let body = form_body(request);
    assert_eq!(body["grant_type"], "authorization_code");
    assert_eq!(body["code"], AUTHORIZATION_CODE);
    assert_eq!(body["redirect_uri"], REDIRECT_URI);
    assert!(!body.contains_key("client_id"));
    assert!(!body.contains_key("client_secret"));
    assert!(!body.contains_key("code_verifier"));
}

#[tokio::test]
async fn exchange_code_authenticates_with_post_when_basic_is_unsupported() {
    let relying_party = relying_party();
    let server = MockServer::start().await;
    mount_discovery(&server, &["client_secret_post"]).await;
    mount_jwks(&server).await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_response_body(None)))
        .mount(&server)
        .await;

    let (id, _handle) = ready_provider(&relying_party, &server).await;

    relying_party
        .exchange_code(id, AUTHORIZATION_CODE, Some(CODE_VERIFIER.to_owned()))
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let request = requests
        .iter()
        .find(|request| request.url.path() == "/token")
        .unwrap();

    assert!(request.headers.get("authorization").is_none());

    let body = form_body(request);
    assert_eq!(body["client_id"], CLIENT_ID);
    assert_eq!(body["client_secret"], CLIENT_SECRET);
    assert_eq!(body["code_verifier"], CODE_VERIFIER);
}

#[tokio::test]
async fn refresh_token_sends_scope_only_when_given() {
    let relying_party = relying_party();
    let server = MockServer::start().await;
    mount_discovery(&server, &["client_secret_basic"]).await;
    mount_jwks(&server).await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_response_body(None)))
        .mount(&server)
        .await;

    let (id, _handle) = ready_provider(&relying_party, &server).await;

    relying_party
        .refresh_token(id, REFRESH_TOKEN, Some("openid email".parse().unwrap()))
        .await
        .unwrap();
    relying_party.refresh_token(id, REFRESH_TOKEN, None).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let bodies: Vec<HashMap<String, String>> = requests
        .iter()
        .filter(|request| request.url.path() == "/token")
        .map(form_body)
        .collect();

    assert_eq!(bodies.len(), 2);
    assert_eq!(bodies[0]["grant_type"], "refresh_token");
    assert_eq!(bodies[0]["refresh_token"], REFRESH_TOKEN);
    assert_eq!(bodies[0]["scope"], "email openid");
    assert!(!bodies[1].contains_key("scope"));
}

#[tokio::test]
async fn token_endpoint_error_surfaces_status_and_body() {
    let relying_party = relying_party();
    let server = MockServer::start().await;
    mount_discovery(&server, &["client_secret_basic"]).await;
    mount_jwks(&server).await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "code expired",
        })))
        .mount(&server)
        .await;

    let (id, _handle) = ready_provider(&relying_party, &server).await;

    let error = relying_party
        .exchange_code(id, AUTHORIZATION_CODE, None)
        .await
        .unwrap_err();

    assert_matches!(
        error,
        Error::Token(TokenRequestError::Http { status, error: Some(oauth2), .. }) => {
            assert_eq!(status.as_u16(), 400);
            assert_eq!(oauth2.error, "invalid_grant");
        }
    );
}
