// Copyright 2025, 2026 The oxidc Authors.
//
// SPDX-License-Identifier: MIT
// Please see LICENSE in the repository root for full details.

use assert_matches::assert_matches;
use oxidc_client::error::{Error, RevocationError};
use wiremock::{
    matchers::{method, path},
    Mock, ResponseTemplate,
};

use crate::{ready_mock_provider, relying_party, REFRESH_TOKEN};

#[tokio::test]
async fn revokes_a_token() {
    let relying_party = relying_party();
    let (server, id, _handle) = ready_mock_provider(&relying_party).await;

    Mock::given(method("POST"))
        .and(path("/revoke"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    relying_party.revoke(id, REFRESH_TOKEN).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let request = requests
        .iter()
        .find(|request| request.url.path() == "/revoke")
        .unwrap();
    let body = String::from_utf8(request.body.clone()).unwrap();
    assert!(body.contains("token=RefreshToken1"));
}

#[tokio::test]
async fn revocation_surfaces_bad_statuses() {
    let relying_party = relying_party();
    let (server, id, _handle) = ready_mock_provider(&relying_party).await;

    Mock::given(method("POST"))
        .and(path("/revoke"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let error = relying_party.revoke(id, REFRESH_TOKEN).await.unwrap_err();
    assert_matches!(
        error,
        Error::Revocation(RevocationError::BadStatus(status)) if status.as_u16() == 503
    );
}
