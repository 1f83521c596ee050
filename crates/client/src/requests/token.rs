// Copyright 2025, 2026 The oxidc Authors.
//
// SPDX-License-Identifier: MIT
// Please see LICENSE in the repository root for full details.

//! Requests for the Token endpoint.

use std::fmt;

use oxidc_types::{
    requests::{AccessTokenRequest, AuthorizationCodeGrant, RefreshTokenGrant},
    scope::Scope,
};
use reqwest::header::ACCEPT;
use serde::Serialize;
use url::Url;

use crate::{
    error::{OAuth2ErrorResponse, TokenRequestError},
    provider::ProviderInfo,
};

/// The client authentication methods this library can use at the token
/// endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenEndpointAuthMethod {
    /// `client_secret_basic`: credentials in the `Authorization` header.
    ClientSecretBasic,

    /// `client_secret_post`: credentials in the form body.
    ClientSecretPost,

    /// `none`: no client authentication, for public clients.
    None,
}

impl TokenEndpointAuthMethod {
    /// Select the authentication method to use from the methods a provider
    /// advertises.
    ///
    /// The preference is fixed: `client_secret_basic` over
    /// `client_secret_post` over `none`. An empty or unrecognized list
    /// falls back to `client_secret_basic`.
    #[must_use]
    pub fn select(supported: &[String]) -> Self {
        if supported.iter().any(|m| m == "client_secret_basic") {
            Self::ClientSecretBasic
        } else if supported.iter().any(|m| m == "client_secret_post") {
            Self::ClientSecretPost
        } else if supported.iter().any(|m| m == "none") {
            Self::None
        } else {
            Self::ClientSecretBasic
        }
    }
}

/// The credentials to authenticate the client on endpoints that require
/// it.
#[derive(Clone)]
pub enum ClientCredentials {
    /// No client authentication is used.
    None {
        /// The unique ID for the client.
        client_id: String,
    },

    /// The client authentication is sent via the `Authorization` HTTP
    /// header.
    ClientSecretBasic {
        /// The unique ID for the client.
        client_id: String,

        /// The secret of the client.
        client_secret: String,
    },

    /// The client authentication is sent with the body of the request.
    ClientSecretPost {
        /// The unique ID for the client.
        client_id: String,

        /// The secret of the client.
        client_secret: String,
    },
}

impl ClientCredentials {
    /// The credentials matching the provider's advertised authentication
    /// methods.
    #[must_use]
    pub fn for_provider(info: &ProviderInfo) -> Self {
        match TokenEndpointAuthMethod::select(&info.token_endpoint_auth_methods_supported) {
            TokenEndpointAuthMethod::ClientSecretBasic => Self::ClientSecretBasic {
                client_id: info.client_id.clone(),
                client_secret: info.client_secret.clone(),
            },
            TokenEndpointAuthMethod::ClientSecretPost => Self::ClientSecretPost {
                client_id: info.client_id.clone(),
                client_secret: info.client_secret.clone(),
            },
            TokenEndpointAuthMethod::None => Self::None {
                client_id: info.client_id.clone(),
            },
        }
    }

    /// Basic credentials for the provider, regardless of what it
    /// advertises.
    #[must_use]
    pub fn basic(info: &ProviderInfo) -> Self {
        Self::ClientSecretBasic {
            client_id: info.client_id.clone(),
            client_secret: info.client_secret.clone(),
        }
    }

    /// Get the client ID of these `ClientCredentials`.
    #[must_use]
    pub fn client_id(&self) -> &str {
        match self {
            Self::None { client_id }
            | Self::ClientSecretBasic { client_id, .. }
            | Self::ClientSecretPost { client_id, .. } => client_id,
        }
    }

    /// Apply these credentials to the given request with the given form.
    pub(crate) fn authenticated_form<T: Serialize>(
        &self,
        request: reqwest::RequestBuilder,
        form: &T,
    ) -> reqwest::RequestBuilder {
        match self {
            Self::None { client_id } => request.form(&RequestWithClientCredentials {
                body: form,
                client_id: Some(client_id),
                client_secret: Option::None,
            }),

            Self::ClientSecretBasic {
                client_id,
                client_secret,
            } => {
                // Credentials are form-encoded before going into the
                // header, as per RFC 6749 §2.3.1.
                let username =
                    form_urlencoded::byte_serialize(client_id.as_bytes()).collect::<String>();
                let password =
                    form_urlencoded::byte_serialize(client_secret.as_bytes()).collect::<String>();

                request
                    .basic_auth(username, Some(password))
                    .form(&RequestWithClientCredentials {
                        body: form,
                        client_id: Option::None,
                        client_secret: Option::None,
                    })
            }

            Self::ClientSecretPost {
                client_id,
                client_secret,
            } => request.form(&RequestWithClientCredentials {
                body: form,
                client_id: Some(client_id),
                client_secret: Some(client_secret),
            }),
        }
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None { client_id } => f
                .debug_struct("None")
                .field("client_id", client_id)
                .finish(),
            Self::ClientSecretBasic { client_id, .. } => f
                .debug_struct("ClientSecretBasic")
                .field("client_id", client_id)
                .finish_non_exhaustive(),
            Self::ClientSecretPost { client_id, .. } => f
                .debug_struct("ClientSecretPost")
                .field("client_id", client_id)
                .finish_non_exhaustive(),
        }
    }
}

/// A request form with client credentials added to it.
#[derive(Clone, Serialize)]
struct RequestWithClientCredentials<'a, T> {
    #[serde(flatten)]
    body: &'a T,

    #[serde(skip_serializing_if = "Option::is_none")]
    client_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    client_secret: Option<&'a str>,
}

/// POST a form to the token endpoint and return the raw response body.
///
/// This is the single-shot pipeline shared by the code exchange and the
/// token refresh; it does not retry.
///
/// # Errors
///
/// Returns an error if the request fails or the endpoint answers with a
/// non-success status.
#[tracing::instrument(skip_all, fields(token_endpoint = %token_endpoint))]
pub async fn request_token(
    client: &reqwest::Client,
    credentials: &ClientCredentials,
    token_endpoint: &Url,
    request: &AccessTokenRequest,
) -> Result<String, TokenRequestError> {
    tracing::debug!("Requesting access token...");

    let builder = client
        .post(token_endpoint.as_str())
        .header(ACCEPT, "application/json");
    let builder = credentials.authenticated_form(builder, request);

    let response = builder.send().await.map_err(TokenRequestError::from_reqwest)?;

    let status = response.status();
    let body = response.text().await.map_err(TokenRequestError::from_reqwest)?;

    if !status.is_success() {
        let error = serde_json::from_str::<OAuth2ErrorResponse>(&body).ok();
        return Err(TokenRequestError::Http {
            status,
            body,
            error,
        });
    }

    Ok(body)
}

/// Exchange an authorization code for tokens.
///
/// The `redirect_uri` sent with the request is the provider's configured
/// local endpoint, and the PKCE verifier is added when the authorization
/// request carried a challenge.
///
/// # Errors
///
/// Returns an error if the provider has no token endpoint yet, the request
/// fails, or the endpoint answers with a non-success status.
pub async fn exchange_code(
    client: &reqwest::Client,
    info: &ProviderInfo,
    code: String,
    code_verifier: Option<String>,
) -> Result<String, TokenRequestError> {
    let token_endpoint = info
        .token_endpoint
        .as_ref()
        .ok_or(TokenRequestError::ProviderNotReady)?;
    let credentials = ClientCredentials::for_provider(info);

    let request = AccessTokenRequest::AuthorizationCode(AuthorizationCodeGrant {
        code,
        redirect_uri: Some(info.local_endpoint.clone()),
        code_verifier,
    });

    request_token(client, &credentials, token_endpoint, &request).await
}

/// Refresh an access token.
///
/// # Errors
///
/// Returns an error if the provider has no token endpoint yet, the request
/// fails, or the endpoint answers with a non-success status.
pub async fn refresh_token(
    client: &reqwest::Client,
    info: &ProviderInfo,
    refresh_token: String,
    scope: Option<Scope>,
) -> Result<String, TokenRequestError> {
    let token_endpoint = info
        .token_endpoint
        .as_ref()
        .ok_or(TokenRequestError::ProviderNotReady)?;
    let credentials = ClientCredentials::for_provider(info);

    let request = AccessTokenRequest::RefreshToken(RefreshTokenGrant {
        refresh_token,
        scope: scope.filter(|scope| !scope.is_empty()),
    });

    request_token(client, &credentials, token_endpoint, &request).await
}
