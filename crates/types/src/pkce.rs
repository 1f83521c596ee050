// Copyright 2025, 2026 The oxidc Authors.
//
// SPDX-License-Identifier: MIT
// Please see LICENSE in the repository root for full details.

//! Types for [Proof Key for Code Exchange].
//!
//! [Proof Key for Code Exchange]: https://www.rfc-editor.org/rfc/rfc7636

use std::{borrow::Cow, fmt, str::FromStr};

use base64ct::{Base64UrlUnpadded, Encoding};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors that can occur when handling a code challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CodeChallengeError {
    /// The code verifier is invalid per RFC 7636 §4.1.
    #[error("code verifier should contain between 43 and 128 unreserved characters")]
    InvalidCodeVerifier,

    /// The code challenge does not match the verifier.
    #[error("code challenge verification failed")]
    VerificationFailed,
}

// As per RFC 7636 §4.1:
//    code-verifier = 43*128unreserved
//    unreserved    = ALPHA / DIGIT / "-" / "." / "_" / "~"
fn valid_code_verifier(verifier: &str) -> bool {
    (43..=128).contains(&verifier.len())
        && verifier
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~'))
}

/// A code challenge method per RFC 7636 §4.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodeChallengeMethod {
    /// `plain`, the challenge is the verifier itself.
    #[serde(rename = "plain")]
    Plain,

    /// `S256`, the challenge is the unpadded base64url-encoded SHA-256 hash
    /// of the verifier.
    #[serde(rename = "S256")]
    S256,
}

impl fmt::Display for CodeChallengeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain => f.write_str("plain"),
            Self::S256 => f.write_str("S256"),
        }
    }
}

impl FromStr for CodeChallengeMethod {
    type Err = CodeChallengeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plain" => Ok(Self::Plain),
            "S256" => Ok(Self::S256),
            _ => Err(CodeChallengeError::VerificationFailed),
        }
    }
}

/// Helpers to compute and verify code challenges.
pub trait CodeChallengeMethodExt {
    /// Compute the challenge for the given verifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the verifier is invalid per RFC 7636 §4.1.
    fn compute_challenge<'a>(&self, verifier: &'a str)
        -> Result<Cow<'a, str>, CodeChallengeError>;

    /// Verify that the given challenge matches the given verifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the verifier is invalid or does not match the
    /// challenge.
    fn verify(&self, challenge: &str, verifier: &str) -> Result<(), CodeChallengeError>;
}

impl CodeChallengeMethodExt for CodeChallengeMethod {
    fn compute_challenge<'a>(
        &self,
        verifier: &'a str,
    ) -> Result<Cow<'a, str>, CodeChallengeError> {
        if !valid_code_verifier(verifier) {
            return Err(CodeChallengeError::InvalidCodeVerifier);
        }

        let challenge = match self {
            Self::Plain => verifier.into(),
            Self::S256 => {
                let hash = Sha256::digest(verifier.as_bytes());
                Base64UrlUnpadded::encode_string(&hash).into()
            }
        };

        Ok(challenge)
    }

    fn verify(&self, challenge: &str, verifier: &str) -> Result<(), CodeChallengeError> {
        if self.compute_challenge(verifier)? == challenge {
            Ok(())
        } else {
            Err(CodeChallengeError::VerificationFailed)
        }
    }
}

/// The PKCE parameters of an authorization request, flattened into its
/// query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRequestPkce {
    /// The method used to derive the challenge from the verifier.
    pub code_challenge_method: CodeChallengeMethod,

    /// The code challenge.
    pub code_challenge: String,
}

/// A code verifier together with its derived challenge.
///
/// The verifier is produced by the host and sent with the token request;
/// only the challenge travels in the authorization request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkcePair {
    /// The challenge method.
    pub method: CodeChallengeMethod,

    /// The code verifier.
    pub verifier: String,

    /// The challenge derived from the verifier.
    pub challenge: String,
}

impl PkcePair {
    /// Derive the challenge for the given verifier and method.
    ///
    /// # Errors
    ///
    /// Returns an error if the verifier is invalid per RFC 7636 §4.1.
    pub fn from_verifier(
        method: CodeChallengeMethod,
        verifier: &str,
    ) -> Result<Self, CodeChallengeError> {
        let challenge = method.compute_challenge(verifier)?.into_owned();

        Ok(Self {
            method,
            verifier: verifier.to_owned(),
            challenge,
        })
    }

    /// The parameters to add to the authorization request query.
    #[must_use]
    pub fn authorization_request(&self) -> AuthorizationRequestPkce {
        AuthorizationRequestPkce {
            code_challenge_method: self.method,
            code_challenge: self.challenge.clone(),
        }
    }
}
