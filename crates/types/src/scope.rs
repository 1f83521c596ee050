// Copyright 2025, 2026 The oxidc Authors.
//
// SPDX-License-Identifier: MIT
// Please see LICENSE in the repository root for full details.

//! Types for the [access token scope], as defined in RFC 6749 §3.3.
//!
//! [access token scope]: https://www.rfc-editor.org/rfc/rfc6749#section-3.3

use std::{borrow::Cow, collections::BTreeSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The error type returned when a scope token is invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid scope token")]
pub struct InvalidScope;

/// A scope token as defined in RFC 6749 §3.3.
///
/// Tokens are restricted to the printable ASCII range, excluding space,
/// `"` and `\`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeToken(Cow<'static, str>);

/// The `openid` scope token, required for OpenID Connect requests.
pub const OPENID: ScopeToken = ScopeToken::from_static("openid");

/// The `profile` scope token.
pub const PROFILE: ScopeToken = ScopeToken::from_static("profile");

/// The `email` scope token.
pub const EMAIL: ScopeToken = ScopeToken::from_static("email");

// As per RFC 6749 §3.3:
//    scope-token = 1*NQCHAR
//    NQCHAR      = %x21 / %x23-5B / %x5D-7E
fn valid_scope_token(token: &str) -> bool {
    !token.is_empty()
        && token
            .bytes()
            .all(|b| matches!(b, 0x21 | 0x23..=0x5B | 0x5D..=0x7E))
}

impl ScopeToken {
    /// Create a `ScopeToken` from a static string.
    ///
    /// The token is not validated; it must conform to the RFC 6749 §3.3
    /// grammar.
    #[must_use]
    pub const fn from_static(token: &'static str) -> Self {
        Self(Cow::Borrowed(token))
    }

    /// Get this `ScopeToken` as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ScopeToken {
    type Err = InvalidScope;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if valid_scope_token(s) {
            Ok(Self(Cow::Owned(s.to_owned())))
        } else {
            Err(InvalidScope)
        }
    }
}

impl fmt::Display for ScopeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for ScopeToken {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ScopeToken {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A space-separated list of unique scope tokens.
///
/// The backing set keeps tokens ordered, so joining a `Scope` always
/// produces the same string for the same set of tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope(BTreeSet<ScopeToken>);

impl Scope {
    /// Whether this `Scope` is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The number of tokens in this `Scope`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether this `Scope` contains the given token.
    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.0.iter().any(|t| t.as_str() == token)
    }

    /// Add the given token to this `Scope`.
    ///
    /// Returns whether the token was newly inserted.
    pub fn insert(&mut self, token: ScopeToken) -> bool {
        self.0.insert(token)
    }
}

impl FromStr for Scope {
    type Err = InvalidScope;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split_ascii_whitespace()
            .map(ScopeToken::from_str)
            .collect()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(token.as_str())?;
        }
        Ok(())
    }
}

impl Serialize for Scope {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Scope {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl FromIterator<ScopeToken> for Scope {
    fn from_iter<T: IntoIterator<Item = ScopeToken>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Scope {
    type Item = ScopeToken;
    type IntoIter = std::collections::btree_set::IntoIter<ScopeToken>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Extend<ScopeToken> for Scope {
    fn extend<T: IntoIterator<Item = ScopeToken>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

impl TryFrom<&[&str]> for Scope {
    type Error = InvalidScope;

    fn try_from(tokens: &[&str]) -> Result<Self, Self::Error> {
        tokens.iter().map(|t| ScopeToken::from_str(t)).collect()
    }
}
