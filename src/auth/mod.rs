//! Bearer token acquisition for the Orchestrate APIs.
//!
//! An API key is exchanged for a short-lived bearer token by an
//! [`IdentityProvider`]; [`TokenCache`] keeps the most recent token and only
//! goes back to the provider when the cached one is about to expire.

pub mod cache;
pub mod iam;

use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

use crate::error::Result;

pub use cache::{TokenCache, TokenStatus};
pub use iam::IamIdentityProvider;

/// Grant type for IBM Cloud API key exchange.
pub const APIKEY_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";

/// Token as returned by an identity provider, before expiry is anchored.
#[derive(Clone, Deserialize)]
pub struct IssuedToken {
    /// Bearer token value
    pub access_token: String,
    /// Lifetime in seconds, counted from the moment of issue
    pub expires_in: u64,
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("access_token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// A cached bearer token with an absolute expiry.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    value: String,
    expires_at: Instant,
}

impl Token {
    /// Anchor an issued token's lifetime at `issued_at`.
    pub fn from_issued(issued: IssuedToken, issued_at: Instant) -> Self {
        Self {
            value: issued.access_token,
            expires_at: issued_at + Duration::from_secs(issued.expires_in),
        }
    }

    /// The bearer value to put in `Authorization` headers.
    pub fn secret(&self) -> &str {
        &self.value
    }

    /// Absolute expiry instant.
    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    /// `true` while `now` is strictly before `expires_at - margin`.
    pub fn is_fresh(&self, now: Instant, margin: Duration) -> bool {
        match self.expires_at.checked_sub(margin) {
            Some(deadline) => now < deadline,
            None => false,
        }
    }

    /// Time left until the hard expiry, zero once expired.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.expires_at.saturating_duration_since(now)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("value", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Exchanges configured credentials for a bearer token.
///
/// Implementations fail with [`crate::error::BridgeError::Auth`] when the
/// endpoint is unreachable, answers with a non-success status, or rejects
/// the credentials.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Perform one credential exchange.
    async fn exchange(&self) -> Result<IssuedToken>;
}
