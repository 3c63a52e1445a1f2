//! Error types for wxo-bridge
//!
//! This module defines all error types used throughout the bridge.
//! Uses `thiserror` for ergonomic error handling with automatic `Display` and
//! `Error` trait implementations.

use thiserror::Error;

/// The primary error type for wxo-bridge operations.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Configuration errors (missing API key, malformed agents file, etc.).
    /// Only raised at startup; the process refuses to run with bad config.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unknown conversation, agent or other resource
    #[error("Not found: {0}")]
    NotFound(String),

    /// Credential exchange with the identity provider failed
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The remote Orchestrate service answered with a non-success status
    #[error("Upstream error: HTTP {status}: {body}")]
    Upstream {
        /// HTTP status returned by the remote service
        status: u16,
        /// Raw response body (may be empty)
        body: String,
    },

    /// Caller supplied an unusable value (empty message, blank id, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport errors (connect failures, timeouts, bad bodies)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl BridgeError {
    /// Build an [`BridgeError::Upstream`] from a status code and body.
    pub fn upstream(status: u16, body: impl Into<String>) -> Self {
        BridgeError::Upstream {
            status,
            body: body.into(),
        }
    }

    /// Returns the remote HTTP status for upstream failures.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            BridgeError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` for failures caused by the caller rather than by this
    /// service or its upstreams.
    pub fn is_client_error(&self) -> bool {
        matches!(self, BridgeError::NotFound(_) | BridgeError::InvalidInput(_))
    }
}

/// A specialized `Result` type for wxo-bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;
