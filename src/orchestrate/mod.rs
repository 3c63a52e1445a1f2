//! watsonx Orchestrate remote API
//!
//! Two kinds of calls are made, both with a bearer token from
//! [`crate::auth::TokenCache`]:
//! - the messaging endpoint on the host URL, which forwards one user turn to
//!   a remote agent and returns its reply payload
//! - read-only catalog listings (agents, threads, thread messages) on the
//!   service instance URL, forwarded verbatim to the caller
//! - single-agent session lifecycle and skill invocation, whose payloads are
//!   likewise passed through untouched

pub mod catalog;
pub mod client;
pub mod types;

pub use catalog::CatalogRequest;
pub use client::OrchestrateClient;
pub use types::{
    extract_reply_text, AgentQuery, PageQuery, SendMessageRequest, SkillRequest, ThreadQuery,
    NO_RESPONSE,
};

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Remote Orchestrate operations.
///
/// Implementations map non-success statuses to
/// [`crate::error::BridgeError::Upstream`] and transport failures to
/// [`crate::error::BridgeError::Http`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrchestrateApi: Send + Sync {
    /// `POST {host}/v2/assistants/{remote_agent_id}/message`
    async fn send_message(
        &self,
        bearer: &str,
        remote_agent_id: &str,
        request: &SendMessageRequest,
    ) -> Result<Value>;

    /// One read-only catalog call; the payload is returned untouched.
    async fn fetch_catalog(&self, bearer: &str, request: &CatalogRequest) -> Result<Value>;

    /// `POST {host}/v2/assistants/{remote_agent_id}/sessions`, returning the
    /// new `session_id`.
    async fn create_session(&self, bearer: &str, remote_agent_id: &str) -> Result<String>;

    /// `POST {host}/v2/assistants/{remote_agent_id}/sessions/{session_id}/message`
    async fn send_session_message(
        &self,
        bearer: &str,
        remote_agent_id: &str,
        session_id: &str,
        request: &SendMessageRequest,
    ) -> Result<Value>;

    /// `DELETE {host}/v2/assistants/{remote_agent_id}/sessions/{session_id}`.
    ///
    /// A rejected delete is `Ok(false)`, not an error.
    async fn delete_session(
        &self,
        bearer: &str,
        remote_agent_id: &str,
        session_id: &str,
    ) -> Result<bool>;

    /// `POST {instance}/skills/invoke`
    async fn invoke_skill(&self, bearer: &str, request: &SkillRequest) -> Result<Value>;
}

/// Shared HTTP client for IAM and Orchestrate calls.
pub fn http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("wxo-bridge/", env!("CARGO_PKG_VERSION")))
        .build()?)
}
