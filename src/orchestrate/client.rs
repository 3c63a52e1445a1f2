//! reqwest implementation of [`OrchestrateApi`].

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde_json::Value;

use super::catalog::{build_url, CatalogRequest};
use super::types::{SendMessageRequest, SkillRequest};
use super::OrchestrateApi;
use crate::config::OrchestrateConfig;
use crate::error::{BridgeError, Result};
use crate::log_component;

/// HTTP client for the Orchestrate messaging and catalog endpoints.
pub struct OrchestrateClient {
    client: Client,
    host_url: String,
    catalog_base_url: String,
}

impl OrchestrateClient {
    /// Create a client. `catalog_base_url` is the service instance URL.
    pub fn new(client: Client, host_url: &str, catalog_base_url: &str) -> Self {
        Self {
            client,
            host_url: host_url.to_string(),
            catalog_base_url: catalog_base_url.to_string(),
        }
    }

    /// Build from the `orchestrate` config section.
    pub fn from_config(config: &OrchestrateConfig, client: Client) -> Self {
        Self::new(client, &config.host_url, config.catalog_base_url())
    }

    pub fn host_url(&self) -> &str {
        &self.host_url
    }

    pub fn catalog_base_url(&self) -> &str {
        &self.catalog_base_url
    }
}

/// Turn a non-success response into [`BridgeError::Upstream`].
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(BridgeError::upstream(status.as_u16(), body))
}

#[async_trait]
impl OrchestrateApi for OrchestrateClient {
    async fn send_message(
        &self,
        bearer: &str,
        remote_agent_id: &str,
        request: &SendMessageRequest,
    ) -> Result<Value> {
        let url = build_url(
            &self.host_url,
            &["v2", "assistants", remote_agent_id, "message"],
            &[],
        )?;

        log_component!(debug, "orchestrate", "sending message", remote_agent_id = remote_agent_id);

        let response = self
            .client
            .post(url)
            .bearer_auth(bearer)
            .header("Accept", "application/json")
            .json(request)
            .send()
            .await?;

        let response = match check_status(response).await {
            Ok(response) => response,
            Err(e) => {
                log_component!(
                    warn,
                    "orchestrate",
                    "message rejected by remote agent",
                    remote_agent_id = remote_agent_id,
                    status = e.upstream_status().unwrap_or_default()
                );
                return Err(e);
            }
        };

        Ok(response.json().await?)
    }

    async fn fetch_catalog(&self, bearer: &str, request: &CatalogRequest) -> Result<Value> {
        let url = request.url(&self.catalog_base_url)?;

        log_component!(debug, "orchestrate", "fetching catalog", kind = request.kind());

        let response = self
            .client
            .get(url)
            .bearer_auth(bearer)
            .header("Accept", "application/json")
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    async fn create_session(&self, bearer: &str, remote_agent_id: &str) -> Result<String> {
        let url = build_url(
            &self.host_url,
            &["v2", "assistants", remote_agent_id, "sessions"],
            &[],
        )?;

        let response = self
            .client
            .post(url)
            .bearer_auth(bearer)
            .header("Accept", "application/json")
            .json(&serde_json::json!({}))
            .send()
            .await?;

        let response = check_status(response).await?;
        let status = response.status().as_u16();
        let payload: Value = response.json().await?;
        let session_id = payload
            .get("session_id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                BridgeError::upstream(status, format!("no session_id in response: {}", payload))
            })?;

        log_component!(
            info,
            "orchestrate",
            "session created",
            remote_agent_id = remote_agent_id,
            session_id = session_id
        );
        Ok(session_id.to_string())
    }

    async fn send_session_message(
        &self,
        bearer: &str,
        remote_agent_id: &str,
        session_id: &str,
        request: &SendMessageRequest,
    ) -> Result<Value> {
        let url = build_url(
            &self.host_url,
            &["v2", "assistants", remote_agent_id, "sessions", session_id, "message"],
            &[],
        )?;

        let response = self
            .client
            .post(url)
            .bearer_auth(bearer)
            .header("Accept", "application/json")
            .json(request)
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    async fn delete_session(
        &self,
        bearer: &str,
        remote_agent_id: &str,
        session_id: &str,
    ) -> Result<bool> {
        let url = build_url(
            &self.host_url,
            &["v2", "assistants", remote_agent_id, "sessions", session_id],
            &[],
        )?;

        let response = self.client.delete(url).bearer_auth(bearer).send().await?;
        let deleted = response.status().is_success();
        if !deleted {
            log_component!(
                warn,
                "orchestrate",
                "session delete rejected",
                session_id = session_id,
                status = response.status().as_u16()
            );
        }
        Ok(deleted)
    }

    async fn invoke_skill(&self, bearer: &str, request: &SkillRequest) -> Result<Value> {
        let url = build_url(&self.catalog_base_url, &["skills", "invoke"], &[])?;

        log_component!(
            debug,
            "orchestrate",
            "invoking skill",
            skill = request.skill_name.as_str()
        );

        let response = self
            .client
            .post(url)
            .bearer_auth(bearer)
            .header("Accept", "application/json")
            .json(request)
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(response.json().await?)
    }
}
