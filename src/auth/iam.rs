//! IBM Cloud IAM identity provider.
//!
//! POSTs the API key as an `application/x-www-form-urlencoded` body to the
//! IAM token endpoint and reads `{access_token, expires_in}` back.

use async_trait::async_trait;
use reqwest::Client;

use super::{IdentityProvider, IssuedToken, APIKEY_GRANT_TYPE};
use crate::config::{OrchestrateConfig, DEFAULT_IAM_URL};
use crate::error::{BridgeError, Result};

/// API key exchange against IBM Cloud IAM.
pub struct IamIdentityProvider {
    api_key: String,
    iam_url: String,
    client: Client,
}

impl IamIdentityProvider {
    /// Create a provider for the default IAM endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Config`] if `api_key` is blank.
    pub fn new(api_key: &str, client: Client) -> Result<Self> {
        Self::with_url(api_key, DEFAULT_IAM_URL, client)
    }

    /// Create a provider for a custom IAM endpoint.
    pub fn with_url(api_key: &str, iam_url: &str, client: Client) -> Result<Self> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(BridgeError::Config(
                "Orchestrate API key is not configured".to_string(),
            ));
        }
        Ok(Self {
            api_key: api_key.to_string(),
            iam_url: iam_url.to_string(),
            client,
        })
    }

    /// Build from the `orchestrate` config section.
    pub fn from_config(config: &OrchestrateConfig, client: Client) -> Result<Self> {
        let api_key = config.api_key().ok_or_else(|| {
            BridgeError::Config("Orchestrate API key is not configured".to_string())
        })?;
        Self::with_url(api_key, &config.iam_url, client)
    }

    /// The endpoint this provider talks to.
    pub fn iam_url(&self) -> &str {
        &self.iam_url
    }
}

#[async_trait]
impl IdentityProvider for IamIdentityProvider {
    async fn exchange(&self) -> Result<IssuedToken> {
        let response = self
            .client
            .post(&self.iam_url)
            .header("Accept", "application/json")
            .form(&[
                ("grant_type", APIKEY_GRANT_TYPE),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| BridgeError::Auth(format!("identity endpoint unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BridgeError::Auth(format!(
                "failed to get IAM token: HTTP {}: {}",
                status.as_u16(),
                body
            )));
        }

        let issued: IssuedToken = response
            .json()
            .await
            .map_err(|e| BridgeError::Auth(format!("unexpected IAM response: {}", e)))?;

        if issued.access_token.is_empty() {
            return Err(BridgeError::Auth(
                "IAM response carried an empty access token".to_string(),
            ));
        }

        Ok(issued)
    }
}
