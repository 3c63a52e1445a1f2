//! Configuration type definitions for wxo-bridge
//!
//! This module defines all configuration structs used throughout the bridge.
//! All types implement serde traits for JSON serialization and have sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::agents::AgentDefinition;

/// Main configuration struct for wxo-bridge
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// watsonx Orchestrate credentials and endpoints
    pub orchestrate: OrchestrateConfig,
    /// Agent definitions (inline or via an agents file)
    pub agents: AgentsConfig,
    /// HTTP facade configuration
    pub gateway: GatewayConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

// ============================================================================
// Orchestrate Configuration
// ============================================================================

/// Default watsonx Orchestrate host used for agent messaging.
pub const DEFAULT_HOST_URL: &str = "https://us-south.watson-orchestrate.cloud.ibm.com";

/// Default IBM Cloud IAM token endpoint.
pub const DEFAULT_IAM_URL: &str = "https://iam.cloud.ibm.com/identity/token";

/// Credentials and endpoints for the remote agent platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestrateConfig {
    /// IBM Cloud API key exchanged for bearer tokens
    pub api_key: Option<String>,
    /// Base URL for `/v2/assistants/{id}/message`
    pub host_url: String,
    /// Base URL for the agent/thread catalog endpoints (defaults to `host_url`)
    pub service_instance_url: Option<String>,
    /// IAM token endpoint
    pub iam_url: String,
    /// Tokens are refreshed this many seconds before they expire
    pub token_safety_margin_secs: u64,
    /// Transport timeout for outbound requests
    pub request_timeout_secs: u64,
    /// Project scope sent with skill invocations
    pub project_id: Option<String>,
}

impl Default for OrchestrateConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            host_url: DEFAULT_HOST_URL.to_string(),
            service_instance_url: None,
            iam_url: DEFAULT_IAM_URL.to_string(),
            token_safety_margin_secs: 300,
            request_timeout_secs: 120,
            project_id: None,
        }
    }
}

impl OrchestrateConfig {
    /// The configured API key, if it is present and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// Base URL for catalog calls, falling back to the messaging host.
    pub fn catalog_base_url(&self) -> &str {
        self.service_instance_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or(&self.host_url)
    }
}

// ============================================================================
// Agents Configuration
// ============================================================================

/// Where the agent registry is loaded from.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AgentsConfig {
    /// Path to an agents file (`{"agents": [...]}`); defaults to
    /// `~/.wxo-bridge/agents-config.json`
    pub file: Option<PathBuf>,
    /// Inline definitions; take precedence over `file` when non-empty
    pub definitions: Vec<AgentDefinition>,
    /// Agent used by the job listing helper when the request names none
    pub job_listing_agent: Option<String>,
}

// ============================================================================
// Gateway Configuration
// ============================================================================

/// HTTP facade configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Allowed CORS origin; any origin is allowed when unset
    pub frontend_url: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            frontend_url: None,
        }
    }
}

// ============================================================================
// Logging Configuration
// ============================================================================

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable multi-line output
    Pretty,
    /// Compact single-line output with component tags
    #[default]
    Component,
    /// Structured JSON lines
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "component" => Ok(LogFormat::Component),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Output format
    pub format: LogFormat,
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    /// Optional log file (appended to)
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Component,
            level: "info".to_string(),
            file: None,
        }
    }
}
