//! Configuration management for wxo-bridge
//!
//! This module provides configuration loading and saving.
//! Configuration is loaded from `~/.wxo-bridge/config.json` with environment variable overrides.

mod types;
pub mod validate;

pub use types::*;

use crate::error::Result;
use std::path::{Path, PathBuf};

/// Prefix for all environment variable overrides.
pub const ENV_PREFIX: &str = "WXO_BRIDGE_";

impl Config {
    /// Returns the wxo-bridge configuration directory path (~/.wxo-bridge)
    pub fn dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".wxo-bridge")
    }

    /// Returns the path to the config file (~/.wxo-bridge/config.json)
    pub fn path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load configuration from `path`, then apply environment overrides
    /// (`WXO_BRIDGE_SECTION_KEY`). A missing file yields the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Apply environment variable overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides using an arbitrary variable lookup.
    ///
    /// Prefixed variables win over the legacy unprefixed names
    /// (`WATSONX_API_KEY`, `SERVICE_INSTANCE_URL`, `WATSONX_PROJECT_ID`,
    /// `FRONTEND_URL`).
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        // Orchestrate
        if let Some(val) = var("ORCHESTRATE_API_KEY").or_else(|| lookup("WATSONX_API_KEY")) {
            self.orchestrate.api_key = Some(val);
        }
        if let Some(val) = var("ORCHESTRATE_HOST_URL") {
            self.orchestrate.host_url = val;
        }
        if let Some(val) =
            var("ORCHESTRATE_SERVICE_INSTANCE_URL").or_else(|| lookup("SERVICE_INSTANCE_URL"))
        {
            self.orchestrate.service_instance_url = Some(val);
        }
        if let Some(val) = var("ORCHESTRATE_IAM_URL") {
            self.orchestrate.iam_url = val;
        }
        if let Some(val) = var("ORCHESTRATE_TOKEN_SAFETY_MARGIN_SECS") {
            if let Ok(v) = val.parse() {
                self.orchestrate.token_safety_margin_secs = v;
            }
        }
        if let Some(val) = var("ORCHESTRATE_REQUEST_TIMEOUT_SECS") {
            if let Ok(v) = val.parse() {
                self.orchestrate.request_timeout_secs = v;
            }
        }
        if let Some(val) = var("ORCHESTRATE_PROJECT_ID").or_else(|| lookup("WATSONX_PROJECT_ID")) {
            self.orchestrate.project_id = Some(val);
        }

        // Agents
        if let Some(val) = var("AGENTS_FILE") {
            self.agents.file = Some(PathBuf::from(val));
        }
        if let Some(val) = var("AGENTS_JOB_LISTING_AGENT") {
            self.agents.job_listing_agent = Some(val);
        }

        // Gateway
        if let Some(val) = var("GATEWAY_HOST") {
            self.gateway.host = val;
        }
        if let Some(val) = var("GATEWAY_PORT") {
            if let Ok(v) = val.parse() {
                self.gateway.port = v;
            }
        }
        if let Some(val) = var("GATEWAY_FRONTEND_URL").or_else(|| lookup("FRONTEND_URL")) {
            self.gateway.frontend_url = Some(val);
        }

        // Logging
        if let Some(val) = var("LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Some(val) = var("LOG_FORMAT") {
            if let Ok(v) = val.parse() {
                self.logging.format = v;
            }
        }
    }

    /// Resolved path of the agents file.
    pub fn agents_file(&self) -> PathBuf {
        self.agents
            .file
            .clone()
            .unwrap_or_else(|| Self::dir().join("agents-config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.orchestrate.api_key.is_none());
        assert_eq!(config.orchestrate.host_url, DEFAULT_HOST_URL);
        assert_eq!(config.orchestrate.iam_url, DEFAULT_IAM_URL);
        assert_eq!(config.orchestrate.token_safety_margin_secs, 300);
        assert_eq!(config.gateway.port, 3001);
        assert!(config.agents.definitions.is_empty());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"gateway": {"port": 9000}}"#).unwrap();
        assert_eq!(config.gateway.port, 9000);
        assert_eq!(config.gateway.host, "0.0.0.0");
        assert_eq!(config.orchestrate.token_safety_margin_secs, 300);
    }

    #[test]
    fn test_prefixed_overrides() {
        let mut config = Config::default();
        config.apply_overrides_from(env(&[
            ("WXO_BRIDGE_ORCHESTRATE_API_KEY", "key-1"),
            ("WXO_BRIDGE_ORCHESTRATE_HOST_URL", "https://host.example"),
            ("WXO_BRIDGE_ORCHESTRATE_TOKEN_SAFETY_MARGIN_SECS", "60"),
            ("WXO_BRIDGE_GATEWAY_PORT", "8088"),
            ("WXO_BRIDGE_LOG_FORMAT", "json"),
            ("WXO_BRIDGE_AGENTS_FILE", "/etc/agents.json"),
        ]));
        assert_eq!(config.orchestrate.api_key(), Some("key-1"));
        assert_eq!(config.orchestrate.host_url, "https://host.example");
        assert_eq!(config.orchestrate.token_safety_margin_secs, 60);
        assert_eq!(config.gateway.port, 8088);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.agents_file(), PathBuf::from("/etc/agents.json"));
    }

    #[test]
    fn test_legacy_names_are_fallbacks() {
        let mut config = Config::default();
        config.apply_overrides_from(env(&[
            ("WATSONX_API_KEY", "legacy"),
            ("SERVICE_INSTANCE_URL", "https://instance.example"),
            ("FRONTEND_URL", "http://localhost:5173"),
            ("WATSONX_PROJECT_ID", "proj-legacy"),
        ]));
        assert_eq!(config.orchestrate.api_key(), Some("legacy"));
        assert_eq!(config.orchestrate.project_id.as_deref(), Some("proj-legacy"));
        assert_eq!(
            config.orchestrate.catalog_base_url(),
            "https://instance.example"
        );
        assert_eq!(
            config.gateway.frontend_url.as_deref(),
            Some("http://localhost:5173")
        );

        let mut config = Config::default();
        config.apply_overrides_from(env(&[
            ("WATSONX_API_KEY", "legacy"),
            ("WXO_BRIDGE_ORCHESTRATE_API_KEY", "prefixed"),
        ]));
        assert_eq!(config.orchestrate.api_key(), Some("prefixed"));
    }

    #[test]
    fn test_unparseable_numbers_are_ignored() {
        let mut config = Config::default();
        config.apply_overrides_from(env(&[("WXO_BRIDGE_GATEWAY_PORT", "not-a-port")]));
        assert_eq!(config.gateway.port, 3001);
    }

    #[test]
    fn test_blank_api_key_is_absent() {
        let mut config = Config::default();
        config.orchestrate.api_key = Some("   ".into());
        assert!(config.orchestrate.api_key().is_none());
    }

    #[test]
    fn test_catalog_base_url_falls_back_to_host() {
        let mut config = Config::default();
        assert_eq!(config.orchestrate.catalog_base_url(), DEFAULT_HOST_URL);
        config.orchestrate.service_instance_url = Some(String::new());
        assert_eq!(config.orchestrate.catalog_base_url(), DEFAULT_HOST_URL);
    }

    #[test]
    fn test_load_file_then_env() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"gateway": {"port": 4100}, "agents": {"job_listing_agent": "recruiter-bot"}}"#,
        )
        .unwrap();

        let mut config: Config =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        config.apply_overrides_from(env(&[("WXO_BRIDGE_GATEWAY_PORT", "4200")]));
        assert_eq!(config.gateway.port, 4200);
        assert_eq!(
            config.agents.job_listing_agent.as_deref(),
            Some("recruiter-bot")
        );

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(
            loaded.agents.job_listing_agent.as_deref(),
            Some("recruiter-bot")
        );
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from_path(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config.orchestrate.host_url, DEFAULT_HOST_URL);
    }

    #[test]
    fn test_load_malformed_file_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(Config::load_from_path(&path).is_err());
    }
}
