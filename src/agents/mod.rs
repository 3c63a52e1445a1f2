//! Agent registry
//!
//! Static list of the remote agents the bridge may talk to. Definitions are
//! loaded once at startup, either inline from the config file or from a
//! separate agents file:
//!
//! ```json
//! {
//!   "agents": [
//!     { "id": "recruiter-bot", "name": "Recruiter", "agentId": "4f0c..." }
//!   ]
//! }
//! ```
//!
//! A registry that cannot be loaded completely is a fatal configuration
//! error; the bridge never runs with an empty or partial registry.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use crate::config::Config;
use crate::error::{BridgeError, Result};
use crate::log_component;

/// A configured remote agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDefinition {
    /// Local identifier used by the frontend and in conversation ids
    pub id: String,
    /// Human readable name, shown in switch notices
    #[serde(rename = "name", alias = "displayName")]
    pub display_name: String,
    /// Identifier of the agent on the Orchestrate platform
    #[serde(rename = "agentId", alias = "remoteAgentId")]
    pub remote_agent_id: String,
    /// Optional free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Any other fields from the agents file, forwarded to the frontend as-is
    #[serde(flatten)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl AgentDefinition {
    /// Create a definition without description or metadata.
    pub fn new(id: &str, display_name: &str, remote_agent_id: &str) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            remote_agent_id: remote_agent_id.to_string(),
            description: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Builder: set the description.
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// On-disk layout of the agents file.
#[derive(Debug, Deserialize)]
struct AgentsFile {
    agents: Vec<AgentDefinition>,
}

/// Immutable, ordered set of agent definitions.
#[derive(Debug, Clone)]
pub struct AgentRegistry {
    agents: Vec<AgentDefinition>,
    index: HashMap<String, usize>,
}

impl AgentRegistry {
    /// Build a registry, rejecting empty lists, blank fields and duplicate ids.
    pub fn new(agents: Vec<AgentDefinition>) -> Result<Self> {
        if agents.is_empty() {
            return Err(BridgeError::Config(
                "no agent definitions configured".to_string(),
            ));
        }

        let mut index = HashMap::with_capacity(agents.len());
        for (i, agent) in agents.iter().enumerate() {
            if agent.id.trim().is_empty() {
                return Err(BridgeError::Config(format!(
                    "agent definition #{} has an empty id",
                    i
                )));
            }
            if agent.remote_agent_id.trim().is_empty() {
                return Err(BridgeError::Config(format!(
                    "agent '{}' has an empty remote agent id",
                    agent.id
                )));
            }
            if index.insert(agent.id.clone(), i).is_some() {
                return Err(BridgeError::Config(format!(
                    "duplicate agent id '{}'",
                    agent.id
                )));
            }
        }

        Ok(Self { agents, index })
    }

    /// Load definitions from an agents file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BridgeError::Config(format!(
                "cannot read agents file {}: {}",
                path.display(),
                e
            ))
        })?;
        let file: AgentsFile = serde_json::from_str(&content).map_err(|e| {
            BridgeError::Config(format!(
                "malformed agents file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::new(file.agents)
    }

    /// Load the registry the config points at.
    ///
    /// Inline `agents.definitions` win; otherwise the agents file is read.
    pub fn from_config(config: &Config) -> Result<Self> {
        let registry = if config.agents.definitions.is_empty() {
            let path = config.agents_file();
            let registry = Self::from_file(&path)?;
            log_component!(
                info,
                "agents",
                "loaded agents file",
                path = tracing::field::display(path.display()),
                count = registry.len()
            );
            registry
        } else {
            Self::new(config.agents.definitions.clone())?
        };

        if let Some(ref id) = config.agents.job_listing_agent {
            if !registry.contains(id) {
                return Err(BridgeError::Config(format!(
                    "job_listing_agent '{}' is not a registered agent",
                    id
                )));
            }
        }

        Ok(registry)
    }

    /// All definitions in configured order.
    pub fn list_agents(&self) -> &[AgentDefinition] {
        &self.agents
    }

    /// Look up a definition by local id.
    pub fn get_agent(&self, id: &str) -> Result<&AgentDefinition> {
        self.index
            .get(id)
            .map(|&i| &self.agents[i])
            .ok_or_else(|| BridgeError::NotFound(format!("agent '{}'", id)))
    }

    /// Returns `true` if `id` is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// First configured agent.
    pub fn first(&self) -> &AgentDefinition {
        // `new` guarantees at least one entry.
        &self.agents[0]
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
