//! Conversation types
//!
//! Everything here serializes with the camelCase keys the chat frontend
//! reads (`conversationId`, `agentId`, `agentName`, `lastActivity`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agents::AgentDefinition;

/// Author of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// One transcript entry. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Agent that produced (or is announced by) this entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
}

impl Message {
    /// A message typed by the user.
    pub fn user(content: &str) -> Self {
        Self {
            role: Role::User,
            content: content.to_string(),
            timestamp: Utc::now(),
            agent_id: None,
            agent_name: None,
        }
    }

    /// A reply from `agent`.
    pub fn assistant(content: &str, agent: &AgentDefinition) -> Self {
        Self::attributed(Role::Assistant, content, agent)
    }

    /// A notice about `agent`, e.g. an agent switch.
    pub fn system(content: &str, agent: &AgentDefinition) -> Self {
        Self::attributed(Role::System, content, agent)
    }

    fn attributed(role: Role, content: &str, agent: &AgentDefinition) -> Self {
        Self {
            role,
            content: content.to_string(),
            timestamp: Utc::now(),
            agent_id: Some(agent.id.clone()),
            agent_name: Some(agent.display_name.clone()),
        }
    }

    /// The transcript entry recorded when a conversation moves to `agent`.
    pub fn switched_to(agent: &AgentDefinition) -> Self {
        Self::system(&format!("Switched to {}", agent.display_name), agent)
    }
}

/// A local chat with one agent at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    #[serde(rename = "conversationId")]
    pub id: String,
    #[serde(rename = "agentId")]
    pub current_agent_id: String,
    /// Display name of the current agent
    pub agent_name: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "lastActivity")]
    pub last_activity_at: DateTime<Utc>,
}

impl Conversation {
    /// A fresh conversation with `agent` and an empty transcript.
    pub fn new(id: String, agent: &AgentDefinition) -> Self {
        let now = Utc::now();
        Self {
            id,
            current_agent_id: agent.id.clone(),
            agent_name: agent.display_name.clone(),
            messages: Vec::new(),
            created_at: now,
            last_activity_at: now,
        }
    }

    /// Append a message and bump `last_activity_at`.
    ///
    /// The activity timestamp never moves backwards, even if the wall clock does.
    pub fn push(&mut self, message: Message) {
        if message.timestamp > self.last_activity_at {
            self.last_activity_at = message.timestamp;
        }
        self.messages.push(message);
    }

    /// Make `agent` current and record the switch notice.
    pub fn switch_to(&mut self, agent: &AgentDefinition) {
        self.current_agent_id = agent.id.clone();
        self.agent_name = agent.display_name.clone();
        self.push(Message::switched_to(agent));
    }

    /// Last transcript entry, if any.
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn summary(&self) -> ConversationSummary {
        ConversationSummary {
            conversation_id: self.id.clone(),
            agent_id: self.current_agent_id.clone(),
            agent_name: self.agent_name.clone(),
            message_count: self.messages.len(),
            created_at: self.created_at,
            last_activity_at: self.last_activity_at,
        }
    }
}

/// Listing entry for a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub conversation_id: String,
    pub agent_id: String,
    pub agent_name: String,
    pub message_count: usize,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "lastActivity")]
    pub last_activity_at: DateTime<Utc>,
}

/// Result of an agent switch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchSummary {
    pub conversation_id: String,
    pub agent_id: String,
    pub agent_name: String,
}
