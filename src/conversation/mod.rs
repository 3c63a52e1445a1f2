//! Conversation module - local chat transcripts keyed by generated ids
//!
//! A conversation talks to one registered agent at a time and records every
//! user message, agent reply and agent switch in order. Storage is delegated
//! to a [`ConversationBackend`]; [`MemoryBackend`] keeps everything in
//! process memory.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use wxo_bridge::agents::{AgentDefinition, AgentRegistry};
//! use wxo_bridge::conversation::ConversationStore;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let registry = AgentRegistry::new(vec![
//!     AgentDefinition::new("recruiter-bot", "Recruiter", "remote-1"),
//!     AgentDefinition::new("scheduler-bot", "Scheduler", "remote-2"),
//! ])
//! .unwrap();
//! let store = ConversationStore::in_memory(Arc::new(registry));
//!
//! let conv = store.create("recruiter-bot").await.unwrap();
//! let switched = store.switch_agent(&conv.id, "scheduler-bot").await.unwrap();
//! assert_eq!(switched.agent_name, "Scheduler");
//! # }
//! ```

pub mod backend;
pub mod types;

pub use backend::{ConversationBackend, MemoryBackend};
pub use types::{Conversation, ConversationSummary, Message, Role, SwitchSummary};

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::agents::AgentRegistry;
use crate::error::{BridgeError, Result};

/// Length of the random suffix in generated conversation ids.
const ID_SUFFIX_LEN: usize = 9;

/// Upper bound on id regeneration after collisions.
const MAX_ID_ATTEMPTS: usize = 8;

/// Conversation lifecycle on top of a storage backend.
///
/// Cheap to clone; clones share the same backend.
#[derive(Clone)]
pub struct ConversationStore {
    registry: Arc<AgentRegistry>,
    backend: Arc<dyn ConversationBackend>,
}

impl ConversationStore {
    pub fn new(registry: Arc<AgentRegistry>, backend: Arc<dyn ConversationBackend>) -> Self {
        Self { registry, backend }
    }

    /// Store backed by a fresh [`MemoryBackend`].
    pub fn in_memory(registry: Arc<AgentRegistry>) -> Self {
        Self::new(registry, Arc::new(MemoryBackend::new()))
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    pub fn backend_name(&self) -> &str {
        self.backend.backend_name()
    }

    /// Start an empty conversation with `agent_id`.
    ///
    /// # Errors
    ///
    /// [`BridgeError::NotFound`] if the agent is not registered; nothing is stored.
    pub async fn create(&self, agent_id: &str) -> Result<Conversation> {
        let agent = self.registry.get_agent(agent_id)?;

        for _ in 0..MAX_ID_ATTEMPTS {
            let conversation = Conversation::new(generate_id(&agent.id), agent);
            if self.backend.insert(conversation.clone()).await? {
                return Ok(conversation);
            }
        }

        Err(BridgeError::Io(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("could not allocate a conversation id for agent '{}'", agent_id),
        )))
    }

    /// Fetch a conversation with its full transcript.
    pub async fn get(&self, id: &str) -> Result<Conversation> {
        self.backend
            .load(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Summaries ordered by creation time, ties broken by id.
    pub async fn list(&self) -> Result<Vec<ConversationSummary>> {
        let mut summaries = self.backend.summaries().await?;
        summaries.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.conversation_id.cmp(&b.conversation_id))
        });
        Ok(summaries)
    }

    /// Remove a conversation. Returns `false` when it did not exist.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        self.backend.remove(id).await
    }

    /// Move a conversation to another agent, keeping its history.
    ///
    /// # Errors
    ///
    /// [`BridgeError::NotFound`] if the conversation or the agent is missing;
    /// the conversation is left unchanged.
    pub async fn switch_agent(&self, id: &str, new_agent_id: &str) -> Result<SwitchSummary> {
        let mut conversation = self.get(id).await?;
        let agent = self.registry.get_agent(new_agent_id)?;

        conversation.switch_to(agent);
        self.save(&conversation).await?;

        Ok(SwitchSummary {
            conversation_id: conversation.id,
            agent_id: agent.id.clone(),
            agent_name: agent.display_name.clone(),
        })
    }

    /// Append one message and return the updated conversation.
    pub async fn append(&self, id: &str, message: Message) -> Result<Conversation> {
        let mut conversation = self.get(id).await?;
        conversation.push(message);
        self.save(&conversation).await?;
        Ok(conversation)
    }

    /// Number of live conversations.
    pub async fn count(&self) -> Result<usize> {
        self.backend.len().await
    }

    async fn save(&self, conversation: &Conversation) -> Result<()> {
        if self.backend.update(conversation).await? {
            Ok(())
        } else {
            Err(not_found(&conversation.id))
        }
    }
}

fn not_found(id: &str) -> BridgeError {
    BridgeError::NotFound(format!("conversation '{}'", id))
}

/// `<agentId>_<unix-millis>_<random>`
fn generate_id(agent_id: &str) -> String {
    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(ID_SUFFIX_LEN)
        .collect();
    format!("{}_{}_{}", agent_id, Utc::now().timestamp_millis(), suffix)
}
