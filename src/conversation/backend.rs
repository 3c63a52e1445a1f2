//! Storage backends for conversations.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::types::{Conversation, ConversationSummary};
use crate::error::Result;

/// Keyed conversation storage.
///
/// Backends store whole [`Conversation`] values; callers that read, modify
/// and write back are responsible for serializing access per id.
#[async_trait]
pub trait ConversationBackend: Send + Sync {
    /// Store `conversation` unless its id is taken. Returns `false` on collision.
    async fn insert(&self, conversation: Conversation) -> Result<bool>;

    /// Load a conversation by id.
    async fn load(&self, id: &str) -> Result<Option<Conversation>>;

    /// Replace an existing conversation. Returns `false` if it no longer exists.
    async fn update(&self, conversation: &Conversation) -> Result<bool>;

    /// Remove a conversation. Returns `false` if it was absent.
    async fn remove(&self, id: &str) -> Result<bool>;

    /// Summaries of every stored conversation, in no particular order.
    async fn summaries(&self) -> Result<Vec<ConversationSummary>>;

    /// Number of stored conversations.
    async fn len(&self) -> Result<usize>;

    /// Backend name for diagnostics
    fn backend_name(&self) -> &str {
        "unknown"
    }
}

/// Volatile in-process backend. Contents are lost on exit.
#[derive(Default)]
pub struct MemoryBackend {
    conversations: RwLock<HashMap<String, Conversation>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationBackend for MemoryBackend {
    async fn insert(&self, conversation: Conversation) -> Result<bool> {
        let mut map = self.conversations.write().await;
        if map.contains_key(&conversation.id) {
            return Ok(false);
        }
        map.insert(conversation.id.clone(), conversation);
        Ok(true)
    }

    async fn load(&self, id: &str) -> Result<Option<Conversation>> {
        Ok(self.conversations.read().await.get(id).cloned())
    }

    async fn update(&self, conversation: &Conversation) -> Result<bool> {
        let mut map = self.conversations.write().await;
        match map.get_mut(&conversation.id) {
            Some(slot) => {
                *slot = conversation.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove(&self, id: &str) -> Result<bool> {
        Ok(self.conversations.write().await.remove(id).is_some())
    }

    async fn summaries(&self) -> Result<Vec<ConversationSummary>> {
        Ok(self
            .conversations
            .read()
            .await
            .values()
            .map(Conversation::summary)
            .collect())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.conversations.read().await.len())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}
