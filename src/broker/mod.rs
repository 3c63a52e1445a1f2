//! Message broker
//!
//! Ties the conversation store, token cache and Orchestrate client together.
//! Everything the HTTP gateway exposes goes through [`MessageBroker`].
//!
//! Mutations of one conversation (`send`, `switch_agent`, `delete`) run under
//! a per-conversation lock so transcript appends land in request order; calls
//! for different conversations proceed in parallel. A lock entry only lives
//! while some call holds or waits for it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::agents::{AgentDefinition, AgentRegistry};
use crate::auth::{IamIdentityProvider, TokenCache, TokenStatus};
use crate::config::Config;
use crate::conversation::{Conversation, ConversationStore, ConversationSummary, Message, SwitchSummary};
use crate::error::{BridgeError, Result};
use crate::log_component;
use crate::orchestrate::{
    extract_reply_text, http_client, AgentQuery, CatalogRequest, OrchestrateApi,
    OrchestrateClient, PageQuery, SendMessageRequest, SkillRequest, ThreadQuery,
};

/// Prefix for job listing generation prompts.
pub const JOB_LISTING_PROMPT: &str =
    "Generate a professional job listing based on the following intake information: ";

/// Result of a successful `send`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOutcome {
    pub conversation_id: String,
    /// The assistant reply that was appended
    pub message: Message,
    pub agent_id: String,
    pub agent_name: String,
}

/// Result of a job listing generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListingOutcome {
    pub ok: bool,
    /// Conversation the listing was generated in, kept for follow-ups
    pub conversation_id: String,
    pub agent_id: String,
    pub agent_name: String,
    pub intake_text: String,
    pub job_listing: String,
}

/// A remote session opened on the default agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOutcome {
    pub session_id: String,
    pub agent_id: String,
}

/// User id sent with session-less single-agent messages.
pub const ANONYMOUS_USER: &str = "anonymous";

/// Connectivity report for the health endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    /// `"connected"` when a token could be obtained, `"error"` otherwise
    pub status: String,
    pub has_token: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub token: TokenStatus,
    pub agent_count: usize,
    pub conversation_count: usize,
    pub backend: String,
}

/// Conversation-aware front for the Orchestrate API.
pub struct MessageBroker {
    store: ConversationStore,
    tokens: Arc<TokenCache>,
    api: Arc<dyn OrchestrateApi>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    job_listing_agent: Option<String>,
    project_id: Option<String>,
}

impl MessageBroker {
    pub fn new(
        store: ConversationStore,
        tokens: Arc<TokenCache>,
        api: Arc<dyn OrchestrateApi>,
    ) -> Self {
        Self {
            store,
            tokens,
            api,
            locks: Mutex::new(HashMap::new()),
            job_listing_agent: None,
            project_id: None,
        }
    }

    /// Wire the production stack from config: agent registry, IAM token
    /// cache and the reqwest Orchestrate client over one shared HTTP client.
    ///
    /// # Errors
    ///
    /// [`BridgeError::Config`] for a missing API key or unusable agent definitions.
    pub fn from_config(config: &Config) -> Result<Self> {
        let registry = Arc::new(AgentRegistry::from_config(config)?);
        let http = http_client(config.orchestrate.request_timeout_secs)?;

        let provider = IamIdentityProvider::from_config(&config.orchestrate, http.clone())?;
        let tokens = Arc::new(TokenCache::with_margin(
            Arc::new(provider),
            Duration::from_secs(config.orchestrate.token_safety_margin_secs),
        ));
        let api = Arc::new(OrchestrateClient::from_config(&config.orchestrate, http));

        log_component!(
            info,
            "broker",
            "broker ready",
            agents = registry.len(),
            host_url = config.orchestrate.host_url.as_str()
        );

        Ok(Self::new(ConversationStore::in_memory(registry), tokens, api)
            .with_job_listing_agent(config.agents.job_listing_agent.clone())
            .with_project_id(config.orchestrate.project_id.clone()))
    }

    /// Builder: default agent for job listing generation and sessions.
    pub fn with_job_listing_agent(mut self, agent_id: Option<String>) -> Self {
        self.job_listing_agent = agent_id;
        self
    }

    /// Builder: project scope for skill invocations.
    pub fn with_project_id(mut self, project_id: Option<String>) -> Self {
        self.project_id = project_id.filter(|p| !p.trim().is_empty());
        self
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn registry(&self) -> &AgentRegistry {
        self.store.registry()
    }

    // ------------------------------------------------------------------
    // Agents
    // ------------------------------------------------------------------

    pub fn list_agents(&self) -> &[AgentDefinition] {
        self.registry().list_agents()
    }

    pub fn get_agent(&self, id: &str) -> Result<&AgentDefinition> {
        self.registry().get_agent(id)
    }

    /// The configured job listing agent, else the first registered agent.
    pub fn default_agent(&self) -> Result<&AgentDefinition> {
        match self.job_listing_agent.as_deref() {
            Some(id) => self.get_agent(id),
            None => Ok(self.registry().first()),
        }
    }

    // ------------------------------------------------------------------
    // Conversations
    // ------------------------------------------------------------------

    pub async fn create_conversation(&self, agent_id: &str) -> Result<Conversation> {
        let conversation = self.store.create(agent_id).await?;
        log_component!(
            info,
            "broker",
            "conversation created",
            conversation_id = conversation.id.as_str(),
            agent_id = agent_id
        );
        Ok(conversation)
    }

    pub async fn get_conversation(&self, id: &str) -> Result<Conversation> {
        self.store.get(id).await
    }

    pub async fn list_conversations(&self) -> Result<Vec<ConversationSummary>> {
        self.store.list().await
    }

    pub async fn delete_conversation(&self, id: &str) -> Result<bool> {
        let guard = self.lock(id).await;
        let removed = self.store.delete(id).await;
        self.release(id, guard).await;
        let removed = removed?;

        if removed {
            log_component!(info, "broker", "conversation deleted", conversation_id = id);
        }
        Ok(removed)
    }

    pub async fn switch_agent(&self, id: &str, new_agent_id: &str) -> Result<SwitchSummary> {
        let guard = self.lock(id).await;
        let summary = self.store.switch_agent(id, new_agent_id).await;
        self.release(id, guard).await;
        let summary = summary?;
        log_component!(
            info,
            "broker",
            "agent switched",
            conversation_id = id,
            agent_id = new_agent_id
        );
        Ok(summary)
    }

    /// Send one user turn to the conversation's current agent.
    ///
    /// With `agent_override` set to another agent, the conversation is
    /// switched first, exactly as [`MessageBroker::switch_agent`] would.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::InvalidInput`] for blank `text`; nothing is recorded
    /// - [`BridgeError::NotFound`] for an unknown conversation or override
    /// - [`BridgeError::Auth`] when no token can be obtained; the user
    ///   message stays recorded
    /// - [`BridgeError::Upstream`] or [`BridgeError::Http`] when the remote
    ///   call fails; the user message stays recorded, no reply is appended
    pub async fn send(
        &self,
        conversation_id: &str,
        text: &str,
        agent_override: Option<&str>,
    ) -> Result<SendOutcome> {
        if text.trim().is_empty() {
            return Err(BridgeError::InvalidInput("message is required".to_string()));
        }

        let guard = self.lock(conversation_id).await;
        let outcome = self.send_locked(conversation_id, text, agent_override).await;
        self.release(conversation_id, guard).await;
        outcome
    }

    async fn send_locked(
        &self,
        conversation_id: &str,
        text: &str,
        agent_override: Option<&str>,
    ) -> Result<SendOutcome> {
        let conversation = self.store.get(conversation_id).await?;
        if let Some(override_id) = agent_override.filter(|id| !id.is_empty()) {
            if override_id != conversation.current_agent_id {
                self.store.switch_agent(conversation_id, override_id).await?;
                log_component!(
                    info,
                    "broker",
                    "agent switched on send",
                    conversation_id = conversation_id,
                    agent_id = override_id
                );
            }
        }

        let conversation = self.store.append(conversation_id, Message::user(text)).await?;
        let agent = self.registry().get_agent(&conversation.current_agent_id)?.clone();

        let token = self.tokens.get_token().await?;
        let request = SendMessageRequest::text(text, conversation_id);
        let payload = self
            .api
            .send_message(token.secret(), &agent.remote_agent_id, &request)
            .await?;

        let reply = Message::assistant(&extract_reply_text(&payload), &agent);
        self.store.append(conversation_id, reply.clone()).await?;

        log_component!(
            info,
            "broker",
            "reply received",
            conversation_id = conversation_id,
            agent_id = agent.id.as_str(),
            reply_len = reply.content.len()
        );

        Ok(SendOutcome {
            conversation_id: conversation_id.to_string(),
            message: reply,
            agent_id: agent.id,
            agent_name: agent.display_name,
        })
    }

    /// Start a conversation and ask an agent for a job listing.
    ///
    /// The agent is `agent_id`, else the configured job listing agent, else
    /// the first registered agent.
    pub async fn generate_job_listing(
        &self,
        intake_text: &str,
        agent_id: Option<&str>,
    ) -> Result<JobListingOutcome> {
        if intake_text.trim().is_empty() {
            return Err(BridgeError::InvalidInput(
                "intake text is required".to_string(),
            ));
        }

        let agent_id = match agent_id.filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => self.default_agent()?.id.clone(),
        };

        let conversation = self.create_conversation(&agent_id).await?;
        let prompt = format!("{}{}", JOB_LISTING_PROMPT, intake_text);
        let outcome = self.send(&conversation.id, &prompt, None).await?;

        Ok(JobListingOutcome {
            ok: true,
            conversation_id: outcome.conversation_id,
            agent_id: outcome.agent_id,
            agent_name: outcome.agent_name,
            intake_text: intake_text.to_string(),
            job_listing: outcome.message.content,
        })
    }

    // ------------------------------------------------------------------
    // Single-agent sessions and skills
    // ------------------------------------------------------------------

    /// Open a remote session on the default agent.
    pub async fn create_session(&self) -> Result<SessionOutcome> {
        let agent = self.default_agent()?;
        let token = self.tokens.get_token().await?;
        let session_id = self
            .api
            .create_session(token.secret(), &agent.remote_agent_id)
            .await?;
        Ok(SessionOutcome {
            session_id,
            agent_id: agent.id.clone(),
        })
    }

    /// Forward one turn to the default agent, inside `session_id` when given.
    ///
    /// Nothing is recorded locally; the remote payload is returned as is.
    pub async fn session_message(&self, text: &str, session_id: Option<&str>) -> Result<Value> {
        if text.trim().is_empty() {
            return Err(BridgeError::InvalidInput("message is required".to_string()));
        }

        let agent = self.default_agent()?;
        let token = self.tokens.get_token().await?;
        match session_id.filter(|id| !id.trim().is_empty()) {
            Some(session_id) => {
                let request = SendMessageRequest::text(text, session_id);
                self.api
                    .send_session_message(token.secret(), &agent.remote_agent_id, session_id, &request)
                    .await
            }
            None => {
                let request = SendMessageRequest::text(text, ANONYMOUS_USER);
                self.api
                    .send_message(token.secret(), &agent.remote_agent_id, &request)
                    .await
            }
        }
    }

    /// Close a remote session; `false` when the remote side refused.
    pub async fn delete_session(&self, session_id: &str) -> Result<bool> {
        let agent = self.default_agent()?;
        let token = self.tokens.get_token().await?;
        let deleted = self
            .api
            .delete_session(token.secret(), &agent.remote_agent_id, session_id)
            .await?;
        log_component!(
            info,
            "broker",
            "session closed",
            session_id = session_id,
            deleted = deleted
        );
        Ok(deleted)
    }

    /// Invoke a named skill with the configured project scope.
    pub async fn invoke_skill(&self, skill_name: &str, parameters: Option<Value>) -> Result<Value> {
        if skill_name.trim().is_empty() {
            return Err(BridgeError::InvalidInput(
                "skill name is required".to_string(),
            ));
        }

        let request = SkillRequest::new(skill_name, parameters, self.project_id.as_deref());
        let token = self.tokens.get_token().await?;
        self.api.invoke_skill(token.secret(), &request).await
    }

    // ------------------------------------------------------------------
    // Catalog
    // ------------------------------------------------------------------

    pub async fn list_remote_agents(&self, query: AgentQuery) -> Result<Value> {
        self.catalog(CatalogRequest::Agents(query)).await
    }

    pub async fn list_threads(&self, query: ThreadQuery) -> Result<Value> {
        self.catalog(CatalogRequest::Threads(query)).await
    }

    pub async fn get_thread(&self, thread_id: &str) -> Result<Value> {
        self.catalog(CatalogRequest::Thread {
            thread_id: thread_id.to_string(),
        })
        .await
    }

    pub async fn list_thread_messages(&self, thread_id: &str, page: PageQuery) -> Result<Value> {
        self.catalog(CatalogRequest::ThreadMessages {
            thread_id: thread_id.to_string(),
            page,
        })
        .await
    }

    pub async fn get_thread_message(&self, thread_id: &str, message_id: &str) -> Result<Value> {
        self.catalog(CatalogRequest::ThreadMessage {
            thread_id: thread_id.to_string(),
            message_id: message_id.to_string(),
        })
        .await
    }

    async fn catalog(&self, request: CatalogRequest) -> Result<Value> {
        let token = self.tokens.get_token().await?;
        self.api.fetch_catalog(token.secret(), &request).await
    }

    // ------------------------------------------------------------------
    // Health
    // ------------------------------------------------------------------

    /// Try to obtain a token and describe the broker's state.
    ///
    /// A token failure is reported in the result rather than returned.
    pub async fn health(&self) -> Result<HealthReport> {
        let (status, error) = match self.tokens.get_token().await {
            Ok(_) => ("connected", None),
            Err(e) => ("error", Some(e.to_string())),
        };
        let token = self.tokens.status().await;

        Ok(HealthReport {
            status: status.to_string(),
            has_token: token.fresh,
            error,
            token,
            agent_count: self.registry().len(),
            conversation_count: self.store.count().await?,
            backend: self.store.backend_name().to_string(),
        })
    }

    async fn lock(&self, conversation_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(conversation_id.to_string()).or_default())
        };
        lock.lock_owned().await
    }

    /// Unlock and drop the entry unless another call holds or awaits it.
    ///
    /// Every clone of the entry's `Arc` is taken under the map lock, so a
    /// strong count of one here means the map holds the only reference.
    async fn release(&self, conversation_id: &str, guard: OwnedMutexGuard<()>) {
        drop(guard);
        let mut locks = self.locks.lock().await;
        if locks
            .get(conversation_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(conversation_id);
        }
    }
}
