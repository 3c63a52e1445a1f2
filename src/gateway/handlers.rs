//! Route handlers. Each one is a thin translation onto [`MessageBroker`].
//!
//! [`MessageBroker`]: crate::broker::MessageBroker

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use super::state::AppState;
use crate::broker::{HealthReport, JobListingOutcome, SendOutcome, SessionOutcome};
use crate::conversation::{Conversation, ConversationSummary, SwitchSummary};
use crate::error::{BridgeError, Result};
use crate::orchestrate::{AgentQuery, PageQuery, ThreadQuery};

// ============================================================================
// Request bodies
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentBody {
    pub agent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendBody {
    pub message: Option<String>,
    pub agent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListingBody {
    pub intake_text: Option<String>,
    pub agent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMessageBody {
    pub message: Option<String>,
    /// Remote session to continue; absent for a one-off turn
    #[serde(alias = "sessionId")]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillBody {
    pub skill_name: Option<String>,
    pub parameters: Option<Value>,
}

fn body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| BridgeError::InvalidInput(e.body_text()))
}

fn query<T>(params: std::result::Result<Query<T>, QueryRejection>) -> Result<T> {
    params
        .map(|Query(value)| value)
        .map_err(|e| BridgeError::InvalidInput(e.body_text()))
}

/// A present, non-blank string field or `InvalidInput("<what> is required")`.
fn required(value: Option<String>, what: &str) -> Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| BridgeError::InvalidInput(format!("{} is required", what)))
}

// ============================================================================
// Liveness and health
// ============================================================================

/// GET /health
pub async fn liveness() -> Json<Value> {
    Json(json!({ "ok": true, "message": "backend alive" }))
}

/// GET /api/watsonx/health
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthReport>> {
    Ok(Json(state.broker().health().await?))
}

// ============================================================================
// Agents and conversations
// ============================================================================

/// GET /api/agents
pub async fn list_agents(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "agents": state.broker().list_agents() }))
}

/// POST /api/conversations
pub async fn create_conversation(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AgentBody>, JsonRejection>,
) -> Result<Json<ConversationSummary>> {
    let agent_id = required(body(payload)?.agent_id, "Agent ID")?;
    let conversation = state.broker().create_conversation(&agent_id).await?;
    Ok(Json(conversation.summary()))
}

/// GET /api/conversations
pub async fn list_conversations(State(state): State<AppState>) -> Result<Json<Value>> {
    let conversations = state.broker().list_conversations().await?;
    Ok(Json(json!({ "conversations": conversations })))
}

/// GET /api/conversations/{id}
pub async fn get_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Conversation>> {
    Ok(Json(state.broker().get_conversation(&id).await?))
}

/// POST /api/conversations/{id}/messages
pub async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<SendBody>, JsonRejection>,
) -> Result<Json<SendOutcome>> {
    let payload = body(payload)?;
    let message = required(payload.message, "Message")?;
    let outcome = state
        .broker()
        .send(&id, &message, payload.agent_id.as_deref())
        .await?;
    Ok(Json(outcome))
}

/// PUT /api/conversations/{id}/agent
pub async fn switch_agent(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<AgentBody>, JsonRejection>,
) -> Result<Json<SwitchSummary>> {
    let agent_id = required(body(payload)?.agent_id, "Agent ID")?;
    Ok(Json(state.broker().switch_agent(&id, &agent_id).await?))
}

/// DELETE /api/conversations/{id}
pub async fn delete_conversation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let success = state.broker().delete_conversation(&id).await?;
    Ok(Json(json!({ "success": success })))
}

/// POST /api/job-listing/generate
pub async fn generate_job_listing(
    State(state): State<AppState>,
    payload: std::result::Result<Json<JobListingBody>, JsonRejection>,
) -> Result<Json<JobListingOutcome>> {
    let payload = body(payload)?;
    let intake_text = required(payload.intake_text, "Intake text")?;
    let outcome = state
        .broker()
        .generate_job_listing(&intake_text, payload.agent_id.as_deref())
        .await?;
    Ok(Json(outcome))
}

// ============================================================================
// Single-agent sessions and skills
// ============================================================================

/// POST /api/chat/session
pub async fn create_session(State(state): State<AppState>) -> Result<Json<SessionOutcome>> {
    Ok(Json(state.broker().create_session().await?))
}

/// POST /api/chat/message
pub async fn session_message(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SessionMessageBody>, JsonRejection>,
) -> Result<Json<Value>> {
    let payload = body(payload)?;
    let message = required(payload.message, "Message")?;
    Ok(Json(
        state
            .broker()
            .session_message(&message, payload.conversation_id.as_deref())
            .await?,
    ))
}

/// DELETE /api/chat/session/{session_id}
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>> {
    let success = state.broker().delete_session(&session_id).await?;
    Ok(Json(json!({ "success": success })))
}

/// POST /api/watsonx/skill
pub async fn invoke_skill(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SkillBody>, JsonRejection>,
) -> Result<Json<Value>> {
    let payload = body(payload)?;
    let skill_name = required(payload.skill_name, "Skill name")?;
    Ok(Json(
        state
            .broker()
            .invoke_skill(&skill_name, payload.parameters)
            .await?,
    ))
}

// ============================================================================
// Remote catalog
// ============================================================================

/// GET /api/orchestrate/agents
pub async fn remote_agents(
    State(state): State<AppState>,
    params: std::result::Result<Query<AgentQuery>, QueryRejection>,
) -> Result<Json<Value>> {
    Ok(Json(state.broker().list_remote_agents(query(params)?).await?))
}

/// GET /api/orchestrate/threads
pub async fn threads(
    State(state): State<AppState>,
    params: std::result::Result<Query<ThreadQuery>, QueryRejection>,
) -> Result<Json<Value>> {
    Ok(Json(state.broker().list_threads(query(params)?).await?))
}

/// GET /api/orchestrate/threads/{thread_id}
pub async fn thread(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
) -> Result<Json<Value>> {
    Ok(Json(state.broker().get_thread(&thread_id).await?))
}

/// GET /api/orchestrate/threads/{thread_id}/messages
pub async fn thread_messages(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
    params: std::result::Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<Value>> {
    Ok(Json(
        state
            .broker()
            .list_thread_messages(&thread_id, query(params)?)
            .await?,
    ))
}

/// GET /api/orchestrate/threads/{thread_id}/messages/{message_id}
pub async fn thread_message(
    State(state): State<AppState>,
    Path((thread_id, message_id)): Path<(String, String)>,
) -> Result<Json<Value>> {
    Ok(Json(
        state
            .broker()
            .get_thread_message(&thread_id, &message_id)
            .await?,
    ))
}
