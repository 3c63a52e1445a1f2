//! Integration tests for wxo-bridge
//!
//! These exercise the public API end to end with in-process fakes for the
//! identity provider and the Orchestrate service. No network access.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use wxo_bridge::auth::IssuedToken;
use wxo_bridge::gateway::{build_router, cors_layer, AppState};
use wxo_bridge::orchestrate::{CatalogRequest, SendMessageRequest, SkillRequest};
use wxo_bridge::{
    AgentDefinition, AgentRegistry, BridgeError, Config, ConversationStore, IdentityProvider,
    MessageBroker, OrchestrateApi, Result, Role, TokenCache,
};

// ============================================================================
// Fakes
// ============================================================================

/// Issues `token-1`, `token-2`, ... and counts exchanges.
#[derive(Default)]
struct CountingProvider {
    exchanges: AtomicUsize,
}

#[async_trait]
impl IdentityProvider for CountingProvider {
    async fn exchange(&self) -> Result<IssuedToken> {
        let n = self.exchanges.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(IssuedToken {
            access_token: format!("token-{}", n),
            expires_in: 3600,
        })
    }
}

/// One recorded messaging call.
#[derive(Debug, Clone)]
struct SentTurn {
    bearer: String,
    remote_agent_id: String,
    text: String,
    user_id: String,
}

/// Echoes the remote agent id back and records every call.
#[derive(Default)]
struct RecordingApi {
    turns: Mutex<Vec<SentTurn>>,
    catalog: Mutex<Vec<CatalogRequest>>,
    skills: Mutex<Vec<SkillRequest>>,
    open_sessions: Mutex<Vec<String>>,
    fail_with: Mutex<Option<u16>>,
}

impl RecordingApi {
    fn fail_next(&self, status: u16) {
        *self.fail_with.lock().unwrap() = Some(status);
    }

    fn turns(&self) -> Vec<SentTurn> {
        self.turns.lock().unwrap().clone()
    }
}

#[async_trait]
impl OrchestrateApi for RecordingApi {
    async fn send_message(
        &self,
        bearer: &str,
        remote_agent_id: &str,
        request: &SendMessageRequest,
    ) -> Result<Value> {
        if let Some(status) = self.fail_with.lock().unwrap().take() {
            return Err(BridgeError::upstream(status, "remote agent unavailable"));
        }
        self.turns.lock().unwrap().push(SentTurn {
            bearer: bearer.to_string(),
            remote_agent_id: remote_agent_id.to_string(),
            text: request.input.text.clone(),
            user_id: request.context.global.system.user_id.clone(),
        });
        Ok(json!({
            "output": {
                "generic": [{ "response_type": "text", "text": format!("reply from {}", remote_agent_id) }]
            }
        }))
    }

    async fn fetch_catalog(&self, _bearer: &str, request: &CatalogRequest) -> Result<Value> {
        self.catalog.lock().unwrap().push(request.clone());
        Ok(json!({ "kind": request.kind() }))
    }

    async fn create_session(&self, _bearer: &str, remote_agent_id: &str) -> Result<String> {
        let mut sessions = self.open_sessions.lock().unwrap();
        let id = format!("{}-session-{}", remote_agent_id, sessions.len() + 1);
        sessions.push(id.clone());
        Ok(id)
    }

    async fn send_session_message(
        &self,
        bearer: &str,
        remote_agent_id: &str,
        session_id: &str,
        request: &SendMessageRequest,
    ) -> Result<Value> {
        let open = self.open_sessions.lock().unwrap().iter().any(|s| s == session_id);
        if !open {
            return Err(BridgeError::upstream(404, "session not found"));
        }
        self.send_message(bearer, remote_agent_id, request).await
    }

    async fn delete_session(
        &self,
        _bearer: &str,
        _remote_agent_id: &str,
        session_id: &str,
    ) -> Result<bool> {
        let mut sessions = self.open_sessions.lock().unwrap();
        let before = sessions.len();
        sessions.retain(|s| s != session_id);
        Ok(sessions.len() < before)
    }

    async fn invoke_skill(&self, _bearer: &str, request: &SkillRequest) -> Result<Value> {
        self.skills.lock().unwrap().push(request.clone());
        Ok(json!({ "skill": request.skill_name }))
    }
}

/// Provider that never yields a token.
struct RejectingProvider {
    called: AtomicBool,
}

#[async_trait]
impl IdentityProvider for RejectingProvider {
    async fn exchange(&self) -> Result<IssuedToken> {
        self.called.store(true, Ordering::SeqCst);
        Err(BridgeError::Auth("token exchange failed: 400".to_string()))
    }
}

fn registry() -> Arc<AgentRegistry> {
    Arc::new(
        AgentRegistry::new(vec![
            AgentDefinition::new("recruiter-bot", "Recruiter", "remote-1"),
            AgentDefinition::new("scheduler-bot", "Interview Scheduler", "remote-2"),
        ])
        .unwrap(),
    )
}

struct Harness {
    broker: Arc<MessageBroker>,
    provider: Arc<CountingProvider>,
    api: Arc<RecordingApi>,
}

fn harness() -> Harness {
    let provider = Arc::new(CountingProvider::default());
    let api = Arc::new(RecordingApi::default());
    let broker = MessageBroker::new(
        ConversationStore::in_memory(registry()),
        Arc::new(TokenCache::new(provider.clone())),
        api.clone(),
    );
    Harness {
        broker: Arc::new(broker),
        provider,
        api,
    }
}

// ============================================================================
// Broker scenarios
// ============================================================================

#[tokio::test]
async fn test_recruiter_to_scheduler_handoff() {
    let h = harness();

    let conversation = h.broker.create_conversation("recruiter-bot").await.unwrap();
    assert!(conversation.id.starts_with("recruiter-bot_"));

    let outcome = h
        .broker
        .send(
            &conversation.id,
            "Generate a job listing for a backend engineer",
            None,
        )
        .await
        .unwrap();
    assert_eq!(outcome.message.content, "reply from remote-1");
    assert_eq!(outcome.agent_name, "Recruiter");

    let switched = h
        .broker
        .switch_agent(&conversation.id, "scheduler-bot")
        .await
        .unwrap();
    assert_eq!(switched.agent_name, "Interview Scheduler");

    let outcome = h
        .broker
        .send(&conversation.id, "Book a first-round interview", None)
        .await
        .unwrap();
    assert_eq!(outcome.message.content, "reply from remote-2");

    let stored = h.broker.get_conversation(&conversation.id).await.unwrap();
    let roles: Vec<Role> = stored.messages.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![
            Role::User,
            Role::Assistant,
            Role::System,
            Role::User,
            Role::Assistant
        ]
    );
    assert_eq!(stored.messages[2].content, "Switched to Interview Scheduler");
    assert_eq!(stored.current_agent_id, "scheduler-bot");

    // Both turns used the same cached token and the conversation id as user id.
    let turns = h.api.turns();
    assert_eq!(turns.len(), 2);
    assert!(turns.iter().all(|t| t.bearer == "token-1"));
    assert!(turns.iter().all(|t| t.user_id == conversation.id));
    assert_eq!(turns[1].remote_agent_id, "remote-2");
    assert_eq!(h.provider.exchanges.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_override_switches_before_sending() {
    let h = harness();
    let conversation = h.broker.create_conversation("recruiter-bot").await.unwrap();

    h.broker
        .send(&conversation.id, "When can we meet?", Some("scheduler-bot"))
        .await
        .unwrap();

    let stored = h.broker.get_conversation(&conversation.id).await.unwrap();
    assert_eq!(stored.messages[0].role, Role::System);
    assert_eq!(stored.messages[1].content, "When can we meet?");
    assert_eq!(h.api.turns()[0].remote_agent_id, "remote-2");
}

#[tokio::test]
async fn test_upstream_failure_keeps_user_message_only() {
    let h = harness();
    let conversation = h.broker.create_conversation("recruiter-bot").await.unwrap();

    h.api.fail_next(503);
    let err = h
        .broker
        .send(&conversation.id, "hello?", None)
        .await
        .unwrap_err();
    assert_eq!(err.upstream_status(), Some(503));

    let stored = h.broker.get_conversation(&conversation.id).await.unwrap();
    assert_eq!(stored.messages.len(), 1);
    assert_eq!(stored.messages[0].role, Role::User);

    // The next attempt goes through normally.
    h.broker.send(&conversation.id, "hello again", None).await.unwrap();
    let stored = h.broker.get_conversation(&conversation.id).await.unwrap();
    assert_eq!(stored.messages.len(), 3);
}

#[tokio::test]
async fn test_auth_failure_is_reported_by_health() {
    let provider = Arc::new(RejectingProvider {
        called: AtomicBool::new(false),
    });
    let broker = MessageBroker::new(
        ConversationStore::in_memory(registry()),
        Arc::new(TokenCache::new(provider.clone())),
        Arc::new(RecordingApi::default()),
    );

    let report = broker.health().await.unwrap();
    assert_eq!(report.status, "error");
    assert!(!report.has_token);
    assert!(report.error.unwrap().contains("token exchange failed"));
    assert_eq!(report.agent_count, 2);
    assert!(provider.called.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_job_listing_uses_configured_agent() {
    let provider = Arc::new(CountingProvider::default());
    let api = Arc::new(RecordingApi::default());
    let broker = MessageBroker::new(
        ConversationStore::in_memory(registry()),
        Arc::new(TokenCache::new(provider)),
        api.clone(),
    )
    .with_job_listing_agent(Some("scheduler-bot".to_string()));

    let outcome = broker
        .generate_job_listing("Senior Rust engineer, remote, payments team", None)
        .await
        .unwrap();
    assert!(outcome.ok);
    assert_eq!(outcome.agent_id, "scheduler-bot");
    assert_eq!(outcome.job_listing, "reply from remote-2");

    let turns = api.turns();
    assert!(turns[0]
        .text
        .starts_with("Generate a professional job listing based on the following intake information: "));
    assert!(turns[0].text.ends_with("payments team"));

    // The generating conversation is kept for follow-ups.
    assert!(broker.get_conversation(&outcome.conversation_id).await.is_ok());
}

// ============================================================================
// HTTP surface
// ============================================================================

async fn call(app: &axum::Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(value) => Body::from(value.to_string()),
            None => Body::empty(),
        })
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_http_conversation_flow() {
    let h = harness();
    let app = build_router(AppState::new(h.broker.clone()), cors_layer(None).unwrap());

    let (status, created) = call(
        &app,
        Method::POST,
        "/api/conversations",
        Some(json!({ "agentId": "recruiter-bot" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = created["conversationId"].as_str().unwrap().to_string();

    let (status, sent) = call(
        &app,
        Method::POST,
        &format!("/api/conversations/{}/messages", id),
        Some(json!({ "message": "Generate a job listing for a backend engineer" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sent["message"]["role"], "assistant");
    assert_eq!(sent["agentName"], "Recruiter");

    let (status, switched) = call(
        &app,
        Method::PUT,
        &format!("/api/conversations/{}/agent", id),
        Some(json!({ "agentId": "scheduler-bot" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(switched["agentName"], "Interview Scheduler");

    let (_, listed) = call(&app, Method::GET, "/api/conversations", None).await;
    assert_eq!(listed["conversations"][0]["messageCount"], 3);
    assert_eq!(listed["conversations"][0]["agentId"], "scheduler-bot");

    let (status, deleted) = call(&app, Method::DELETE, &format!("/api/conversations/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["success"], true);

    let (status, _) = call(&app, Method::GET, &format!("/api/conversations/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_http_upstream_error_is_bad_gateway() {
    let h = harness();
    let app = build_router(AppState::new(h.broker.clone()), cors_layer(None).unwrap());
    let conversation = h.broker.create_conversation("recruiter-bot").await.unwrap();

    h.api.fail_next(500);
    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/conversations/{}/messages", conversation.id),
        Some(json!({ "message": "anyone there?" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["status"], 500);
    assert_eq!(body["body"], "remote agent unavailable");
}

#[tokio::test]
async fn test_http_catalog_passthrough() {
    let h = harness();
    let app = build_router(AppState::new(h.broker.clone()), cors_layer(None).unwrap());

    let (status, body) = call(
        &app,
        Method::GET,
        "/api/orchestrate/threads?agent_id=remote-1&limit=5",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["kind"], "threads");

    let recorded = h.api.catalog.lock().unwrap().clone();
    match &recorded[0] {
        CatalogRequest::Threads(query) => {
            assert_eq!(query.agent_id.as_deref(), Some("remote-1"));
            assert_eq!(query.limit, Some(5));
        }
        other => panic!("unexpected catalog request: {:?}", other),
    }
}

#[tokio::test]
async fn test_http_single_agent_session() {
    let h = harness();
    let app = build_router(AppState::new(h.broker.clone()), cors_layer(None).unwrap());

    let (status, created) = call(&app, Method::POST, "/api/chat/session", None).await;
    assert_eq!(status, StatusCode::OK);
    let session_id = created["sessionId"].as_str().unwrap().to_string();
    assert_eq!(session_id, "remote-1-session-1");

    let (status, reply) = call(
        &app,
        Method::POST,
        "/api/chat/message",
        Some(json!({ "message": "What roles are open?", "conversationId": session_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["output"]["generic"][0]["text"], "reply from remote-1");
    assert_eq!(h.api.turns()[0].user_id, session_id);

    let (_, deleted) = call(
        &app,
        Method::DELETE,
        &format!("/api/chat/session/{}", session_id),
        None,
    )
    .await;
    assert_eq!(deleted["success"], true);

    // The remote side no longer knows the session.
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/chat/message",
        Some(json!({ "message": "still there?", "conversationId": session_id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["status"], 404);

    // Single-agent traffic never creates local conversations.
    assert!(h.broker.list_conversations().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_http_skill_invocation() {
    let h = harness();
    let app = build_router(AppState::new(h.broker.clone()), cors_layer(None).unwrap());

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/watsonx/skill",
        Some(json!({ "skillName": "schedule_interview" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["skill"], "schedule_interview");

    let recorded = h.api.skills.lock().unwrap().clone();
    assert_eq!(recorded[0].parameters, json!({}));
    assert_eq!(recorded[0].project_id, None);
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_agents_file_from_config() {
    let dir = TempDir::new().unwrap();
    let agents_path = dir.path().join("agents-config.json");
    std::fs::write(
        &agents_path,
        r#"{
          "agents": [
            {"id": "recruiter-bot", "name": "Recruiter", "agentId": "remote-1", "description": "Drafts listings"},
            {"id": "scheduler-bot", "name": "Interview Scheduler", "agentId": "remote-2", "color": "teal"}
          ]
        }"#,
    )
    .unwrap();

    let config_path = dir.path().join("config.json");
    std::fs::write(
        &config_path,
        json!({ "agents": { "file": agents_path } }).to_string(),
    )
    .unwrap();

    let config = Config::load_from_path(&config_path).unwrap();
    let registry = AgentRegistry::from_config(&config).unwrap();
    assert_eq!(registry.len(), 2);
    assert_eq!(
        registry.get_agent("recruiter-bot").unwrap().description.as_deref(),
        Some("Drafts listings")
    );
    assert_eq!(
        registry.get_agent("scheduler-bot").unwrap().metadata["color"],
        "teal"
    );
}

#[test]
fn test_duplicate_agent_ids_rejected() {
    let err = AgentRegistry::new(vec![
        AgentDefinition::new("a", "A", "r-1"),
        AgentDefinition::new("a", "Again", "r-2"),
    ])
    .unwrap_err();
    assert!(matches!(err, BridgeError::Config(_)));
}
