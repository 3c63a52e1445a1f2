//! Route table and CORS policy for the REST gateway.

use axum::http::HeaderValue;
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::state::AppState;
use crate::error::{BridgeError, Result};

/// CORS for the chat frontend: restricted to `frontend_url` when given,
/// permissive otherwise.
pub fn cors_layer(frontend_url: Option<&str>) -> Result<CorsLayer> {
    match frontend_url.map(str::trim).filter(|u| !u.is_empty()) {
        Some(origin) => {
            let origin = origin.trim_end_matches('/');
            let value = HeaderValue::from_str(origin).map_err(|e| {
                BridgeError::Config(format!("invalid frontend_url '{}': {}", origin, e))
            })?;
            Ok(CorsLayer::new()
                .allow_origin(value)
                .allow_methods(Any)
                .allow_headers(Any))
        }
        None => Ok(CorsLayer::permissive()),
    }
}

/// Build the HTTP router with all endpoints.
pub fn build(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(handlers::liveness))
        .route("/api/watsonx/health", get(handlers::health))
        .route("/api/agents", get(handlers::list_agents))
        .route(
            "/api/conversations",
            get(handlers::list_conversations).post(handlers::create_conversation),
        )
        .route(
            "/api/conversations/{id}",
            get(handlers::get_conversation).delete(handlers::delete_conversation),
        )
        .route(
            "/api/conversations/{id}/messages",
            post(handlers::send_message),
        )
        .route(
            "/api/conversations/{id}/agent",
            put(handlers::switch_agent),
        )
        .route(
            "/api/job-listing/generate",
            post(handlers::generate_job_listing),
        )
        .route("/api/chat/session", post(handlers::create_session))
        .route(
            "/api/chat/session/{session_id}",
            delete(handlers::delete_session),
        )
        .route("/api/chat/message", post(handlers::session_message))
        .route("/api/watsonx/skill", post(handlers::invoke_skill))
        .route("/api/orchestrate/agents", get(handlers::remote_agents))
        .route("/api/orchestrate/threads", get(handlers::threads))
        .route("/api/orchestrate/threads/{thread_id}", get(handlers::thread))
        .route(
            "/api/orchestrate/threads/{thread_id}/messages",
            get(handlers::thread_messages),
        )
        .route(
            "/api/orchestrate/threads/{thread_id}/messages/{message_id}",
            get(handlers::thread_message),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
