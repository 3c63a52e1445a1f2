//! HTTP gateway
//!
//! JSON REST surface for the chat frontend, built on axum. Routes map
//! one-to-one onto [`MessageBroker`] operations; errors are rendered by the
//! [`axum::response::IntoResponse`] impl for [`crate::error::BridgeError`].

pub mod error;
pub mod handlers;
pub mod router;
pub mod state;

pub use router::{build as build_router, cors_layer};
pub use state::AppState;

use std::sync::Arc;

use crate::broker::MessageBroker;
use crate::config::GatewayConfig;
use crate::error::Result;
use crate::log_component;

/// Bind `config.host:config.port` and serve until Ctrl-C.
pub async fn serve(config: &GatewayConfig, broker: Arc<MessageBroker>) -> Result<()> {
    let cors = cors_layer(config.frontend_url.as_deref())?;
    let app = build_router(AppState::new(broker), cors);

    let bind_addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    log_component!(
        info,
        "gateway",
        "listening",
        addr = bind_addr.as_str(),
        frontend = config.frontend_url.as_deref().unwrap_or("*")
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log_component!(info, "gateway", "shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log_component!(
            warn,
            "gateway",
            "failed to listen for shutdown signal",
            error = tracing::field::display(&e)
        );
        std::future::pending::<()>().await;
    }
}
