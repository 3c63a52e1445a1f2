//! Serve command handler.

use std::sync::Arc;

use anyhow::{Context, Result};

use wxo_bridge::broker::MessageBroker;
use wxo_bridge::config::Config;
use wxo_bridge::gateway;

/// Start the HTTP gateway. Bad config, agents or a missing API key are fatal.
pub(crate) async fn cmd_serve(
    mut config: Config,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    if let Some(host) = host {
        config.gateway.host = host;
    }
    if let Some(port) = port {
        config.gateway.port = port;
    }

    let broker = MessageBroker::from_config(&config).context("Failed to start the bridge")?;

    gateway::serve(&config.gateway, Arc::new(broker))
        .await
        .with_context(|| {
            format!(
                "Gateway on {}:{} stopped with an error",
                config.gateway.host, config.gateway.port
            )
        })
}
