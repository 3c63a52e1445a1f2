//! Logging initialization.
//!
//! Supports three formats:
//! - `pretty`: multi-line human-readable output for local development
//! - `component`: compact `timestamp LEVEL target message {fields}` lines; use the
//!   [`log_component!`] macro to add a `component` field for per-subsystem filtering
//! - `json`: structured JSON lines for log aggregators

use std::fs::OpenOptions;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};
use crate::error::Result;

/// Build the event filter. `RUST_LOG` wins over `cfg.level`.
pub fn env_filter(cfg: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.level))
}

/// Initialize the global tracing subscriber from config.
///
/// Call this once at startup before any tracing events are emitted. Fails
/// only when `cfg.file` is set and cannot be opened for appending. A second
/// call is a no-op. Without a file, events go to stderr.
pub fn init_logging(cfg: &LoggingConfig) -> Result<()> {
    let filter = env_filter(cfg);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    // `try_init` only fails when a global subscriber is already installed.
    match (&cfg.format, &cfg.file) {
        (LogFormat::Json, Some(path)) => {
            let file = Arc::new(OpenOptions::new().create(true).append(true).open(path)?);
            let _ = builder.json().with_writer(file).try_init();
        }
        (LogFormat::Json, None) => {
            let _ = builder.json().with_writer(std::io::stderr).try_init();
        }
        (LogFormat::Pretty, Some(path)) => {
            let file = Arc::new(OpenOptions::new().create(true).append(true).open(path)?);
            let _ = builder.pretty().with_ansi(false).with_writer(file).try_init();
        }
        (LogFormat::Pretty, None) => {
            let _ = builder.pretty().with_writer(std::io::stderr).try_init();
        }
        (LogFormat::Component, Some(path)) => {
            let file = Arc::new(OpenOptions::new().create(true).append(true).open(path)?);
            let _ = builder
                .compact()
                .with_ansi(false)
                .with_writer(file)
                .try_init();
        }
        (LogFormat::Component, None) => {
            let _ = builder.compact().with_writer(std::io::stderr).try_init();
        }
    }

    Ok(())
}

/// Emit a component-tagged tracing event.
///
/// Works with any tracing level (`trace`, `debug`, `info`, `warn`, `error`).
/// Wrap non-primitive values with `tracing::field::display` or `debug`:
///
/// ```
/// # use wxo_bridge::log_component;
/// log_component!(info, "broker", "message sent");
/// log_component!(warn, "auth", "token exchange failed", status = 401u16);
/// ```
#[macro_export]
macro_rules! log_component {
    ($level:ident, $component:expr, $msg:expr) => {
        tracing::$level!(component = $component, $msg)
    };
    ($level:ident, $component:expr, $msg:expr, $($key:ident = $val:expr),+ $(,)?) => {
        tracing::$level!(component = $component, $($key = $val,)+ $msg)
    };
}
