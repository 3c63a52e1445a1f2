//! CLI module: command parsing and dispatch
//!
//! All CLI logic lives here. `main.rs` calls `cli::run()`.

pub mod agents;
pub mod config;
pub mod doctor;
pub mod serve;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};

use wxo_bridge::config::Config;

#[derive(Parser)]
#[command(name = "wxo-bridge")]
#[command(version)]
#[command(about = "Chat bridge between a web frontend and watsonx Orchestrate agents", long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.wxo-bridge/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Override gateway.host
        #[arg(long)]
        host: Option<String>,
        /// Override gateway.port
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// List the configured agents
    Agents {
        /// Print the definitions as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Run diagnostics on configuration and connectivity
    Doctor {
        /// Exchange the API key for a token to verify credentials
        #[arg(long)]
        online: bool,
    },
    /// Show version information
    Version,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Check configuration for errors and warnings
    Check,
}

/// Config path from `--config`, or the default location.
fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit.map(Path::to_path_buf).unwrap_or_else(Config::path)
}

/// Load config (file, then environment overrides).
pub(crate) fn load_config(path: &Path) -> Result<Config> {
    Config::load_from_path(path)
        .with_context(|| format!("Failed to load config from {}", path.display()))
}

/// Parse arguments and dispatch.
pub async fn run() -> Result<()> {
    // A missing .env is normal outside development.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let path = config_path(cli.config.as_deref());

    // Respect logging settings when the config is readable; `config check`
    // reports the actual problem otherwise.
    let logging_cfg = Config::load_from_path(&path)
        .map(|c| c.logging)
        .unwrap_or_default();
    wxo_bridge::utils::logging::init_logging(&logging_cfg)
        .context("Failed to initialize logging")?;

    match cli.command {
        None => {
            let mut cmd = Cli::command();
            cmd.print_help()?;
            println!();
        }
        Some(Commands::Version) => {
            cmd_version();
        }
        Some(Commands::Serve { host, port }) => {
            serve::cmd_serve(load_config(&path)?, host, port).await?;
        }
        Some(Commands::Agents { json }) => {
            agents::cmd_agents(&load_config(&path)?, json)?;
        }
        Some(Commands::Config { action }) => {
            config::cmd_config(&path, action)?;
        }
        Some(Commands::Doctor { online }) => {
            doctor::cmd_doctor(&load_config(&path)?, online).await?;
        }
    }

    Ok(())
}

fn cmd_version() {
    println!("wxo-bridge {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Chat bridge for watsonx Orchestrate agents");
}
