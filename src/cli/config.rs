//! Config check command handler.

use std::path::Path;

use anyhow::{bail, Context, Result};

use wxo_bridge::agents::AgentRegistry;
use wxo_bridge::config::validate::{validate_config, Diagnostic, DiagnosticLevel};
use wxo_bridge::config::Config;

use super::ConfigAction;

/// Validate a configuration file. Exits non-zero when errors are found.
pub(crate) fn cmd_config(config_path: &Path, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Check => {
            println!("Config file: {}", config_path.display());
            let diagnostics = check_file(config_path)?;
            for diag in &diagnostics {
                println!("{}", diag);
            }

            let count = |level: DiagnosticLevel| diagnostics.iter().filter(|d| d.level == level).count();
            let errors = count(DiagnosticLevel::Error);
            let warnings = count(DiagnosticLevel::Warn);

            if errors > 0 {
                bail!("Found {} error(s), {} warning(s)", errors, warnings);
            }
            if warnings == 0 {
                println!("\nConfiguration looks good!");
            } else {
                println!("\nFound {} warning(s)", warnings);
            }
        }
    }
    Ok(())
}

/// Field-level validation of the raw file, then a typed load with
/// environment overrides and agent resolution.
fn check_file(path: &Path) -> Result<Vec<Diagnostic>> {
    let mut diagnostics = Vec::new();

    if path.exists() {
        let content = std::fs::read_to_string(path).context("Failed to read config file")?;
        match serde_json::from_str::<serde_json::Value>(&content) {
            Ok(raw) => diagnostics.extend(validate_config(&raw)),
            Err(e) => {
                diagnostics.push(Diagnostic::error("", format!("Invalid JSON: {}", e)));
                return Ok(diagnostics);
            }
        }
    } else {
        diagnostics.push(Diagnostic::ok("", "No config file found (using defaults)"));
    }

    let config = match Config::load_from_path(path) {
        Ok(config) => config,
        Err(e) => {
            diagnostics.push(Diagnostic::error("", format!("Config does not load: {}", e)));
            return Ok(diagnostics);
        }
    };

    if config.orchestrate.api_key().is_none() {
        diagnostics.push(Diagnostic::error(
            "orchestrate.api_key",
            "No API key; set WXO_BRIDGE_ORCHESTRATE_API_KEY",
        ));
    }

    match AgentRegistry::from_config(&config) {
        Ok(registry) => diagnostics.push(Diagnostic::ok(
            "agents",
            format!("{} agent(s) registered", registry.len()),
        )),
        Err(e) => diagnostics.push(Diagnostic::error("agents", e.to_string())),
    }

    Ok(diagnostics)
}
