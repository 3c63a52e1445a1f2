//! Agents command handler.

use anyhow::{Context, Result};

use wxo_bridge::agents::AgentRegistry;
use wxo_bridge::config::Config;

/// Print the configured agents as a table or as JSON.
pub(crate) fn cmd_agents(config: &Config, json: bool) -> Result<()> {
    let registry = AgentRegistry::from_config(config).context("Failed to load agents")?;

    if json {
        let out = serde_json::to_string_pretty(registry.list_agents())?;
        println!("{}", out);
        return Ok(());
    }

    println!("{:<24} {:<28} REMOTE AGENT ID", "ID", "NAME");
    for agent in registry.list_agents() {
        println!(
            "{:<24} {:<28} {}",
            agent.id, agent.display_name, agent.remote_agent_id
        );
        if let Some(ref description) = agent.description {
            println!("{:<24} {}", "", description);
        }
    }
    if let Some(ref id) = config.agents.job_listing_agent {
        println!("\nJob listings go to '{}'", id);
    }
    Ok(())
}
