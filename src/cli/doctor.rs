//! Doctor: configuration and connectivity diagnostics.

use anyhow::Result;
use reqwest::Url;

use wxo_bridge::agents::AgentRegistry;
use wxo_bridge::auth::{IamIdentityProvider, IdentityProvider};
use wxo_bridge::config::Config;
use wxo_bridge::orchestrate::http_client;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Ok,
    Warn,
    Err,
}

impl Severity {
    pub fn icon(&self) -> &'static str {
        match self {
            Severity::Ok => "[ok]",
            Severity::Warn => "[warn]",
            Severity::Err => "[ERR]",
        }
    }
}

pub struct DiagItem {
    pub severity: Severity,
    pub category: &'static str,
    pub message: String,
}

impl DiagItem {
    fn new(severity: Severity, category: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity,
            category,
            message: message.into(),
        }
    }
}

/// Offline checks: credentials present, URLs usable, agents loadable.
pub fn run_diagnostics(config: &Config) -> Vec<DiagItem> {
    let mut diags = Vec::new();

    check_credentials(config, &mut diags);
    check_urls(config, &mut diags);
    check_agents(config, &mut diags);

    diags
}

fn check_credentials(config: &Config, diags: &mut Vec<DiagItem>) {
    if config.orchestrate.api_key().is_some() {
        diags.push(DiagItem::new(Severity::Ok, "credentials", "API key configured"));
    } else {
        diags.push(DiagItem::new(
            Severity::Err,
            "credentials",
            "No API key; set WXO_BRIDGE_ORCHESTRATE_API_KEY or WATSONX_API_KEY",
        ));
    }
}

fn check_urls(config: &Config, diags: &mut Vec<DiagItem>) {
    let orchestrate = &config.orchestrate;
    let urls = [
        ("host_url", orchestrate.host_url.as_str()),
        ("service_instance_url", orchestrate.catalog_base_url()),
        ("iam_url", orchestrate.iam_url.as_str()),
    ];

    for (name, raw) in urls {
        match Url::parse(raw) {
            Ok(url) if url.scheme() == "https" => {
                diags.push(DiagItem::new(Severity::Ok, "urls", format!("{}: {}", name, url)));
            }
            Ok(url) => diags.push(DiagItem::new(
                Severity::Warn,
                "urls",
                format!("{} uses {}, tokens travel unencrypted", name, url.scheme()),
            )),
            Err(e) => diags.push(DiagItem::new(
                Severity::Err,
                "urls",
                format!("{} is not a valid URL ({}): {}", name, e, raw),
            )),
        }
    }

    if orchestrate.service_instance_url.is_none() {
        diags.push(DiagItem::new(
            Severity::Warn,
            "urls",
            "service_instance_url unset; catalog calls go to host_url",
        ));
    }
}

fn check_agents(config: &Config, diags: &mut Vec<DiagItem>) {
    match AgentRegistry::from_config(config) {
        Ok(registry) => diags.push(DiagItem::new(
            Severity::Ok,
            "agents",
            format!("{} agent(s) registered", registry.len()),
        )),
        Err(e) => diags.push(DiagItem::new(Severity::Err, "agents", e.to_string())),
    }
}

/// Exchange the API key once. Reports the token lifetime, never the token.
async fn check_token_exchange(config: &Config, diags: &mut Vec<DiagItem>) {
    let provider = match http_client(config.orchestrate.request_timeout_secs)
        .and_then(|client| IamIdentityProvider::from_config(&config.orchestrate, client))
    {
        Ok(provider) => provider,
        Err(e) => {
            diags.push(DiagItem::new(Severity::Err, "iam", e.to_string()));
            return;
        }
    };

    match provider.exchange().await {
        Ok(issued) => diags.push(DiagItem::new(
            Severity::Ok,
            "iam",
            format!("Token issued, valid for {}s", issued.expires_in),
        )),
        Err(e) => diags.push(DiagItem::new(Severity::Err, "iam", e.to_string())),
    }
}

pub(crate) async fn cmd_doctor(config: &Config, online: bool) -> Result<()> {
    println!("wxo-bridge doctor\n");

    let mut diags = run_diagnostics(config);
    if online {
        check_token_exchange(config, &mut diags).await;
    }

    for item in &diags {
        println!("{} {}: {}", item.severity.icon(), item.category, item.message);
    }

    let errors = diags.iter().filter(|d| d.severity == Severity::Err).count();
    let warnings = diags.iter().filter(|d| d.severity == Severity::Warn).count();
    println!("\n{} error(s), {} warning(s)", errors, warnings);
    if !online {
        println!("Run with --online to verify the API key against IAM.");
    }

    if errors > 0 {
        anyhow::bail!("doctor found {} error(s)", errors);
    }
    Ok(())
}
