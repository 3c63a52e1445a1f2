//! Field-level validation of a raw config file.
//!
//! Runs on the untyped JSON so that typos (`"gatway"`) are reported with a
//! suggestion instead of being silently ignored by serde defaults.

use serde_json::{Map, Value};

const TOP_LEVEL: &[&str] = &["orchestrate", "agents", "gateway", "logging"];

const SECTIONS: &[(&str, &[&str])] = &[
    (
        "orchestrate",
        &[
            "api_key",
            "host_url",
            "service_instance_url",
            "iam_url",
            "token_safety_margin_secs",
            "request_timeout_secs",
            "project_id",
        ],
    ),
    ("agents", &["file", "definitions", "job_listing_agent"]),
    ("gateway", &["host", "port", "frontend_url"]),
    ("logging", &["format", "level", "file"]),
];

/// URL fields that carry bearer tokens or the API key.
const URL_FIELDS: &[&str] = &["host_url", "service_instance_url", "iam_url"];

/// Largest edit distance still offered as a suggestion.
const MAX_SUGGESTION_DISTANCE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Ok,
    Warn,
    Error,
}

/// One finding, addressed by a dotted config path (empty for the whole file).
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(level: DiagnosticLevel, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn ok(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Ok, path, message)
    }

    pub fn warn(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Warn, path, message)
    }

    pub fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Error, path, message)
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self.level {
            DiagnosticLevel::Ok => "[OK]",
            DiagnosticLevel::Warn => "[WARN]",
            DiagnosticLevel::Error => "[ERROR]",
        };
        match self.path.as_str() {
            "" => write!(f, "{} {}", tag, self.message),
            path => write!(f, "{} {}: {}", tag, path, self.message),
        }
    }
}

/// Edit distance between `a` and `b`, counted in chars.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// `did you mean '<field>'?` for the closest known field, if any is close.
pub fn suggest_field(unknown: &str, known: &[&str]) -> Option<String> {
    known
        .iter()
        .map(|k| (levenshtein(unknown, k), k))
        .filter(|(d, _)| *d <= MAX_SUGGESTION_DISTANCE)
        .min()
        .map(|(_, k)| format!("did you mean '{}'?", k))
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

/// Push an error for every key of `obj` outside `known`; returns how many.
fn unknown_keys(
    obj: &Map<String, Value>,
    known: &[&str],
    prefix: &str,
    out: &mut Vec<Diagnostic>,
) -> usize {
    let before = out.len();
    for key in obj.keys().filter(|k| !known.contains(&k.as_str())) {
        let message = match suggest_field(key, known) {
            Some(hint) => format!("Unknown field '{}', {}", key, hint),
            None => format!("Unknown field '{}'", key),
        };
        out.push(Diagnostic::error(join_path(prefix, key), message));
    }
    out.len() - before
}

fn non_blank<'a>(value: Option<&'a Value>) -> Option<&'a str> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

fn check_orchestrate(section: &Map<String, Value>, out: &mut Vec<Diagnostic>) {
    if non_blank(section.get("api_key")).is_some() {
        out.push(Diagnostic::warn(
            "orchestrate.api_key",
            "Stored in plain text; prefer WXO_BRIDGE_ORCHESTRATE_API_KEY",
        ));
    }
    for field in URL_FIELDS {
        let plain_http = section
            .get(*field)
            .and_then(Value::as_str)
            .is_some_and(|url| url.starts_with("http://"));
        if plain_http {
            out.push(Diagnostic::warn(
                join_path("orchestrate", field),
                "Plain http, bearer tokens would travel unencrypted",
            ));
        }
    }
}

fn check_inline_agents(definitions: &[Value], out: &mut Vec<Diagnostic>) {
    for (i, def) in definitions.iter().enumerate() {
        let path = format!("agents.definitions[{}]", i);
        if non_blank(def.get("id")).is_none() {
            out.push(Diagnostic::error(path.as_str(), "Missing 'id'"));
        }
        let remote = def.get("agentId").or_else(|| def.get("remoteAgentId"));
        if non_blank(remote).is_none() {
            out.push(Diagnostic::error(
                path,
                "Missing 'agentId' (remote agent identifier)",
            ));
        }
    }
}

/// Check a raw config document: unknown fields, plain-text secrets,
/// insecure URLs and incomplete inline agent definitions.
pub fn validate_config(raw: &Value) -> Vec<Diagnostic> {
    let Some(obj) = raw.as_object() else {
        return vec![Diagnostic::error("", "Config must be a JSON object")];
    };

    let mut out = vec![Diagnostic::ok("", "Valid JSON")];

    let mut unknown = unknown_keys(obj, TOP_LEVEL, "", &mut out);
    for (name, known) in SECTIONS {
        if let Some(section) = obj.get(*name).and_then(Value::as_object) {
            unknown += unknown_keys(section, known, name, &mut out);
        }
    }
    if unknown == 0 {
        out.push(Diagnostic::ok("", "All fields recognized"));
    }

    if let Some(orchestrate) = obj.get("orchestrate").and_then(Value::as_object) {
        check_orchestrate(orchestrate, &mut out);
    }
    if let Some(definitions) = obj
        .get("agents")
        .and_then(|agents| agents.get("definitions"))
        .and_then(Value::as_array)
    {
        check_inline_agents(definitions, &mut out);
    }

    out
}
