//! Orchestrate API request and response shapes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reply text used when the remote payload carries none.
pub const NO_RESPONSE: &str = "No response";

// ============================================================================
// Messaging
// ============================================================================

/// Body of `POST /v2/assistants/{agentId}/message`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SendMessageRequest {
    pub input: MessageInput,
    pub context: MessageContext,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageInput {
    pub message_type: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageContext {
    pub global: GlobalContext,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalContext {
    pub system: SystemContext,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemContext {
    /// Scopes remote-side state; the local conversation id is used
    pub user_id: String,
}

impl SendMessageRequest {
    /// A plain text turn on behalf of `user_id`.
    pub fn text(text: &str, user_id: &str) -> Self {
        Self {
            input: MessageInput {
                message_type: "text".to_string(),
                text: text.to_string(),
            },
            context: MessageContext {
                global: GlobalContext {
                    system: SystemContext {
                        user_id: user_id.to_string(),
                    },
                },
            },
        }
    }
}

/// Body of `POST /skills/invoke`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillRequest {
    pub skill_name: String,
    /// Forwarded as given; `{}` when the caller sent none
    pub parameters: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

impl SkillRequest {
    pub fn new(skill_name: &str, parameters: Option<Value>, project_id: Option<&str>) -> Self {
        Self {
            skill_name: skill_name.to_string(),
            parameters: match parameters {
                Some(Value::Null) | None => Value::Object(Default::default()),
                Some(value) => value,
            },
            project_id: project_id.map(str::to_string),
        }
    }
}

/// Pull the reply text out of a messaging response.
///
/// Takes the first non-empty of `output.generic[0].text`, then `output.text`
/// (a string, or the first non-empty string of an array), and falls back to
/// [`NO_RESPONSE`].
pub fn extract_reply_text(payload: &Value) -> String {
    let output = payload.get("output");

    let generic = output
        .and_then(|o| o.get("generic"))
        .and_then(|g| g.get(0))
        .and_then(|g| g.get("text"))
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty());

    let text = || match output.and_then(|o| o.get("text")) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.as_str()),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .find(|s| !s.is_empty()),
        _ => None,
    };

    generic.or_else(text).unwrap_or(NO_RESPONSE).to_string()
}

// ============================================================================
// Catalog queries
// ============================================================================

/// Filters for the remote agent listing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AgentQuery {
    pub query: Option<String>,
    pub ids: Option<String>,
    pub names: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub sort: Option<String>,
}

/// Filters for the remote thread listing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ThreadQuery {
    pub agent_id: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Paging for thread messages.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PageQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

type Params = Vec<(&'static str, String)>;

fn push_str(params: &mut Params, key: &'static str, value: &Option<String>) {
    if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
        params.push((key, v.to_string()));
    }
}

fn push_num(params: &mut Params, key: &'static str, value: Option<u32>) {
    if let Some(v) = value {
        params.push((key, v.to_string()));
    }
}

impl AgentQuery {
    /// Present parameters in `query, ids, names, limit, offset, sort` order.
    pub fn params(&self) -> Params {
        let mut params = Vec::new();
        push_str(&mut params, "query", &self.query);
        push_str(&mut params, "ids", &self.ids);
        push_str(&mut params, "names", &self.names);
        push_num(&mut params, "limit", self.limit);
        push_num(&mut params, "offset", self.offset);
        push_str(&mut params, "sort", &self.sort);
        params
    }
}

impl ThreadQuery {
    pub fn params(&self) -> Params {
        let mut params = Vec::new();
        push_str(&mut params, "agent_id", &self.agent_id);
        push_num(&mut params, "limit", self.limit);
        push_num(&mut params, "offset", self.offset);
        params
    }
}

impl PageQuery {
    pub fn params(&self) -> Params {
        let mut params = Vec::new();
        push_num(&mut params, "limit", self.limit);
        push_num(&mut params, "offset", self.offset);
        params
    }
}
