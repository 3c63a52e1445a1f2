//! Read-only catalog endpoints and URL construction.

use reqwest::Url;

use super::types::{AgentQuery, PageQuery, ThreadQuery};
use crate::error::{BridgeError, Result};

/// One read-only listing call against the service instance.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogRequest {
    /// `GET /v2/orchestrate/agents`
    Agents(AgentQuery),
    /// `GET /v1/threads`
    Threads(ThreadQuery),
    /// `GET /v1/threads/{thread_id}`
    Thread { thread_id: String },
    /// `GET /v1/threads/{thread_id}/messages`
    ThreadMessages { thread_id: String, page: PageQuery },
    /// `GET /v1/threads/{thread_id}/messages/{message_id}`
    ThreadMessage {
        thread_id: String,
        message_id: String,
    },
}

impl CatalogRequest {
    /// Unencoded path segments below the service instance URL.
    pub fn path_segments(&self) -> Vec<&str> {
        match self {
            CatalogRequest::Agents(_) => vec!["v2", "orchestrate", "agents"],
            CatalogRequest::Threads(_) => vec!["v1", "threads"],
            CatalogRequest::Thread { thread_id } => vec!["v1", "threads", thread_id.as_str()],
            CatalogRequest::ThreadMessages { thread_id, .. } => {
                vec!["v1", "threads", thread_id.as_str(), "messages"]
            }
            CatalogRequest::ThreadMessage {
                thread_id,
                message_id,
            } => vec!["v1", "threads", thread_id.as_str(), "messages", message_id.as_str()],
        }
    }

    /// Query parameters that are present, in forwarding order.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        match self {
            CatalogRequest::Agents(q) => q.params(),
            CatalogRequest::Threads(q) => q.params(),
            CatalogRequest::ThreadMessages { page, .. } => page.params(),
            CatalogRequest::Thread { .. } | CatalogRequest::ThreadMessage { .. } => Vec::new(),
        }
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            CatalogRequest::Agents(_) => "agents",
            CatalogRequest::Threads(_) => "threads",
            CatalogRequest::Thread { .. } => "thread",
            CatalogRequest::ThreadMessages { .. } => "thread_messages",
            CatalogRequest::ThreadMessage { .. } => "thread_message",
        }
    }

    /// Absolute URL for this request below `base`.
    pub fn url(&self, base: &str) -> Result<Url> {
        build_url(base, &self.path_segments(), &self.query_params())
    }
}

/// Append percent-encoded `segments` and `params` to `base`.
///
/// Any path already present on `base` (e.g. `/instances/<id>`) is kept.
pub fn build_url(base: &str, segments: &[&str], params: &[(&'static str, String)]) -> Result<Url> {
    let mut url = Url::parse(base)
        .map_err(|e| BridgeError::Config(format!("invalid base URL '{}': {}", base, e)))?;

    url.path_segments_mut()
        .map_err(|_| BridgeError::Config(format!("base URL '{}' cannot carry a path", base)))?
        .pop_if_empty()
        .extend(segments);

    if !params.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in params {
            pairs.append_pair(key, value);
        }
    }

    Ok(url)
}
