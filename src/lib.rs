//! wxo-bridge - chat broker between a web frontend and watsonx Orchestrate agents
//!
//! The bridge exchanges an IBM Cloud API key for bearer tokens, keeps local
//! multi-agent conversations in memory, forwards user turns to remote agents
//! and exposes a small JSON REST surface for the frontend.

pub mod agents;
pub mod auth;
pub mod broker;
pub mod config;
pub mod conversation;
pub mod error;
pub mod gateway;
pub mod orchestrate;
pub mod utils;

pub use agents::{AgentDefinition, AgentRegistry};
pub use auth::{IdentityProvider, TokenCache};
pub use broker::{MessageBroker, SendOutcome};
pub use config::Config;
pub use conversation::{Conversation, ConversationStore, Message, Role};
pub use error::{BridgeError, Result};
pub use orchestrate::{OrchestrateApi, OrchestrateClient};
