use std::sync::Arc;

use crate::broker::MessageBroker;

/// Shared state for the HTTP layer.
#[derive(Clone)]
pub struct AppState {
    broker: Arc<MessageBroker>,
}

impl AppState {
    pub fn new(broker: Arc<MessageBroker>) -> Self {
        Self { broker }
    }

    pub fn broker(&self) -> &MessageBroker {
        &self.broker
    }
}
