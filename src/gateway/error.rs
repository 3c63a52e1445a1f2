//! HTTP mapping for [`BridgeError`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::BridgeError;
use crate::log_component;

impl BridgeError {
    /// Status code the gateway answers with for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            BridgeError::NotFound(_) => StatusCode::NOT_FOUND,
            BridgeError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            BridgeError::Auth(_) | BridgeError::Upstream { .. } | BridgeError::Http(_) => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            log_component!(
                warn,
                "gateway",
                "request failed",
                status = status.as_u16(),
                error = tracing::field::display(&self)
            );
        }

        let body = match &self {
            BridgeError::Upstream {
                status: upstream,
                body,
            } => json!({
                "error": self.to_string(),
                "status": upstream,
                "body": body,
            }),
            _ => json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
