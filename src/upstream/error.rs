//! User-facing error taxonomy for the upstream proxy.
//!
//! # Responsibilities
//! - One variant per failure category the frontend can act on
//! - Map each category to a gateway HTTP status and a friendly message
//! - Keep upstream detail in logs, out of responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::observability::metrics;

/// Everything that can go wrong between accepting a request and returning
/// an upstream payload. Quota rejection is deliberately not here: it is a
/// policy outcome, not an error (see `http::response::QuotaRejection`).
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Client-caused; retrying without changing the input will not help.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Operator-caused; the gateway itself is not set up for this service.
    #[error("gateway misconfigured: {0}")]
    Configuration(String),

    /// The upstream rejected the gateway's credentials.
    #[error("upstream rejected credentials (status {status})")]
    AuthFailure { status: u16 },

    /// The upstream is rate limiting the gateway; retry later.
    #[error("upstream overloaded (status {status})")]
    UpstreamOverloaded { status: u16 },

    /// Any other non-2xx upstream status, or a connection failure.
    #[error("upstream request failed (status {status:?})")]
    Upstream { status: Option<u16> },

    /// The upstream returned 2xx but the body violated its own contract.
    #[error("upstream returned an unusable response")]
    MalformedResponse,

    /// The upstream call exceeded its deadline. Never retried here.
    #[error("upstream request timed out")]
    UpstreamTimeout,

    /// Catch-all; no detail leaks to the caller.
    #[error("internal error")]
    Internal,
}

impl GatewayError {
    /// Stable machine-readable category name.
    pub fn category(&self) -> &'static str {
        match self {
            GatewayError::InvalidInput(_) => "invalid_input",
            GatewayError::Configuration(_) => "configuration",
            GatewayError::AuthFailure { .. } => "auth_failure",
            GatewayError::UpstreamOverloaded { .. } => "upstream_overloaded",
            GatewayError::Upstream { .. } => "upstream_error",
            GatewayError::MalformedResponse => "malformed_upstream_response",
            GatewayError::UpstreamTimeout => "upstream_timeout",
            GatewayError::Internal => "internal_error",
        }
    }

    /// Gateway status returned to the client for this category.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            GatewayError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::AuthFailure { .. } => StatusCode::BAD_GATEWAY,
            GatewayError::UpstreamOverloaded { .. } => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            GatewayError::MalformedResponse => StatusCode::BAD_GATEWAY,
            GatewayError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Original upstream HTTP status, wherever one exists.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            GatewayError::AuthFailure { status }
            | GatewayError::UpstreamOverloaded { status } => Some(*status),
            GatewayError::Upstream { status } => *status,
            _ => None,
        }
    }

    /// Friendly message shown to the end user. Operator and upstream
    /// detail stays in the logs.
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::InvalidInput(detail) => format!("Invalid request: {}", detail),
            GatewayError::Configuration(_) => {
                "This service is not configured yet. Please contact the operator.".to_string()
            }
            GatewayError::AuthFailure { .. } => {
                "The AI service rejected the gateway's credentials. Please try again later."
                    .to_string()
            }
            GatewayError::UpstreamOverloaded { .. } => {
                "The AI service is busy right now. Please try again in a moment.".to_string()
            }
            GatewayError::Upstream { .. } => {
                "The AI service returned an unexpected error. Please try again.".to_string()
            }
            GatewayError::MalformedResponse => {
                "The AI service returned an unreadable answer. Please try again.".to_string()
            }
            GatewayError::UpstreamTimeout => {
                "The AI service took too long to answer. Please try again.".to_string()
            }
            GatewayError::Internal => "Something went wrong. Please try again.".to_string(),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        tracing::warn!(
            category = self.category(),
            upstream_status = ?self.upstream_status(),
            error = %self,
            "Request failed"
        );
        metrics::record_upstream_error(self.category());

        let body = json!({
            "error": self.category(),
            "message": self.user_message(),
        });
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_names_are_stable() {
        assert_eq!(GatewayError::InvalidInput("x".into()).category(), "invalid_input");
        assert_eq!(GatewayError::AuthFailure { status: 401 }.category(), "auth_failure");
        assert_eq!(
            GatewayError::UpstreamOverloaded { status: 429 }.category(),
            "upstream_overloaded"
        );
        assert_eq!(
            GatewayError::MalformedResponse.category(),
            "malformed_upstream_response"
        );
        assert_eq!(GatewayError::UpstreamTimeout.category(), "upstream_timeout");
    }

    #[test]
    fn test_upstream_status_preserved() {
        assert_eq!(
            GatewayError::AuthFailure { status: 401 }.upstream_status(),
            Some(401)
        );
        assert_eq!(
            GatewayError::Upstream { status: Some(500) }.upstream_status(),
            Some(500)
        );
        assert_eq!(GatewayError::Upstream { status: None }.upstream_status(), None);
        assert_eq!(GatewayError::MalformedResponse.upstream_status(), None);
    }

    #[test]
    fn test_timeout_maps_to_gateway_timeout() {
        assert_eq!(GatewayError::UpstreamTimeout.status(), StatusCode::GATEWAY_TIMEOUT);
    }
}
