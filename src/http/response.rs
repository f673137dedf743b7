//! Response shapes shared across handlers.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Returned with 429 when the quota gate rejects a request.
///
/// Not an error: the reset time lets the client compute retry timing.
#[derive(Debug, Serialize)]
pub struct QuotaRejection {
    pub error: &'static str,
    pub message: String,
    /// ISO-8601 instant at which the client's window resets.
    pub reset_time: String,
}

impl QuotaRejection {
    pub fn new(reset_at: DateTime<Utc>) -> Self {
        Self {
            error: "rate_limited",
            message: "Request limit reached. Please try again later.".to_string(),
            reset_time: reset_at.to_rfc3339(),
        }
    }
}

impl IntoResponse for QuotaRejection {
    fn into_response(self) -> Response {
        (StatusCode::TOO_MANY_REQUESTS, Json(self)).into_response()
    }
}
