//! Gateway-generated responses.
//!
//! # Responsibilities
//! - Render synthetic failures (401/403/500/502/504) as `{"error": "..."}`
//! - Serve the fixed health response
//!
//! # Design Decisions
//! - Messages are fixed strings; internal causes never reach the body
//! - Upstream responses are relayed untouched and never pass through here

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// JSON body of every gateway-generated error.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

pub fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.to_string(),
        }),
    )
        .into_response()
}

/// `GET /health`.
pub async fn health() -> &'static str {
    "OK"
}
