//! API route handlers
//!
//! - `health`: liveness, readiness and pipeline status
//! - `intent`: retrieval, generative, hybrid and ranking classification,
//!   plus exemplar upserts

pub mod health;
pub mod intent;

use crate::error::{ServerError, ServerResult};
use axum::extract::rejection::JsonRejection;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};

/// API version and base info
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "intent-gate",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "POST /api/intent/embedding",
            "POST /api/intent/slm",
            "POST /api/intent/hybrid",
            "POST /api/intent/rank",
            "PUT /api/intent/documents",
            "GET /health",
            "GET /ready"
        ]
    })))
}

/// 404 Not Found handler
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}

/// JSON body with a required non-empty `message` string.
pub(crate) struct MessagePayload {
    pub message: String,
    pub body: Value,
}

impl MessagePayload {
    pub(crate) fn parse(payload: Result<Json<Value>, JsonRejection>) -> ServerResult<Self> {
        let Json(body) = payload.map_err(|e| ServerError::InvalidJson(e.body_text()))?;
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.trim().is_empty())
            .ok_or(ServerError::InvalidPayload)?
            .to_string();
        Ok(Self { message, body })
    }

    pub(crate) fn optional_str(&self, key: &str) -> Option<&str> {
        self.body.get(key).and_then(Value::as_str)
    }

    pub(crate) fn optional_usize(&self, key: &str) -> ServerResult<Option<usize>> {
        match self.body.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value
                .as_u64()
                .filter(|v| *v > 0)
                .map(|v| Some(v as usize))
                .ok_or_else(|| ServerError::BadRequest(format!("{key} must be a positive integer"))),
        }
    }
}
