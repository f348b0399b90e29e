use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use intent_gate::{DispatchError, MatchError, PipelineError};
use serde::{Deserialize, Serialize};

pub type ServerResult<T> = Result<T, ServerError>;

/// Everything a handler can fail with, rendered as `{ "error": { code, message } }`.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid payload: {{ message: string }} expected")]
    InvalidPayload,

    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found")]
    NotFound,
}

/// Wire shape of every error body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::InvalidPayload
            | ServerError::InvalidJson(_)
            | ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Pipeline(PipelineError::Dispatch(err)) => match err {
                DispatchError::NoResult => StatusCode::BAD_GATEWAY,
                DispatchError::InvalidConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
                DispatchError::RetriesExhausted { .. }
                | DispatchError::Disabled
                | DispatchError::Closed => StatusCode::SERVICE_UNAVAILABLE,
            },
            ServerError::Pipeline(PipelineError::Match(
                MatchError::InvalidDocument { .. } | MatchError::DuplicateDocument(_),
            )) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::Pipeline(_) | ServerError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ServerError::InvalidPayload => "INVALID_PAYLOAD",
            ServerError::InvalidJson(_) => "INVALID_JSON",
            ServerError::BadRequest(_) => "BAD_REQUEST",
            ServerError::Pipeline(PipelineError::Dispatch(DispatchError::NoResult)) => {
                "NO_CLASSIFICATION"
            }
            ServerError::Pipeline(PipelineError::Dispatch(_)) => "CLASSIFIER_UNAVAILABLE",
            ServerError::Pipeline(PipelineError::Match(_)) => "MATCH_ERROR",
            ServerError::Pipeline(_) => "PIPELINE_ERROR",
            ServerError::Config(_) => "CONFIG_ERROR",
            ServerError::NotFound => "NOT_FOUND",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}
