use crate::error::ServerResult;
use crate::state::{ServerMetadata, ServerState};
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

/// Liveness: 200 while the process is serving.
pub async fn health_check() -> impl IntoResponse {
    let metadata = ServerMetadata::current();
    Json(json!({
        "status": "healthy",
        "service": "intent-server",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": metadata.version,
        "uptime_seconds": metadata.uptime_seconds,
    }))
}

/// Readiness plus a snapshot of pipeline components.
///
/// The generative backend is reported but never gates readiness: the keyword
/// fallback keeps the service answering without it.
pub async fn readiness_check(
    State(state): State<Arc<ServerState>>,
) -> ServerResult<impl IntoResponse> {
    let pipeline = &state.pipeline;
    let matcher = pipeline.matcher();
    let embeddings = matcher.embeddings();
    let cache = embeddings.cache_stats();

    Ok(Json(json!({
        "status": "ready",
        "service": "intent-server",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": ServerMetadata::current().uptime_seconds,
        "components": {
            "corpus": {
                "documents": matcher.document_count(),
            },
            "embedding": {
                "provider": if embeddings.has_provider() { "ollama" } else { "offline" },
                "cache": cache,
            },
            "classifier": {
                "generative": pipeline.classifier().generative_enabled(),
                "fallback": pipeline.fallback(),
                "dispatcher": pipeline.classifier().stats(),
            },
        }
    })))
}
