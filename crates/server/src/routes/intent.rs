use crate::error::{ServerError, ServerResult};
use crate::routes::MessagePayload;
use crate::state::ServerState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use intent_gate::{FallbackPolicy, IntentDocument};
use serde_json::{json, Value};
use std::sync::Arc;

/// Vector path: nearest exemplars for the message.
///
/// `intent` is the best match, or `null` when the best score is below the
/// confidence threshold.
pub async fn classify_embedding(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ServerResult<impl IntoResponse> {
    let payload = MessagePayload::parse(payload)?;
    let top_k = payload.optional_usize("topK")?;

    let nearest = state.pipeline.nearest(&payload.message, top_k).await;

    Ok(Json(json!({
        "intent": nearest.matches.first(),
        "candidates": nearest.matches,
        "belowThreshold": nearest.below_threshold,
        "bestScore": nearest.best_score,
        "durationMs": nearest.duration_ms,
    })))
}

/// Generative path with keyword fallback.
///
/// Optional fields: `context` (retrieval context lines) and `fallback`
/// (`"allow_keywords"` or `"disabled"`).
pub async fn classify_slm(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ServerResult<impl IntoResponse> {
    let payload = MessagePayload::parse(payload)?;
    let policy = fallback_policy(&payload, state.pipeline.fallback())?;

    let classification = state
        .pipeline
        .classify_with_policy(&payload.message, payload.optional_str("context"), policy)
        .await?;

    Ok(Json(json!({ "classification": classification })))
}

/// Top nearest exemplars as context for the generative classifier.
pub async fn classify_hybrid(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ServerResult<impl IntoResponse> {
    let payload = MessagePayload::parse(payload)?;
    let hybrid = state.pipeline.hybrid(&payload.message).await?;
    Ok(Json(hybrid))
}

/// Intent-level ranking with rule bonuses.
pub async fn rank_intents(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ServerResult<impl IntoResponse> {
    let payload = MessagePayload::parse(payload)?;
    let top_k = payload.optional_usize("topK")?;
    let ranking = state.pipeline.rank(&payload.message, top_k).await;
    Ok(Json(ranking))
}

/// Add or replace an exemplar `{ id, intent, text }`.
pub async fn upsert_document(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<IntentDocument>, JsonRejection>,
) -> ServerResult<impl IntoResponse> {
    let Json(document) =
        payload.map_err(|e| ServerError::BadRequest(e.body_text()))?;
    let id = document.id.clone();
    let replaced = state.pipeline.upsert_document(document)?;

    Ok(Json(json!({
        "id": id,
        "replaced": replaced,
        "documents": state.pipeline.matcher().document_count(),
    })))
}

fn fallback_policy(
    payload: &MessagePayload,
    default: FallbackPolicy,
) -> ServerResult<FallbackPolicy> {
    match payload.body.get("fallback") {
        None | Some(Value::Null) => Ok(default),
        Some(value) => serde_json::from_value(value.clone()).map_err(|_| {
            ServerError::BadRequest(
                "fallback must be \"allow_keywords\" or \"disabled\"".to_string(),
            )
        }),
    }
}
