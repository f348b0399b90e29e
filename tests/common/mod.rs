//! Shared helpers for pipeline integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use intent_gate::{deterministic_embedding, FallbackPolicy, IntentGateConfig, RetryConfig};
use serde_json::{json, Value};

/// In-process stand-in for the Ollama HTTP API.
///
/// Embeddings come from the deterministic embedding so retrieval results
/// match the offline pipeline. Generation replies with a fixed status and
/// `response` text, and records every prompt it receives.
#[derive(Clone)]
pub struct FakeOllama {
    pub prompts: Arc<Mutex<Vec<String>>>,
    pub generate_calls: Arc<AtomicUsize>,
    pub embedding_calls: Arc<AtomicUsize>,
    status: StatusCode,
    reply: String,
}

impl FakeOllama {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self::with_status(StatusCode::OK, reply)
    }

    pub fn with_status(status: StatusCode, reply: impl Into<String>) -> Self {
        Self {
            prompts: Arc::new(Mutex::new(Vec::new())),
            generate_calls: Arc::new(AtomicUsize::new(0)),
            embedding_calls: Arc::new(AtomicUsize::new(0)),
            status,
            reply: reply.into(),
        }
    }

    pub fn generate_count(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }

    pub fn embedding_count(&self) -> usize {
        self.embedding_calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }

    /// Serve on an ephemeral port and return the API root (`http://addr/api`).
    pub async fn spawn(self) -> String {
        let router = Router::new()
            .route("/api/tags", get(|| async { Json(json!({ "models": [] })) }))
            .route("/api/embeddings", post(embeddings))
            .route("/api/generate", post(generate))
            .with_state(self);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/api")
    }
}

async fn embeddings(State(fake): State<FakeOllama>, Json(body): Json<Value>) -> Json<Value> {
    fake.embedding_calls.fetch_add(1, Ordering::SeqCst);
    let prompt = body["prompt"].as_str().unwrap_or_default();
    Json(json!({ "embedding": deterministic_embedding(prompt) }))
}

async fn generate(
    State(fake): State<FakeOllama>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    fake.generate_calls.fetch_add(1, Ordering::SeqCst);
    if let Some(prompt) = body["prompt"].as_str() {
        fake.prompts.lock().unwrap().push(prompt.to_string());
    }
    (fake.status, Json(json!({ "response": fake.reply })))
}

/// Pipeline config pointing both providers at `base_url` with short timings.
pub fn config_for(base_url: &str, fallback: FallbackPolicy) -> IntentGateConfig {
    let mut config = IntentGateConfig::default();
    config.embedding.base_url = base_url.to_string();
    config.embedding.timeout_secs = 5;
    config.dispatch.base_url = base_url.to_string();
    config.dispatch.readiness_timeout = Duration::from_secs(2);
    config.dispatch.readiness_poll_interval = Duration::from_millis(20);
    config.dispatch.request_timeout = Duration::from_secs(5);
    config.dispatch.retry = RetryConfig::default().with_base_delay(Duration::from_millis(10));
    config.fallback = fallback;
    config
}
