use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{EmbeddingConfig, EmbeddingError};

/// External source of text embeddings.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    /// Embed one text. Any error sends the caller to the deterministic fallback.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

/// Ollama `POST {base_url}/embeddings` client.
#[derive(Debug, Clone)]
pub struct OllamaEmbeddingProvider {
    client: reqwest::Client,
    url: String,
    model: String,
}

impl OllamaEmbeddingProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .pool_max_idle_per_host(8)
            .build()
            .map_err(|e| EmbeddingError::InvalidConfig(format!("http client: {e}")))?;

        Ok(Self {
            client,
            url: config.embeddings_url(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbeddingProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let response = self
            .client
            .post(&self.url)
            .json(&EmbeddingRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .await
            .map_err(|e| EmbeddingError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        if parsed.embedding.is_empty() {
            return Err(EmbeddingError::InvalidResponse("empty embedding".into()));
        }
        Ok(parsed.embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/api")
    }

    fn provider(base_url: String) -> OllamaEmbeddingProvider {
        OllamaEmbeddingProvider::new(&EmbeddingConfig {
            base_url,
            timeout_secs: 2,
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn returns_vector_and_sends_model_and_prompt() {
        let router = Router::new().route(
            "/api/embeddings",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["model"], "nomic-embed-text");
                assert_eq!(body["prompt"], "cemento");
                Json(json!({ "embedding": [0.5, 0.25, 0.0] }))
            }),
        );
        let base = spawn(router).await;

        let vector = provider(base).embed("cemento").await.unwrap();
        assert_eq!(vector, vec![0.5, 0.25, 0.0]);
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let router = Router::new().route(
            "/api/embeddings",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let base = spawn(router).await;

        let err = provider(base).embed("x").await.unwrap_err();
        assert_eq!(
            err,
            EmbeddingError::Status {
                status: 500,
                body: "boom".into()
            }
        );
    }

    #[tokio::test]
    async fn malformed_body_is_invalid_response() {
        let router = Router::new().route(
            "/api/embeddings",
            post(|| async { Json(json!({ "vectors": [] })) }),
        );
        let base = spawn(router).await;

        let err = provider(base).embed("x").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn empty_vector_is_invalid_response() {
        let router = Router::new().route(
            "/api/embeddings",
            post(|| async { Json(json!({ "embedding": [] })) }),
        );
        let base = spawn(router).await;

        let err = provider(base).embed("x").await.unwrap_err();
        assert_eq!(err, EmbeddingError::InvalidResponse("empty embedding".into()));
    }

    #[tokio::test]
    async fn unreachable_host_is_http_error() {
        // Bind then drop to get a port nobody listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = provider(format!("http://{addr}/api"))
            .embed("x")
            .await
            .unwrap_err();
        assert!(matches!(err, EmbeddingError::Http(_)));
    }
}
