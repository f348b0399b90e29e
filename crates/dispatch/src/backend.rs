use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{BackendError, DispatchConfig};

/// A text-generation model reachable over some transport.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Cheap liveness probe; must not fail loudly.
    async fn is_ready(&self) -> bool;

    /// One completion for `prompt`, returned as raw model text.
    async fn generate(&self, prompt: &str) -> Result<String, BackendError>;
}

/// Poll `backend` every `interval` until it reports ready or `timeout` elapses.
pub async fn wait_until_ready(
    backend: &dyn GenerativeBackend,
    timeout: Duration,
    interval: Duration,
) -> Result<(), BackendError> {
    let poll = async {
        loop {
            if backend.is_ready().await {
                return;
            }
            tracing::debug!(backend = backend.name(), "backend not ready yet");
            tokio::time::sleep(interval).await;
        }
    };
    tokio::time::timeout(timeout, poll)
        .await
        .map_err(|_| BackendError::NotReady(timeout))
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    top_p: f32,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Ollama `/tags` + `/generate` client.
#[derive(Debug, Clone)]
pub struct OllamaBackend {
    client: reqwest::Client,
    tags_url: String,
    generate_url: String,
    model: String,
    temperature: f32,
    top_p: f32,
}

impl OllamaBackend {
    pub fn new(config: &DispatchConfig) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(Duration::from_secs(5))
            .pool_max_idle_per_host(config.max_concurrency)
            .build()
            .map_err(|e| BackendError::Connect(format!("http client: {e}")))?;

        Ok(Self {
            client,
            tags_url: config.tags_url(),
            generate_url: config.generate_url(),
            model: config.model.clone(),
            temperature: config.temperature,
            top_p: config.top_p,
        })
    }
}

fn map_reqwest(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        BackendError::Timeout
    } else if err.is_decode() {
        BackendError::Malformed(err.to_string())
    } else {
        BackendError::Connect(err.to_string())
    }
}

#[async_trait]
impl GenerativeBackend for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn is_ready(&self) -> bool {
        match self.client.get(&self.tags_url).send().await {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                tracing::trace!(error = %err, "ollama readiness probe failed");
                false
            }
        }
    }

    async fn generate(&self, prompt: &str) -> Result<String, BackendError> {
        let response = self
            .client
            .post(&self.generate_url)
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
                stream: false,
                options: GenerateOptions {
                    temperature: self.temperature,
                    top_p: self.top_p,
                },
            })
            .send()
            .await
            .map_err(map_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Malformed(e.to_string()))?;
        Ok(parsed.response)
    }
}
