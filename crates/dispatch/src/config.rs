use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::retry::RetryConfig;
use crate::DispatchError;

/// Settings for the generative classification path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// When false every request goes straight to the keyword fallback.
    pub enabled: bool,
    /// Ollama API root, e.g. `http://127.0.0.1:11434/api`.
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    /// Requests allowed to talk to the backend at once.
    pub max_concurrency: usize,
    /// Bounded queue in front of the workers.
    pub queue_capacity: usize,
    #[serde(rename = "readiness_timeout_ms", with = "crate::serde_millis")]
    pub readiness_timeout: Duration,
    #[serde(rename = "readiness_poll_interval_ms", with = "crate::serde_millis")]
    pub readiness_poll_interval: Duration,
    #[serde(rename = "request_timeout_ms", with = "crate::serde_millis")]
    pub request_timeout: Duration,
    pub retry: RetryConfig,
    /// Overrides the built-in instruction text.
    pub system_prompt: Option<String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "http://127.0.0.1:11434/api".into(),
            model: "phi3:instruct".into(),
            temperature: 0.1,
            top_p: 0.9,
            max_concurrency: 3,
            queue_capacity: 256,
            readiness_timeout: Duration::from_secs(30),
            readiness_poll_interval: Duration::from_secs(1),
            request_timeout: Duration::from_secs(60),
            retry: RetryConfig::default(),
            system_prompt: None,
        }
    }
}

impl DispatchConfig {
    pub fn validate(&self) -> Result<(), DispatchError> {
        if self.max_concurrency == 0 {
            return Err(DispatchError::InvalidConfig(
                "max_concurrency must be at least 1".into(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(DispatchError::InvalidConfig(
                "queue_capacity must be at least 1".into(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(DispatchError::InvalidConfig(
                "retry.max_attempts must be at least 1".into(),
            ));
        }
        if self.readiness_poll_interval.is_zero() {
            return Err(DispatchError::InvalidConfig(
                "readiness_poll_interval_ms must be positive".into(),
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(DispatchError::InvalidConfig(format!(
                "temperature {} outside [0, 2]",
                self.temperature
            )));
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(DispatchError::InvalidConfig(format!(
                "top_p {} outside [0, 1]",
                self.top_p
            )));
        }
        Ok(())
    }

    pub fn tags_url(&self) -> String {
        format!("{}/tags", self.base_url.trim_end_matches('/'))
    }

    pub fn generate_url(&self) -> String {
        format!("{}/generate", self.base_url.trim_end_matches('/'))
    }
}
