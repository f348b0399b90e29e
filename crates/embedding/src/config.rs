use serde::{Deserialize, Serialize};

/// Where and how to reach the embedding provider.
///
/// # Example
/// ```
/// use embedding::EmbeddingConfig;
///
/// let cfg = EmbeddingConfig {
///     base_url: "http://ollama:11434/api".into(),
///     ..Default::default()
/// };
/// assert_eq!(cfg.embeddings_url(), "http://ollama:11434/api/embeddings");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// When false every lookup goes straight to the deterministic fallback.
    pub provider_enabled: bool,
    /// API root; `/embeddings` is appended.
    pub base_url: String,
    pub model: String,
    /// Whole-request timeout for one provider call.
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider_enabled: true,
            base_url: "http://127.0.0.1:11434/api".into(),
            model: "nomic-embed-text".into(),
            timeout_secs: 10,
            connect_timeout_secs: 2,
        }
    }
}

impl EmbeddingConfig {
    pub fn embeddings_url(&self) -> String {
        format!("{}/embeddings", self.base_url.trim_end_matches('/'))
    }
}
