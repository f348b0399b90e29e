use thiserror::Error;

/// Failures of the embedding provider. Every variant routes the caller to the
/// deterministic fallback; none of them reach the classification result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmbeddingError {
    /// The provider is switched off in configuration.
    #[error("embedding provider disabled")]
    ProviderDisabled,
    /// Transport-level failure: refused, reset, timed out.
    #[error("embedding request failed: {0}")]
    Http(String),
    /// The provider answered with a non-2xx status.
    #[error("embedding provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    /// The body was not `{ "embedding": [..] }` or the vector was empty.
    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),
    #[error("invalid embedding config: {0}")]
    InvalidConfig(String),
}
