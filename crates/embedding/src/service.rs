use std::sync::Arc;

use serde::Serialize;

use crate::cache::{CacheStats, EmbeddingCache};
use crate::fallback::deterministic_embedding;
use crate::provider::{EmbeddingProvider, OllamaEmbeddingProvider};
use crate::{EmbeddingConfig, EmbeddingError};

/// Where a vector came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingSource {
    Cache,
    Provider,
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub vector: Arc<Vec<f32>>,
    pub source: EmbeddingSource,
}

/// Cache in front of an optional provider, backed by the deterministic fallback.
///
/// Never fails: a missing, disabled or broken provider degrades to
/// [`deterministic_embedding`].
pub struct EmbeddingService {
    provider: Option<Arc<dyn EmbeddingProvider>>,
    cache: EmbeddingCache,
}

impl EmbeddingService {
    /// Build from config. A disabled provider yields an offline service.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        if !config.provider_enabled {
            return Ok(Self::offline());
        }
        let provider = OllamaEmbeddingProvider::new(config)?;
        Ok(Self::with_provider(Arc::new(provider)))
    }

    pub fn with_provider(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider: Some(provider),
            cache: EmbeddingCache::new(),
        }
    }

    /// Service that only ever uses the deterministic fallback.
    pub fn offline() -> Self {
        Self {
            provider: None,
            cache: EmbeddingCache::new(),
        }
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    pub async fn get_embedding(&self, text: &str) -> Arc<Vec<f32>> {
        self.embed(text).await.vector
    }

    /// Like [`get_embedding`](Self::get_embedding) but reports the source.
    pub async fn embed(&self, text: &str) -> Embedding {
        if let Some(vector) = self.cache.get(text) {
            return Embedding {
                vector,
                source: EmbeddingSource::Cache,
            };
        }

        let (vector, source) = match &self.provider {
            Some(provider) => match provider.embed(text).await {
                Ok(vector) => (vector, EmbeddingSource::Provider),
                Err(err) => {
                    tracing::warn!(
                        provider = provider.name(),
                        error = %err,
                        "embedding provider unavailable, using deterministic fallback"
                    );
                    (deterministic_embedding(text), EmbeddingSource::Fallback)
                }
            },
            None => (deterministic_embedding(text), EmbeddingSource::Fallback),
        };

        Embedding {
            vector: self.cache.insert(text, vector),
            source,
        }
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
        tracing::debug!("embedding cache cleared");
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
