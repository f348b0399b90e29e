use std::sync::Arc;
use std::time::Instant;

use rules::{classify_with_keywords, ClassificationResult};
use serde::{Deserialize, Serialize};

use crate::backend::{GenerativeBackend, OllamaBackend};
use crate::dispatcher::{Dispatcher, DispatcherStats};
use crate::{DispatchConfig, DispatchError};

/// Whether the keyword cascade may stand in for the generative path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    #[default]
    AllowKeywords,
    Disabled,
}

impl FallbackPolicy {
    pub fn allows_keywords(self) -> bool {
        matches!(self, FallbackPolicy::AllowKeywords)
    }
}

/// Generative classification with the keyword cascade behind it.
#[derive(Clone)]
pub struct ClassificationService {
    dispatcher: Option<Dispatcher>,
}

impl ClassificationService {
    /// Build from config; spawns the dispatch loop unless the path is disabled.
    pub fn from_config(config: &DispatchConfig) -> Result<Self, DispatchError> {
        if !config.enabled {
            return Ok(Self::keywords_only());
        }
        let backend = OllamaBackend::new(config)
            .map_err(|e| DispatchError::InvalidConfig(e.to_string()))?;
        Self::with_backend(Arc::new(backend), config.clone())
    }

    pub fn with_backend(
        backend: Arc<dyn GenerativeBackend>,
        config: DispatchConfig,
    ) -> Result<Self, DispatchError> {
        Ok(Self {
            dispatcher: Some(Dispatcher::spawn(backend, config)?),
        })
    }

    /// No generative backend at all.
    pub fn keywords_only() -> Self {
        Self { dispatcher: None }
    }

    pub fn generative_enabled(&self) -> bool {
        self.dispatcher.is_some()
    }

    pub fn stats(&self) -> Option<DispatcherStats> {
        self.dispatcher.as_ref().map(Dispatcher::stats)
    }

    /// Classify `message`, optionally grounded by retrieval `context`.
    ///
    /// With [`FallbackPolicy::AllowKeywords`] this always yields a result.
    /// With [`FallbackPolicy::Disabled`] any path that would have needed the
    /// keyword cascade returns an error instead.
    pub async fn classify(
        &self,
        message: &str,
        context: Option<&str>,
        policy: FallbackPolicy,
    ) -> Result<ClassificationResult, DispatchError> {
        let started = Instant::now();

        let failure = match &self.dispatcher {
            None => DispatchError::Disabled,
            Some(dispatcher) => match dispatcher
                .dispatch(message, context.map(str::to_owned))
                .await
            {
                Ok(Some(result)) => return Ok(result),
                Ok(None) => DispatchError::NoResult,
                Err(err) => err,
            },
        };

        if !policy.allows_keywords() {
            tracing::warn!(error = %failure, "generative classification failed, fallback disabled");
            return Err(failure);
        }

        tracing::debug!(reason = %failure, "falling back to keyword classification");
        let mut result = classify_with_keywords(message);
        result.duration_ms = started.elapsed().as_millis() as u64;
        Ok(result)
    }
}
