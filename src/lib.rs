//! Workspace umbrella crate for intent-gate.
//!
//! This crate wires retrieval ([`matcher`]), rule bonuses ([`rules`]) and the
//! generative dispatcher ([`dispatch`]) into one [`IntentPipeline`] so
//! callers can classify a query through a single entry point.
//!
//! ```
//! use intent_gate::{Intent, IntentPipeline};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), intent_gate::PipelineError> {
//! let pipeline = IntentPipeline::offline()?;
//! let result = pipeline.classify("precio de cemento Holcim 50kg", None).await?;
//! assert_eq!(result.intent, Intent::PriceQuery);
//! # Ok(())
//! # }
//! ```

pub mod config;

pub use config::{ConfigLoadError, IntentGateConfig};
pub use dispatch::{
    BackendError, ClassificationService, DispatchConfig, DispatchError, DispatcherStats,
    FallbackPolicy, GenerativeBackend, OllamaBackend, RetryConfig,
};
pub use embedding::{
    deterministic_embedding, EmbeddingConfig, EmbeddingError, EmbeddingProvider,
    EmbeddingService,
};
pub use matcher::{
    IntentCorpus, IntentDocument, IntentMatcher, IntentRanking, IntentScore, MatchError,
    MatcherConfig, NearestDocuments, VectorMatch,
};
pub use rules::{
    apply_bonuses, classify_with_keywords, normalize_query, BonusEngine, BonusWeights,
    ClassificationResult, ClassificationSource, Intent, ScoreMap,
};

use std::sync::{Arc, OnceLock, RwLock};
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while building or running the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration failure: {0}")]
    Config(#[from] ConfigLoadError),

    #[error("embedding setup failure: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("matcher failure: {0}")]
    Match(#[from] MatchError),

    #[error("classification failure: {0}")]
    Dispatch(#[from] DispatchError),
}

/// Observer for pipeline stage latencies.
pub trait PipelineMetrics: Send + Sync {
    fn record_rank(&self, latency: Duration, below_threshold: bool);
    fn record_classify(
        &self,
        latency: Duration,
        result: Result<ClassificationSource, &DispatchError>,
    );
}

/// Install or clear the global pipeline metrics recorder.
pub fn set_pipeline_metrics(recorder: Option<Arc<dyn PipelineMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn PipelineMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn PipelineMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

fn metrics_recorder() -> Option<Arc<dyn PipelineMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

struct MetricsSpan {
    recorder: Arc<dyn PipelineMetrics>,
    start: Instant,
}

impl MetricsSpan {
    fn start() -> Option<Self> {
        metrics_recorder().map(|recorder| Self {
            recorder,
            start: Instant::now(),
        })
    }

    fn record_rank(self, below_threshold: bool) {
        self.recorder.record_rank(self.start.elapsed(), below_threshold);
    }

    fn record_classify(self, result: Result<ClassificationSource, &DispatchError>) {
        self.recorder.record_classify(self.start.elapsed(), result);
    }
}

/// Retrieval context plus the classification it informed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HybridClassification {
    pub vector_matches: Vec<VectorMatch>,
    #[serde(rename = "slm")]
    pub classification: ClassificationResult,
}

/// Number of nearest exemplars fed to the generative classifier as context.
pub const HYBRID_CONTEXT_DOCUMENTS: usize = 3;

/// Matcher plus classification service behind one API.
pub struct IntentPipeline {
    matcher: IntentMatcher,
    classifier: ClassificationService,
    fallback: FallbackPolicy,
}

impl IntentPipeline {
    pub fn new(matcher: IntentMatcher, classifier: ClassificationService) -> Self {
        Self {
            matcher,
            classifier,
            fallback: FallbackPolicy::default(),
        }
    }

    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    /// Build every stage from configuration.
    ///
    /// Must run inside a tokio runtime when the generative path is enabled,
    /// since the dispatch loop is spawned here.
    pub fn from_config(config: &IntentGateConfig) -> Result<Self, PipelineError> {
        config.validate()?;

        let corpus = match &config.corpus_path {
            Some(path) => IntentCorpus::from_file(path)?,
            None => IntentCorpus::builtin(),
        };
        let embeddings = Arc::new(EmbeddingService::from_config(&config.embedding)?);
        let matcher = IntentMatcher::new(corpus, embeddings, config.matcher)?
            .with_bonus_engine(BonusEngine::new(config.bonus));
        let classifier = ClassificationService::from_config(&config.dispatch)?;

        tracing::info!(
            documents = matcher.document_count(),
            embedding_provider = config.embedding.provider_enabled,
            generative = classifier.generative_enabled(),
            fallback = ?config.fallback,
            "intent pipeline ready"
        );

        Ok(Self::new(matcher, classifier).with_fallback(config.fallback))
    }

    /// Built-in corpus, deterministic embeddings and keyword-only
    /// classification. Makes no network calls.
    pub fn offline() -> Result<Self, PipelineError> {
        let matcher = IntentMatcher::new(
            IntentCorpus::builtin(),
            Arc::new(EmbeddingService::offline()),
            MatcherConfig::default(),
        )?;
        Ok(Self::new(matcher, ClassificationService::keywords_only()))
    }

    pub fn matcher(&self) -> &IntentMatcher {
        &self.matcher
    }

    pub fn classifier(&self) -> &ClassificationService {
        &self.classifier
    }

    pub fn fallback(&self) -> FallbackPolicy {
        self.fallback
    }

    /// Intent-level ranking: retrieval maxima, rule bonuses, top-K.
    pub async fn rank(&self, message: &str, top_k: Option<usize>) -> IntentRanking {
        let span = MetricsSpan::start();
        let ranking = self.matcher.rank(message, top_k).await;
        if let Some(span) = span {
            span.record_rank(ranking.below_threshold);
        }
        ranking
    }

    /// Nearest exemplars, empty when the best one is below threshold.
    pub async fn nearest(&self, message: &str, top_k: Option<usize>) -> NearestDocuments {
        self.matcher.nearest_documents(message, top_k).await
    }

    /// Classify with the pipeline's configured fallback policy.
    pub async fn classify(
        &self,
        message: &str,
        context: Option<&str>,
    ) -> Result<ClassificationResult, PipelineError> {
        self.classify_with_policy(message, context, self.fallback).await
    }

    pub async fn classify_with_policy(
        &self,
        message: &str,
        context: Option<&str>,
        policy: FallbackPolicy,
    ) -> Result<ClassificationResult, PipelineError> {
        let span = MetricsSpan::start();
        let result = self.classifier.classify(message, context, policy).await;
        if let Some(span) = span {
            span.record_classify(result.as_ref().map(|r| r.source));
        }
        Ok(result?)
    }

    /// Retrieve the closest exemplars and hand them to the classifier as context.
    pub async fn hybrid(&self, message: &str) -> Result<HybridClassification, PipelineError> {
        let nearest = self
            .matcher
            .nearest_documents(message, Some(HYBRID_CONTEXT_DOCUMENTS))
            .await;
        let context = nearest.context_lines();
        let classification = self.classify(message, context.as_deref()).await?;

        Ok(HybridClassification {
            vector_matches: nearest.matches,
            classification,
        })
    }

    /// Add or replace an exemplar. Returns true when an existing id was replaced.
    pub fn upsert_document(&self, document: IntentDocument) -> Result<bool, PipelineError> {
        Ok(self.matcher.upsert_document(document)?)
    }
}
