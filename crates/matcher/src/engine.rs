use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;

use embedding::EmbeddingService;
use rules::{BonusEngine, ScoreMap};

use crate::corpus::{IntentCorpus, IntentDocument};
use crate::similarity::{cosine_similarity, score_intents};
use crate::types::{IntentRanking, IntentScore, MatcherConfig, NearestDocuments, VectorMatch};
use crate::MatchError;


/// Retrieval over the exemplar corpus.
///
/// The corpus is shared between concurrent queries; mutating it clears the
/// embedding cache so stale exemplar vectors are never compared.
pub struct IntentMatcher {
    corpus: RwLock<IntentCorpus>,
    embeddings: Arc<EmbeddingService>,
    bonus: BonusEngine,
    config: MatcherConfig,
}

impl IntentMatcher {
    pub fn new(
        corpus: IntentCorpus,
        embeddings: Arc<EmbeddingService>,
        config: MatcherConfig,
    ) -> Result<Self, MatchError> {
        config.validate()?;
        Ok(Self {
            corpus: RwLock::new(corpus),
            embeddings,
            bonus: BonusEngine::default(),
            config,
        })
    }

    pub fn with_bonus_engine(mut self, bonus: BonusEngine) -> Self {
        self.bonus = bonus;
        self
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    pub fn embeddings(&self) -> &Arc<EmbeddingService> {
        &self.embeddings
    }

    pub fn document_count(&self) -> usize {
        self.read_corpus().len()
    }

    /// Add or replace an exemplar. Returns true when an existing id was replaced.
    pub fn upsert_document(&self, doc: IntentDocument) -> Result<bool, MatchError> {
        let id = doc.id.clone();
        let replaced = self.write_corpus().upsert(doc)?.is_some();
        self.embeddings.clear_cache();
        tracing::info!(doc_id = %id, replaced, "intent corpus updated");
        Ok(replaced)
    }

    /// Raw per-intent maxima before any rule bonus.
    pub async fn score_query(&self, text: &str) -> ScoreMap {
        let query = self.embeddings.get_embedding(text).await;
        let exemplars = self.exemplar_vectors().await;
        score_intents(
            &query,
            exemplars
                .iter()
                .map(|(doc, vector)| (doc.intent, vector.as_slice())),
        )
    }

    /// Aggregate, apply rule bonuses and keep the `top_k` best intents.
    pub async fn rank(&self, text: &str, top_k: Option<usize>) -> IntentRanking {
        let started = Instant::now();
        let k = top_k.unwrap_or(self.config.top_k).max(1);

        let raw = self.score_query(text).await;
        let boosted = self.bonus.apply(text, &raw);

        let ranked: Vec<IntentScore> = boosted
            .scores
            .ranked()
            .into_iter()
            .take(k)
            .map(|(intent, score)| IntentScore { intent, score })
            .collect();

        let average_top_k_score = if ranked.is_empty() {
            0.0
        } else {
            ranked.iter().map(|s| s.score).sum::<f32>() / ranked.len() as f32
        };

        let best = ranked
            .first()
            .copied()
            .filter(|top| top.score >= self.config.confidence_threshold);
        let below_threshold = best.is_none();

        tracing::debug!(
            best = ?best.map(|b| b.intent),
            top_score = ranked.first().map(|s| s.score).unwrap_or_default(),
            below_threshold,
            reasons = ?boosted.reasons,
            "ranked intents"
        );

        IntentRanking {
            ranked,
            best,
            below_threshold,
            average_top_k_score,
            reasons: boosted.reasons,
            scores: boosted.scores,
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }

    /// Per-exemplar nearest neighbours, best first.
    pub async fn nearest_documents(&self, text: &str, top_k: Option<usize>) -> NearestDocuments {
        let started = Instant::now();
        let k = top_k.unwrap_or(self.config.top_k).max(1);

        let query = self.embeddings.get_embedding(text).await;
        let exemplars = self.exemplar_vectors().await;

        let mut matches: Vec<VectorMatch> = exemplars
            .into_iter()
            .map(|(doc, vector)| VectorMatch {
                score: cosine_similarity(&query, &vector),
                id: doc.id,
                intent: doc.intent,
                text: doc.text,
            })
            .collect();
        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        matches.truncate(k);

        let best_score = matches.first().map(|m| m.score).unwrap_or(0.0);
        let below_threshold = best_score < self.config.confidence_threshold;
        if below_threshold {
            matches.clear();
        }

        NearestDocuments {
            matches,
            below_threshold,
            best_score,
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }

    // Snapshot first so no lock is held across the embedding awaits.
    async fn exemplar_vectors(&self) -> Vec<(IntentDocument, Arc<Vec<f32>>)> {
        let docs = self.read_corpus().sorted();
        let mut out = Vec::with_capacity(docs.len());
        for doc in docs {
            let vector = self.embeddings.get_embedding(&doc.text).await;
            out.push((doc, vector));
        }
        out
    }

    fn read_corpus(&self) -> RwLockReadGuard<'_, IntentCorpus> {
        self.corpus
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_corpus(&self) -> RwLockWriteGuard<'_, IntentCorpus> {
        self.corpus
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
