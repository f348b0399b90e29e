use serde::{Deserialize, Serialize};

use rules::{Intent, ScoreMap};

use crate::MatchError;

/// Retrieval tuning knobs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Best scores below this are reported as low-confidence instead of an intent.
    pub confidence_threshold: f32,
    /// Default number of intents / documents returned.
    pub top_k: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.6,
            top_k: 3,
        }
    }
}

impl MatcherConfig {
    pub fn validate(&self) -> Result<(), MatchError> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(MatchError::InvalidConfig(format!(
                "confidence_threshold must be within [0, 1], got {}",
                self.confidence_threshold
            )));
        }
        if self.top_k == 0 {
            return Err(MatchError::InvalidConfig("top_k must be at least 1".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IntentScore {
    pub intent: Intent,
    pub score: f32,
}

/// Vector-path result: boosted per-intent scores, best first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentRanking {
    pub ranked: Vec<IntentScore>,
    /// `None` when the top score is under the confidence threshold.
    pub best: Option<IntentScore>,
    pub below_threshold: bool,
    pub average_top_k_score: f32,
    pub reasons: Vec<&'static str>,
    pub scores: ScoreMap,
    pub duration_ms: u64,
}

/// One corpus exemplar and its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorMatch {
    pub id: String,
    pub intent: Intent,
    pub score: f32,
    pub text: String,
}

/// Per-document nearest neighbours of a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearestDocuments {
    /// Empty when `below_threshold` is set.
    pub matches: Vec<VectorMatch>,
    pub below_threshold: bool,
    pub best_score: f32,
    pub duration_ms: u64,
}

impl NearestDocuments {
    /// `"{intent}: {text}"` lines, used as retrieved context for the generative classifier.
    pub fn context_lines(&self) -> Option<String> {
        if self.matches.is_empty() {
            return None;
        }
        Some(
            self.matches
                .iter()
                .map(|m| format!("{}: {}", m.intent, m.text))
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }
}
