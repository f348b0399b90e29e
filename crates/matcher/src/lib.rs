//! # Intent matcher (`matcher`)
//!
//! Retrieval half of the intent pipeline. Every exemplar in the
//! [`IntentCorpus`] is embedded through the shared
//! [`EmbeddingService`](embedding::EmbeddingService) and compared with the
//! query by [`cosine_similarity`]. [`score_intents`] then keeps the single
//! best exemplar score per intent, so an intent with many near-duplicate
//! exemplars gains nothing from volume alone.
//!
//! [`IntentMatcher::rank`] runs the rule bonus table over those raw scores
//! and returns the top-K intents with their mean. When the best score is
//! under [`MatcherConfig::confidence_threshold`] the ranking is flagged
//! `below_threshold` and carries no `best` intent. [`IntentMatcher::nearest_documents`]
//! does the same per exemplar and feeds the hybrid classifier its context.

mod corpus;
mod engine;
mod error;
mod similarity;
mod types;

pub use corpus::{IntentCorpus, IntentDocument};
pub use engine::IntentMatcher;
pub use error::MatchError;
pub use similarity::{cosine_similarity, score_intents};
pub use types::{IntentRanking, IntentScore, MatcherConfig, NearestDocuments, VectorMatch};
