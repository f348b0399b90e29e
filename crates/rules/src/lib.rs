//! # Intent rules (`rules`)
//!
//! Deterministic, dependency-free pieces of the intent pipeline:
//!
//! - [`Intent`] and [`ScoreMap`]: the closed label set and a dense score
//!   table over it.
//! - [`normalize_query`]: lowercase, accent-stripped, whitespace-collapsed
//!   form that every lexical pattern is written against.
//! - [`Cues`]: boolean detectors (price, bulk, comparison, planning,
//!   navigation verb/noun, record filter).
//! - [`BonusEngine`]: ordered rule table that nudges retrieval scores
//!   toward what the wording makes obvious, then clamps to `[0, 1]`.
//! - [`classify_with_keywords`]: first-match keyword cascade producing a
//!   full [`ClassificationResult`] with no external calls.
//!
//! ```
//! use rules::{apply_bonuses, classify_with_keywords, Intent, ScoreMap};
//!
//! let boosted = apply_bonuses("ver facturas del último mes", &ScoreMap::new());
//! assert!(
//!     boosted.scores.get(Intent::NavigationWithParameters)
//!         > boosted.scores.get(Intent::Navigation)
//! );
//!
//! let fallback = classify_with_keywords("precio de cemento Holcim 50kg");
//! assert_eq!(fallback.intent, Intent::PriceQuery);
//! ```

mod bonus;
mod cues;
mod intent;
mod keywords;
mod normalize;
mod types;

pub use bonus::{apply_bonuses, BonusEngine, BonusOutcome, BonusRule, BonusWeights};
pub use cues::Cues;
pub use intent::{Intent, ParseIntentError, ScoreMap};
pub use keywords::{classify_with_keywords, DEFAULT_CONFIDENCE};
pub use normalize::normalize_query;
pub use types::{ClassificationResult, ClassificationSource};
