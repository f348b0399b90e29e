//! Rule bonus engine.
//!
//! Rules live in an ordered table of `(predicate, effects)` entries and are
//! evaluated by one loop. Effects are additive, so a later rule can partly
//! undo an earlier one (price + bulk moves weight from price to bulk).
//! Scores are clamped to `[0, 1]` only after every rule has run.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::cues::Cues;
use crate::intent::{Intent, ScoreMap};
use crate::normalize::normalize_query;

/// Tunable bonus magnitudes. Defaults reproduce the hand-tuned production values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BonusWeights {
    pub price: f32,
    pub price_bulk_to_bulk: f32,
    pub price_bulk_from_price: f32,
    pub bulk: f32,
    pub comparison: f32,
    pub comparison_over_planning: f32,
    pub planning: f32,
    pub planning_over_product: f32,
    pub navigation: f32,
    pub navigation_params: f32,
    pub navigation_params_from_navigation: f32,
}

impl Default for BonusWeights {
    fn default() -> Self {
        Self {
            price: 0.08,
            price_bulk_to_bulk: 0.06,
            price_bulk_from_price: 0.03,
            bulk: 0.07,
            comparison: 0.07,
            comparison_over_planning: 0.02,
            planning: 0.07,
            planning_over_product: 0.02,
            navigation: 0.08,
            navigation_params: 0.09,
            navigation_params_from_navigation: 0.03,
        }
    }
}

/// One row of the bonus table.
#[derive(Debug, Clone)]
pub struct BonusRule {
    pub name: &'static str,
    pub reason: &'static str,
    pub when: fn(&Cues) -> bool,
    pub effects: Vec<(Intent, f32)>,
}

/// Boosted scores plus the reasons of every rule that fired, in firing order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BonusOutcome {
    pub scores: ScoreMap,
    pub reasons: Vec<&'static str>,
    pub cues: Cues,
}

/// Holds the compiled rule table for one set of weights.
#[derive(Debug, Clone)]
pub struct BonusEngine {
    weights: BonusWeights,
    rules: Vec<BonusRule>,
}

impl Default for BonusEngine {
    fn default() -> Self {
        Self::new(BonusWeights::default())
    }
}

impl BonusEngine {
    pub fn new(weights: BonusWeights) -> Self {
        Self {
            weights,
            rules: rule_table(&weights),
        }
    }

    pub fn weights(&self) -> &BonusWeights {
        &self.weights
    }

    pub fn rules(&self) -> &[BonusRule] {
        &self.rules
    }

    /// Normalize `query`, detect cues and run the table over `base`.
    pub fn apply(&self, query: &str, base: &ScoreMap) -> BonusOutcome {
        let cues = Cues::detect(&normalize_query(query));
        self.apply_cues(cues, base)
    }

    pub fn apply_cues(&self, cues: Cues, base: &ScoreMap) -> BonusOutcome {
        let mut scores = *base;
        let mut reasons = Vec::new();

        for rule in &self.rules {
            if !(rule.when)(&cues) {
                continue;
            }
            for &(intent, delta) in &rule.effects {
                scores.add(intent, delta);
            }
            reasons.push(rule.reason);
        }

        scores.clamp_unit();
        tracing::trace!(?reasons, "rule bonuses applied");

        BonusOutcome {
            scores,
            reasons,
            cues,
        }
    }
}

static DEFAULT_ENGINE: Lazy<BonusEngine> = Lazy::new(BonusEngine::default);

/// Apply the default-weighted bonus table.
pub fn apply_bonuses(query: &str, base: &ScoreMap) -> BonusOutcome {
    DEFAULT_ENGINE.apply(query, base)
}

// Evaluation order is part of the contract: price, bulk, comparison,
// planning, navigation, navigation with parameters.
fn rule_table(w: &BonusWeights) -> Vec<BonusRule> {
    vec![
        BonusRule {
            name: "price",
            reason: "bonus: price cue",
            when: |c| c.price,
            effects: vec![(Intent::PriceQuery, w.price)],
        },
        BonusRule {
            name: "price_and_bulk",
            reason: "bonus: price+bulk -> favor bulk/budget",
            when: |c| c.price && c.bulk,
            effects: vec![
                (Intent::BulkOrBudgetSearch, w.price_bulk_to_bulk),
                (Intent::PriceQuery, -w.price_bulk_from_price),
            ],
        },
        BonusRule {
            name: "bulk",
            reason: "bonus: bulk/budget cue",
            when: |c| c.bulk,
            effects: vec![(Intent::BulkOrBudgetSearch, w.bulk)],
        },
        BonusRule {
            name: "comparison",
            reason: "bonus: comparison cue",
            when: |c| c.comparison,
            effects: vec![(Intent::ComparisonSearch, w.comparison)],
        },
        BonusRule {
            name: "comparison_over_planning",
            reason: "bonus: comparison outranks planning",
            when: |c| c.comparison && c.planning,
            effects: vec![
                (Intent::ProblemSolvingSearch, -w.comparison_over_planning),
                (Intent::ProjectBasedSearch, -w.comparison_over_planning),
            ],
        },
        BonusRule {
            name: "planning",
            reason: "bonus: planning/recommendation cue",
            when: |c| c.planning,
            effects: vec![
                (Intent::ProblemSolvingSearch, w.planning),
                (Intent::ProjectBasedSearch, w.planning),
                (Intent::DirectProductSearch, -w.planning_over_product),
            ],
        },
        BonusRule {
            name: "navigation",
            reason: "bonus: navigation cue",
            when: Cues::navigation,
            effects: vec![(Intent::Navigation, w.navigation)],
        },
        BonusRule {
            name: "navigation_with_params",
            reason: "bonus: nav+filters -> nav_with_params",
            when: Cues::navigation_with_params,
            effects: vec![
                (Intent::NavigationWithParameters, w.navigation_params),
                (Intent::Navigation, -w.navigation_params_from_navigation),
            ],
        },
    ]
}
