use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// Closed set of user intents the assistant can route to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    DirectProductSearch,
    AttributeBasedSearch,
    PriceQuery,
    BulkOrBudgetSearch,
    ComparisonSearch,
    ProblemSolvingSearch,
    ProjectBasedSearch,
    Navigation,
    NavigationWithParameters,
    Unknown,
}

impl Intent {
    pub const COUNT: usize = 10;

    /// Every intent, in declaration order. Ties in rankings resolve by this order.
    pub const ALL: [Intent; Intent::COUNT] = [
        Intent::DirectProductSearch,
        Intent::AttributeBasedSearch,
        Intent::PriceQuery,
        Intent::BulkOrBudgetSearch,
        Intent::ComparisonSearch,
        Intent::ProblemSolvingSearch,
        Intent::ProjectBasedSearch,
        Intent::Navigation,
        Intent::NavigationWithParameters,
        Intent::Unknown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Intent::DirectProductSearch => "direct_product_search",
            Intent::AttributeBasedSearch => "attribute_based_search",
            Intent::PriceQuery => "price_query",
            Intent::BulkOrBudgetSearch => "bulk_or_budget_search",
            Intent::ComparisonSearch => "comparison_search",
            Intent::ProblemSolvingSearch => "problem_solving_search",
            Intent::ProjectBasedSearch => "project_based_search",
            Intent::Navigation => "navigation",
            Intent::NavigationWithParameters => "navigation_with_parameters",
            Intent::Unknown => "unknown",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a label is not one of [`Intent::ALL`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown intent label: {0}")]
pub struct ParseIntentError(pub String);

impl FromStr for Intent {
    type Err = ParseIntentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        Intent::ALL
            .into_iter()
            .find(|intent| intent.as_str() == label)
            .ok_or_else(|| ParseIntentError(label.to_string()))
    }
}

/// Dense per-intent score table. Every intent is always present and starts at 0.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScoreMap {
    scores: [f32; Intent::COUNT],
}

impl ScoreMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, intent: Intent) -> f32 {
        self.scores[intent.index()]
    }

    pub fn set(&mut self, intent: Intent, score: f32) {
        self.scores[intent.index()] = score;
    }

    pub fn add(&mut self, intent: Intent, delta: f32) {
        self.scores[intent.index()] += delta;
    }

    /// Keep the larger of the current and the candidate score.
    pub fn raise_to(&mut self, intent: Intent, candidate: f32) {
        let slot = &mut self.scores[intent.index()];
        if candidate > *slot {
            *slot = candidate;
        }
    }

    /// Clamp every score into `[0, 1]`. NaN collapses to 0.
    pub fn clamp_unit(&mut self) {
        for score in self.scores.iter_mut() {
            *score = if score.is_nan() {
                0.0
            } else {
                score.clamp(0.0, 1.0)
            };
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Intent, f32)> + '_ {
        Intent::ALL.into_iter().map(|intent| (intent, self.get(intent)))
    }

    /// All intents sorted by descending score; equal scores keep declaration order.
    pub fn ranked(&self) -> Vec<(Intent, f32)> {
        let mut ranked: Vec<(Intent, f32)> = self.iter().collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked
    }
}

impl FromIterator<(Intent, f32)> for ScoreMap {
    fn from_iter<I: IntoIterator<Item = (Intent, f32)>>(iter: I) -> Self {
        let mut map = ScoreMap::new();
        for (intent, score) in iter {
            map.set(intent, score);
        }
        map
    }
}

impl Serialize for ScoreMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Intent::COUNT))?;
        for (intent, score) in self.iter() {
            map.serialize_entry(intent.as_str(), &score)?;
        }
        map.end()
    }
}
