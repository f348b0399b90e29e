use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::intent::Intent;

/// Which path produced a [`ClassificationResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationSource {
    Llm,
    Keywords,
}

/// Structured outcome of the generative or keyword classification path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub intent: Intent,
    /// Always within `[0, 1]`.
    pub confidence: f32,
    /// Intent-specific parameters; an empty object when nothing was extracted.
    #[serde(default = "empty_params")]
    pub params: Value,
    pub duration_ms: u64,
    pub source: ClassificationSource,
}

fn empty_params() -> Value {
    Value::Object(Default::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_with_wire_field_names() {
        let result = ClassificationResult {
            intent: Intent::PriceQuery,
            confidence: 0.75,
            params: json!({ "product_description": "cemento" }),
            duration_ms: 4,
            source: ClassificationSource::Keywords,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["intent"], "price_query");
        assert_eq!(value["durationMs"], 4);
        assert_eq!(value["source"], "keywords");
    }

    #[test]
    fn missing_params_deserialize_to_empty_object() {
        let result: ClassificationResult = serde_json::from_value(json!({
            "intent": "navigation",
            "confidence": 0.6,
            "durationMs": 0,
            "source": "llm"
        }))
        .unwrap();
        assert_eq!(result.params, json!({}));
    }
}
