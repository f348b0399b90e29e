//! Keyword fallback classifier.
//!
//! A strict first-match cascade used when neither the generative classifier
//! nor retrieval can be trusted. Patterns run against the normalized query;
//! extracted params quote the raw query so callers see what the user typed.

use std::time::Instant;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

use crate::intent::Intent;
use crate::normalize::normalize_query;
use crate::types::{ClassificationResult, ClassificationSource};

/// Confidence reported when no rule matches.
pub const DEFAULT_CONFIDENCE: f32 = 0.5;

fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("keyword pattern must compile")
}

static PRICE: Lazy<Regex> = Lazy::new(|| {
    pattern(r"\b(?:precios?|cuanto cuestan?|cuanto valen?|valor(?:es)?|cost(?:e|o)?s?|prices?)\b")
});
static BULK: Lazy<Regex> = Lazy::new(|| {
    pattern(
        r"\b(?:barat[oa]s?|economic[oa]s?|al por mayor|por volumen|presupuestos?|low cost|cheap(?:er|est)?|budgets?|wholesale|bulk)\b",
    )
});
static COMPARISON: Lazy<Regex> = Lazy::new(|| {
    pattern(r"\b(?:vs|versus|o|que es mejor|diferencias?|comparar|compare|comparacion|mejor(?:es)?|better)\b")
});
static PROBLEM: Lazy<Regex> = Lazy::new(|| {
    pattern(r"\b(?:como|solucion(?:es)?|que usar|material para|que producto|que sirve|how to|solutions?)\b")
});
static PROJECT: Lazy<Regex> = Lazy::new(|| {
    pattern(
        r"\b(?:materiales para|que necesito para|lista de materiales|herramientas para|equipos para|materials for|tools for)\b",
    )
});
static NAVIGATION: Lazy<Regex> = Lazy::new(|| {
    pattern(
        r"\b(?:ir al?|mostrar|muestrame|ver|abrir|pagina|panel|seccion|dashboard|products|invoices|go to|show|open)\b",
    )
});
// Bare "de" is left out; nearly every Spanish query contains it.
static NAV_FILTER: Lazy<Regex> = Lazy::new(|| {
    pattern(
        r"\b(?:del|entre|desde|hasta|ultimos?|pendientes?|pagad[ao]s?|estado|status|filtro|filtrar|filtrad[ao]s?|filter|categoria|category)\b",
    )
});
static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    pattern(
        r"\d+\s?x\s?\d+|\d+/\d+|\d+\s?mm\b|\d+ pulgadas?\b|\b(?:calibre|serie|gauge|awg|specs?|specification)\b",
    )
});
static BRAND: Lazy<Regex> = Lazy::new(|| {
    pattern(r"\b(?:holcim|schneider|dewalt|sherwin|marca|brand|modelo|model)\b")
});
static PAGE: Lazy<Regex> = Lazy::new(|| {
    pattern(
        r"\b(?:dashboard|panel|productos?|products|facturas?|invoices|cotizaciones?|pedidos?|clientes?|carrito|configuracion|historial)\b",
    )
});
static OPTION_SPLIT: Lazy<Regex> = Lazy::new(|| pattern(r"(?i)\s+(?:vs\.?|versus|o)\s+"));

/// One row of the cascade. Every pattern in `all_of` must match.
struct KeywordRule {
    intent: Intent,
    confidence: f32,
    all_of: Vec<&'static Regex>,
    params: fn(&str, &str) -> Value,
}

impl KeywordRule {
    fn matches(&self, normalized: &str) -> bool {
        self.all_of.iter().all(|re| re.is_match(normalized))
    }
}

// First match wins. Parameterized navigation sits directly before plain
// navigation so the filter check acts as an upgrade of the same rule.
static RULES: Lazy<Vec<KeywordRule>> = Lazy::new(|| {
    vec![
        KeywordRule {
            intent: Intent::PriceQuery,
            confidence: 0.75,
            all_of: vec![&*PRICE],
            params: |raw, _| json!({ "product_description": raw }),
        },
        KeywordRule {
            intent: Intent::BulkOrBudgetSearch,
            confidence: 0.70,
            all_of: vec![&*BULK],
            params: |raw, normalized| {
                let keywords: Vec<&str> = BULK.find_iter(normalized).map(|m| m.as_str()).collect();
                json!({ "product_description": raw, "budget_keywords": keywords })
            },
        },
        KeywordRule {
            intent: Intent::ComparisonSearch,
            confidence: 0.75,
            all_of: vec![&*COMPARISON],
            params: |raw, _| json!({ "options": comparison_options(raw) }),
        },
        KeywordRule {
            intent: Intent::ProblemSolvingSearch,
            confidence: 0.70,
            all_of: vec![&*PROBLEM],
            params: |raw, _| json!({ "problem_description": raw }),
        },
        KeywordRule {
            intent: Intent::ProjectBasedSearch,
            confidence: 0.70,
            all_of: vec![&*PROJECT],
            params: |raw, _| json!({ "project_description": raw }),
        },
        KeywordRule {
            intent: Intent::NavigationWithParameters,
            confidence: 0.65,
            all_of: vec![&*NAVIGATION, &*NAV_FILTER],
            params: |_, normalized| json!({ "target_page": target_page(normalized), "filters": {} }),
        },
        KeywordRule {
            intent: Intent::Navigation,
            confidence: 0.65,
            all_of: vec![&*NAVIGATION],
            params: |_, normalized| json!({ "target_page": target_page(normalized) }),
        },
        KeywordRule {
            intent: Intent::AttributeBasedSearch,
            confidence: 0.60,
            all_of: vec![&*ATTRIBUTE],
            params: |raw, _| json!({ "attributes": raw }),
        },
        KeywordRule {
            intent: Intent::DirectProductSearch,
            confidence: 0.65,
            all_of: vec![&*BRAND],
            params: |raw, _| json!({ "product_description": raw }),
        },
    ]
});

fn target_page(normalized: &str) -> String {
    PAGE.find(normalized)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

fn comparison_options(raw: &str) -> Vec<String> {
    let options: Vec<String> = OPTION_SPLIT
        .split(raw.trim())
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect();
    if options.len() >= 2 {
        options
    } else {
        Vec::new()
    }
}

/// Classify `text` with the keyword cascade. Never calls out and never fails.
pub fn classify_with_keywords(text: &str) -> ClassificationResult {
    let started = Instant::now();
    let normalized = normalize_query(text);

    let (intent, confidence, params) = RULES
        .iter()
        .find(|rule| rule.matches(&normalized))
        .map(|rule| (rule.intent, rule.confidence, (rule.params)(text, &normalized)))
        .unwrap_or_else(|| (Intent::Unknown, DEFAULT_CONFIDENCE, json!({})));

    tracing::debug!(intent = %intent, confidence, "keyword fallback classification");

    ClassificationResult {
        intent,
        confidence,
        params,
        duration_ms: started.elapsed().as_millis() as u64,
        source: ClassificationSource::Keywords,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_query_keeps_raw_text_as_description() {
        let result = classify_with_keywords("precio de cemento Holcim 50kg");
        assert_eq!(result.intent, Intent::PriceQuery);
        assert!((result.confidence - 0.75).abs() < 1e-6);
        assert_eq!(
            result.params["product_description"],
            "precio de cemento Holcim 50kg"
        );
        assert_eq!(result.source, ClassificationSource::Keywords);
    }

    #[test]
    fn plain_navigation_without_filters() {
        let result = classify_with_keywords("Ir al panel principal");
        assert_eq!(result.intent, Intent::Navigation);
        assert_eq!(result.params["target_page"], "panel");
        assert!(result.params.get("filters").is_none());
    }

    #[test]
    fn filter_words_upgrade_navigation() {
        let result = classify_with_keywords("Ir al panel principal del último mes");
        assert_eq!(result.intent, Intent::NavigationWithParameters);
        assert!((result.confidence - 0.65).abs() < 1e-6);
        assert!(result.params["filters"].is_object());

        let result = classify_with_keywords("ver facturas del último mes");
        assert_eq!(result.intent, Intent::NavigationWithParameters);
        assert_eq!(result.params["target_page"], "facturas");
    }

    #[test]
    fn price_wins_over_bulk_in_cascade() {
        let result = classify_with_keywords("precio de cemento al por mayor");
        assert_eq!(result.intent, Intent::PriceQuery);
    }

    #[test]
    fn bulk_collects_matched_keywords() {
        let result = classify_with_keywords("pintura barata al por mayor");
        assert_eq!(result.intent, Intent::BulkOrBudgetSearch);
        assert_eq!(
            result.params["budget_keywords"],
            json!(["barata", "al por mayor"])
        );
    }

    #[test]
    fn comparison_splits_options() {
        let result = classify_with_keywords("pintura acrílica vs pintura vinílica");
        assert_eq!(result.intent, Intent::ComparisonSearch);
        assert_eq!(
            result.params["options"],
            json!(["pintura acrílica", "pintura vinílica"])
        );
    }

    #[test]
    fn problem_and_project_rules() {
        assert_eq!(
            classify_with_keywords("cómo impermeabilizar terraza").intent,
            Intent::ProblemSolvingSearch
        );
        assert_eq!(
            classify_with_keywords("materiales para construir pérgola").intent,
            Intent::ProjectBasedSearch
        );
    }

    #[test]
    fn attribute_and_brand_rules() {
        let attr = classify_with_keywords("cables eléctricos 12 AWG");
        assert_eq!(attr.intent, Intent::AttributeBasedSearch);
        assert!((attr.confidence - 0.60).abs() < 1e-6);

        let brand = classify_with_keywords("taladro dewalt");
        assert_eq!(brand.intent, Intent::DirectProductSearch);
        assert!((brand.confidence - 0.65).abs() < 1e-6);
    }

    #[test]
    fn inflected_keywords_still_match() {
        for (text, intent) in [
            ("costos de cemento", Intent::PriceQuery),
            ("valores del porcelanato", Intent::PriceQuery),
            ("prices for rebar", Intent::PriceQuery),
            ("costes de envío", Intent::PriceQuery),
            ("cuáles son los mejores adhesivos", Intent::ComparisonSearch),
            ("diferencias entre drywall y fibrocemento", Intent::ComparisonSearch),
            ("pinturas baratas", Intent::BulkOrBudgetSearch),
        ] {
            assert_eq!(classify_with_keywords(text).intent, intent, "{text}");
        }
    }

    #[test]
    fn unmatched_text_is_unknown() {
        for text in ["", "hola", "buenas tardes"] {
            let result = classify_with_keywords(text);
            assert_eq!(result.intent, Intent::Unknown);
            assert_eq!(result.confidence, DEFAULT_CONFIDENCE);
            assert_eq!(result.params, json!({}));
        }
    }

    #[test]
    fn confidence_is_always_below_one() {
        for text in [
            "precio del cemento",
            "cemento barato",
            "pvc o cpvc",
            "cómo pegar cerámica",
            "herramientas para remodelar cocina",
            "abrir sección de facturas",
            "malla 6mm",
            "marca sherwin",
            "???",
        ] {
            let result = classify_with_keywords(text);
            assert!(result.confidence < 1.0 && result.confidence >= 0.5);
        }
    }
}
