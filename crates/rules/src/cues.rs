//! Lexical cue detectors over normalized query text.
//!
//! Every pattern is written accent-free and lowercase; callers pass the
//! output of [`normalize_query`](crate::normalize_query).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("cue pattern must compile")
}

static PRICE: Lazy<Regex> = Lazy::new(|| {
    pattern(
        r"\b(?:precios?|cuanto cuesta|cuanto vale|valor|costo|coste|a como|en cuanto|how much|\$|usd|dolar(?:es)?)\b",
    )
});

static BULK: Lazy<Regex> = Lazy::new(|| {
    pattern(
        r"\b(?:al por mayor|mayorista|por volumen|en cantidad|por caja|por pallet|descuentos?|ofertas?|barat[oa]s?|economic[oa]s?|low\s*cost|presupuesto|menor a \$?\d+|por menos de \$?\d+)\b",
    )
});

static COMPARE: Lazy<Regex> = Lazy::new(|| {
    pattern(r"\b(?:vs|versus|diferencia|comparar|comparativas?|que es mejor|cual es mejor|cual conviene)\b")
});

// "A o B" only counts when a material token is also present.
static OR_CHOICE: Lazy<Regex> = Lazy::new(|| pattern(r"\bo\b"));

static MATERIAL: Lazy<Regex> = Lazy::new(|| {
    pattern(r"\b(?:vs|pvc|cpvc|hdpe|drywall|fibrocemento|malla|pernos|techo|teja|ceramica|porcelanato)\b")
});

static PLANNING: Lazy<Regex> = Lazy::new(|| {
    pattern(
        r"\b(?:que necesito|lista de materiales?|materiales? para|herramientas para|insumos para|como|solucion|que usar|cual sirve|recomiendas?|no se si|me conviene)\b",
    )
});

static NAV_VERB: Lazy<Regex> =
    Lazy::new(|| pattern(r"^(?:ir|ver|mostrar|muestrame|abrir|entrar|llevarme|go|open)\b"));

static UI_NOUN: Lazy<Regex> = Lazy::new(|| {
    pattern(
        r"\b(?:panel|pagina|seccion|menu|configuracion|carrito|clientes?|facturas?|cotizaciones?|pedidos?|historial)\b",
    )
});

static RECORD_FILTER: Lazy<Regex> = Lazy::new(|| {
    pattern(
        r"\b(?:entre|desde|hasta|ultimos?|hoy|ayer|esta semana|este mes|ano|pendientes?|pagad[ao]s?|estado|filtrar|ordenad[ao]s?)\b",
    )
});

/// Boolean cues detected in one normalized query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Cues {
    pub price: bool,
    pub bulk: bool,
    pub comparison: bool,
    pub planning: bool,
    pub nav_verb: bool,
    pub ui_noun: bool,
    pub record_filter: bool,
}

impl Cues {
    pub fn detect(normalized: &str) -> Self {
        Self {
            price: PRICE.is_match(normalized),
            bulk: BULK.is_match(normalized),
            comparison: COMPARE.is_match(normalized)
                || (OR_CHOICE.is_match(normalized) && MATERIAL.is_match(normalized)),
            planning: PLANNING.is_match(normalized),
            nav_verb: NAV_VERB.is_match(normalized),
            ui_noun: UI_NOUN.is_match(normalized),
            record_filter: RECORD_FILTER.is_match(normalized),
        }
    }

    /// A navigation request needs both a leading verb and an app-section noun.
    pub fn navigation(&self) -> bool {
        self.nav_verb && self.ui_noun
    }

    /// Parameterized navigation refines navigation; a filter word alone never triggers it.
    pub fn navigation_with_params(&self) -> bool {
        self.navigation() && self.record_filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize_query;

    fn cues(text: &str) -> Cues {
        Cues::detect(&normalize_query(text))
    }

    #[test]
    fn price_words_and_currency() {
        assert!(cues("precio del cemento").price);
        assert!(cues("¿Cuánto cuesta el porcelanato?").price);
        assert!(cues("tubos a 20 usd").price);
        assert!(!cues("tubos por $20").price);
        assert!(!cues("cemento holcim 50kg").price);
    }

    #[test]
    fn bulk_words_including_price_caps() {
        assert!(cues("pintura barata").bulk);
        assert!(cues("bloques al por mayor").bulk);
        let capped = cues("taladro por menos de $80");
        assert!(capped.bulk);
        assert!(!capped.price);
        assert!(!cues("pintura blanca").bulk);
    }

    #[test]
    fn comparison_by_marker() {
        assert!(cues("pintura acrílica vs vinílica").comparison);
        assert!(cues("¿Cuál es mejor para baños?").comparison);
    }

    #[test]
    fn comparison_by_or_choice_needs_material_token() {
        assert!(cues("tubería hdpe o pvc").comparison);
        assert!(!cues("cemento o arena").comparison);
    }

    #[test]
    fn planning_words() {
        assert!(cues("qué necesito para un baño").planning);
        assert!(cues("cómo impermeabilizar terraza").planning);
        assert!(!cues("cemento holcim").planning);
    }

    #[test]
    fn navigation_needs_leading_verb_and_noun() {
        assert!(cues("Ir al panel principal").navigation());
        assert!(!cues("panel solar 300w").navigation());
        assert!(!cues("quiero ver cemento").navigation());
    }

    #[test]
    fn filter_word_alone_is_not_parameterized_navigation() {
        let c = cues("cemento desde 5 dólares");
        assert!(c.record_filter);
        assert!(!c.navigation_with_params());
    }

    #[test]
    fn navigation_with_filter_is_parameterized() {
        let c = cues("ver facturas del último mes");
        assert!(c.navigation());
        assert!(c.navigation_with_params());
    }

    #[test]
    fn empty_query_has_no_cues() {
        assert_eq!(cues(""), Cues::default());
    }
}
