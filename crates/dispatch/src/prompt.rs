/// Instruction text sent ahead of every query.
pub const INTENT_SYSTEM_PROMPT: &str = r#"You classify shopper queries for a construction and building materials store.
Pick exactly one intent:
- "direct_product_search": a specific product or SKU, often with brand or format.
- "attribute_based_search": products described by specs (size, material, series, gauge) with no mention of price or budget.
- "price_query": explicitly asks for price, cost or how much something is.
- "bulk_or_budget_search": cheap, economic, wholesale, bulk quantities or a budget.
- "comparison_search": compares two or more options or asks which is better.
- "problem_solving_search": describes a problem and asks what to use or how to fix it.
- "project_based_search": describes a project and asks for everything it needs.
- "navigation": wants to open a page or section of the app, without filters.
- "navigation_with_parameters": wants a page with filters (dates, status, customer, category, price).
- "unknown": none of the above, or too ambiguous.

Reply with one JSON object and nothing else:
{"intent": "<intent>", "confidence": <number between 0 and 1>, "params": {...}}

params by intent:
- direct_product_search, price_query: {"product_description": string}
- attribute_based_search: {"attributes": string}
- bulk_or_budget_search: {"product_description": string | null, "budget_keywords": string[]}
- comparison_search: {"options": string[]}
- problem_solving_search: {"problem_description": string}
- project_based_search: {"project_description": string}
- navigation: {"target_page": string}
- navigation_with_parameters: {"target_page": string, "filters": {"date_range"?: {"from"?: string, "to"?: string}, "status"?: string, "category"?: string, "customer_name"?: string}}
- unknown: {}"#;

/// Full prompt: instructions, the quoted query, then optional retrieval context.
pub fn build_prompt(system: &str, message: &str, context: Option<&str>) -> String {
    let mut prompt = format!("{}\n\nUser query: \"{}\"", system.trim(), message);
    if let Some(context) = context.map(str::trim).filter(|c| !c.is_empty()) {
        prompt.push_str("\n\nContext from vector search:\n");
        prompt.push_str(context);
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_without_context() {
        let prompt = build_prompt("SYS", "precio cemento", None);
        assert_eq!(prompt, "SYS\n\nUser query: \"precio cemento\"");
    }

    #[test]
    fn prompt_with_context_appends_block() {
        let prompt = build_prompt(
            "SYS",
            "pvc o cpvc",
            Some("comparison_search: pvc vs cpvc para agua caliente"),
        );
        assert!(prompt.ends_with(
            "\n\nContext from vector search:\ncomparison_search: pvc vs cpvc para agua caliente"
        ));
    }

    #[test]
    fn blank_context_is_ignored() {
        assert_eq!(
            build_prompt("SYS", "x", Some("  ")),
            build_prompt("SYS", "x", None)
        );
    }

    #[test]
    fn builtin_prompt_lists_every_label() {
        for intent in rules::Intent::ALL {
            assert!(
                INTENT_SYSTEM_PROMPT.contains(&format!("\"{}\"", intent.as_str())),
                "{intent} missing from prompt"
            );
        }
    }
}
