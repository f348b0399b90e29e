//! Turning free-form model output into a validated [`ClassificationResult`].

use rules::{ClassificationResult, ClassificationSource, Intent, DEFAULT_CONFIDENCE};
use serde_json::{Map, Value};

/// First balanced `{...}` span in `text`, honoring JSON strings and escapes.
///
/// Models often wrap the object in prose or code fences; everything outside
/// the first complete object is ignored.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse and validate model output.
///
/// Returns `None` when no JSON object can be recovered. Otherwise:
/// unrecognised labels become [`Intent::Unknown`], confidence is clamped to
/// `[0, 1]` (default 0.5) and missing or non-object params become `{}`.
pub fn parse_classification(text: &str) -> Option<ClassificationResult> {
    let raw = extract_json_object(text)?;
    let parsed: Map<String, Value> = match serde_json::from_str(raw) {
        Ok(map) => map,
        Err(err) => {
            tracing::debug!(error = %err, "model output is not a JSON object");
            return None;
        }
    };

    let intent = parsed
        .get("intent")
        .and_then(Value::as_str)
        .and_then(|label| label.parse::<Intent>().ok())
        .unwrap_or(Intent::Unknown);

    let confidence = parsed
        .get("confidence")
        .and_then(|value| match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
        .filter(|c| c.is_finite())
        .map(|c| c.clamp(0.0, 1.0) as f32)
        .unwrap_or(DEFAULT_CONFIDENCE);

    let params = match parsed.get("params") {
        Some(Value::Object(map)) => Value::Object(map.clone()),
        _ => Value::Object(Map::new()),
    };

    Some(ClassificationResult {
        intent,
        confidence,
        params,
        duration_ms: 0,
        source: ClassificationSource::Llm,
    })
}
