use rules::{Intent, ScoreMap};

/// Cosine similarity over the common prefix of `a` and `b`.
///
/// When the lengths differ only the first `min(len)` components take part.
/// A zero denominator is replaced by 1, so any zero vector scores 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let n = a.len().min(b.len());
    let (a, b) = (&a[..n], &b[..n]);

    let mut dot = 0f32;
    let mut norm_a = 0f32;
    let mut norm_b = 0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    dot / if denom == 0.0 { 1.0 } else { denom }
}

/// Reduce exemplar similarities to one score per intent, keeping the maximum.
///
/// Intents without exemplars, or whose best exemplar is anti-correlated, stay at 0.
pub fn score_intents<'a, I>(query: &[f32], exemplars: I) -> ScoreMap
where
    I: IntoIterator<Item = (Intent, &'a [f32])>,
{
    let mut scores = ScoreMap::new();
    for (intent, vector) in exemplars {
        scores.raise_to(intent, cosine_similarity(query, vector));
    }
    scores
}
