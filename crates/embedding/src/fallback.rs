/// Width of the offline fallback vector.
pub const FALLBACK_DIMENSION: usize = 128;

/// Deterministic bag-of-code-units embedding used when the provider is unavailable.
///
/// Each UTF-16 code unit `c` adds `(c % 7) + 1` to slot `c % 128`; the result is
/// scaled to unit length. An empty string yields the zero vector. The output
/// depends on nothing but `text`, so offline runs stay comparable with each other.
pub fn deterministic_embedding(text: &str) -> Vec<f32> {
    let mut vector = vec![0f32; FALLBACK_DIMENSION];
    for unit in text.encode_utf16() {
        let code = unit as usize;
        vector[code % FALLBACK_DIMENSION] += ((code % 7) + 1) as f32;
    }

    let magnitude = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    let divisor = if magnitude == 0.0 { 1.0 } else { magnitude };
    for x in vector.iter_mut() {
        *x /= divisor;
    }
    vector
}
