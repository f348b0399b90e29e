use unicode_categories::UnicodeCategories;
use unicode_normalization::UnicodeNormalization;

/// Fold a raw query into the form the cue patterns are written against.
///
/// Lowercases, decomposes to NFD and drops non-spacing marks (so `"Último"`
/// becomes `"ultimo"` and `"año"` becomes `"ano"`), then collapses runs of
/// whitespace to a single ASCII space and trims both ends.
pub fn normalize_query(input: &str) -> String {
    let folded: String = input
        .to_lowercase()
        .nfd()
        .filter(|c| !c.is_mark_nonspacing())
        .collect();

    let mut out = String::with_capacity(folded.len());
    for word in folded.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}
