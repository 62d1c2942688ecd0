//! Answer normalization and fuzzy similarity for free-text validation.

use strsim::levenshtein;

/// Lowercase, trim, and strip sentence punctuation so "Bonjour." and
/// "bonjour" compare equal.
pub fn normalize(input: &str) -> String {
    input
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '.' | ',' | '!' | '?' | ';'))
        .collect()
}

/// Normalized edit-distance similarity in `[0, 1]`:
/// `(max_len - levenshtein) / max_len`. Empty-vs-empty counts as identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    let distance = levenshtein(a, b);
    (max_len.saturating_sub(distance)) as f64 / max_len as f64
}
