//! Lexical similarity helpers shared by key-phrase refinement and distractor
//! selection.

use std::collections::BTreeSet;

/// Lowercase alphanumeric tokens: everything outside `[a-z0-9]` is a separator.
pub fn tokens(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_ascii_lowercase() || c.is_ascii_digit()))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Token set of a string.
pub fn token_set(text: &str) -> BTreeSet<String> {
    tokens(text).into_iter().collect()
}

/// Jaccard similarity of two sets. Two empty sets are identical.
pub fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f32 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f32 / union as f32
}

/// Crude English singularization.
///
/// ```
/// use study_oxide::lexical::singularize;
///
/// assert_eq!(singularize("enzymes"), "enzyme");
/// assert_eq!(singularize("mitochondria"), "mitochondria");
/// assert_eq!(singularize("theories"), "theory");
/// ```
pub fn singularize(word: &str) -> String {
    let w = word.to_lowercase();
    if w.len() <= 3 {
        return w;
    }
    if let Some(stem) = w.strip_suffix("ies") {
        return format!("{}y", stem);
    }
    for suffix in ["sses", "shes", "ches", "xes"] {
        if w.ends_with(suffix) {
            return w[..w.len() - 2].to_string();
        }
    }
    if w.ends_with('s') && !w.ends_with("ss") && !w.ends_with("us") && !w.ends_with("is") {
        return w[..w.len() - 1].to_string();
    }
    w
}

/// Singularized token set.
pub fn morph_set(text: &str) -> BTreeSet<String> {
    tokens(text).iter().map(|t| singularize(t)).collect()
}

/// Morphologically normalized form: singular tokens joined by spaces.
pub fn morph_key(text: &str) -> String {
    tokens(text)
        .iter()
        .map(|t| singularize(t))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether two strings are near-duplicates: equal ignoring case, same
/// morphological form, or token-set Jaccard at or above `threshold`.
pub fn too_similar(a: &str, b: &str, threshold: f32) -> bool {
    if a.trim().eq_ignore_ascii_case(b.trim()) {
        return true;
    }
    if morph_key(a) == morph_key(b) {
        return true;
    }
    jaccard(&token_set(a), &token_set(b)) >= threshold
}

/// Whether `needle` occurs as a contiguous run inside `hay`.
pub fn contains_tokens(hay: &[String], needle: &[String]) -> bool {
    !needle.is_empty() && hay.windows(needle.len()).any(|w| w == needle)
}

/// Whether `text` contains `phrase` on word boundaries, ignoring case.
pub fn contains_phrase(text: &str, phrase: &str) -> bool {
    contains_tokens(&tokens(text), &tokens(phrase))
}
