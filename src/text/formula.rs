//! Formula detection and extraction.
//!
//! Two signals are used: LaTeX math delimiters, which are returned verbatim,
//! and short equation-like lines containing a relational symbol.

use lazy_static::lazy_static;
use regex::Regex;

/// Maximum number of formulas returned by [`extract_formulas`].
pub const MAX_FORMULAS: usize = 12;

lazy_static! {
    /// `$$…$$`, `$…$`, `\[…\]`, `\(…\)`; display math is tried first
    static ref RE_LATEX: Regex =
        Regex::new(r"(?s)\$\$.+?\$\$|\$[^$\n]+?\$|\\\[.+?\\\]|\\\(.+?\\\)").unwrap();

    static ref RE_RELATION: Regex = Regex::new(r"[=<>≤≥≈≠]").unwrap();
}

/// Maximum length of a heuristic equation line.
const MAX_EQUATION_LEN: usize = 120;

/// Maximum share of non-ASCII characters in a heuristic equation line.
const MAX_NOISE_RATIO: f32 = 0.3;

/// Whether the text contains LaTeX math delimiters.
pub fn has_latex(text: &str) -> bool {
    RE_LATEX.is_match(text)
}

/// Heuristic equation-like line: a relational symbol, some letters or digits,
/// bounded length and bounded non-ASCII noise.
pub fn is_equation_line(line: &str) -> bool {
    let trimmed = line.trim();
    let len = trimmed.chars().count();
    if len == 0 || len > MAX_EQUATION_LEN || !RE_RELATION.is_match(trimmed) {
        return false;
    }
    if !trimmed.chars().any(|c| c.is_alphanumeric()) {
        return false;
    }
    // relational symbols outside ASCII are signal, not noise
    let noise = trimmed
        .chars()
        .filter(|c| !c.is_ascii() && !matches!(c, '≤' | '≥' | '≈' | '≠'))
        .count();
    noise as f32 / len as f32 <= MAX_NOISE_RATIO
}

/// Whether a line should be treated as a formula by the normalizer.
pub fn looks_like_formula(line: &str) -> bool {
    has_latex(line) || is_equation_line(line)
}

/// Extract distinct formulas in document order.
///
/// LaTeX spans come first, delimiters included; equation-like lines without
/// LaTeX follow. At most [`MAX_FORMULAS`] are returned.
pub fn extract_formulas(text: &str) -> Vec<String> {
    fn push(candidate: &str, formulas: &mut Vec<String>) {
        let candidate = candidate.trim();
        if !candidate.is_empty() && !formulas.iter().any(|f| f == candidate) {
            formulas.push(candidate.to_string());
        }
    }

    let mut formulas: Vec<String> = Vec::new();
    for m in RE_LATEX.find_iter(text) {
        push(m.as_str(), &mut formulas);
    }
    for line in text.lines() {
        if !has_latex(line) && is_equation_line(line) {
            push(line, &mut formulas);
        }
    }

    formulas.truncate(MAX_FORMULAS);
    log::debug!("Extracted {} formulas", formulas.len());
    formulas
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_latex_captured_verbatim() {
        let text = "Einstein wrote $E = mc^2$ in 1905.";
        assert_eq!(extract_formulas(text), vec!["$E = mc^2$".to_string()]);
    }

    #[test]
    fn test_display_and_bracket_delimiters() {
        let text = "$$a^2 + b^2 = c^2$$ and \\[x = y\\] and \\(p \\le q\\)";
        let formulas = extract_formulas(text);
        assert_eq!(formulas, vec!["$$a^2 + b^2 = c^2$$", "\\[x = y\\]", "\\(p \\le q\\)"]);
    }

    #[test]
    fn test_equation_lines() {
        assert!(is_equation_line("F = m * a"));
        assert!(is_equation_line("v ≤ c"));
        assert!(!is_equation_line("= = ="));
        assert!(!is_equation_line("No relation in this line at all"));
        assert!(!is_equation_line(&format!("x = {}", "long ".repeat(40))));
    }

    #[test]
    fn test_noise_ratio_bounded() {
        assert!(!is_equation_line("ж = ЖЖЖЖЖЖ"));
    }

    #[test]
    fn test_extract_dedupes_and_orders() {
        let text = "Newton: $F = ma$.\nF = m * a\nAgain $F = ma$ appears.";
        let formulas = extract_formulas(text);
        assert_eq!(formulas[0], "$F = ma$");
        assert!(formulas.contains(&"F = m * a".to_string()));
        assert_eq!(formulas.iter().filter(|f| f.as_str() == "$F = ma$").count(), 1);
    }

    #[test]
    fn test_extract_caps_results() {
        let text: String = (0..20).map(|i| format!("$x_{} = {}$ ", i, i)).collect();
        assert_eq!(extract_formulas(&text).len(), MAX_FORMULAS);
    }
}
