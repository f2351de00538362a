//! Heading-like line detection.
//!
//! Lines are classified by an ordered table of predicates. The first rule
//! that fires names the reason; a line no rule claims is body text. Formula
//! lines are never headings.

use crate::text::formula::looks_like_formula;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// "1.2 Scope", "3.1.4 Results"
    static ref RE_NUMBERED_SECTION: Regex =
        Regex::new(r"^\d+(\.\d+)+\.?\s+\S").unwrap();

    /// "Chapter 3", "Section 2: Cells", "Lecture 5 - Enzymes"
    static ref RE_DIVISION: Regex = Regex::new(
        r"(?i)^(chapter|section|unit|lecture|lesson|module|part|appendix)\s+([0-9]+|[ivxlc]+|[a-z])\b"
    ).unwrap();

    /// "Figure 3:", "Fig. 2.", "Table 1 -"
    static ref RE_FIGURE: Regex =
        Regex::new(r"(?i)^(figure|fig\.|table|chart|diagram)\s*\d+(\.\d+)?\s*[:.\-]").unwrap();

    /// Contents headers and dot leaders ending in a page number
    static ref RE_TOC: Regex =
        Regex::new(r"(?i)^(table of contents|contents)\s*$|\.{4,}\s*\d+\s*$|(\s\.){3,}\s*\d+\s*$").unwrap();
}

/// Why a line was classified as a heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingKind {
    /// Predominantly uppercase letters
    AllCaps,
    /// Short title-case line without terminal punctuation
    TitleCase,
    /// Numbered section or named division
    NumberedSection,
    /// Figure or table caption label
    FigureLabel,
    /// Table-of-contents marker
    TableOfContents,
}

/// A heading rule: predicate over a trimmed line and the verdict it yields.
struct HeadingRule {
    kind: HeadingKind,
    matches: fn(&str) -> bool,
}

const HEADING_RULES: &[HeadingRule] = &[
    HeadingRule {
        kind: HeadingKind::TableOfContents,
        matches: |line| RE_TOC.is_match(line),
    },
    HeadingRule {
        kind: HeadingKind::FigureLabel,
        matches: |line| RE_FIGURE.is_match(line),
    },
    HeadingRule {
        kind: HeadingKind::NumberedSection,
        matches: |line| RE_NUMBERED_SECTION.is_match(line) || RE_DIVISION.is_match(line),
    },
    HeadingRule {
        kind: HeadingKind::AllCaps,
        matches: is_all_caps,
    },
    HeadingRule {
        kind: HeadingKind::TitleCase,
        matches: is_title_case,
    },
];

/// Words that stay lowercase inside a title.
const MINOR_WORDS: &[&str] = &[
    "a", "an", "and", "as", "at", "by", "for", "from", "in", "into", "of", "on", "or", "the",
    "to", "vs", "via", "with",
];

/// Classify a line, returning the first matching heading rule.
pub fn classify_heading(line: &str) -> Option<HeadingKind> {
    let trimmed = line.trim();
    if trimmed.is_empty() || looks_like_formula(trimmed) {
        return None;
    }
    HEADING_RULES
        .iter()
        .find(|rule| (rule.matches)(trimmed))
        .map(|rule| rule.kind)
}

/// Convenience wrapper over [`classify_heading`].
pub fn is_heading(line: &str) -> bool {
    classify_heading(line).is_some()
}

/// More than 70% of at least two letters are uppercase.
pub fn is_all_caps(text: &str) -> bool {
    let (mut letters, mut upper) = (0usize, 0usize);
    for c in text.chars().filter(|c| c.is_alphabetic()) {
        letters += 1;
        if c.is_uppercase() {
            upper += 1;
        }
    }
    letters >= 2 && upper as f32 / letters as f32 > 0.7
}

/// Ends in sentence punctuation, ignoring closing quotes and brackets.
pub fn has_terminal_punctuation(text: &str) -> bool {
    text.trim_end()
        .trim_end_matches(['"', '\'', ')', ']', '}'])
        .ends_with(['.', '!', '?', ':', ';'])
}

fn is_title_case(line: &str) -> bool {
    if has_terminal_punctuation(line) {
        return false;
    }
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.is_empty() || words.len() > 10 {
        return false;
    }
    let mut significant = 0;
    for (i, word) in words.iter().enumerate() {
        let bare = word.trim_matches(|c: char| !c.is_alphanumeric());
        let Some(first) = bare.chars().next() else {
            continue;
        };
        if i > 0 && MINOR_WORDS.contains(&bare.to_lowercase().as_str()) {
            continue;
        }
        if first.is_alphabetic() && !first.is_uppercase() {
            return false;
        }
        significant += 1;
    }
    significant >= 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_caps_heading() {
        assert_eq!(classify_heading("CELL BIOLOGY REVIEW"), Some(HeadingKind::AllCaps));
    }

    #[test]
    fn test_title_case_heading() {
        assert_eq!(classify_heading("The Structure of the Cell"), Some(HeadingKind::TitleCase));
        assert_eq!(classify_heading("Introduction"), Some(HeadingKind::TitleCase));
    }

    #[test]
    fn test_title_case_needs_capitalised_words() {
        assert_eq!(classify_heading("The cell is small"), None);
    }

    #[test]
    fn test_title_case_word_limit() {
        let long = "One Two Three Four Five Six Seven Eight Nine Ten Eleven";
        assert_eq!(classify_heading(long), None);
    }

    #[test]
    fn test_numbered_sections() {
        assert_eq!(classify_heading("1.2 Scope of work"), Some(HeadingKind::NumberedSection));
        assert_eq!(classify_heading("Chapter 3"), Some(HeadingKind::NumberedSection));
        assert_eq!(classify_heading("Lecture 5: enzymes and kinetics"), Some(HeadingKind::NumberedSection));
    }

    #[test]
    fn test_figure_labels() {
        assert_eq!(classify_heading("Figure 3: the inner membrane"), Some(HeadingKind::FigureLabel));
        assert_eq!(classify_heading("Table 2. Measured rates"), Some(HeadingKind::FigureLabel));
    }

    #[test]
    fn test_table_of_contents() {
        assert_eq!(classify_heading("Contents"), Some(HeadingKind::TableOfContents));
        assert_eq!(classify_heading("Glycolysis ........ 12"), Some(HeadingKind::TableOfContents));
    }

    #[test]
    fn test_sentences_are_not_headings() {
        assert_eq!(classify_heading("Cells divide by mitosis."), None);
        assert_eq!(classify_heading("The Krebs Cycle Produces NADH."), None);
    }

    #[test]
    fn test_formula_never_heading() {
        assert_eq!(classify_heading("F = MA"), None);
        assert_eq!(classify_heading("$E = mc^2$"), None);
    }

    #[test]
    fn test_terminal_punctuation() {
        assert!(has_terminal_punctuation("It ends here.\""));
        assert!(has_terminal_punctuation("Steps:"));
        assert!(!has_terminal_punctuation("no end"));
    }
}
