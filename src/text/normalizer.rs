//! Cleanup of raw extracted text.
//!
//! The normalizer turns page text, OCR transcripts or pasted notes into
//! paragraph-joined prose:
//!
//! 1. Typographic characters are folded to ASCII and spaces collapsed
//! 2. Scanner watermarks and page-number lines are removed
//! 3. Words hyphenated across line breaks are rejoined
//! 4. Bullet and numeral markers are stripped, heading-like lines dropped
//! 5. Lines without terminal punctuation are merged with the next line
//!
//! The output is a fixed point: normalizing it again changes nothing.

use crate::text::formula::looks_like_formula;
use crate::text::headings::{has_terminal_punctuation, is_heading};
use crate::text::hyphenation::HyphenationHandler;
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

lazy_static! {
    /// Watermarks stamped by phone scanning apps
    static ref RE_WATERMARK: Regex =
        Regex::new(r"(?i)scanned\s+(?:with|by)\s+camscanner|adobe\s+scan").unwrap();

    /// "12", "Page 3", "3 of 10", "3/10"
    static ref RE_PAGE_NUMBER: Regex =
        Regex::new(r"(?i)^(?:page\s+)?\d{1,4}(?:\s*(?:of|/)\s*\d{1,4})?$").unwrap();

    /// "- 4 -", "[4]", "(4)"
    static ref RE_DECORATED_PAGE_NUMBER: Regex =
        Regex::new(r"^(?:-\s*\d{1,4}\s*-|\[\d{1,4}\]|\(\d{1,4}\))$").unwrap();

    static ref RE_SPACES: Regex = Regex::new(r"[ \t\u{00A0}\u{2009}\u{202F}]+").unwrap();

    /// Bullets, "1." / "2)" numerals, "a)" / "(b)" letters, "(iv)" roman numerals
    static ref RE_LIST_MARKER: Regex = Regex::new(
        r"^(?:[-*•·▪◦‣>]+|\(?\d{1,3}[.)]|[a-z][.)]|\([A-Za-z]\)|\([ivxIVX]{1,5}\))\s+"
    ).unwrap();
}

/// Normalized text: paragraphs separated by exactly one blank line, no
/// heading lines, no unterminated continuation lines.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NormalizedText(String);

impl NormalizedText {
    /// Borrow the text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether nothing survived normalization.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Take ownership of the text.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NormalizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Text normalizer.
#[derive(Debug, Clone, Default)]
pub struct TextNormalizer {
    hyphenation: HyphenationHandler,
}

impl TextNormalizer {
    /// Create a normalizer with the default hyphenation handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom hyphenation handler.
    pub fn with_hyphenation(mut self, handler: HyphenationHandler) -> Self {
        self.hyphenation = handler;
        self
    }

    /// Normalize raw text. Never fails; unusual input simply yields less text.
    ///
    /// Cleanup passes repeat until the text stops changing, so lines that
    /// only become headings once merged are dropped too.
    pub fn normalize(&self, raw: &str) -> NormalizedText {
        let mut text = self.clean_pass(raw);
        let mut passes = 1;
        // A pass that changes the text shortens it or removes a line break.
        loop {
            let next = self.clean_pass(&text);
            if next == text {
                break;
            }
            text = next;
            passes += 1;
        }
        log::debug!("Normalized {} chars into {} chars in {} passes", raw.len(), text.len(), passes);
        NormalizedText(text)
    }

    fn clean_pass(&self, raw: &str) -> String {
        let folded = fold_characters(raw);
        let cleaned = strip_noise_lines(&folded);
        let dehyphenated = self.hyphenation.process_text(&cleaned);

        let mut paragraphs: Vec<String> = Vec::new();
        for block in split_paragraphs(&dehyphenated) {
            let lines: Vec<String> = block
                .iter()
                .map(|line| strip_list_markers(line))
                .filter(|line| !line.is_empty() && !is_heading(line))
                .collect();
            let merged = merge_continuations(lines);
            if !merged.is_empty() {
                paragraphs.push(merged.join("\n"));
            }
        }
        paragraphs.join("\n\n")
    }
}

/// Fold typographic characters to ASCII equivalents.
fn fold_characters(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '\r' | '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{FEFF}' => {},
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => out.push('"'),
            '\u{2013}' | '\u{2014}' | '\u{2212}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            '\u{FB01}' => out.push_str("fi"),
            '\u{FB02}' => out.push_str("fl"),
            _ => out.push(c),
        }
    }
    out
}

/// Remove watermarks, collapse spaces and drop page-number lines.
///
/// Lines emptied by cleanup are removed rather than blanked so they do not
/// introduce paragraph breaks.
fn strip_noise_lines(text: &str) -> String {
    let mut kept: Vec<String> = Vec::new();
    for line in text.split('\n') {
        if line.trim().is_empty() {
            kept.push(String::new());
            continue;
        }
        let without_marks = RE_WATERMARK.replace_all(line, " ");
        let collapsed = RE_SPACES.replace_all(&without_marks, " ");
        let trimmed = collapsed.trim();
        if trimmed.is_empty() || RE_PAGE_NUMBER.is_match(trimmed) || RE_DECORATED_PAGE_NUMBER.is_match(trimmed) {
            continue;
        }
        kept.push(trimmed.to_string());
    }
    kept.join("\n")
}

/// Group lines into paragraphs separated by blank lines.
fn split_paragraphs(text: &str) -> Vec<Vec<&str>> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }
    paragraphs
}

/// Strip leading bullet and numeral markers until none remain.
fn strip_list_markers(line: &str) -> String {
    let mut current = line.trim();
    while let Some(m) = RE_LIST_MARKER.find(current) {
        current = current[m.end()..].trim_start();
    }
    current.to_string()
}

/// Merge lines that lack terminal punctuation into the following line,
/// unless either line is formula-like.
fn merge_continuations(lines: Vec<String>) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(lines.len());
    for line in lines {
        if let Some(prev) = merged.last_mut() {
            if !has_terminal_punctuation(prev) && !looks_like_formula(prev) && !looks_like_formula(&line) {
                prev.push(' ');
                prev.push_str(&line);
                continue;
            }
        }
        merged.push(line);
    }
    merged
}
