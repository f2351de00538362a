//! Sentence segmentation.
//!
//! Normalized text is split after runs of `.`, `!` or `?` followed by
//! whitespace. Fragments that are too short, unterminated, shouting, or
//! repeated are discarded.

use crate::text::headings::is_all_caps;
use crate::text::NormalizedText;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

/// Maximum number of sentences kept per document.
pub const MAX_SENTENCES: usize = 2000;

/// Default minimum sentence length in characters.
pub const DEFAULT_MIN_CHARS: usize = 50;

lazy_static! {
    static ref RE_WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Tokens that end with a period without ending a sentence.
const ABBREVIATIONS: &[&str] = &[
    "e.g.", "i.e.", "dr.", "mr.", "mrs.", "ms.", "prof.", "fig.", "figs.", "vs.", "etc.", "al.",
    "approx.", "eq.", "no.", "st.", "cf.",
];

/// Sentence segmenter.
#[derive(Debug, Clone)]
pub struct SentenceSegmenter {
    min_chars: usize,
    max_sentences: usize,
}

impl Default for SentenceSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl SentenceSegmenter {
    /// Create a segmenter with the default 50-character minimum.
    pub fn new() -> Self {
        Self {
            min_chars: DEFAULT_MIN_CHARS,
            max_sentences: MAX_SENTENCES,
        }
    }

    /// Set the minimum sentence length.
    pub fn with_min_chars(mut self, min_chars: usize) -> Self {
        self.min_chars = min_chars;
        self
    }

    /// Set the maximum number of sentences returned.
    pub fn with_max_sentences(mut self, max: usize) -> Self {
        self.max_sentences = max;
        self
    }

    /// Split normalized text into sentences in document order.
    pub fn segment(&self, text: &NormalizedText) -> Vec<String> {
        self.segment_str(text.as_str())
    }

    /// Split an arbitrary string into sentences.
    pub fn segment_str(&self, text: &str) -> Vec<String> {
        let flat = RE_WHITESPACE.replace_all(text, " ");
        let mut seen: HashSet<String> = HashSet::new();
        let mut sentences = Vec::new();

        for fragment in split_fragments(&flat) {
            if sentences.len() >= self.max_sentences {
                break;
            }
            if !self.accepts(fragment) {
                continue;
            }
            if seen.insert(fragment.to_lowercase()) {
                sentences.push(fragment.to_string());
            }
        }

        log::debug!("Segmented {} sentences (min {} chars)", sentences.len(), self.min_chars);
        sentences
    }

    fn accepts(&self, fragment: &str) -> bool {
        fragment.chars().count() >= self.min_chars
            && fragment.ends_with(['.', '!', '?'])
            && !is_all_caps(fragment)
    }
}

/// Split on terminal punctuation runs followed by whitespace, keeping the
/// punctuation on the preceding fragment. Fragments are trimmed.
fn split_fragments(text: &str) -> Vec<&str> {
    let mut fragments = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        // extend over the whole punctuation run ("?!", "...")
        let mut end = i + c.len_utf8();
        while let Some(&(j, next)) = chars.peek() {
            if matches!(next, '.' | '!' | '?') {
                end = j + next.len_utf8();
                chars.next();
            } else {
                break;
            }
        }
        let followed_by_space = chars.peek().is_some_and(|&(_, next)| next.is_whitespace());
        if !followed_by_space {
            continue;
        }
        let candidate = &text[start..end];
        if ends_with_abbreviation(candidate) {
            continue;
        }
        let trimmed = candidate.trim();
        if !trimmed.is_empty() {
            fragments.push(trimmed);
        }
        start = end;
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        fragments.push(tail);
    }
    fragments
}

/// Whether the fragment ends in an abbreviation or a single-letter initial.
fn ends_with_abbreviation(fragment: &str) -> bool {
    let last = fragment.rsplit(' ').next().unwrap_or("");
    let lower = last.to_lowercase();
    if ABBREVIATIONS.contains(&lower.as_str()) {
        return true;
    }
    // "J." in "J. Watson"
    let mut chars = last.chars();
    matches!((chars.next(), chars.next(), chars.next()), (Some(c), Some('.'), None) if c.is_uppercase())
}
