//! Artifact synthesis: quiz, flashcards and the seven-day plan.
//!
//! Synthesis is a pure function of its input. The same sentences, phrases,
//! formulas and difficulty always produce the same kit. Two entry points
//! exist:
//!
//! - [`Synthesizer::baseline`] works from sentences in document order;
//! - [`Synthesizer::enhanced`] works from a [`RerankedSet`], using embedding
//!   support choices, centrality order and clusters.

pub mod flashcards;
pub mod options;
pub mod plan;
pub mod quiz;

pub use options::{content_hash, OptionPicker, GENERIC_DISTRACTORS};

use crate::config::{Difficulty, SimilarityThresholds};
use crate::keyphrase::KeyPhrase;
use crate::kit::StudyKit;
use crate::lexical::{contains_tokens, tokens};
use crate::semantic::RerankedSet;
use regex::Regex;

/// Maximum length of a concept answer.
pub const MAX_ANSWER_CHARS: usize = 200;

/// Maximum length of a flashcard back.
pub const MAX_BACK_CHARS: usize = 280;

/// Maximum length of a sentence quoted in a plan objective.
pub const MAX_OBJECTIVE_CHARS: usize = 120;

/// Maximum length of a title derived from the first sentence.
pub const MAX_TITLE_CHARS: usize = 40;

/// Title used when there is neither a given title nor a sentence.
pub const UNTITLED: &str = "Untitled";

/// Inputs shared by both synthesis paths.
#[derive(Debug, Clone, Copy)]
pub struct SynthesisInput<'a> {
    /// Caller-provided title
    pub title: Option<&'a str>,
    /// Retained sentences in document order
    pub sentences: &'a [String],
    /// Refined key phrases in rank order
    pub phrases: &'a [KeyPhrase],
    /// Detected formulas in document order
    pub formulas: &'a [String],
}

/// Builds a [`StudyKit`] from extracted material.
#[derive(Debug, Clone, Default)]
pub struct Synthesizer {
    difficulty: Difficulty,
    thresholds: SimilarityThresholds,
}

impl Synthesizer {
    /// Synthesizer with default similarity thresholds.
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            thresholds: SimilarityThresholds::default(),
        }
    }

    /// Override the similarity thresholds.
    pub fn with_thresholds(mut self, thresholds: SimilarityThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Kit built from sentences in document order.
    pub fn baseline(&self, input: &SynthesisInput<'_>) -> StudyKit {
        let ctx = Context::baseline(input);
        self.assemble(input, &ctx)
    }

    /// Kit built from the reranked sentence set.
    pub fn enhanced(&self, input: &SynthesisInput<'_>, reranked: &RerankedSet) -> StudyKit {
        let ctx = Context::reranked(input, reranked);
        self.assemble(input, &ctx)
    }

    fn assemble(&self, input: &SynthesisInput<'_>, ctx: &Context<'_>) -> StudyKit {
        let picker = OptionPicker::new(self.thresholds.near_duplicate_jaccard);
        StudyKit {
            title: kit_title(input.title, input.sentences),
            quiz: quiz::build_quiz(ctx, self.difficulty, &picker),
            flashcards: flashcards::build_flashcards(ctx, self.thresholds.strict_cosine),
            plan: plan::build_plan(ctx),
        }
    }
}

/// Working view over the material, shared by the quiz, flashcard and plan
/// builders.
pub(crate) struct Context<'a> {
    /// Sentences in working order
    pub sentences: Vec<&'a str>,
    /// Cleaned sentences, at most [`MAX_ANSWER_CHARS`]
    pub cleaned: Vec<String>,
    pub phrases: Vec<&'a str>,
    /// Per sentence, the indices of the phrases it contains
    pub sentence_phrases: Vec<Vec<usize>>,
    /// Per phrase, the sentence that best supports it
    pub support: Vec<Option<usize>>,
    pub formulas: &'a [String],
    /// Present only on the reranked path
    pub embeddings: Option<&'a [Vec<f32>]>,
    pub clusters: Option<&'a [Vec<usize>]>,
}

impl<'a> Context<'a> {
    fn new(sentences: Vec<&'a str>, input: &SynthesisInput<'a>) -> Self {
        let phrases: Vec<&str> = input.phrases.iter().map(|p| p.text.as_str()).collect();
        let phrase_tokens: Vec<Vec<String>> = phrases.iter().map(|p| tokens(p)).collect();
        let sentence_phrases = sentences
            .iter()
            .map(|s| {
                let hay = tokens(s);
                phrase_tokens
                    .iter()
                    .enumerate()
                    .filter(|(_, needle)| contains_tokens(&hay, needle))
                    .map(|(p, _)| p)
                    .collect()
            })
            .collect();
        Self {
            cleaned: cleaned(&sentences),
            sentences,
            phrases,
            sentence_phrases,
            support: Vec::new(),
            formulas: input.formulas,
            embeddings: None,
            clusters: None,
        }
    }

    fn baseline(input: &SynthesisInput<'a>) -> Self {
        let sentences = input.sentences.iter().map(String::as_str).collect();
        let mut ctx = Self::new(sentences, input);
        ctx.support = (0..ctx.phrases.len())
            .map(|p| ctx.sentences_with(p).first().copied())
            .collect();
        ctx
    }

    fn reranked(input: &SynthesisInput<'a>, set: &'a RerankedSet) -> Self {
        let sentences = set.sentences.iter().map(String::as_str).collect();
        let mut ctx = Self::new(sentences, input);
        ctx.support = (0..ctx.phrases.len())
            .map(|p| set.phrase_support.get(p).copied().flatten())
            .collect();
        ctx.embeddings = Some(set.embeddings.as_slice());
        ctx.clusters = Some(set.clusters.as_slice());
        ctx
    }

    /// Whether sentence `s` contains phrase `p`.
    pub fn contains(&self, s: usize, p: usize) -> bool {
        self.sentence_phrases.get(s).is_some_and(|hits| hits.contains(&p))
    }

    /// Indices of sentences containing phrase `p`, in working order.
    pub fn sentences_with(&self, p: usize) -> Vec<usize> {
        (0..self.sentences.len())
            .filter(|&s| self.contains(s, p))
            .collect()
    }
}

fn cleaned(sentences: &[&str]) -> Vec<String> {
    sentences
        .iter()
        .map(|s| truncate_words(&clean_sentence(s), MAX_ANSWER_CHARS))
        .collect()
}

/// Collapse whitespace and make sure the sentence ends with terminal
/// punctuation.
pub fn clean_sentence(sentence: &str) -> String {
    let mut out = sentence.split_whitespace().collect::<Vec<_>>().join(" ");
    if !out.is_empty() && !out.ends_with(['.', '!', '?']) {
        out = out.trim_end_matches([',', ';', ':', '-']).to_string();
        out.push('.');
    }
    out
}

/// Truncate to at most `max` characters, cutting at a word boundary and
/// appending "...".
pub fn truncate_words(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let budget = max.saturating_sub(3);
    let head: String = text.chars().take(budget).collect();
    let cut = match head.rfind(' ') {
        Some(pos) if pos > 0 => &head[..pos],
        _ => head.as_str(),
    };
    format!("{}...", cut.trim_end_matches([',', ';', ':', '.', ' ']))
}

/// Word-boundary, case-insensitive phrase regex. Whitespace inside the phrase
/// also matches hyphens.
pub fn phrase_regex(phrase: &str) -> Option<Regex> {
    let words: Vec<String> = phrase.split_whitespace().map(regex::escape).collect();
    if words.is_empty() {
        return None;
    }
    Regex::new(&format!(r"(?i)\b{}\b", words.join(r"[\s\-]+"))).ok()
}

/// Uppercase the first character.
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Capitalise the first letter of every word.
pub fn title_case(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Kit title: the given title, else the first sentence cut to
/// [`MAX_TITLE_CHARS`], else [`UNTITLED`].
pub fn kit_title(given: Option<&str>, sentences: &[String]) -> String {
    if let Some(title) = given.map(str::trim).filter(|t| !t.is_empty()) {
        return title.to_string();
    }
    match sentences.first() {
        Some(first) => truncate_words(&clean_sentence(first), MAX_TITLE_CHARS + 3),
        None => UNTITLED.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_sentence() {
        assert_eq!(clean_sentence("  Cells   divide  "), "Cells divide.");
        assert_eq!(clean_sentence("Cells divide;"), "Cells divide.");
        assert_eq!(clean_sentence("Why?"), "Why?");
        assert_eq!(clean_sentence(""), "");
    }

    #[test]
    fn test_truncate_words() {
        assert_eq!(truncate_words("short", 10), "short");
        let cut = truncate_words("the quick brown fox jumps over the lazy dog", 20);
        assert_eq!(cut, "the quick brown...");
        assert!(cut.chars().count() <= 20);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("oxidative phosphorylation"), "Oxidative Phosphorylation");
    }

    #[test]
    fn test_kit_title() {
        let sentences = vec![
            "Mitochondria are the powerhouse of the cell and make ATP.".to_string(),
        ];
        assert_eq!(kit_title(Some("  Biology "), &sentences), "Biology");
        assert_eq!(kit_title(Some("  "), &sentences), "Mitochondria are the powerhouse of the...");
        assert_eq!(kit_title(None, &[]), UNTITLED);
    }
}
