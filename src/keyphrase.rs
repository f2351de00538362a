//! Key-phrase extraction.
//!
//! Candidates are unigrams, bigrams and trigrams counted within punctuation
//! segments, scored by `count × ln(1 + count)`. A refinement pass keeps only
//! phrases that are grounded in a retained sentence and are not near-copies
//! of a phrase already accepted.

use crate::config::KeyPhraseConfig;
use crate::lexical::{jaccard, morph_set};
use crate::text::headings::is_heading;
use crate::utils::safe_float_cmp;
use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{BTreeSet, HashSet};

lazy_static! {
    static ref RE_TOKEN: Regex = Regex::new(r"[A-Za-z][A-Za-z\-']+").unwrap();

    /// n-grams never span these
    static ref RE_SEGMENT_BREAK: Regex = Regex::new(r#"[.!?;:,()\[\]{}"\n]+"#).unwrap();

    /// Contact details, affiliations and legal lines
    static ref RE_AUTHOR_LINE: Regex = Regex::new(
        r"(?i)\b(professor|lecturer|instructor|author|authors|department\s+of|university|faculty|ph\.?\s?d|e-?mail|copyright|all\s+rights\s+reserved)\b|@|https?://|www\."
    ).unwrap();

    static ref STOPWORDS: HashSet<&'static str> = [
        "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "have", "if", "in",
        "into", "is", "it", "its", "of", "on", "that", "the", "to", "was", "were", "will", "with",
        "this", "those", "these", "your", "you", "i", "we", "our", "us", "their", "they", "them",
        "he", "she", "his", "her", "or", "nor", "not", "but", "than", "then", "so", "too", "very",
        "can", "just", "should", "would", "could", "about", "above", "after", "again", "against",
        "all", "am", "any", "because", "been", "before", "being", "below", "between", "both",
        "did", "do", "does", "doing", "down", "during", "each", "few", "further", "here", "how",
        "more", "most", "other", "over", "own", "same", "some", "such", "under", "until", "up",
        "when", "where", "which", "while", "who", "whom", "why", "what", "there", "also",
        "yourself", "themselves", "itself", "ourselves", "myself", "don't", "can't", "won't",
        "shouldn't", "couldn't", "isn't", "aren't", "wasn't", "weren't", "i'm", "you're",
        "we're", "they're", "it's", "that's", "there's", "here's", "what's", "who's", "didn't",
        "haven't", "hasn't", "hadn't", "doesn't", "wouldn't", "mustn't", "mightn't", "needn't",
    ]
    .into_iter()
    .collect();

    /// Document furniture: any phrase containing one of these is dropped
    static ref BANNED_TOKENS: HashSet<&'static str> = [
        "chapter", "section", "figure", "fig", "table", "page", "pages", "lecture", "lectures",
        "slide", "slides", "unit", "module", "appendix", "contents", "university", "professor",
        "lecturer", "copyright", "http", "https", "www", "com", "pdf", "camscanner", "scanned",
        "exercise", "exercises", "homework", "assignment", "quiz", "exam", "et", "al",
    ]
    .into_iter()
    .collect();

    /// Too generic to study on their own
    static ref GENERIC_WORDS: HashSet<&'static str> = [
        "however", "therefore", "thus", "hence", "using", "used", "use", "uses", "one", "two",
        "three", "first", "second", "third", "many", "much", "may", "might", "must", "make",
        "makes", "made", "well", "like", "within", "without", "often", "called", "known",
        "different", "important", "various", "example", "examples", "following", "based",
        "number", "new", "way", "ways", "part", "type", "types", "result", "results", "shown",
        "show", "shows", "given", "thing", "things", "lot", "get", "gets", "also", "another",
        "every", "several", "certain", "usually", "generally", "called", "means", "mean",
        "include", "includes", "including", "introduction", "conclusion", "summary", "notes",
        "overview", "review", "today", "students", "student", "class",
    ]
    .into_iter()
    .collect();

    static ref BANNED_PHRASES: HashSet<&'static str> = [
        "for example", "such as", "as well", "in order", "in addition", "in general",
        "on the other hand", "learning objectives", "key terms", "study guide",
    ]
    .into_iter()
    .collect();
}

/// A scored, sentence-grounded key phrase.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyPhrase {
    /// Lowercase phrase of one to three tokens
    pub text: String,
    /// `count × ln(1 + count)`
    pub score: f32,
    /// Index of the first retained sentence containing the phrase
    pub support: usize,
}

impl KeyPhrase {
    /// Number of tokens in the phrase.
    pub fn token_count(&self) -> usize {
        self.text.split(' ').count()
    }
}

/// Ranked candidate before refinement.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Lowercase phrase
    pub text: String,
    /// Occurrence count
    pub count: usize,
    /// `count × ln(1 + count)`
    pub score: f32,
}

/// Key-phrase extractor.
#[derive(Debug, Clone)]
pub struct KeyPhraseExtractor {
    config: KeyPhraseConfig,
    near_duplicate: f32,
}

impl Default for KeyPhraseExtractor {
    fn default() -> Self {
        Self::new(KeyPhraseConfig::default(), 0.7)
    }
}

impl KeyPhraseExtractor {
    /// Create an extractor; `near_duplicate` is the Jaccard threshold for
    /// morphological near-duplicates.
    pub fn new(config: KeyPhraseConfig, near_duplicate: f32) -> Self {
        Self { config, near_duplicate }
    }

    /// Rank candidates: multi-word phrases first up to the cap, then
    /// unigrams, then the remaining multi-word phrases.
    pub fn rank(&self, text: &str) -> Vec<Candidate> {
        let mut unigrams: IndexMap<String, usize> = IndexMap::new();
        let mut ngrams: IndexMap<String, usize> = IndexMap::new();

        for segment in segments(text) {
            let tokens = segment_tokens(segment);
            for (i, token) in tokens.iter().enumerate() {
                if !is_stopword(token) {
                    *unigrams.entry(token.clone()).or_insert(0) += 1;
                }
                for n in 2..=3 {
                    if i + n > tokens.len() {
                        break;
                    }
                    let window = &tokens[i..i + n];
                    if is_stopword(&window[0])
                        || is_stopword(&window[n - 1])
                        || window.iter().all(|t| *t == window[0])
                    {
                        continue;
                    }
                    *ngrams.entry(window.join(" ")).or_insert(0) += 1;
                }
            }
        }

        let unigrams = sorted_candidates(unigrams, 1);
        let multi = sorted_candidates(ngrams, self.config.min_ngram_count);
        let cap = self.config.multiword_cap.min(multi.len());

        let mut ranked = Vec::with_capacity(unigrams.len() + multi.len());
        ranked.extend(multi[..cap].iter().cloned());
        ranked.extend(unigrams);
        ranked.extend(multi[cap..].iter().cloned());
        ranked
    }

    /// Extract up to `k` refined phrases grounded in `sentences`.
    pub fn extract(&self, text: &str, sentences: &[String]) -> Vec<KeyPhrase> {
        let sentence_segments: Vec<Vec<Vec<String>>> = sentences
            .iter()
            .map(|s| segments(s).map(segment_tokens).collect())
            .collect();

        let mut accepted: Vec<KeyPhrase> = Vec::new();
        let mut accepted_sets: Vec<BTreeSet<String>> = Vec::new();

        for candidate in self.rank(text) {
            if accepted.len() >= self.config.k {
                break;
            }
            let tokens: Vec<&str> = candidate.text.split(' ').collect();
            if tokens.iter().any(|t| t.chars().count() < 3) || is_banned(&candidate.text, &tokens) {
                continue;
            }
            let Some(support) = find_support(&tokens, &sentence_segments) else {
                continue;
            };
            if looks_like_front_matter(&sentences[support]) {
                continue;
            }
            let set = morph_set(&candidate.text);
            if accepted_sets.iter().any(|other| *other == set || jaccard(other, &set) >= self.near_duplicate) {
                continue;
            }
            accepted_sets.push(set);
            accepted.push(KeyPhrase {
                text: candidate.text,
                score: candidate.score,
                support,
            });
        }

        log::debug!(
            "Accepted {} key phrases: {:?}",
            accepted.len(),
            accepted.iter().map(|p| p.text.as_str()).collect::<Vec<_>>()
        );
        accepted
    }
}

fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(token)
}

fn segments(text: &str) -> impl Iterator<Item = &str> {
    RE_SEGMENT_BREAK.split(text).filter(|s| !s.trim().is_empty())
}

/// Lowercase tokens of one segment, with dangling hyphens and apostrophes
/// trimmed.
fn segment_tokens(segment: &str) -> Vec<String> {
    RE_TOKEN
        .find_iter(segment)
        .map(|m| m.as_str().trim_end_matches(['-', '\'']).to_lowercase())
        .filter(|t| t.chars().count() >= 2)
        .collect()
}

fn sorted_candidates(counts: IndexMap<String, usize>, min_count: usize) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = counts
        .into_iter()
        .filter(|(_, count)| *count >= min_count)
        .map(|(text, count)| Candidate {
            text,
            count,
            score: count as f32 * (1.0 + count as f32).ln(),
        })
        .collect();
    // stable: ties keep first-appearance order
    candidates.sort_by(|a, b| safe_float_cmp(b.score, a.score));
    candidates
}

fn is_banned(phrase: &str, tokens: &[&str]) -> bool {
    if BANNED_PHRASES.contains(phrase) || tokens.iter().any(|t| BANNED_TOKENS.contains(t)) {
        return true;
    }
    match tokens {
        [single] => GENERIC_WORDS.contains(single),
        _ => false,
    }
}

/// First sentence with the phrase as a contiguous token run in one segment.
fn find_support(tokens: &[&str], sentence_segments: &[Vec<Vec<String>>]) -> Option<usize> {
    sentence_segments.iter().position(|segments| {
        segments.iter().any(|seg| {
            seg.len() >= tokens.len()
                && seg
                    .windows(tokens.len())
                    .any(|w| w.iter().zip(tokens).all(|(a, b)| a == b))
        })
    })
}

/// Heading-like or author-biography sentence.
fn looks_like_front_matter(sentence: &str) -> bool {
    is_heading(sentence) || RE_AUTHOR_LINE.is_match(sentence)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentences(text: &str) -> Vec<String> {
        crate::text::SentenceSegmenter::new().segment_str(text)
    }

    #[test]
    fn test_scoring_formula() {
        let extractor = KeyPhraseExtractor::default();
        let ranked = extractor.rank("enzyme enzyme enzyme. substrate.");
        let enzyme = ranked.iter().find(|c| c.text == "enzyme").unwrap();
        assert_eq!(enzyme.count, 3);
        assert!((enzyme.score - 3.0 * 4f32.ln()).abs() < 1e-5);
    }

    #[test]
    fn test_multiword_preferred() {
        let text = "The cell membrane controls transport. The cell membrane is thin. \
                    Proteins fold. Proteins bind. Proteins move. Proteins signal.";
        let ranked = KeyPhraseExtractor::default().rank(text);
        assert_eq!(ranked[0].text, "cell membrane");
        assert_eq!(ranked[1].text, "proteins");
    }

    #[test]
    fn test_ngrams_skip_stopword_edges() {
        let ranked = KeyPhraseExtractor::default().rank("law of motion. law of motion.");
        assert!(ranked.iter().any(|c| c.text == "law of motion"));
        assert!(!ranked.iter().any(|c| c.text == "law of"));
    }

    #[test]
    fn test_ngrams_do_not_cross_punctuation() {
        let ranked = KeyPhraseExtractor::default().rank("alpha, beta. alpha, beta.");
        assert!(!ranked.iter().any(|c| c.text == "alpha beta"));
    }

    #[test]
    fn test_requires_supporting_sentence() {
        let text = "Oxidative phosphorylation drives energy production in every living cell. glycolysis";
        let sents = sentences(text);
        let phrases = KeyPhraseExtractor::default().extract(text, &sents);
        assert!(phrases.iter().any(|p| p.text == "phosphorylation"));
        assert!(!phrases.iter().any(|p| p.text == "glycolysis"));
        assert!(phrases.iter().all(|p| p.support == 0));
    }

    #[test]
    fn test_ban_list_and_short_tokens() {
        let text = "The chapter explains how ATP powers muscle contraction in skeletal tissue. \
                    However the chapter also explains how ATP powers neurons too.";
        let sents = sentences(text);
        let phrases = KeyPhraseExtractor::default().extract(text, &sents);
        assert!(!phrases.iter().any(|p| p.text.contains("chapter")));
        assert!(!phrases.iter().any(|p| p.text == "however"));
        assert!(phrases.iter().any(|p| p.text == "powers"));
    }

    #[test]
    fn test_near_duplicates_excluded() {
        let text = "Enzymes speed reactions inside cells and tissues of the body. \
                    Each enzyme binds a substrate at its active site very specifically.";
        let sents = sentences(text);
        let phrases = KeyPhraseExtractor::default().extract(text, &sents);
        let enzyme_like = phrases.iter().filter(|p| p.text.starts_with("enzyme")).count();
        assert_eq!(enzyme_like, 1);
    }

    #[test]
    fn test_author_lines_rejected() {
        let text = "Written by Professor Alan Smith of the Department of Biology at the university. \
                    Ribosomes translate messenger RNA into chains of amino acids.";
        let sents = sentences(text);
        let phrases = KeyPhraseExtractor::default().extract(text, &sents);
        assert!(!phrases.iter().any(|p| p.text == "smith" || p.text == "alan"));
        assert!(phrases.iter().any(|p| p.text == "ribosomes"));
    }

    #[test]
    fn test_respects_k() {
        let config = KeyPhraseConfig {
            k: 3,
            ..KeyPhraseConfig::default()
        };
        let text = "Mitosis produces two identical daughter cells after replication of chromosomes.";
        let sents = sentences(text);
        assert_eq!(KeyPhraseExtractor::new(config, 0.7).extract(text, &sents).len(), 3);
    }
}
