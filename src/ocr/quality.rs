//! Transcript plausibility scoring.
//!
//! OCR engines return confident-looking garbage on bad segmentations. The
//! plausibility score rewards text that looks like English prose and
//! penalizes symbol noise, so the recognizer can choose between attempts.

use crate::config::QualityWeights;

/// Vowel share of letters in typical English text.
pub const ENGLISH_VOWEL_RATIO: f32 = 0.38;

/// Punctuation that does not count as noise.
const PROSE_PUNCTUATION: &[char] = &['.', ',', ';', ':', '\'', '"', '!', '?', '(', ')', '-'];

/// Score in `[0, 1]`; higher is more plausible.
///
/// `letters·letter_frac + vowels·vowel_score + token_length·token_score
/// − noise_penalty·noise_density`, clamped.
pub fn plausibility(text: &str, weights: &QualityWeights) -> f32 {
    let visible: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
    if visible.is_empty() {
        return 0.0;
    }
    let total = visible.len() as f32;
    let letters = visible.iter().filter(|c| c.is_alphabetic()).count() as f32;
    let vowels = visible
        .iter()
        .filter(|c| matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u'))
        .count() as f32;
    let noise = visible
        .iter()
        .filter(|c| !c.is_alphanumeric() && !PROSE_PUNCTUATION.contains(c))
        .count() as f32;

    let letter_frac = letters / total;
    let vowel_score = if letters > 0.0 {
        let ratio = vowels / letters;
        (1.0 - (ratio - ENGLISH_VOWEL_RATIO).abs() / ENGLISH_VOWEL_RATIO).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let score = weights.letters * letter_frac
        + weights.vowels * vowel_score
        + weights.token_length * token_length_score(text)
        - weights.noise_penalty * (noise / total);
    score.clamp(0.0, 1.0)
}

/// 1 for an average token length of 3 to 8 letters, falling off outside.
fn token_length_score(text: &str) -> f32 {
    let lengths: Vec<usize> = text
        .split_whitespace()
        .map(|t| t.chars().filter(|c| c.is_alphabetic()).count())
        .collect();
    if lengths.is_empty() {
        return 0.0;
    }
    let avg = lengths.iter().sum::<usize>() as f32 / lengths.len() as f32;
    if avg < 3.0 {
        avg / 3.0
    } else if avg <= 8.0 {
        1.0
    } else {
        (8.0 / avg).clamp(0.0, 1.0)
    }
}
