//! Deterministic option selection and placement.
//!
//! Every multiple-choice item is built from a correct answer and a cascade of
//! candidate pools. Candidates that are near-duplicates of an option already
//! chosen are skipped, and fixed filler strings guarantee four options. The
//! answer position is a pure function of the answer text.

use crate::lexical::{morph_key, too_similar};

/// Fillers used when the pools cannot supply three distinct distractors.
///
/// They are pairwise dissimilar so any three of them can coexist.
pub const GENERIC_DISTRACTORS: &[&str] = &[
    "A related but inaccurate claim about the topic.",
    "An unrelated statement that does not follow from the text.",
    "A plausible but incorrect detail about the material.",
    "A misinterpretation of the concept discussed.",
    "None of the listed choices is described in the notes.",
    "Something the source never mentions.",
    "An exaggerated generalisation drawn from one example.",
    "A reversal of cause and effect.",
];

/// Content hash used for answer placement: `h = h * 31 + code_point`,
/// wrapping at 32 bits, over the Unicode scalar values of `text`.
///
/// ```
/// use study_oxide::synth::options::content_hash;
///
/// assert_eq!(content_hash(""), 0);
/// assert_eq!(content_hash("ab"), 97 * 31 + 98);
/// ```
pub fn content_hash(text: &str) -> u32 {
    text.chars()
        .fold(0u32, |h, c| h.wrapping_mul(31).wrapping_add(c as u32))
}

/// Answer position: `(hash(correct) + offset) mod 4`.
pub fn answer_position(correct: &str, offset: u32) -> usize {
    (content_hash(correct).wrapping_add(offset) % 4) as usize
}

/// Place the correct answer at its deterministic position; distractors fill
/// the remaining slots in order.
pub fn place(correct: String, distractors: [String; 3], offset: u32) -> ([String; 4], usize) {
    let index = answer_position(&correct, offset);
    let mut rest = distractors.into_iter();
    let mut slot = |i: usize| {
        if i == index {
            correct.clone()
        } else {
            rest.next().unwrap_or_default()
        }
    };
    let options = [slot(0), slot(1), slot(2), slot(3)];
    (options, index)
}

/// Selects three distractors that are distinct from the answer and from each
/// other.
#[derive(Debug, Clone, Copy)]
pub struct OptionPicker {
    threshold: f32,
}

impl OptionPicker {
    /// `threshold` is the Jaccard similarity at which candidates are rejected.
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    /// Whether `candidate` may join `chosen`.
    pub fn admits(&self, chosen: &[String], candidate: &str) -> bool {
        let candidate = candidate.trim();
        if candidate.is_empty() {
            return false;
        }
        let key = morph_key(candidate);
        chosen
            .iter()
            .all(|c| morph_key(c) != key && !too_similar(c, candidate, self.threshold))
    }

    /// Walk the pools in order, then [`GENERIC_DISTRACTORS`], collecting
    /// three distractors for `correct`.
    pub fn distractors<'a, I>(&self, correct: &str, pools: I) -> [String; 3]
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut chosen: Vec<String> = vec![correct.to_string()];
        let generics: &[&'a str] = GENERIC_DISTRACTORS;
        let generics = generics.iter().copied();
        for candidate in pools.into_iter().chain(generics) {
            if chosen.len() == 4 {
                break;
            }
            if self.admits(&chosen, candidate) {
                chosen.push(candidate.trim().to_string());
            }
        }
        // filler strings are pairwise distinct, so this only triggers when
        // the answer itself collides with several of them
        let mut n = 1;
        while chosen.len() < 4 {
            let filler = format!("Option {} is not supported by the material.", n);
            if self.admits(&chosen, &filler) || n > 8 {
                chosen.push(filler);
            }
            n += 1;
        }
        let mut it = chosen.into_iter().skip(1);
        [
            it.next().unwrap_or_default(),
            it.next().unwrap_or_default(),
            it.next().unwrap_or_default(),
        ]
    }

    /// Distractors plus placement in one step.
    pub fn build<'a, I>(&self, correct: &str, pools: I, offset: u32) -> ([String; 4], usize)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let distractors = self.distractors(correct, pools);
        place(correct.to_string(), distractors, offset)
    }
}
