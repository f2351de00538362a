//! Flashcard construction.

use super::{clean_sentence, truncate_words, Context, MAX_BACK_CHARS};
use crate::kit::{Flashcard, MAX_FLASHCARDS};
use crate::semantic::similarity::cosine;
use std::collections::HashSet;

/// Front of padding cards.
pub const KEY_IDEA: &str = "Key idea?";

/// A supporting sentence at least this long is preferred for card backs.
const MIN_SUPPORT_CHARS: usize = 60;

/// Back text: cleaned, ending in a period and cut at a word boundary.
pub fn card_back(sentence: &str) -> String {
    let cleaned = clean_sentence(sentence);
    let body = cleaned.trim_end_matches(['.', '!', '?']).trim_end();
    if body.is_empty() {
        return String::new();
    }
    truncate_words(&format!("{}.", body), MAX_BACK_CHARS)
}

struct Deck<'c> {
    ctx: &'c Context<'c>,
    cards: Vec<Flashcard>,
    used: Vec<bool>,
    backs: HashSet<String>,
    strict_cosine: f32,
}

impl Deck<'_> {
    fn is_full(&self) -> bool {
        self.cards.len() >= MAX_FLASHCARDS
    }

    /// Add a card backed by sentence `s`; duplicates are skipped.
    fn add(&mut self, front: String, s: usize) -> bool {
        let back = card_back(self.ctx.sentences[s]);
        if back.is_empty() || !self.backs.insert(back.to_lowercase()) {
            return false;
        }
        if let Some(embeddings) = self.ctx.embeddings {
            let near = self
                .used
                .iter()
                .enumerate()
                .filter(|(_, used)| **used)
                .any(|(t, _)| match (embeddings.get(t), embeddings.get(s)) {
                    (Some(a), Some(b)) => cosine(a, b) > self.strict_cosine,
                    _ => false,
                });
            if near {
                return false;
            }
        }
        self.used[s] = true;
        self.cards.push(Flashcard { front, back });
        true
    }
}

pub(crate) fn build_flashcards(ctx: &Context<'_>, strict_cosine: f32) -> Vec<Flashcard> {
    let mut deck = Deck {
        ctx,
        cards: Vec::new(),
        used: vec![false; ctx.sentences.len()],
        backs: HashSet::new(),
        strict_cosine,
    };

    for (p, phrase) in ctx.phrases.iter().enumerate() {
        if deck.is_full() {
            break;
        }
        if let Some(s) = card_support(ctx, p) {
            deck.add(format!("Define: {}", phrase), s);
        }
    }

    let mut order: Vec<usize> = (0..ctx.sentences.len()).collect();
    if ctx.embeddings.is_none() {
        order.sort_by_key(|&s| std::cmp::Reverse(ctx.sentences[s].chars().count()));
    }
    for s in order {
        if deck.is_full() {
            break;
        }
        if !deck.used[s] {
            deck.add(KEY_IDEA.to_string(), s);
        }
    }

    deck.cards
}

/// Sentence backing a phrase card: the embedding choice when reranked,
/// otherwise the first long supporting sentence, otherwise any.
fn card_support(ctx: &Context<'_>, p: usize) -> Option<usize> {
    if ctx.embeddings.is_some() {
        return ctx.support.get(p).copied().flatten();
    }
    let candidates = ctx.sentences_with(p);
    candidates
        .iter()
        .copied()
        .find(|&s| ctx.sentences[s].chars().count() >= MIN_SUPPORT_CHARS)
        .or_else(|| candidates.first().copied())
}
