//! Quiz construction.
//!
//! Items are drafted in a fixed order (formula, concept/cloze pairs,
//! statements, study skills) until [`QUIZ_LEN`] slots are filled.

use super::options::{content_hash, OptionPicker};
use super::{capitalize, clean_sentence, phrase_regex, Context};
use crate::config::Difficulty;
use crate::kit::{QuestionKind, QuizItem, QUIZ_LEN};
use crate::lexical::{jaccard, token_set, too_similar};
use crate::utils::safe_float_cmp;

/// Question asked by formula items.
pub const FORMULA_QUESTION: &str = "Which of the following expressions appears in the material?";

/// Question asked by statement items.
pub const STATEMENT_QUESTION: &str =
    "Which of the following statements is supported by the material?";

/// Replacement for the blanked phrase in cloze items.
pub const BLANK: &str = "_____";

/// At most this many formula items per quiz.
pub const MAX_FORMULA_ITEMS: usize = 2;

/// False statements generated per statement item.
const MAX_CORRUPTIONS: usize = 12;

struct StudySkill {
    question: &'static str,
    answer: &'static str,
    distractors: [&'static str; 3],
}

const STUDY_SKILLS: [StudySkill; 10] = [
    StudySkill {
        question: "Which study habit improves long-term retention the most?",
        answer: "Spacing review sessions over several days.",
        distractors: [
            "Rereading the same page many times in one sitting.",
            "Highlighting every sentence in the chapter.",
            "Cramming only the night before the exam.",
        ],
    },
    StudySkill {
        question: "What is active recall?",
        answer: "Retrieving information from memory without looking at notes.",
        distractors: [
            "Copying notes into a new notebook word for word.",
            "Listening to a lecture recording at double speed.",
            "Skimming headings to feel familiar with a chapter.",
        ],
    },
    StudySkill {
        question: "Why is it useful to explain a topic in your own words?",
        answer: "It exposes gaps in understanding that rereading hides.",
        distractors: [
            "It lets you skip practice questions entirely.",
            "It guarantees the exact wording of the textbook.",
            "It removes any need to review later.",
        ],
    },
    StudySkill {
        question: "What should you do after getting a practice question wrong?",
        answer: "Work out why the correct answer is right and revisit the topic.",
        distractors: [
            "Move on quickly and avoid similar questions.",
            "Memorise the letter of the correct option.",
            "Assume the question was badly written.",
        ],
    },
    StudySkill {
        question: "How should a long study session be structured?",
        answer: "Short focused blocks separated by brief breaks.",
        distractors: [
            "One uninterrupted block of several hours.",
            "Switching subjects every minute to stay alert.",
            "Passive reading while checking messages.",
        ],
    },
    StudySkill {
        question: "What makes a good flashcard?",
        answer: "One clear question with one concise answer.",
        distractors: [
            "A full page of notes copied onto a single card.",
            "A vague keyword with no context on either side.",
            "Several unrelated facts combined together.",
        ],
    },
    StudySkill {
        question: "Which technique helps connect related ideas?",
        answer: "Drawing a concept map that links terms together.",
        distractors: [
            "Memorising each definition in isolation.",
            "Reading the glossary in alphabetical order.",
            "Rewriting the textbook index by hand.",
        ],
    },
    StudySkill {
        question: "When should new material first be reviewed?",
        answer: "Within a day of first learning it.",
        distractors: [
            "Only after the course has ended.",
            "Exactly one month later and never sooner.",
            "Never, since one reading is enough.",
        ],
    },
    StudySkill {
        question: "What is interleaving?",
        answer: "Mixing different topics or problem types within one session.",
        distractors: [
            "Studying one topic until it is perfect before moving on.",
            "Reading the same chapter in reverse order.",
            "Alternating between studying and watching videos.",
        ],
    },
    StudySkill {
        question: "How can you check whether you are ready for an exam?",
        answer: "Take a timed practice test without notes.",
        distractors: [
            "Count the hours spent reading.",
            "Check whether the notes look familiar.",
            "See whether every page has been highlighted.",
        ],
    },
];

/// An item before option selection.
struct Draft<'c> {
    kind: QuestionKind,
    question: String,
    correct: String,
    pool: Vec<&'c str>,
    explanation: Option<String>,
}

struct QuizBuilder<'p> {
    items: Vec<QuizItem>,
    picker: &'p OptionPicker,
    difficulty_offset: u32,
}

impl QuizBuilder<'_> {
    fn is_full(&self) -> bool {
        self.items.len() >= QUIZ_LEN
    }

    fn push(&mut self, draft: Draft<'_>) {
        if self.is_full() || draft.correct.trim().is_empty() {
            return;
        }
        let position = self.items.len();
        let offset = (position as u32 + self.difficulty_offset) % 4;
        let (options, answer_index) =
            self.picker
                .build(&draft.correct, draft.pool.iter().copied(), offset);
        let hash = content_hash(&format!("{}\n{}", draft.question, draft.correct));
        self.items.push(QuizItem {
            id: format!("q{}-{:08x}", position + 1, hash),
            kind: draft.kind,
            question: draft.question,
            options,
            answer_index,
            explanation: draft.explanation,
        });
    }
}

pub(crate) fn build_quiz(
    ctx: &Context<'_>,
    difficulty: Difficulty,
    picker: &OptionPicker,
) -> Vec<QuizItem> {
    let mut quiz = QuizBuilder {
        items: Vec::with_capacity(QUIZ_LEN),
        picker,
        difficulty_offset: difficulty.placement_offset(),
    };
    let mut used = vec![false; ctx.sentences.len()];

    formula_items(ctx, &mut quiz);
    concept_and_cloze_items(ctx, difficulty, &mut quiz, &mut used);
    statement_items(ctx, &mut quiz, &mut used);
    for skill in &STUDY_SKILLS {
        quiz.push(Draft {
            kind: QuestionKind::Statement,
            question: skill.question.to_string(),
            correct: skill.answer.to_string(),
            pool: skill.distractors.to_vec(),
            explanation: None,
        });
    }

    log::debug!("quiz: {} items", quiz.items.len());
    quiz.items
}

fn formula_items(ctx: &Context<'_>, quiz: &mut QuizBuilder<'_>) {
    for formula in ctx.formulas.iter().take(MAX_FORMULA_ITEMS) {
        let perturbed = perturb_formula(formula);
        let mut pool: Vec<&str> = ctx
            .formulas
            .iter()
            .filter(|f| *f != formula)
            .map(String::as_str)
            .collect();
        pool.extend(perturbed.iter().map(String::as_str));
        pool.extend(ctx.phrases.iter().copied());

        let core = strip_delimiters(formula);
        let explanation = ctx
            .sentences
            .iter()
            .find(|s| s.contains(formula.as_str()) || (!core.is_empty() && s.contains(core)))
            .map(|s| clean_sentence(s));

        quiz.push(Draft {
            kind: QuestionKind::Formula,
            question: FORMULA_QUESTION.to_string(),
            correct: formula.clone(),
            pool,
            explanation,
        });
    }
}

fn concept_and_cloze_items(
    ctx: &Context<'_>,
    difficulty: Difficulty,
    quiz: &mut QuizBuilder<'_>,
    used: &mut [bool],
) {
    for (p, phrase) in ctx.phrases.iter().enumerate() {
        if quiz.is_full() {
            break;
        }
        let Some(support) = ctx.support.get(p).copied().flatten() else {
            continue;
        };
        used[support] = true;

        let concept = concept_draft(ctx, p, phrase, support, difficulty);
        let cloze = cloze_draft(ctx, p, phrase, support, used);
        match difficulty {
            Difficulty::Balanced => {
                quiz.push(concept);
                if let Some(cloze) = cloze {
                    quiz.push(cloze);
                }
            }
            Difficulty::Harder => {
                if let Some(cloze) = cloze {
                    quiz.push(cloze);
                }
                quiz.push(concept);
            }
        }
    }
}

fn concept_draft<'c>(
    ctx: &'c Context<'_>,
    p: usize,
    phrase: &str,
    support: usize,
    difficulty: Difficulty,
) -> Draft<'c> {
    let correct = ctx.cleaned[support].clone();
    let mut primary: Vec<&str> = (0..ctx.cleaned.len())
        .filter(|&s| s != support && !ctx.contains(s, p))
        .map(|s| ctx.cleaned[s].as_str())
        .collect();
    if difficulty == Difficulty::Harder {
        let answer_set = token_set(&correct);
        let mut scored: Vec<(f32, &str)> = primary
            .iter()
            .map(|c| (jaccard(&token_set(c), &answer_set), *c))
            .collect();
        scored.sort_by(|a, b| safe_float_cmp(b.0, a.0));
        primary = scored.into_iter().map(|(_, c)| c).collect();
    }
    let mut pool = primary;
    pool.extend(ctx.cleaned.iter().map(String::as_str));
    pool.extend(ctx.phrases.iter().copied());

    Draft {
        kind: QuestionKind::Concept,
        question: format!("Which statement best describes \"{}\"?", phrase),
        correct,
        pool,
        explanation: None,
    }
}

fn cloze_draft<'c>(
    ctx: &'c Context<'_>,
    p: usize,
    phrase: &str,
    support: usize,
    used: &mut [bool],
) -> Option<Draft<'c>> {
    let candidates = ctx.sentences_with(p);
    let sentence = candidates
        .iter()
        .copied()
        .find(|&s| s != support)
        .unwrap_or(support);

    let blanked = blank_phrase(&ctx.cleaned[sentence], phrase)
        .or_else(|| blank_phrase(&clean_sentence(ctx.sentences[sentence]), phrase))?;
    used[sentence] = true;

    let width = phrase.split_whitespace().count();
    let mut pool: Vec<&str> = ctx
        .phrases
        .iter()
        .enumerate()
        .filter(|(q, other)| *q != p && other.split_whitespace().count() == width)
        .map(|(_, other)| *other)
        .collect();
    pool.extend(
        ctx.phrases
            .iter()
            .enumerate()
            .filter(|(q, _)| *q != p)
            .map(|(_, other)| *other),
    );

    Some(Draft {
        kind: QuestionKind::Cloze,
        question: format!("Fill in the blank: {}", blanked),
        correct: phrase.to_string(),
        pool,
        explanation: Some(clean_sentence(ctx.sentences[sentence])),
    })
}

fn statement_items(ctx: &Context<'_>, quiz: &mut QuizBuilder<'_>, used: &mut [bool]) {
    for s in 0..ctx.sentences.len() {
        if quiz.is_full() {
            break;
        }
        if used[s] {
            continue;
        }
        used[s] = true;
        let corruptions = corrupted_statements(ctx, s);
        let mut pool: Vec<&str> = corruptions.iter().map(String::as_str).collect();
        pool.extend(ctx.phrases.iter().copied());
        quiz.push(Draft {
            kind: QuestionKind::Statement,
            question: STATEMENT_QUESTION.to_string(),
            correct: ctx.cleaned[s].clone(),
            pool,
            explanation: None,
        });
    }
}

/// False statements: other sentences with one key phrase swapped for a
/// different key phrase.
fn corrupted_statements(ctx: &Context<'_>, skip: usize) -> Vec<String> {
    let n = ctx.phrases.len();
    let mut out = Vec::new();
    for (s, hits) in ctx.sentence_phrases.iter().enumerate() {
        if out.len() >= MAX_CORRUPTIONS {
            break;
        }
        let Some(&p) = hits.first() else {
            continue;
        };
        if s == skip {
            continue;
        }
        let phrase = ctx.phrases[p];
        let replacement = (1..n)
            .map(|step| (p + step) % n)
            .find(|&q| !hits.contains(&q) && !too_similar(ctx.phrases[q], phrase, 0.7))
            .map(|q| ctx.phrases[q]);
        if let Some(false_statement) =
            replacement.and_then(|r| swap_phrase(&ctx.cleaned[s], phrase, r))
        {
            out.push(false_statement);
        }
    }
    out
}

/// Replace every occurrence of `phrase` with [`BLANK`].
pub fn blank_phrase(sentence: &str, phrase: &str) -> Option<String> {
    let re = phrase_regex(phrase)?;
    if !re.is_match(sentence) {
        return None;
    }
    Some(re.replace_all(sentence, BLANK).into_owned())
}

/// Replace the first occurrence of `phrase` with `replacement`, keeping a
/// leading capital.
pub fn swap_phrase(sentence: &str, phrase: &str, replacement: &str) -> Option<String> {
    let re = phrase_regex(phrase)?;
    if !re.is_match(sentence) {
        return None;
    }
    let swapped = re.replacen(sentence, 1, |caps: &regex::Captures<'_>| {
        let capitalised = caps[0].chars().next().is_some_and(char::is_uppercase);
        if capitalised {
            capitalize(replacement)
        } else {
            replacement.to_string()
        }
    });
    Some(swapped.into_owned())
}

fn strip_delimiters(formula: &str) -> &str {
    let trimmed = formula.trim();
    for (open, close) in [("$$", "$$"), ("$", "$"), ("\\[", "\\]"), ("\\(", "\\)")] {
        if let Some(inner) = trimmed
            .strip_prefix(open)
            .and_then(|rest| rest.strip_suffix(close))
        {
            return inner.trim();
        }
    }
    trimmed
}

/// Deterministic near-miss variants of a formula: the first digit shifted by
/// one and two, then the first and last single-letter variables shifted.
pub fn perturb_formula(formula: &str) -> Vec<String> {
    let chars: Vec<char> = formula.chars().collect();
    let mut variants = Vec::new();

    if let Some(pos) = chars.iter().position(|c| c.is_ascii_digit()) {
        for shift in [1, 2] {
            let digit = chars[pos].to_digit(10).unwrap_or(0);
            let shifted = char::from_digit((digit + shift) % 10, 10).unwrap_or('0');
            variants.push(replace_at(&chars, pos, shifted));
        }
    }

    let variables: Vec<usize> = (0..chars.len())
        .filter(|&i| chars[i].is_ascii_alphabetic())
        .filter(|&i| i == 0 || (!chars[i - 1].is_ascii_alphabetic() && chars[i - 1] != '\\'))
        .filter(|&i| i + 1 >= chars.len() || !chars[i + 1].is_ascii_alphabetic())
        .collect();
    if let Some(&first) = variables.first() {
        variants.push(replace_at(&chars, first, shift_letter(chars[first], 1)));
    }
    if let Some(&last) = variables.last() {
        variants.push(replace_at(&chars, last, shift_letter(chars[last], 2)));
    }

    let mut distinct: Vec<String> = Vec::new();
    for v in variants {
        if v != formula && !distinct.contains(&v) {
            distinct.push(v);
        }
    }
    distinct
}

fn replace_at(chars: &[char], pos: usize, with: char) -> String {
    chars
        .iter()
        .enumerate()
        .map(|(i, c)| if i == pos { with } else { *c })
        .collect()
}

fn shift_letter(c: char, by: u8) -> char {
    let base = if c.is_ascii_uppercase() { b'A' } else { b'a' };
    let offset = (c as u8 - base + by) % 26;
    (base + offset) as char
}
