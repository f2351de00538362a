//! Seven-day study plan.

use super::{clean_sentence, title_case, truncate_words, Context, MAX_OBJECTIVE_CHARS};
use crate::kit::{PlanDay, OBJECTIVES_PER_DAY, PLAN_DAYS};

/// Objective templates, rotated per day. `{}` is the day's phrase.
const TEMPLATES: [&str; 7] = [
    "Review your notes on {}.",
    "Write a one-sentence definition of {}.",
    "Create three flashcards about {}.",
    "Answer two practice questions on {}.",
    "Explain {} aloud as if teaching a classmate.",
    "Draw a mind map linking {} to related ideas.",
    "Re-take the quiz items that mention {}.",
];

const SYNTHESIS_OBJECTIVES: [&str; OBJECTIVES_PER_DAY] = [
    "Re-take the full quiz and note every missed question.",
    "Summarise the material in five sentences without notes.",
    "Review each flashcard you marked as difficult.",
];

const REVIEW_OBJECTIVES: [&str; OBJECTIVES_PER_DAY] = [
    "Recall yesterday's key ideas before opening your notes.",
    "Write down one question you still have.",
    "Test yourself on today's flashcards.",
];

/// Title used for a cluster with no recognisable phrase.
const KEY_IDEAS: &str = "Key Ideas";

pub(crate) fn build_plan(ctx: &Context<'_>) -> Vec<PlanDay> {
    match ctx.clusters {
        Some(clusters) if !clusters.is_empty() => cluster_plan(ctx, clusters),
        _ => phrase_plan(ctx),
    }
}

fn phrase_plan(ctx: &Context<'_>) -> Vec<PlanDay> {
    (0..PLAN_DAYS)
        .map(|d| match ctx.phrases.get(d) {
            Some(phrase) => PlanDay {
                day: day_number(d),
                title: format!("Day {}: {}", d + 1, title_case(phrase)),
                objectives: std::array::from_fn(|j| {
                    TEMPLATES[(d + j) % TEMPLATES.len()].replace("{}", phrase)
                }),
            },
            None => synthesis_day(d),
        })
        .collect()
}

fn cluster_plan(ctx: &Context<'_>, clusters: &[Vec<usize>]) -> Vec<PlanDay> {
    let days = clusters.len().min(PLAN_DAYS);
    let titles: Vec<Option<usize>> = (0..days)
        .map(|d| dominant_phrase(ctx, &clusters[d]).or(Some(d).filter(|&d| d < ctx.phrases.len())))
        .collect();

    let mut spare = (0..ctx.phrases.len()).filter(|p| !titles.contains(&Some(*p)));

    (0..PLAN_DAYS)
        .map(|d| {
            if d >= days {
                return synthesis_day(d);
            }
            let title = match titles[d] {
                Some(p) => ctx.phrases[p].to_string(),
                None => KEY_IDEAS.to_string(),
            };
            let mut objectives: Vec<String> = clusters[d]
                .iter()
                .take(OBJECTIVES_PER_DAY)
                .map(|&s| {
                    let sentence = clean_sentence(ctx.sentences[s]);
                    format!("Study: {}", truncate_words(&sentence, MAX_OBJECTIVE_CHARS))
                })
                .collect();
            while objectives.len() < OBJECTIVES_PER_DAY {
                match spare.next() {
                    Some(p) => objectives.push(format!("Review concept: {}", ctx.phrases[p])),
                    None => break,
                }
            }
            let mut generic = REVIEW_OBJECTIVES.iter();
            while objectives.len() < OBJECTIVES_PER_DAY {
                objectives.push(generic.next().copied().unwrap_or_default().to_string());
            }
            PlanDay {
                day: day_number(d),
                title: format!("Day {}: {}", d + 1, title),
                objectives: into_objectives(objectives),
            }
        })
        .collect()
}

/// Phrase occurring in the most cluster sentences; ties go to the higher
/// ranked phrase.
fn dominant_phrase(ctx: &Context<'_>, members: &[usize]) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None;
    for p in 0..ctx.phrases.len() {
        let count = members.iter().filter(|&&s| ctx.contains(s, p)).count();
        if count > 0 && best.map_or(true, |(_, c)| count > c) {
            best = Some((p, count));
        }
    }
    best.map(|(p, _)| p)
}

fn synthesis_day(d: usize) -> PlanDay {
    PlanDay {
        day: day_number(d),
        title: format!("Day {}: Synthesis", d + 1),
        objectives: SYNTHESIS_OBJECTIVES.map(str::to_string),
    }
}

fn day_number(d: usize) -> u8 {
    u8::try_from(d + 1).unwrap_or(u8::MAX)
}

fn into_objectives(objectives: Vec<String>) -> [String; OBJECTIVES_PER_DAY] {
    let mut it = objectives.into_iter();
    std::array::from_fn(|_| it.next().unwrap_or_default())
}
