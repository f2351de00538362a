//! The study kit returned to callers.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Number of quiz items in every kit.
pub const QUIZ_LEN: usize = 10;

/// Maximum number of flashcards in a kit.
pub const MAX_FLASHCARDS: usize = 12;

/// Number of days in every plan.
pub const PLAN_DAYS: usize = 7;

/// Objectives per plan day.
pub const OBJECTIVES_PER_DAY: usize = 3;

/// Question type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    /// Pick the sentence that describes a key phrase
    Concept,
    /// Fill the blanked key phrase
    Cloze,
    /// Pick the expression that appears in the material
    Formula,
    /// Pick the supported statement
    Statement,
}

/// A multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizItem {
    /// Stable identifier derived from position and content
    pub id: String,
    /// Question type
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    /// Question text
    pub question: String,
    /// Exactly four options
    pub options: [String; 4],
    /// Index of the correct option
    pub answer_index: usize,
    /// Optional explanation shown after answering
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl QuizItem {
    /// The correct option.
    pub fn answer(&self) -> &str {
        &self.options[self.answer_index]
    }
}

/// A term/definition card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    /// Prompt side
    pub front: String,
    /// Answer side, ending in a period, at most 280 characters
    pub back: String,
}

/// One day of the study plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanDay {
    /// Day number, 1 through 7
    pub day: u8,
    /// Day title
    pub title: String,
    /// Exactly three objectives
    pub objectives: [String; OBJECTIVES_PER_DAY],
}

/// Quiz, flashcards and plan generated from one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyKit {
    /// Kit title
    pub title: String,
    /// Exactly ten questions
    pub quiz: Vec<QuizItem>,
    /// Up to twelve cards
    pub flashcards: Vec<Flashcard>,
    /// Exactly seven days
    pub plan: Vec<PlanDay>,
}

impl StudyKit {
    /// Render as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
