// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::type_complexity)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]
// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]

//! # Study Oxide
//!
//! Deterministic study-kit synthesis: a ten-item quiz, up to twelve
//! flashcards and a seven-day study plan from pasted text, digital pages or
//! scans.
//!
//! ## Pipeline
//!
//! - **Extraction**: text layers first; OCR only for pages that need it,
//!   under a document-wide time budget
//! - **OCR**: deskew, contrast stretch, adaptive binarization, column
//!   detection, multi-strategy recognition scored by plausibility, and
//!   rule-based correction of common engine confusions
//! - **Text**: watermark and page-number removal, hyphenation repair,
//!   heading removal, sentence segmentation
//! - **Key phrases**: n-gram counting with morphological near-duplicate
//!   removal
//! - **Reranking** (best-effort): embedding centrality, cosine dedupe and
//!   k-means clustering within a short deadline
//! - **Synthesis**: concept, cloze, formula and statement questions with
//!   deterministic answer placement, flashcards and a day-by-day plan
//!
//! ## Quick Start
//!
//! ```no_run
//! use study_oxide::{KitGenerator, KitRequest, Difficulty};
//!
//! # async fn run() -> study_oxide::Result<()> {
//! let generator = KitGenerator::new().with_hashing_embedder();
//! let request = KitRequest::from_text(std::fs::read_to_string("notes.txt")?)
//!     .with_title("Cell Biology")
//!     .with_difficulty(Difficulty::Harder);
//! let kit = generator.generate(request).await?;
//! println!("{}", kit.to_json()?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - `ml`: ONNX sentence embeddings via tract-onnx
//! - `remote-ocr`: HTTP client for a remote OCR service

// Error handling
pub mod error;

// Configuration
pub mod config;

// Input model
pub mod document;

// Text cleanup and segmentation
pub mod lexical;
pub mod text;

// OCR
pub mod ocr;

// Key phrases and reranking
pub mod keyphrase;
pub mod semantic;

// Model loading
pub mod ml;
pub mod service;

// Output
pub mod kit;
pub mod synth;

// Orchestration
pub mod pipeline;

// Re-exports
pub use config::{Difficulty, KitConfig};
pub use document::{Document, ImagePages, PageImage, PageSource, SourceFile};
pub use error::{Error, Result};
pub use kit::{Flashcard, PlanDay, QuestionKind, QuizItem, StudyKit};
pub use pipeline::{GenerateOptions, KitGenerator, KitRequest};

// Internal utilities
pub(crate) mod utils {
    //! Internal utility functions for the library.

    use std::cmp::Ordering;

    /// Compare two floats for sorting, handling NaN.
    ///
    /// NaN values are equal to each other and greater than all other values,
    /// so sorting never panics.
    #[inline]
    pub fn safe_float_cmp(a: f32, b: f32) -> Ordering {
        match (a.is_nan(), b.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_safe_float_cmp_normal() {
            assert_eq!(safe_float_cmp(1.0, 2.0), Ordering::Less);
            assert_eq!(safe_float_cmp(2.0, 1.0), Ordering::Greater);
            assert_eq!(safe_float_cmp(1.5, 1.5), Ordering::Equal);
        }

        #[test]
        fn test_safe_float_cmp_nan() {
            assert_eq!(safe_float_cmp(f32::NAN, f32::NAN), Ordering::Equal);
            assert_eq!(safe_float_cmp(f32::NAN, 0.0), Ordering::Greater);
            assert_eq!(safe_float_cmp(0.0, f32::NAN), Ordering::Less);
        }

        #[test]
        fn test_safe_float_cmp_infinity() {
            assert_eq!(safe_float_cmp(f32::INFINITY, f32::INFINITY), Ordering::Equal);
            assert_eq!(safe_float_cmp(f32::NEG_INFINITY, f32::INFINITY), Ordering::Less);
        }
    }
}

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(VERSION.starts_with("0."));
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "study_oxide");
    }
}
