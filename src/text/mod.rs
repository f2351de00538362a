//! Text cleanup and sentence segmentation.
//!
//! - [`normalizer`]: raw text → [`NormalizedText`]
//! - [`segmenter`]: [`NormalizedText`] → sentences
//! - [`headings`], [`formula`], [`hyphenation`]: line-level helpers shared by both

pub mod formula;
pub mod headings;
pub mod hyphenation;
pub mod normalizer;
pub mod segmenter;

pub use formula::extract_formulas;
pub use headings::{classify_heading, is_heading, HeadingKind};
pub use hyphenation::HyphenationHandler;
pub use normalizer::{NormalizedText, TextNormalizer};
pub use segmenter::SentenceSegmenter;
