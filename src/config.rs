//! Configuration for study-kit generation.
//!
//! Every empirically chosen constant (plausibility weights, similarity
//! thresholds, time budgets) lives here so it can be tuned without touching
//! the stages that consume it.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Quiz difficulty.
///
/// `Harder` shifts the answer-placement offset, puts cloze items before
/// concept items and orders concept distractors by lexical overlap with the
/// correct answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Default mix
    #[default]
    Balanced,
    /// More confusable distractors
    Harder,
}

impl Difficulty {
    /// Offset added to the answer-placement hash.
    pub fn placement_offset(self) -> u32 {
        match self {
            Difficulty::Balanced => 0,
            Difficulty::Harder => 1,
        }
    }
}

impl FromStr for Difficulty {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "balanced" => Ok(Difficulty::Balanced),
            "harder" | "hard" => Ok(Difficulty::Harder),
            other => Err(Error::InvalidConfig(format!("unknown difficulty '{}'", other))),
        }
    }
}

/// Weights of the OCR transcript plausibility score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityWeights {
    /// Weight of the letter fraction among non-space characters
    pub letters: f32,
    /// Weight of the vowel-fraction closeness to English
    pub vowels: f32,
    /// Weight of the average token length score
    pub token_length: f32,
    /// Penalty applied to the non-alphanumeric noise density
    pub noise_penalty: f32,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            letters: 0.55,
            vowels: 0.25,
            token_length: 0.2,
            noise_penalty: 0.25,
        }
    }
}

/// Similarity thresholds used for near-duplicate rejection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityThresholds {
    /// Token-set Jaccard at or above which two strings are near-duplicates
    pub near_duplicate_jaccard: f32,
    /// Cosine above which a sentence is dropped during reranking
    pub dedupe_cosine: f32,
    /// Stricter cosine used when deduplicating flashcard backs
    pub strict_cosine: f32,
}

impl Default for SimilarityThresholds {
    fn default() -> Self {
        Self {
            near_duplicate_jaccard: 0.7,
            dedupe_cosine: 0.85,
            strict_cosine: 0.86,
        }
    }
}

/// Image preprocessing parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessConfig {
    /// Candidate deskew angles in degrees, tried in order (first wins ties)
    pub deskew_angles: Vec<f32>,
    /// Maximum probe width used to score deskew angles
    pub probe_width: u32,
    /// Lower percentile for contrast stretching
    pub stretch_low: f32,
    /// Upper percentile for contrast stretching
    pub stretch_high: f32,
    /// Background brightness below which the page is inverted
    pub dark_background: f32,
    /// Background brightness above which the lighter threshold offset applies
    pub bright_background: f32,
    /// Tile size for adaptive binarization
    pub tile_size: u32,
    /// Threshold offset on bright pages
    pub offset_bright: f32,
    /// Threshold offset on other pages
    pub offset_default: f32,
    /// Minimum mean ink density of each side for a column split
    pub min_side_density: f32,
    /// Maximum valley density relative to the weaker side
    pub valley_ratio: f32,
    /// Blocks narrower or shorter than this are dropped
    pub min_block_size: u32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            deskew_angles: vec![0.0, -1.2, 1.2, -3.0, 3.0],
            probe_width: 400,
            stretch_low: 0.02,
            stretch_high: 0.98,
            dark_background: 110.0,
            bright_background: 180.0,
            tile_size: 24,
            offset_bright: 6.0,
            offset_default: 8.0,
            min_side_density: 0.02,
            valley_ratio: 0.2,
            min_block_size: 80,
        }
    }
}

/// OCR recognition parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrConfig {
    /// Pixel width requested from the page rasterizer
    pub target_width: u32,
    /// Lower bound on the per-attempt timeout
    pub min_attempt: Duration,
    /// Upper bound on the OCR time spent on one page
    pub page_cap: Duration,
    /// Pages are skipped when less than this remains in the budget
    pub skip_below: Duration,
    /// Transcripts scoring below this trigger stripe re-segmentation
    pub min_quality: f32,
    /// Height of each stripe in pixels
    pub stripe_height: u32,
    /// Deadline for the recognition engine to become ready
    pub engine_load_timeout: Duration,
    /// Plausibility weights
    pub quality: QualityWeights,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            target_width: 2000,
            min_attempt: Duration::from_millis(800),
            page_cap: Duration::from_secs(10),
            skip_below: Duration::from_millis(600),
            min_quality: 0.5,
            stripe_height: 160,
            engine_load_timeout: Duration::from_secs(8),
            quality: QualityWeights::default(),
        }
    }
}

/// Document extraction parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionConfig {
    /// Combined input is truncated to this many characters
    pub max_chars: usize,
    /// Maximum number of pages read from a page source
    pub max_pages: usize,
    /// Text layers at least this long skip OCR
    pub text_layer_min_chars: usize,
    /// Run OCR even when the text layer is long enough
    pub force_ocr: bool,
    /// Disable OCR entirely
    pub ocr_enabled: bool,
    /// Total OCR budget per document
    pub ocr_budget: Duration,
    /// OCR budget when `force_ocr` is set
    pub forced_ocr_budget: Duration,
    /// Extra time tolerated past the budget before OCR stops
    pub grace: Duration,
    /// Page limit passed to the remote OCR service
    pub remote_max_pages: usize,
    /// Render scale passed to the remote OCR service
    pub remote_scale: f32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_chars: 150_000,
            max_pages: 60,
            text_layer_min_chars: 80,
            force_ocr: false,
            ocr_enabled: true,
            ocr_budget: Duration::from_millis(16_000),
            forced_ocr_budget: Duration::from_millis(28_000),
            grace: Duration::from_millis(1_500),
            remote_max_pages: 12,
            remote_scale: 2.0,
        }
    }
}

impl ExtractionConfig {
    /// Text-layer-only preset for fast previews.
    pub fn quick() -> Self {
        Self {
            max_pages: 24,
            ocr_enabled: false,
            ocr_budget: Duration::from_millis(4_500),
            ..Self::default()
        }
    }

    /// OCR budget for the current mode.
    pub fn effective_budget(&self) -> Duration {
        if self.force_ocr {
            self.forced_ocr_budget
        } else {
            self.ocr_budget
        }
    }
}

/// Key-phrase extraction parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyPhraseConfig {
    /// Number of phrases to return
    pub k: usize,
    /// Minimum occurrences for a bigram or trigram
    pub min_ngram_count: usize,
    /// Maximum multi-word phrases taken before unigrams
    pub multiword_cap: usize,
}

impl Default for KeyPhraseConfig {
    fn default() -> Self {
        Self {
            k: 18,
            min_ngram_count: 2,
            multiword_cap: 9,
        }
    }
}

/// Semantic reranking parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct RerankConfig {
    /// Deadline for the whole reranking pass, model wait included
    pub deadline: Duration,
    /// Maximum sentences embedded
    pub max_items: usize,
    /// Texts per embedding call
    pub batch_size: usize,
    /// Texts are truncated to this many characters before embedding
    pub max_chars: usize,
    /// Maximum number of clusters
    pub max_clusters: usize,
    /// k-means rounds
    pub kmeans_rounds: usize,
}

impl Default for RerankConfig {
    fn default() -> Self {
        Self {
            deadline: Duration::from_millis(150),
            max_items: 160,
            batch_size: 16,
            max_chars: 512,
            max_clusters: 7,
            kmeans_rounds: 20,
        }
    }
}

/// Top-level generation configuration.
#[derive(Debug, Clone, Default)]
pub struct KitConfig {
    /// Document extraction
    pub extraction: ExtractionConfig,
    /// Image preprocessing
    pub preprocess: PreprocessConfig,
    /// Recognition
    pub ocr: OcrConfig,
    /// Key phrases
    pub keyphrases: KeyPhraseConfig,
    /// Reranking
    pub rerank: RerankConfig,
    /// Near-duplicate thresholds
    pub similarity: SimilarityThresholds,
}

impl KitConfig {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set extraction parameters.
    pub fn with_extraction(mut self, extraction: ExtractionConfig) -> Self {
        self.extraction = extraction;
        self
    }

    /// Set preprocessing parameters.
    pub fn with_preprocess(mut self, preprocess: PreprocessConfig) -> Self {
        self.preprocess = preprocess;
        self
    }

    /// Set recognition parameters.
    pub fn with_ocr(mut self, ocr: OcrConfig) -> Self {
        self.ocr = ocr;
        self
    }

    /// Set key-phrase parameters.
    pub fn with_keyphrases(mut self, keyphrases: KeyPhraseConfig) -> Self {
        self.keyphrases = keyphrases;
        self
    }

    /// Set reranking parameters.
    pub fn with_rerank(mut self, rerank: RerankConfig) -> Self {
        self.rerank = rerank;
        self
    }

    /// Set similarity thresholds.
    pub fn with_similarity(mut self, similarity: SimilarityThresholds) -> Self {
        self.similarity = similarity;
        self
    }

    /// Run OCR on every page regardless of the text layer.
    pub fn with_force_ocr(mut self, force: bool) -> Self {
        self.extraction.force_ocr = force;
        self
    }

    /// Check that thresholds and sizes are usable.
    pub fn validate(&self) -> Result<()> {
        let sim = &self.similarity;
        for (name, value) in [
            ("near_duplicate_jaccard", sim.near_duplicate_jaccard),
            ("dedupe_cosine", sim.dedupe_cosine),
            ("strict_cosine", sim.strict_cosine),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidConfig(format!("{} must be within [0, 1], got {}", name, value)));
            }
        }
        if self.preprocess.tile_size == 0 {
            return Err(Error::InvalidConfig("tile_size must be positive".to_string()));
        }
        if self.preprocess.deskew_angles.is_empty() {
            return Err(Error::InvalidConfig("deskew_angles must not be empty".to_string()));
        }
        if self.ocr.stripe_height == 0 {
            return Err(Error::InvalidConfig("stripe_height must be positive".to_string()));
        }
        if self.keyphrases.k == 0 {
            return Err(Error::InvalidConfig("k must be positive".to_string()));
        }
        if self.rerank.batch_size == 0 || self.rerank.max_clusters == 0 {
            return Err(Error::InvalidConfig("rerank batch size and cluster count must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(KitConfig::default().validate().is_ok());
    }

    #[test]
    fn test_quality_weights_defaults() {
        let w = QualityWeights::default();
        assert_eq!(w.letters, 0.55);
        assert_eq!(w.vowels, 0.25);
        assert_eq!(w.token_length, 0.2);
        assert_eq!(w.noise_penalty, 0.25);
    }

    #[test]
    fn test_difficulty_parse() {
        assert_eq!("balanced".parse::<Difficulty>().unwrap(), Difficulty::Balanced);
        assert_eq!(" Harder ".parse::<Difficulty>().unwrap(), Difficulty::Harder);
        assert!("extreme".parse::<Difficulty>().is_err());
    }

    #[test]
    fn test_forced_budget() {
        let config = KitConfig::new().with_force_ocr(true);
        assert_eq!(config.extraction.effective_budget(), Duration::from_millis(28_000));
        assert_eq!(ExtractionConfig::default().effective_budget(), Duration::from_millis(16_000));
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let config = KitConfig::new().with_similarity(SimilarityThresholds {
            near_duplicate_jaccard: 1.5,
            ..SimilarityThresholds::default()
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_quick_preset_disables_ocr() {
        let quick = ExtractionConfig::quick();
        assert!(!quick.ocr_enabled);
        assert_eq!(quick.max_pages, 24);
    }
}
