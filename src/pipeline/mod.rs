//! Document-to-kit pipeline.
//!
//! ```text
//! KitRequest
//!     ↓
//! [Extractor] (text, text layers, OCR, remote OCR)
//!     ↓
//! [TextNormalizer] → [SentenceSegmenter]
//!     ↓
//! [KeyPhraseExtractor] + formulas
//!     ↓
//! [Synthesizer::baseline] ──→ StudyKit
//!     ↓ (if the reranker answers within its deadline)
//! [SemanticReranker] → [Synthesizer::enhanced] ──→ StudyKit
//! ```
//!
//! Only an empty request is an error. Every other failure degrades to a
//! simpler path: no OCR engine means text layers only, a slow or missing
//! embedding model means the baseline kit.

pub mod extract;
pub mod request;

pub use extract::Extraction;
pub use request::{GenerateOptions, KitRequest};

use crate::config::KitConfig;
use crate::error::{Error, Result};
use crate::keyphrase::KeyPhraseExtractor;
use crate::kit::StudyKit;
use crate::ocr::{RemoteOcr, TesseractCli, TextRecognizer};
use crate::semantic::{EmbeddingService, SemanticReranker, SentenceEmbedder};
use crate::service::LazyModel;
use crate::synth::{SynthesisInput, Synthesizer};
use crate::text::{extract_formulas, SentenceSegmenter, TextNormalizer};
use extract::Extractor;
use std::sync::Arc;
use std::time::Instant;

/// Minimum sentence length used when the default segmentation keeps nothing.
pub const SHORT_INPUT_MIN_CHARS: usize = 30;

/// Study-kit generator.
///
/// Owns the model handles, so one generator should be kept for the life of
/// the process and shared between requests.
///
/// # Example
///
/// ```no_run
/// use study_oxide::{KitGenerator, KitRequest};
///
/// # async fn run() -> study_oxide::Result<()> {
/// let generator = KitGenerator::new().with_hashing_embedder();
/// let kit = generator
///     .generate(KitRequest::from_text("Mitochondria produce most of the chemical energy needed by the cell."))
///     .await?;
/// assert_eq!(kit.quiz.len(), 10);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct KitGenerator {
    config: KitConfig,
    normalizer: TextNormalizer,
    engine: Option<LazyModel<dyn TextRecognizer>>,
    remote: Option<Arc<dyn RemoteOcr>>,
    reranker: Option<SemanticReranker>,
}

impl std::fmt::Debug for KitGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KitGenerator")
            .field("config", &self.config)
            .field("engine", &self.engine)
            .field("remote", &self.remote.is_some())
            .field("reranker", &self.reranker)
            .finish()
    }
}

impl KitGenerator {
    /// Generator without OCR engine or reranker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: KitConfig) -> Self {
        self.reranker = self.reranker.take().map(|r| configure(r, &config));
        self.config = config;
        self
    }

    /// Rerank with an embedder that is ready immediately.
    pub fn with_embedder(self, embedder: Arc<dyn SentenceEmbedder>) -> Self {
        self.with_embedding_service(EmbeddingService::from_embedder("sentence-embedder", embedder))
    }

    /// Rerank with the built-in deterministic [`crate::semantic::HashingEmbedder`].
    pub fn with_hashing_embedder(self) -> Self {
        self.with_embedding_service(EmbeddingService::hashing())
    }

    /// Rerank with a lazily loaded embedding service.
    pub fn with_embedding_service(mut self, service: EmbeddingService) -> Self {
        self.reranker = Some(configure(SemanticReranker::new(service), &self.config));
        self
    }

    /// Use an OCR engine that is ready immediately.
    pub fn with_recognizer(self, engine: Arc<dyn TextRecognizer>) -> Self {
        self.with_recognizer_loader(LazyModel::ready("ocr-engine", engine))
    }

    /// Use a lazily loaded OCR engine.
    pub fn with_recognizer_loader(mut self, engine: LazyModel<dyn TextRecognizer>) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Use the `tesseract` binary found on `PATH`, located on first use.
    pub fn with_tesseract(self) -> Self {
        self.with_recognizer_loader(LazyModel::blocking("tesseract", || {
            TesseractCli::locate().map(|engine| Arc::new(engine) as Arc<dyn TextRecognizer>)
        }))
    }

    /// Network OCR used when no on-device engine is available.
    pub fn with_remote_ocr(mut self, remote: Arc<dyn RemoteOcr>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn config(&self) -> &KitConfig {
        &self.config
    }

    /// Start loading the OCR engine and the embedding model in the
    /// background.
    pub fn warm(&self) {
        if let Some(engine) = &self.engine {
            engine.warm();
        }
        if let Some(reranker) = &self.reranker {
            reranker.warm();
        }
    }

    /// Generate a study kit.
    ///
    /// Always yields ten quiz items, seven plan days and at most twelve
    /// flashcards.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyInput`] when the request carries neither text nor pages.
    pub async fn generate(&self, request: KitRequest) -> Result<StudyKit> {
        let document = request.document();
        if document.is_empty() {
            return Err(Error::EmptyInput);
        }
        let started = Instant::now();

        let extraction = self.extract(&document).await;
        log::debug!(
            "extracted {} chars ({} pages, {} via OCR) in {:?}",
            extraction.text.len(),
            extraction.pages_read,
            extraction.ocr_pages,
            started.elapsed()
        );

        let normalized = self.normalizer.normalize(&extraction.text);
        let mut sentences = SentenceSegmenter::new().segment(&normalized);
        if sentences.is_empty() {
            log::debug!("no sentences at default length, retrying at {}", SHORT_INPUT_MIN_CHARS);
            sentences = SentenceSegmenter::new()
                .with_min_chars(SHORT_INPUT_MIN_CHARS)
                .segment(&normalized);
        }

        let phrases = KeyPhraseExtractor::new(
            self.config.keyphrases.clone(),
            self.config.similarity.near_duplicate_jaccard,
        )
        .extract(normalized.as_str(), &sentences);
        let formulas = extract_formulas(normalized.as_str());
        log::debug!(
            "{} sentences, {} phrases, {} formulas",
            sentences.len(),
            phrases.len(),
            formulas.len()
        );

        let input = SynthesisInput {
            title: request.title.as_deref(),
            sentences: &sentences,
            phrases: &phrases,
            formulas: &formulas,
        };
        let synthesizer =
            Synthesizer::new(request.options.difficulty).with_thresholds(self.config.similarity);
        let baseline = synthesizer.baseline(&input);

        let kit = match &self.reranker {
            Some(reranker) => match reranker.rerank(&sentences, &phrases).await {
                Some(reranked) => {
                    log::debug!("using reranked kit ({} sentences kept)", reranked.sentences.len());
                    synthesizer.enhanced(&input, &reranked)
                }
                None => {
                    log::debug!("reranker unavailable, keeping baseline kit");
                    baseline
                }
            },
            None => baseline,
        };

        log::info!("generated kit '{}' in {:?}", kit.title, started.elapsed());
        Ok(kit)
    }

    /// Text of a request without synthesis.
    pub async fn extract_text(&self, request: &KitRequest) -> Result<Extraction> {
        let document = request.document();
        if document.is_empty() {
            return Err(Error::EmptyInput);
        }
        Ok(self.extract(&document).await)
    }

    async fn extract(&self, document: &crate::document::Document) -> Extraction {
        Extractor {
            config: &self.config,
            engine: self.engine.as_ref(),
            remote: self.remote.as_deref(),
        }
        .extract(document)
        .await
    }
}

fn configure(reranker: SemanticReranker, config: &KitConfig) -> SemanticReranker {
    reranker
        .with_config(config.rerank.clone())
        .with_dedupe_threshold(config.similarity.dedupe_cosine)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "Mitochondria are membrane-bound organelles found in most eukaryotic cells. \
        Mitochondria generate most of the chemical energy needed to power the cell. \
        Oxidative phosphorylation takes place on the inner membrane of the mitochondria. \
        The inner membrane is folded into cristae that increase its surface area. \
        Oxidative phosphorylation produces most of the ATP used by eukaryotic cells.";

    #[tokio::test]
    async fn test_empty_request_is_error() {
        let generator = KitGenerator::new();
        let err = generator.generate(KitRequest::default()).await.unwrap_err();
        assert!(matches!(err, Error::EmptyInput));
        assert!(matches!(
            generator.generate(KitRequest::from_text("  ")).await,
            Err(Error::EmptyInput)
        ));
    }

    #[tokio::test]
    async fn test_generate_shape() {
        let kit = KitGenerator::new()
            .generate(KitRequest::from_text(TEXT))
            .await
            .unwrap();
        assert_eq!(kit.quiz.len(), 10);
        assert_eq!(kit.plan.len(), 7);
        assert!(kit.flashcards.len() <= 12);
    }

    #[tokio::test]
    async fn test_short_input_retry() {
        let kit = KitGenerator::new()
            .generate(KitRequest::from_text("Enzymes speed up chemical reactions."))
            .await
            .unwrap();
        assert_eq!(kit.quiz.len(), 10);
        assert!(kit.title.starts_with("Enzymes"));
    }

    #[tokio::test]
    async fn test_reranked_kit_shape() {
        let kit = KitGenerator::new()
            .with_hashing_embedder()
            .generate(KitRequest::from_text(TEXT).with_title("Cell Biology"))
            .await
            .unwrap();
        assert_eq!(kit.title, "Cell Biology");
        assert_eq!(kit.quiz.len(), 10);
        assert_eq!(kit.plan.len(), 7);
    }

    #[test]
    fn test_with_config_keeps_reranker() {
        let generator = KitGenerator::new()
            .with_hashing_embedder()
            .with_config(KitConfig::default());
        assert!(generator.reranker.is_some());
        assert!(generator.engine.is_none());
    }
}
