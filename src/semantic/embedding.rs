//! Sentence embedding providers.

use crate::config::RerankConfig;
use crate::error::{Error, Result};
use crate::lexical::tokens;
use crate::service::LazyModel;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Maps texts to fixed-size vectors, one per input.
#[async_trait]
pub trait SentenceEmbedder: Send + Sync {
    /// Embed a batch of texts.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Deterministic bag-of-words embedder.
///
/// Unigrams and bigrams of tokens with at least three characters are hashed
/// (FNV-1a) into a fixed number of signed buckets, and the vector is
/// L2-normalised.
#[derive(Debug, Clone, Copy)]
pub struct HashingEmbedder {
    dims: usize,
}

impl HashingEmbedder {
    /// Default vector size.
    pub const DEFAULT_DIMS: usize = 256;

    /// Embedder with [`Self::DEFAULT_DIMS`] dimensions.
    pub fn new() -> Self {
        Self {
            dims: Self::DEFAULT_DIMS,
        }
    }

    /// Change the number of dimensions (at least 1).
    pub fn with_dims(mut self, dims: usize) -> Self {
        self.dims = dims.max(1);
        self
    }

    /// Embed one text synchronously.
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let words: Vec<String> = tokens(text).into_iter().filter(|t| t.len() >= 3).collect();
        let mut vector = vec![0.0f32; self.dims];
        let mut add = |feature: &str| {
            let h = fnv1a(feature);
            let bucket = (h % self.dims as u32) as usize;
            let sign = if h & 0x8000_0000 != 0 { -1.0 } else { 1.0 };
            vector[bucket] += sign;
        };
        for w in &words {
            add(w);
        }
        for pair in words.windows(2) {
            add(&format!("{} {}", pair[0], pair[1]));
        }
        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SentenceEmbedder for HashingEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

fn fnv1a(text: &str) -> u32 {
    text.bytes()
        .fold(0x811c_9dc5u32, |h, b| (h ^ b as u32).wrapping_mul(0x0100_0193))
}

/// Best-effort embedding front end.
///
/// Truncates inputs, batches them and bounds the whole call, including the
/// wait for the model, by a deadline. Every failure yields `None`.
#[derive(Debug)]
pub struct EmbeddingService {
    model: LazyModel<dyn SentenceEmbedder>,
    config: RerankConfig,
}

impl EmbeddingService {
    /// Service over a lazily loaded embedder.
    pub fn new(model: LazyModel<dyn SentenceEmbedder>) -> Self {
        Self {
            model,
            config: RerankConfig::default(),
        }
    }

    /// Service over an embedder that is ready immediately.
    pub fn from_embedder(name: &'static str, embedder: Arc<dyn SentenceEmbedder>) -> Self {
        Self::new(LazyModel::ready(name, embedder))
    }

    /// Service over the built-in [`HashingEmbedder`].
    pub fn hashing() -> Self {
        Self::from_embedder("hashing-embedder", Arc::new(HashingEmbedder::new()))
    }

    /// Override batch size and truncation.
    pub fn with_config(mut self, config: RerankConfig) -> Self {
        self.config = config;
        self
    }

    /// Start loading the model in the background.
    pub fn warm(&self) {
        self.model.warm();
    }

    /// Embed `texts` within `deadline`. `None` when the model is not ready,
    /// the embedder fails, time runs out or the vector count is wrong.
    pub async fn embed(&self, texts: &[String], deadline: Duration) -> Option<Vec<Vec<f32>>> {
        let started = Instant::now();
        let model = self.model.get(deadline).await?;
        let remaining = deadline.checked_sub(started.elapsed())?;

        let inputs: Vec<String> = texts
            .iter()
            .map(|t| t.chars().take(self.config.max_chars).collect())
            .collect();
        let batch_size = self.config.batch_size.max(1);
        let work = async {
            let mut vectors = Vec::with_capacity(inputs.len());
            for batch in inputs.chunks(batch_size) {
                vectors.extend(model.embed(batch).await?);
            }
            Ok::<_, Error>(vectors)
        };

        match tokio::time::timeout(remaining, work).await {
            Ok(Ok(vectors)) if vectors.len() == inputs.len() => {
                log::debug!(
                    "embedded {} texts in {:?}",
                    vectors.len(),
                    started.elapsed()
                );
                Some(vectors)
            }
            Ok(Ok(vectors)) => {
                log::warn!(
                    "embedder returned {} vectors for {} texts",
                    vectors.len(),
                    inputs.len()
                );
                None
            }
            Ok(Err(e)) => {
                log::warn!("embedding failed: {}", e);
                None
            }
            Err(_) => {
                log::debug!("embedding exceeded {:?}", deadline);
                None
            }
        }
    }
}
