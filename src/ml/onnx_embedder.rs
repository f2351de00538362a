//! Transformer sentence embeddings on CPU.
//!
//! Expects a sentence-transformer export (`model.onnx`) and its
//! `tokenizer.json` in one directory. The graph is optimized once at load
//! time and run on CPU by tract. Token vectors are mean-pooled over the
//! attention mask and L2-normalised.

use crate::error::{Error, Result};
use crate::semantic::SentenceEmbedder;
use crate::service::LazyModel;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokenizers::Tokenizer;
use tract_onnx::prelude::*;

/// Longest token sequence fed to the model.
pub const MAX_TOKENS: usize = 128;

/// Model file inside the embedder directory.
pub const MODEL_FILE: &str = "model.onnx";

/// Tokenizer file inside the embedder directory.
pub const TOKENIZER_FILE: &str = "tokenizer.json";

struct Inner {
    plan: TypedRunnableModel<TypedModel>,
    /// 2 for (ids, mask) exports, 3 when token type ids are expected
    input_count: usize,
    tokenizer: Tokenizer,
}

/// ONNX sentence embedder. Cheap to clone.
#[derive(Clone)]
pub struct OnnxSentenceEmbedder {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for OnnxSentenceEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxSentenceEmbedder")
            .field("inputs", &self.inner.input_count)
            .finish()
    }
}

impl OnnxSentenceEmbedder {
    /// Load [`MODEL_FILE`] and [`TOKENIZER_FILE`] from `dir`.
    ///
    /// # Errors
    ///
    /// [`Error::ModelLoad`] when either file is missing or unreadable, or the
    /// graph cannot be optimized for CPU.
    pub fn load(dir: &Path) -> Result<Self> {
        let plan = load_plan(&dir.join(MODEL_FILE))?;
        let input_count = plan.model().inputs.len();
        let tokenizer_path = dir.join(TOKENIZER_FILE);
        let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            Error::ModelLoad(format!("tokenizer {}: {}", tokenizer_path.display(), e))
        })?;
        log::info!("loaded sentence embedder from {} ({} inputs)", dir.display(), input_count);
        Ok(Self {
            inner: Arc::new(Inner {
                plan,
                input_count,
                tokenizer,
            }),
        })
    }

    /// Lazily loaded embedder for [`crate::semantic::EmbeddingService::new`].
    pub fn lazy(dir: impl Into<PathBuf>) -> LazyModel<dyn SentenceEmbedder> {
        let dir = dir.into();
        LazyModel::blocking("onnx-sentence-embedder", move || {
            let embedder = Self::load(&dir)?;
            Ok(Arc::new(embedder) as Arc<dyn SentenceEmbedder>)
        })
    }

    fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let encoding = self
            .inner
            .tokenizer
            .encode(text, true)
            .map_err(|e| Error::Embedding(format!("Tokenization failed: {}", e)))?;
        let len = encoding.get_ids().len().min(MAX_TOKENS);
        if len == 0 {
            return Err(Error::Embedding("empty token sequence".to_string()));
        }
        let as_i64 = |ids: &[u32]| ids[..len].iter().map(|&v| v as i64).collect::<Vec<_>>();
        let ids = as_i64(encoding.get_ids());
        let mask = as_i64(encoding.get_attention_mask());
        let types = as_i64(encoding.get_type_ids());

        let tensor = |data: Vec<i64>| -> Result<TValue> {
            tract_ndarray::Array2::from_shape_vec((1, len), data)
                .map(|a| a.into_tensor().into())
                .map_err(|e| Error::Embedding(e.to_string()))
        };
        let mut inputs: TVec<TValue> = tvec!(tensor(ids)?, tensor(mask.clone())?);
        if self.inner.input_count > 2 {
            inputs.push(tensor(types)?);
        }

        let outputs = self
            .inner
            .plan
            .run(inputs)
            .map_err(|e| Error::Embedding(format!("inference failed: {}", e)))?;
        let hidden = outputs
            .first()
            .ok_or_else(|| Error::Embedding("model produced no output".to_string()))?
            .to_array_view::<f32>()
            .map_err(|e| Error::Embedding(e.to_string()))?
            .into_dimensionality::<tract_ndarray::Ix3>()
            .map_err(|e| Error::Embedding(format!("unexpected output rank: {}", e)))?;
        let (_, tokens, dims) = hidden.dim();
        if tokens < len {
            return Err(Error::Embedding(format!("model returned {} of {} tokens", tokens, len)));
        }

        let mut pooled = vec![0.0f32; dims];
        let mut weight = 0.0f32;
        for (t, &m) in mask.iter().enumerate() {
            if m == 0 {
                continue;
            }
            weight += 1.0;
            for (d, value) in pooled.iter_mut().enumerate() {
                *value += hidden[[0, t, d]];
            }
        }
        if weight > 0.0 {
            pooled.iter_mut().for_each(|v| *v /= weight);
        }
        let norm = pooled.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            pooled.iter_mut().for_each(|v| *v /= norm);
        }
        Ok(pooled)
    }
}

/// Parse, optimize and plan the graph at `path`.
fn load_plan(path: &Path) -> Result<TypedRunnableModel<TypedModel>> {
    if !path.exists() {
        return Err(Error::ModelLoad(format!("no model at {}", path.display())));
    }
    tract_onnx::onnx()
        .model_for_path(path)
        .and_then(|model| model.into_optimized())
        .and_then(|model| model.into_runnable())
        .map_err(|e| Error::ModelLoad(format!("model {}: {}", path.display(), e)))
}

#[async_trait]
impl SentenceEmbedder for OnnxSentenceEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let this = self.clone();
        let texts = texts.to_vec();
        tokio::task::spawn_blocking(move || texts.iter().map(|t| this.embed_one(t)).collect())
            .await
            .map_err(|e| Error::Embedding(format!("embedding task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_directory_fails_to_load() {
        let err = OnnxSentenceEmbedder::load(Path::new("/nonexistent/model-dir")).unwrap_err();
        match err {
            Error::ModelLoad(msg) => assert!(msg.contains("model.onnx"), "{}", msg),
            other => panic!("expected ModelLoad, got {:?}", other),
        }
    }

    #[test]
    fn test_unparseable_model_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MODEL_FILE), b"not a graph").unwrap();
        let err = OnnxSentenceEmbedder::load(dir.path()).unwrap_err();
        assert!(matches!(err, Error::ModelLoad(_)));
    }

    #[tokio::test]
    async fn test_lazy_missing_model_is_unavailable() {
        let lazy = OnnxSentenceEmbedder::lazy("/nonexistent/model-dir");
        assert!(lazy.get(std::time::Duration::from_secs(5)).await.is_none());
    }
}
