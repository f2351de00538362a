//! Machine learning integration (optional).
//!
//! Transformer sentence embeddings for the semantic reranker. Gated behind
//! the `ml` feature; without it the reranker uses
//! [`crate::semantic::HashingEmbedder`] or whatever embedder is injected.
//!
//! # Architecture
//!
//! - Uses tract-onnx for CPU-only inference
//! - Tokenization via the `tokenizers` crate
//! - Loaded lazily on the blocking pool, never on the request path
//!
//! # Example
//!
//! ```ignore
//! use study_oxide::ml::OnnxSentenceEmbedder;
//! use study_oxide::semantic::EmbeddingService;
//!
//! let service = EmbeddingService::new(OnnxSentenceEmbedder::lazy("models/minilm"));
//! service.warm();
//! ```

#[cfg(feature = "ml")]
pub mod onnx_embedder;

#[cfg(feature = "ml")]
pub use onnx_embedder::OnnxSentenceEmbedder;
