//! Best-effort semantic reranking.
//!
//! Sentences are embedded, ordered by centrality, deduplicated by cosine
//! similarity and clustered with k-means. Everything here is optional: when
//! embeddings are unavailable the pipeline keeps its lexical baseline.
//!
//! - [`embedding`]: the [`SentenceEmbedder`] seam, the built-in
//!   [`HashingEmbedder`] and the deadline-bounded [`EmbeddingService`]
//! - [`similarity`]: cosine, centrality and dedupe
//! - [`kmeans`]: deterministic cosine k-means
//! - [`reranker`]: [`SemanticReranker`] producing a [`RerankedSet`]

pub mod embedding;
pub mod kmeans;
pub mod reranker;
pub mod similarity;

pub use embedding::{EmbeddingService, HashingEmbedder, SentenceEmbedder};
pub use reranker::{RerankedSet, SemanticReranker};
