//! Embedding-based sentence reranking and clustering.

use super::embedding::EmbeddingService;
use super::kmeans;
use super::similarity::{centrality, dedupe, most_similar, order_by_score};
use crate::config::RerankConfig;
use crate::keyphrase::KeyPhrase;
use crate::lexical::contains_phrase;
use std::time::Instant;

/// Sentences reordered by centrality, deduplicated and clustered.
#[derive(Debug, Clone, PartialEq)]
pub struct RerankedSet {
    /// Sentences, most central first
    pub sentences: Vec<String>,
    /// Centrality score per sentence
    pub centrality: Vec<f32>,
    /// Embedding per sentence
    pub embeddings: Vec<Vec<f32>>,
    /// Sentence indices per cluster, ordered by their most central member
    pub clusters: Vec<Vec<usize>>,
    /// Per phrase, the index of its best supporting sentence
    pub phrase_support: Vec<Option<usize>>,
}

/// Best-effort semantic reranker.
#[derive(Debug)]
pub struct SemanticReranker {
    service: EmbeddingService,
    config: RerankConfig,
    dedupe_threshold: f32,
}

impl SemanticReranker {
    /// Reranker over an embedding service with default limits.
    pub fn new(service: EmbeddingService) -> Self {
        Self {
            service,
            config: RerankConfig::default(),
            dedupe_threshold: 0.85,
        }
    }

    /// Override deadline, item cap and clustering parameters.
    pub fn with_config(mut self, config: RerankConfig) -> Self {
        self.service = self.service.with_config(config.clone());
        self.config = config;
        self
    }

    /// Cosine above which a sentence is treated as a duplicate.
    pub fn with_dedupe_threshold(mut self, threshold: f32) -> Self {
        self.dedupe_threshold = threshold;
        self
    }

    /// Start loading the embedding model in the background.
    pub fn warm(&self) {
        self.service.warm();
    }

    /// Rerank `sentences` and pick supporting sentences for `phrases`.
    ///
    /// Returns `None` when there is nothing to rank or embeddings are not
    /// available within the configured deadline.
    pub async fn rerank(&self, sentences: &[String], phrases: &[KeyPhrase]) -> Option<RerankedSet> {
        if sentences.is_empty() {
            return None;
        }
        let started = Instant::now();
        let working: Vec<&String> = sentences.iter().take(self.config.max_items).collect();
        let mut inputs: Vec<String> = working.iter().map(|s| s.to_string()).collect();
        inputs.extend(phrases.iter().map(|p| p.text.clone()));

        let vectors = self.service.embed(&inputs, self.config.deadline).await?;
        let (sentence_vectors, phrase_vectors) = vectors.split_at(working.len());

        let scores = centrality(sentence_vectors);
        let order = order_by_score(&scores);
        let kept = dedupe(&order, sentence_vectors, self.dedupe_threshold);

        let ranked: Vec<String> = kept.iter().map(|&i| working[i].clone()).collect();
        let embeddings: Vec<Vec<f32>> = kept.iter().map(|&i| sentence_vectors[i].clone()).collect();
        let clusters = kmeans::cluster(&embeddings, self.config.max_clusters, self.config.kmeans_rounds);

        let everything: Vec<usize> = (0..ranked.len()).collect();
        let phrase_support = phrases
            .iter()
            .zip(phrase_vectors)
            .map(|(phrase, vector)| {
                let containing: Vec<usize> = everything
                    .iter()
                    .copied()
                    .filter(|&s| contains_phrase(&ranked[s], &phrase.text))
                    .collect();
                let candidates = if containing.is_empty() {
                    &everything
                } else {
                    &containing
                };
                most_similar(vector, &embeddings, candidates)
            })
            .collect();

        log::debug!(
            "reranked {} sentences into {} kept, {} clusters in {:?}",
            working.len(),
            ranked.len(),
            clusters.len(),
            started.elapsed()
        );

        Some(RerankedSet {
            centrality: kept.iter().map(|&i| scores[i]).collect(),
            sentences: ranked,
            embeddings,
            clusters,
            phrase_support,
        })
    }
}
