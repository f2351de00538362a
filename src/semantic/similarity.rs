//! Vector similarity, centrality and cosine dedupe.

use crate::utils::safe_float_cmp;

/// Cosine similarity. Zero when either vector has zero norm or the lengths
/// differ.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let (mut dot, mut na, mut nb) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na.sqrt() * nb.sqrt())
}

/// Mean cosine of each vector to every other vector, divided by
/// `max(1, n - 1)`.
pub fn centrality(vectors: &[Vec<f32>]) -> Vec<f32> {
    let n = vectors.len();
    let divisor = n.saturating_sub(1).max(1) as f32;
    let mut sums = vec![0.0f32; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let sim = cosine(&vectors[i], &vectors[j]);
            sums[i] += sim;
            sums[j] += sim;
        }
    }
    sums.into_iter().map(|s| s / divisor).collect()
}

/// Indices sorted by descending score; equal scores keep input order.
pub fn order_by_score(scores: &[f32]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| safe_float_cmp(scores[b], scores[a]));
    order
}

/// Walk `order` and keep each index whose cosine to every kept index is at
/// most `threshold`.
pub fn dedupe(order: &[usize], vectors: &[Vec<f32>], threshold: f32) -> Vec<usize> {
    let mut kept: Vec<usize> = Vec::with_capacity(order.len());
    for &i in order {
        if kept
            .iter()
            .all(|&k| cosine(&vectors[i], &vectors[k]) <= threshold)
        {
            kept.push(i);
        }
    }
    kept
}

/// Index of the vector most similar to `query` among `candidates`; the first
/// wins ties.
pub fn most_similar(query: &[f32], vectors: &[Vec<f32>], candidates: &[usize]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for &c in candidates {
        let sim = cosine(query, &vectors[c]);
        if best.map_or(true, |(_, s)| sim > s) {
            best = Some((c, sim));
        }
    }
    best.map(|(c, _)| c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine() {
        assert!((cosine(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_centrality_single_vector() {
        assert_eq!(centrality(&[vec![1.0, 0.0]]), vec![0.0]);
    }

    #[test]
    fn test_centrality_prefers_hub() {
        let vectors = vec![vec![1.0, 0.0], vec![0.7, 0.7], vec![0.0, 1.0]];
        let scores = centrality(&vectors);
        assert!(scores[1] > scores[0]);
        assert!(scores[1] > scores[2]);
        assert_eq!(order_by_score(&scores)[0], 1);
    }

    #[test]
    fn test_order_is_stable() {
        assert_eq!(order_by_score(&[0.5, 0.9, 0.5]), vec![1, 0, 2]);
    }

    #[test]
    fn test_dedupe() {
        let vectors = vec![vec![1.0, 0.0], vec![0.99, 0.01], vec![0.0, 1.0]];
        assert_eq!(dedupe(&[0, 1, 2], &vectors, 0.85), vec![0, 2]);
    }

    #[test]
    fn test_most_similar() {
        let vectors = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        assert_eq!(most_similar(&[0.1, 0.9], &vectors, &[0, 1]), Some(1));
        assert_eq!(most_similar(&[0.1, 0.9], &vectors, &[]), None);
    }
}
