//! Cosine k-means over sentence embeddings.
//!
//! Seeding is deterministic: the first centroid is the most central point
//! and each further seed is the point farthest (by `1 - max cosine`) from the
//! centroids chosen so far.

use super::similarity::cosine;

/// Cluster `vectors`, which must already be in centrality order (index 0 is
/// the most central).
///
/// # Returns
///
/// Non-empty clusters of indices. Members are in ascending index order and
/// clusters are ordered by their first member.
///
/// # Examples
///
/// ```
/// use study_oxide::semantic::kmeans::cluster;
///
/// let vectors = vec![
///     vec![1.0, 0.0],
///     vec![0.0, 1.0],
///     vec![0.95, 0.05],
///     vec![0.05, 0.95],
/// ];
/// let clusters = cluster(&vectors, 2, 20);
/// assert_eq!(clusters, vec![vec![0, 2], vec![1, 3]]);
/// ```
pub fn cluster(vectors: &[Vec<f32>], max_clusters: usize, rounds: usize) -> Vec<Vec<usize>> {
    let n = vectors.len();
    let k = max_clusters.min(n);
    if k == 0 {
        return Vec::new();
    }

    let mut centroids = seed(vectors, k);
    let mut assignment = vec![usize::MAX; n];
    for round in 0..rounds.max(1) {
        let next: Vec<usize> = vectors.iter().map(|v| nearest(v, &centroids)).collect();
        if next == assignment {
            log::debug!("k-means converged after {} rounds", round);
            break;
        }
        assignment = next;
        update(vectors, &assignment, &mut centroids);
    }

    let mut clusters: Vec<Vec<usize>> = vec![Vec::new(); centroids.len()];
    for (i, &c) in assignment.iter().enumerate() {
        if let Some(members) = clusters.get_mut(c) {
            members.push(i);
        }
    }
    clusters.retain(|members| !members.is_empty());
    clusters.sort_by_key(|members| members[0]);
    clusters
}

fn seed(vectors: &[Vec<f32>], k: usize) -> Vec<Vec<f32>> {
    let mut centroids = vec![vectors[0].clone()];
    while centroids.len() < k {
        let mut best: Option<(usize, f32)> = None;
        for (i, v) in vectors.iter().enumerate() {
            let closest = centroids
                .iter()
                .map(|c| cosine(v, c))
                .fold(f32::NEG_INFINITY, f32::max);
            let distance = 1.0 - closest;
            if best.map_or(true, |(_, d)| distance > d) {
                best = Some((i, distance));
            }
        }
        match best {
            Some((i, _)) => centroids.push(vectors[i].clone()),
            None => break,
        }
    }
    centroids
}

fn nearest(v: &[f32], centroids: &[Vec<f32>]) -> usize {
    let mut best = (0, f32::NEG_INFINITY);
    for (c, centroid) in centroids.iter().enumerate() {
        let sim = cosine(v, centroid);
        if sim > best.1 {
            best = (c, sim);
        }
    }
    best.0
}

/// Arithmetic mean of each cluster; empty clusters keep their centroid.
fn update(vectors: &[Vec<f32>], assignment: &[usize], centroids: &mut [Vec<f32>]) {
    for (c, centroid) in centroids.iter_mut().enumerate() {
        let members: Vec<&Vec<f32>> = assignment
            .iter()
            .zip(vectors)
            .filter(|(a, _)| **a == c)
            .map(|(_, v)| v)
            .collect();
        if members.is_empty() {
            continue;
        }
        let mut mean = vec![0.0f32; centroid.len()];
        for v in &members {
            for (m, x) in mean.iter_mut().zip(v.iter()) {
                *m += x;
            }
        }
        let count = members.len() as f32;
        mean.iter_mut().for_each(|m| *m /= count);
        *centroid = mean;
    }
}
