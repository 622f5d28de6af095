//! Lloyd-style k-means used to pick IVFFLAT centroids.
//!
//! Seeds are `k` distinct input points drawn uniformly. Each round assigns
//! every point to its nearest centroid and replaces each centroid with the
//! mean of its points; a centroid that attracted no points keeps its previous
//! position. Training stops after `IVFFLAT_MAX_ITERATIONS` rounds or as soon
//! as every centroid moved less than `IVFFLAT_CONVERGENCE_THRESHOLD`,
//! measured with the index's own distance function.

use super::distance::DistanceFn;
use crate::config::{IVFFLAT_CONVERGENCE_THRESHOLD, IVFFLAT_MAX_ITERATIONS};
use rand::seq::index;
use rand::Rng;
use tracing::trace;

/// Index of the centroid closest to `point`; ties keep the lower index.
pub fn nearest_centroid(point: &[f32], centroids: &[Vec<f32>], distance_fn: DistanceFn) -> usize {
    let mut best = 0;
    let mut best_distance = f32::MAX;
    for (i, centroid) in centroids.iter().enumerate() {
        let distance = distance_fn(point, centroid);
        if distance < best_distance {
            best_distance = distance;
            best = i;
        }
    }
    best
}

fn recompute(points: &[&[f32]], centroids: &[Vec<f32>], distance_fn: DistanceFn) -> Vec<Vec<f32>> {
    let dim = centroids.first().map_or(0, Vec::len);
    let mut sums = vec![vec![0.0f32; dim]; centroids.len()];
    let mut counts = vec![0usize; centroids.len()];

    for point in points {
        let i = nearest_centroid(point, centroids, distance_fn);
        for (acc, x) in sums[i].iter_mut().zip(point.iter()) {
            *acc += x;
        }
        counts[i] += 1;
    }

    sums.into_iter()
        .zip(counts)
        .zip(centroids)
        .map(|((mut sum, count), previous)| {
            if count == 0 {
                return previous.clone();
            }
            let n = count as f32;
            sum.iter_mut().for_each(|x| *x /= n);
            sum
        })
        .collect()
}

/// Trains up to `k` centroids; fewer when there are fewer points than `k`.
pub fn train<R: Rng + ?Sized>(
    points: &[&[f32]],
    k: usize,
    distance_fn: DistanceFn,
    rng: &mut R,
) -> Vec<Vec<f32>> {
    let k = k.min(points.len());
    if k == 0 {
        return Vec::new();
    }

    let mut centroids: Vec<Vec<f32>> = index::sample(rng, points.len(), k)
        .into_iter()
        .map(|i| points[i].to_vec())
        .collect();

    for round in 0..IVFFLAT_MAX_ITERATIONS {
        let next = recompute(points, &centroids, distance_fn);
        let converged = next
            .iter()
            .zip(&centroids)
            .all(|(new, old)| distance_fn(new, old) < IVFFLAT_CONVERGENCE_THRESHOLD);
        centroids = next;
        trace!(round, converged, "k-means round");
        if converged {
            break;
        }
    }
    centroids
}
