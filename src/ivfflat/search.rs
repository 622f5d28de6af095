//! # Probe and Rank
//!
//! ANN search runs in two steps:
//!
//! 1. **Probe**: rank every centroid by distance to the query and keep the
//!    nearest `probes`.
//! 2. **Rank**: compute exact distances to every entry of the probed buckets
//!    and keep the `limit` closest in a bounded max-heap.
//!
//! ```text
//! centroids ──sort──> [c3, c0, c1, c2]
//!                      └─probes=2─┘
//! buckets[c3] ∪ buckets[c0] ──> heap of `limit` ──> ascending RIDs
//! ```
//!
//! Equal distances are ordered by RID so results are deterministic.

use super::distance::DistanceFn;
use crate::records::Rid;
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    pub rid: Rid,
    pub distance: f32,
}

impl Candidate {
    pub fn new(rid: Rid, distance: f32) -> Self {
        Self { rid, distance }
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.rid.cmp(&other.rid))
    }
}

/// Keeps the `limit` smallest candidates pushed into it.
pub struct TopK {
    limit: usize,
    heap: BinaryHeap<Candidate>,
}

impl TopK {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            heap: BinaryHeap::with_capacity(limit.saturating_add(1).min(1024)),
        }
    }

    pub fn push(&mut self, candidate: Candidate) {
        if self.limit == 0 {
            return;
        }
        if self.heap.len() < self.limit {
            self.heap.push(candidate);
            return;
        }
        if let Some(worst) = self.heap.peek() {
            if candidate < *worst {
                self.heap.pop();
                self.heap.push(candidate);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Candidates in ascending distance.
    pub fn into_sorted(self) -> Vec<Candidate> {
        self.heap.into_sorted_vec()
    }
}

/// Indices of the `probes` centroids nearest to `query`, nearest first.
pub fn probe_order(
    query: &[f32],
    centroids: &[Vec<f32>],
    probes: usize,
    distance_fn: DistanceFn,
) -> SmallVec<[usize; 8]> {
    let mut ranked: Vec<(f32, usize)> = centroids
        .iter()
        .enumerate()
        .map(|(i, c)| (distance_fn(query, c), i))
        .collect();
    ranked.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
    ranked.into_iter().take(probes).map(|(_, i)| i).collect()
}
