//! # Distance Kernels
//!
//! Scalar distance functions shared by the IVFFLAT index and the
//! `l2_distance` / `cosine_distance` / `inner_product` builtins.
//!
//! | Metric | Formula | Zero-norm behaviour |
//! |--------|---------|---------------------|
//! | L2 | `sqrt(Σ(aᵢ−bᵢ)²)` | n/a |
//! | Cosine | `1 − a·b / (‖a‖‖b‖)` | `1.0` |
//! | Inner product | `Σ aᵢbᵢ` | n/a |
//!
//! The cosine kernel's `1.0` is only used for clustering. ANN ranking goes
//! through [`rank_distance`], which puts zero-norm entries first the way the
//! builtin's NULL sorts.
//!
//! The inner product is returned as is, not negated: ordering an index probe
//! ascending by it matches `ORDER BY inner_product(v, q) ASC`.
//!
//! Callers check lengths before calling; the kernels zip and stop at the
//! shorter slice.

use super::DistanceFunction;
use crate::config::EPSILON;

pub type DistanceFn = fn(&[f32], &[f32]) -> f32;

pub fn l2_squared(a: &[f32], b: &[f32]) -> f32 {
    let mut sum = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        let diff = x - y;
        sum += diff * diff;
    }
    sum
}

pub fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    l2_squared(a, b).sqrt()
}

pub fn inner_product(a: &[f32], b: &[f32]) -> f32 {
    let mut sum = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        sum += x * y;
    }
    sum
}

pub fn norm(a: &[f32]) -> f32 {
    inner_product(a, a).sqrt()
}

pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let norm_product = (norm_a * norm_b).sqrt();
    if norm_product == 0.0 {
        return 1.0;
    }

    1.0 - (dot / norm_product)
}

/// Distance used to rank an entry against a query in ANN search.
///
/// Agrees with `ORDER BY <builtin>(v, q) ASC`: where `cosine_distance` is
/// NULL (a norm below `EPSILON`) the entry ranks first, as NULL sorts.
pub fn rank_distance(metric: DistanceFunction, query: &[f32], v: &[f32]) -> f32 {
    match metric {
        DistanceFunction::Cosine => {
            let (norm_q, norm_v) = (norm(query), norm(v));
            if norm_q < EPSILON || norm_v < EPSILON {
                return f32::NEG_INFINITY;
            }
            1.0 - inner_product(query, v) / (norm_q * norm_v)
        }
        DistanceFunction::L2 => l2_distance(query, v),
        DistanceFunction::InnerProduct => inner_product(query, v),
    }
}

pub fn select_distance_fn(metric: DistanceFunction) -> DistanceFn {
    match metric {
        DistanceFunction::L2 => l2_distance,
        DistanceFunction::Cosine => cosine_distance,
        DistanceFunction::InnerProduct => inner_product,
    }
}
