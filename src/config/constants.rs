//! # turvec Configuration Constants
//!
//! This module centralizes the numeric constants used by the value system, the
//! operator tree and the IVFFLAT index. Constants that depend on each other are
//! co-located so a change to one is seen next to the values it constrains.
//!
//! ## Dependency Graph
//!
//! ```text
//! EPSILON (1e-6)
//!       │
//!       ├─> Float division: |divisor| < EPSILON yields NULL
//!       │
//!       └─> cosine_distance builtin: ‖a‖ or ‖b‖ < EPSILON yields NULL
//!
//! IVFFLAT_MAX_ITERATIONS (5)
//!       │
//!       └─> IVFFLAT_CONVERGENCE_THRESHOLD (0.01)
//!             k-means stops early once every centroid moved less than this,
//!             measured with the index's own distance function
//!
//! IVFFLAT_DEFAULT_LISTS (1)
//!       │
//!       └─> IVFFLAT_DEFAULT_PROBES (1, must be <= lists)
//!
//! MAX_TEXT_LENGTH (65535)
//!       │
//!       └─> CHAR -> TEXT casts longer than this fail with ValueTooLong
//! ```
//!
//! ## Critical Invariants
//!
//! Enforced by compile-time assertions at the bottom of this file:
//!
//! 1. `IVFFLAT_DEFAULT_PROBES <= IVFFLAT_DEFAULT_LISTS`
//! 2. `IVFFLAT_MAX_ITERATIONS >= 1`
//!
//! ## Usage
//!
//! ```ignore
//! use crate::config::{EPSILON, IVFFLAT_MAX_ITERATIONS};
//! ```

// ============================================================================
// FLOATING POINT
// ============================================================================

/// Threshold below which a float is treated as zero.
///
/// Used by float division (a near-zero divisor gives NULL instead of infinity)
/// and by the cosine distance builtin.
pub const EPSILON: f32 = 1e-6;

/// Number of decimals kept when a FLOAT is rendered as text.
///
/// Trailing zeros, and a trailing decimal point, are trimmed afterwards, so
/// 1.50 renders as "1.5" and 2.00 as "2".
pub const FLOAT_DISPLAY_PRECISION: usize = 2;

// ============================================================================
// RECORD LAYOUT
// ============================================================================

/// Byte written into the trailing flag byte of a nullable field to mark NULL.
pub const NULL_FLAG: u8 = b'1';

/// Byte width of INT, FLOAT and DATE fields.
pub const SCALAR_FIELD_LEN: usize = 4;

/// Byte width of a BOOLEAN field.
pub const BOOLEAN_FIELD_LEN: usize = 1;

/// Byte width of one vector element.
pub const VECTOR_ELEMENT_LEN: usize = std::mem::size_of::<f32>();

/// Upper bound on TEXT payloads.
pub const MAX_TEXT_LENGTH: usize = 65535;

/// Slots per page in the in-memory record heap; RIDs roll to the next page
/// number once a page is full.
pub const HEAP_SLOTS_PER_PAGE: usize = 64;

// ============================================================================
// DATES
// ============================================================================

pub const MIN_YEAR: i32 = 1;
pub const MAX_YEAR: i32 = 9999;

// ============================================================================
// IVFFLAT INDEX
// ============================================================================

/// Maximum number of assign/update rounds during index build.
pub const IVFFLAT_MAX_ITERATIONS: usize = 5;

/// A round in which every centroid moves less than this ends the build early.
pub const IVFFLAT_CONVERGENCE_THRESHOLD: f32 = 0.01;

/// Cluster count used when `CREATE INDEX` names no `lists` option.
pub const IVFFLAT_DEFAULT_LISTS: usize = 1;

/// Clusters searched per query when `CREATE INDEX` names no `probes` option.
pub const IVFFLAT_DEFAULT_PROBES: usize = 1;

// ============================================================================
// OPTIMIZER
// ============================================================================

/// Upper bound on fixed-point rewrite passes over one plan.
pub const OPTIMIZER_MAX_ITERATIONS: usize = 10;

// ============================================================================
// COMPILE-TIME ASSERTIONS
// ============================================================================

const _: () = assert!(IVFFLAT_DEFAULT_PROBES <= IVFFLAT_DEFAULT_LISTS);
const _: () = assert!(IVFFLAT_MAX_ITERATIONS >= 1);
