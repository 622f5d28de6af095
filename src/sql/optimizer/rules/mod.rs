//! # Rewrite Rules
//!
//! | Rule | Purpose |
//! |------|---------|
//! | PredicatePushdown | fold `Predicate` nodes into the scan below them |
//! | VectorIndexScan | replace `Limit(OrderBy(distance))` over a scan with an index probe |
//!
//! ## Rule Implementation Guidelines
//!
//! 1. Rules must be idempotent: applying twice has no further effect
//! 2. Rules return `Ok(false)` if no transformation is possible
//! 3. Rules never change query results, only the access path

mod predicate_pushdown;
mod vector_index_scan;

pub use predicate_pushdown::PredicatePushdownRule;
pub use vector_index_scan::VectorIndexScanRule;
