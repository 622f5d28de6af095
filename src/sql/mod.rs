//! # SQL Execution Module
//!
//! This module gives bound SQL statements their meaning: expressions
//! evaluated against tuples, operators pulling rows through a plan, and the
//! rewriter that swaps an exact nearest-neighbour plan for an index probe.
//!
//! ## Module Structure
//!
//! - `tuple`: row views (`RowTuple`, `ValueListTuple`, `JoinedTuple`)
//! - `expr`: the bound expression tree
//! - `functions`: builtin scalar functions
//! - `aggregate`: aggregate state machines
//! - `binder`: function resolution and implicit casts
//! - `planner`: logical plan and physical plan generation
//! - `optimizer`: rule-based plan rewriting
//! - `executor`: Volcano-style physical operators
//!
//! ## Pipeline
//!
//! ```text
//! Expression trees ──> binder ──> LogicalOperator ──> Rewriter
//!                                                       │
//!             rows <── PhysicalOperator::next() <── PhysicalPlanGenerator
//! ```
//!
//! Parsing SQL text is not part of this crate; callers build plans from
//! already-resolved tables and expressions.

pub mod aggregate;
pub mod binder;
pub mod executor;
pub mod expr;
pub mod functions;
pub mod optimizer;
pub mod planner;
pub mod tuple;
