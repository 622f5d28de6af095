//! # Query Plans
//!
//! A statement is described as a tree of [`LogicalOperator`]s, rewritten by
//! the optimizer and finally turned into a tree of physical operators:
//!
//! ```text
//! LogicalOperator ──> Rewriter::rewrite ──> PhysicalPlanGenerator::create ──> Box<dyn PhysicalOperator>
//! ```
//!
//! ## Module Structure
//!
//! - `logical`: Logical operator definitions
//! - `convert`: Logical to physical conversion

pub mod convert;
pub mod logical;

pub use convert::PhysicalPlanGenerator;
pub use logical::{
    LogicalDelete, LogicalGroupBy, LogicalInsert, LogicalJoin, LogicalLimit, LogicalOperator,
    LogicalOrderBy, LogicalPredicate, LogicalProject, LogicalTableGet, LogicalUpdate,
    LogicalVectorScan, LogicalViewGet,
};
