//! # turvec - Query Execution Runtime with Vector Search
//!
//! turvec is the execution core of a small relational engine: a typed value
//! system, a bound expression tree, Volcano-style physical operators and an
//! IVFFLAT approximate-nearest-neighbour index, tied together by a rewrite
//! that turns `ORDER BY <distance> LIMIT n` into an index probe.
//!
//! ## Quick Start
//!
//! ```ignore
//! use turvec::records::FieldDef;
//! use turvec::storage::{Table, VacuousTrx};
//! use turvec::sql::planner::{LogicalOperator, PhysicalPlanGenerator};
//! use turvec::sql::optimizer::Rewriter;
//! use turvec::sql::executor::collect_rows;
//!
//! let items = Table::create("items", vec![FieldDef::int("id"), FieldDef::vector("v", 3)])?;
//! items.create_ivfflat_index("idx_v", "v", DistanceFunction::L2, IvfflatOptions::new(4, 2)?)?;
//!
//! let mut plan = LogicalOperator::limit(
//!     LogicalOperator::order_by(LogicalOperator::table_get(items), vec![OrderByUnit::asc(distance)]),
//!     10,
//! );
//! Rewriter::new().rewrite(&mut plan)?;
//! let mut op = PhysicalPlanGenerator::create(plan)?;
//! let rows = collect_rows(&mut *op, VacuousTrx::shared())?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │  Rewriter (vector index scan rule)   │
//! ├─────────────────────────────────────┤
//! │   Physical operators (Volcano)       │
//! ├─────────────────────────────────────┤
//! │  Expressions │ Tuples │ Aggregates   │
//! ├─────────────────────────────────────┤
//! │     Value / DataType / casting       │
//! ├───────────────────┬─────────────────┤
//! │ Tables and views  │  IVFFLAT index   │
//! ├───────────────────┴─────────────────┤
//! │    Records and the record heap       │
//! └─────────────────────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`config`]: tunables and IVFFLAT options
//! - [`error`]: `ExecError` result codes
//! - [`types`]: `Value`, `DataType`, casts, dates
//! - [`records`]: records, RIDs, table metadata
//! - [`storage`]: tables, views, the record heap, the `Trx` seam
//! - [`ivfflat`]: the IVFFLAT index
//! - [`sql`]: expressions, operators, plans, rewriting

pub mod config;
pub mod error;
pub mod ivfflat;
pub mod records;
pub mod sql;
pub mod storage;
pub mod types;

pub use error::{ErrorCode, ExecError};
pub use types::{DataType, Value};
