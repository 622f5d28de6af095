//! # Physical Operators - Volcano Model
//!
//! This module implements the operator tree that executes a plan row by row.
//! Every operator implements [`PhysicalOperator`]:
//!
//! - `open(trx)`: open children, then acquire the operator's own state
//! - `next()`: advance; `Ok(true)` means `current_tuple()` is valid,
//!   `Ok(false)` means exhausted
//! - `close()`: release state and close children; safe after any `open()`
//!   that succeeded, including after an error from `next()`
//!
//! ## Operator Hierarchy
//!
//! ```text
//! ProjectOperator
//!     └── LimitOperator
//!             └── OrderByOperator            (pipeline breaker)
//!                     └── PredicateOperator
//!                             └── TableScanOperator
//!                                     └── [RecordFileHandler]
//! ```
//!
//! ## Operators
//!
//! | Operator | Streaming | Notes |
//! |----------|-----------|-------|
//! | `TableScanOperator` | yes | visibility check, residual predicates |
//! | `VectorScanOperator` | yes | RIDs from one `ann_search` at open |
//! | `ViewScanOperator` | yes | rebuilds view rows with base RIDs |
//! | `PredicateOperator` | yes | forwards rows whose predicate is TRUE |
//! | `ProjectOperator` | yes | evaluates the select list |
//! | `NestedLoopJoinOperator` | yes | right side re-opened per left row |
//! | `OrderByOperator` | no | drains the child at open |
//! | `LimitOperator` | yes | stops after `limit` rows |
//! | `GroupByOperator` | no | hash aggregation, first-seen group order |
//! | `InsertOperator` | - | all-or-nothing at open |
//! | `UpdateOperator` | - | collect, apply, roll back on failure |
//! | `DeleteOperator` | - | collect, then delete |
//!
//! DML operators do their work in `open()` and produce no rows.
//!
//! ## Correlation
//!
//! `set_parent_tuple` hands the outer row of a correlated subquery down the
//! tree. Scans, filters and projections evaluate their expressions against
//! `JoinedTuple(row, parent)`, so a cell missing from the row is looked up in
//! the outer row.
//!
//! ## Example Usage
//!
//! ```ignore
//! let mut op = PhysicalPlanGenerator::create(plan)?;
//! op.open(trx)?;
//! while op.next()? {
//!     let row = op.current_tuple();
//! }
//! op.close()?;
//! ```

mod delete;
mod group_by;
mod insert;
mod join;
mod limit;
mod order_by;
mod predicate;
mod project;
mod table_scan;
mod update;
mod vector_scan;
mod view_scan;

pub use delete::DeleteOperator;
pub use group_by::GroupByOperator;
pub use insert::InsertOperator;
pub use join::NestedLoopJoinOperator;
pub use limit::LimitOperator;
pub use order_by::{OrderByOperator, OrderByUnit};
pub use predicate::PredicateOperator;
pub use project::ProjectOperator;
pub use table_scan::TableScanOperator;
pub use update::UpdateOperator;
pub use vector_scan::VectorScanOperator;
pub use view_scan::ViewScanOperator;

use crate::error::ExecError;
use crate::records::Record;
use crate::sql::expr::Expression;
use crate::sql::tuple::{JoinedTuple, Tuple, ValueListTuple};
use crate::storage::TrxRef;
use eyre::{eyre, Result};
use std::fmt;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    TableScan,
    VectorScan,
    ViewScan,
    Predicate,
    Project,
    NestedLoopJoin,
    OrderBy,
    Limit,
    GroupBy,
    Insert,
    Update,
    Delete,
}

impl OperatorKind {
    pub fn name(&self) -> &'static str {
        match self {
            OperatorKind::TableScan => "TABLE_SCAN",
            OperatorKind::VectorScan => "VECTOR_SCAN",
            OperatorKind::ViewScan => "VIEW_SCAN",
            OperatorKind::Predicate => "PREDICATE",
            OperatorKind::Project => "PROJECT",
            OperatorKind::NestedLoopJoin => "NESTED_LOOP_JOIN",
            OperatorKind::OrderBy => "ORDER_BY",
            OperatorKind::Limit => "LIMIT",
            OperatorKind::GroupBy => "GROUP_BY",
            OperatorKind::Insert => "INSERT",
            OperatorKind::Update => "UPDATE",
            OperatorKind::Delete => "DELETE",
        }
    }
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub trait PhysicalOperator {
    fn kind(&self) -> OperatorKind;

    fn open(&mut self, trx: TrxRef) -> Result<()>;

    fn next(&mut self) -> Result<bool>;

    fn close(&mut self) -> Result<()>;

    /// Valid between a `next()` returning `true` and the following
    /// `next()` or `close()`.
    fn current_tuple(&self) -> Option<&dyn Tuple>;

    fn set_parent_tuple(&mut self, _parent: Option<ValueListTuple>) {}
}

/// Opens `op`, snapshots every row and closes it again.
pub fn collect_rows(op: &mut dyn PhysicalOperator, trx: TrxRef) -> Result<Vec<ValueListTuple>> {
    op.open(trx)?;
    let mut rows = Vec::new();
    let result = (|| {
        while op.next()? {
            rows.push(ValueListTuple::snapshot(current_of(&*op)?)?);
        }
        Ok(())
    })();
    let closed = op.close();
    result.and(closed)?;
    Ok(rows)
}

/// The current tuple of a child that just returned `true` from `next()`.
pub(crate) fn current_of(op: &dyn PhysicalOperator) -> Result<&dyn Tuple> {
    op.current_tuple()
        .ok_or_else(|| eyre!(ExecError::Internal(format!("{} produced a row without a tuple", op.kind()))))
}

/// TRUE when every predicate holds for `row`, with `parent` consulted for
/// cells the row does not have.
pub(crate) fn filter_row(
    predicates: &[Expression],
    row: &dyn Tuple,
    parent: Option<&ValueListTuple>,
) -> Result<bool> {
    let joined = JoinedTuple::new(row, parent.map(|p| p as &dyn Tuple));
    for predicate in predicates {
        if !predicate.get_value(&joined)?.get_boolean() {
            return Ok(false);
        }
    }
    Ok(true)
}

pub(crate) fn attach_trx_all<'a>(exprs: impl IntoIterator<Item = &'a Expression>, trx: &TrxRef) {
    for expr in exprs {
        expr.attach_trx(trx);
    }
}

/// Closes `op` after a failure during `open()`, keeping the original error.
pub(crate) fn close_after_error(op: &mut dyn PhysicalOperator, err: eyre::Report) -> eyre::Report {
    if let Err(close_err) = op.close() {
        warn!(operator = %op.kind(), error = %close_err, "failed to close child after error");
    }
    err
}

/// Drains `child` and copies out each row's stored record.
pub(crate) fn drain_records(child: &mut dyn PhysicalOperator) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    while child.next()? {
        let tuple = current_of(child)?;
        let record = tuple.record().ok_or_else(|| {
            eyre!(ExecError::Internal(format!(
                "{} row carries no stored record",
                child.kind()
            )))
        })?;
        records.push(record.clone());
    }
    Ok(records)
}
