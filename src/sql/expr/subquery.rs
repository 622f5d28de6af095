//! # Subquery Expressions
//!
//! A `SubqueryExpr` owns a physical operator tree producing one column. The
//! tree is opened per evaluation with the outer row as its parent tuple, so
//! predicates inside it can refer to the outer query's cells.
//!
//! ```text
//! open(outer) ──> set_parent_tuple(snapshot(outer)) ──> op.open(trx)
//!      │
//!      └─> SubqueryGuard ── close() on success, Drop on every other exit
//! ```
//!
//! Scalar use (`get_value`) reads one row and then checks that no second row
//! exists. An empty result is NULL.

use crate::error::ExecError;
use crate::sql::executor::PhysicalOperator;
use crate::sql::tuple::{Tuple, ValueListTuple};
use crate::storage::TrxRef;
use crate::types::{DataType, Value};
use eyre::{bail, eyre, Result};
use std::cell::{Cell, RefCell};
use std::fmt;
use tracing::warn;

pub struct SubqueryExpr {
    op: RefCell<Box<dyn PhysicalOperator>>,
    output_type: DataType,
    trx: RefCell<Option<TrxRef>>,
    opened: Cell<bool>,
}

impl SubqueryExpr {
    pub fn new(op: Box<dyn PhysicalOperator>, output_types: Vec<DataType>) -> Result<Self> {
        match output_types.as_slice() {
            [ty] => Ok(Self {
                op: RefCell::new(op),
                output_type: *ty,
                trx: RefCell::new(None),
                opened: Cell::new(false),
            }),
            [] => bail!(ExecError::InvalidArgument(
                "subquery projects no columns".into()
            )),
            many => bail!(ExecError::TooLongSubqueryExpr(many.len())),
        }
    }

    pub fn value_type(&self) -> DataType {
        self.output_type
    }

    pub fn attach_trx(&self, trx: TrxRef) {
        *self.trx.borrow_mut() = Some(trx);
    }

    pub fn open(&self, outer: &dyn Tuple) -> Result<SubqueryGuard<'_>> {
        let trx = self
            .trx
            .borrow()
            .clone()
            .ok_or_else(|| eyre!(ExecError::Internal("subquery has no transaction".into())))?;
        let parent = ValueListTuple::snapshot(outer)?;

        let mut op = self
            .op
            .try_borrow_mut()
            .map_err(|_| eyre!(ExecError::Internal("subquery evaluated re-entrantly".into())))?;
        op.set_parent_tuple(Some(parent));
        op.open(trx)?;
        self.opened.set(true);
        Ok(SubqueryGuard {
            expr: self,
            closed: false,
        })
    }

    /// The next row's single cell, or `None` once exhausted.
    pub fn next_value(&self) -> Result<Option<Value<'static>>> {
        let mut op = self.op.borrow_mut();
        if !op.next()? {
            return Ok(None);
        }
        let tuple = op
            .current_tuple()
            .ok_or_else(|| eyre!(ExecError::Internal("subquery row has no tuple".into())))?;
        Ok(Some(tuple.cell_at(0)?.into_owned()))
    }

    pub fn has_more_row(&self) -> Result<bool> {
        self.op.borrow_mut().next()
    }

    pub fn close(&self) -> Result<()> {
        if !self.opened.replace(false) {
            return Ok(());
        }
        self.op.borrow_mut().close()
    }

    pub(super) fn get_value<'t>(&self, outer: &'t dyn Tuple) -> Result<Value<'t>> {
        let guard = self.open(outer)?;
        let value = match self.next_value()? {
            None => Value::Null,
            Some(value) => {
                if self.has_more_row()? {
                    bail!(ExecError::SubqueryReturnedMultipleRows);
                }
                value
            }
        };
        guard.close()?;
        Ok(value)
    }
}

impl fmt::Debug for SubqueryExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubqueryExpr")
            .field("output_type", &self.output_type)
            .field("opened", &self.opened.get())
            .finish()
    }
}

/// Closes the subquery when dropped unless `close` already ran.
pub struct SubqueryGuard<'a> {
    expr: &'a SubqueryExpr,
    closed: bool,
}

impl SubqueryGuard<'_> {
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        self.expr.close()
    }
}

impl Drop for SubqueryGuard<'_> {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(err) = self.expr.close() {
                warn!(error = %err, "failed to close subquery");
            }
        }
    }
}
