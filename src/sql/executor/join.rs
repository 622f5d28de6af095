//! Nested-loop inner join.
//!
//! For every left row the right child is re-opened, so the right side must
//! be re-scannable. The left row is handed to the right side as its parent
//! tuple, together with any outer row the join itself was given.

use super::{current_of, OperatorKind, PhysicalOperator};
use crate::error::ExecError;
use crate::sql::expr::Expression;
use crate::sql::tuple::{JoinedTuple, Tuple, ValueListTuple};
use crate::storage::TrxRef;
use eyre::{eyre, Result};

pub struct NestedLoopJoinOperator {
    left: Box<dyn PhysicalOperator>,
    right: Box<dyn PhysicalOperator>,
    condition: Option<Expression>,
    trx: Option<TrxRef>,
    parent: Option<ValueListTuple>,
    left_row: Option<ValueListTuple>,
    right_open: bool,
    current: Option<ValueListTuple>,
}

impl NestedLoopJoinOperator {
    pub fn new(
        left: Box<dyn PhysicalOperator>,
        right: Box<dyn PhysicalOperator>,
        condition: Option<Expression>,
    ) -> Self {
        Self {
            left,
            right,
            condition,
            trx: None,
            parent: None,
            left_row: None,
            right_open: false,
            current: None,
        }
    }

    fn advance_left(&mut self, trx: &TrxRef) -> Result<bool> {
        if self.right_open {
            self.right.close()?;
            self.right_open = false;
        }
        if !self.left.next()? {
            self.left_row = None;
            return Ok(false);
        }
        let row = ValueListTuple::snapshot(current_of(&*self.left)?)?;
        let right_parent = match &self.parent {
            Some(outer) => ValueListTuple::snapshot(&JoinedTuple::new(&row, Some(outer as &dyn Tuple)))?,
            None => row.clone(),
        };
        self.right.set_parent_tuple(Some(right_parent));
        self.right.open(trx.clone())?;
        self.right_open = true;
        self.left_row = Some(row);
        Ok(true)
    }
}

impl PhysicalOperator for NestedLoopJoinOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::NestedLoopJoin
    }

    fn open(&mut self, trx: TrxRef) -> Result<()> {
        if let Some(condition) = &self.condition {
            condition.attach_trx(&trx);
        }
        self.left.open(trx.clone())?;
        self.trx = Some(trx);
        self.left_row = None;
        self.right_open = false;
        self.current = None;
        Ok(())
    }

    fn next(&mut self) -> Result<bool> {
        let trx = self
            .trx
            .clone()
            .ok_or_else(|| eyre!(ExecError::Internal("join is not open".to_string())))?;

        loop {
            if self.left_row.is_none() && !self.advance_left(&trx)? {
                self.current = None;
                return Ok(false);
            }
            if !self.right.next()? {
                self.left_row = None;
                continue;
            }

            let (Some(left), Some(right)) = (self.left_row.as_ref(), self.right.current_tuple()) else {
                return Err(eyre!(ExecError::Internal("join side produced no tuple".to_string())));
            };
            let joined = JoinedTuple::new(left, Some(right));
            let matched = match &self.condition {
                Some(condition) => condition.get_value(&joined)?.get_boolean(),
                None => true,
            };
            if matched {
                let row = ValueListTuple::snapshot(&joined)?;
                self.current = Some(row);
                return Ok(true);
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        let right = if self.right_open {
            self.right_open = false;
            self.right.close()
        } else {
            Ok(())
        };
        let left = self.left.close();
        self.current = None;
        self.left_row = None;
        self.trx = None;
        right.and(left)
    }

    fn current_tuple(&self) -> Option<&dyn Tuple> {
        self.current.as_ref().map(|t| t as &dyn Tuple)
    }

    fn set_parent_tuple(&mut self, parent: Option<ValueListTuple>) {
        self.parent = parent.clone();
        self.left.set_parent_tuple(parent);
    }
}
