use super::{OperatorKind, PhysicalOperator};
use crate::sql::tuple::{Tuple, ValueListTuple};
use crate::storage::TrxRef;
use eyre::Result;

/// Passes through the first `limit` child rows.
pub struct LimitOperator {
    child: Box<dyn PhysicalOperator>,
    limit: usize,
    emitted: usize,
}

impl LimitOperator {
    pub fn new(child: Box<dyn PhysicalOperator>, limit: usize) -> Self {
        Self {
            child,
            limit,
            emitted: 0,
        }
    }
}

impl PhysicalOperator for LimitOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Limit
    }

    fn open(&mut self, trx: TrxRef) -> Result<()> {
        self.emitted = 0;
        self.child.open(trx)
    }

    fn next(&mut self) -> Result<bool> {
        if self.emitted >= self.limit {
            return Ok(false);
        }
        if !self.child.next()? {
            return Ok(false);
        }
        self.emitted += 1;
        Ok(true)
    }

    fn close(&mut self) -> Result<()> {
        self.child.close()
    }

    fn current_tuple(&self) -> Option<&dyn Tuple> {
        if self.emitted == 0 {
            return None;
        }
        self.child.current_tuple()
    }

    fn set_parent_tuple(&mut self, parent: Option<ValueListTuple>) {
        self.child.set_parent_tuple(parent);
    }
}
