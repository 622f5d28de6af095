use super::{current_of, filter_row, OperatorKind, PhysicalOperator};
use crate::sql::expr::Expression;
use crate::sql::tuple::{Tuple, ValueListTuple};
use crate::storage::TrxRef;
use eyre::Result;
use std::slice;

/// Forwards the child rows for which the predicate is TRUE. NULL and FALSE
/// both drop the row.
pub struct PredicateOperator {
    child: Box<dyn PhysicalOperator>,
    predicate: Expression,
    parent: Option<ValueListTuple>,
}

impl PredicateOperator {
    pub fn new(child: Box<dyn PhysicalOperator>, predicate: Expression) -> Self {
        Self {
            child,
            predicate,
            parent: None,
        }
    }
}

impl PhysicalOperator for PredicateOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Predicate
    }

    fn open(&mut self, trx: TrxRef) -> Result<()> {
        self.predicate.attach_trx(&trx);
        self.child.open(trx)
    }

    fn next(&mut self) -> Result<bool> {
        while self.child.next()? {
            let tuple = current_of(&*self.child)?;
            if filter_row(slice::from_ref(&self.predicate), tuple, self.parent.as_ref())? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn close(&mut self) -> Result<()> {
        self.child.close()
    }

    fn current_tuple(&self) -> Option<&dyn Tuple> {
        self.child.current_tuple()
    }

    fn set_parent_tuple(&mut self, parent: Option<ValueListTuple>) {
        self.parent = parent.clone();
        self.child.set_parent_tuple(parent);
    }
}
