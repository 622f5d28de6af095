use super::{close_after_error, drain_records, OperatorKind, PhysicalOperator};
use crate::sql::tuple::Tuple;
use crate::storage::{Relation, TrxRef};
use eyre::Result;
use tracing::debug;

/// Deletes every row its child produces.
///
/// The child is drained before the first delete so the scan never observes
/// its own deletions.
pub struct DeleteOperator {
    child: Box<dyn PhysicalOperator>,
    relation: Relation,
    deleted: usize,
}

impl DeleteOperator {
    pub fn new(child: Box<dyn PhysicalOperator>, relation: Relation) -> Self {
        Self {
            child,
            relation,
            deleted: 0,
        }
    }

    pub fn affected_rows(&self) -> usize {
        self.deleted
    }
}

impl PhysicalOperator for DeleteOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Delete
    }

    fn open(&mut self, trx: TrxRef) -> Result<()> {
        self.deleted = 0;
        self.child.open(trx.clone())?;
        let records = match drain_records(&mut *self.child) {
            Ok(records) => records,
            Err(err) => return Err(close_after_error(&mut *self.child, err)),
        };

        for record in &records {
            if let Err(err) = trx.delete_record(&self.relation, record) {
                let err = err.wrap_err(format!("deleting {} from '{}'", record.rid(), self.relation.name()));
                return Err(close_after_error(&mut *self.child, err));
            }
            self.deleted += 1;
        }
        debug!(relation = self.relation.name(), rows = self.deleted, "deleted rows");
        Ok(())
    }

    fn next(&mut self) -> Result<bool> {
        Ok(false)
    }

    fn close(&mut self) -> Result<()> {
        self.child.close()
    }

    fn current_tuple(&self) -> Option<&dyn Tuple> {
        None
    }
}
