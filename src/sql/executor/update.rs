//! UPDATE execution.
//!
//! ```text
//! open()
//!   ├─ drain child: for every row compute (old record, new record)
//!   │    └─ any evaluation or validation error aborts before the first write
//!   └─ apply pairs in order through the transaction
//!        └─ on failure: re-apply (new -> old) for every pair already
//!           written, newest first, then return the error
//! ```
//!
//! Assigned values are cast to the field type without promotion; the
//! resulting error codes are those of [`coerce_value`].

use super::{attach_trx_all, close_after_error, current_of, OperatorKind, PhysicalOperator};
use crate::error::ExecError;
use crate::records::{coerce_value, FieldMeta, Record};
use crate::sql::expr::Expression;
use crate::sql::tuple::Tuple;
use crate::storage::{Relation, TrxRef};
use eyre::{bail, eyre, Result};
use tracing::{debug, warn};

pub struct UpdateOperator {
    child: Box<dyn PhysicalOperator>,
    relation: Relation,
    assignments: Vec<(FieldMeta, Expression)>,
    updated: usize,
}

impl UpdateOperator {
    pub fn new(
        child: Box<dyn PhysicalOperator>,
        relation: Relation,
        assignments: Vec<(String, Expression)>,
    ) -> Result<Self> {
        let mut resolved = Vec::with_capacity(assignments.len());
        for (name, expr) in assignments {
            let Some(field) = relation.meta().field(&name) else {
                bail!(ExecError::SchemaFieldMissing(format!("{}.{}", relation.name(), name)));
            };
            if !field.mutable {
                bail!(ExecError::InvalidArgument(format!(
                    "field '{}' of '{}' cannot be updated",
                    name,
                    relation.name()
                )));
            }
            resolved.push((field.clone(), expr));
        }
        Ok(Self {
            child,
            relation,
            assignments: resolved,
            updated: 0,
        })
    }

    pub fn affected_rows(&self) -> usize {
        self.updated
    }

    fn collect(&mut self) -> Result<Vec<(Record, Record)>> {
        let mut pairs = Vec::new();
        while self.child.next()? {
            let tuple = current_of(&*self.child)?;
            let old = tuple
                .record()
                .ok_or_else(|| eyre!(ExecError::Internal("update input row has no record".to_string())))?
                .clone();
            let mut new = old.clone();
            for (field, expr) in &self.assignments {
                let value = expr.get_value(tuple)?;
                let stored = coerce_value(field, &value)?;
                new.write_value(field, &stored)?;
            }
            pairs.push((old, new));
        }
        Ok(pairs)
    }

    fn apply(&self, trx: &TrxRef, pairs: &[(Record, Record)]) -> Result<()> {
        for (done, (old, new)) in pairs.iter().enumerate() {
            if let Err(err) = trx.update_record(&self.relation, old, new) {
                for (old, new) in pairs[..done].iter().rev() {
                    if let Err(undo) = trx.update_record(&self.relation, new, old) {
                        warn!(
                            relation = self.relation.name(),
                            rid = %old.rid(),
                            error = %undo,
                            "failed to roll back update"
                        );
                    }
                }
                return Err(err.wrap_err(format!(
                    "updating {} of '{}'",
                    old.rid(),
                    self.relation.name()
                )));
            }
        }
        Ok(())
    }
}

impl PhysicalOperator for UpdateOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Update
    }

    fn open(&mut self, trx: TrxRef) -> Result<()> {
        self.updated = 0;
        attach_trx_all(self.assignments.iter().map(|(_, e)| e), &trx);
        self.child.open(trx.clone())?;

        let result = self.collect().and_then(|pairs| {
            self.apply(&trx, &pairs)?;
            Ok(pairs.len())
        });
        match result {
            Ok(count) => {
                self.updated = count;
                debug!(relation = self.relation.name(), rows = count, "updated rows");
                Ok(())
            }
            Err(err) => Err(close_after_error(&mut *self.child, err)),
        }
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
