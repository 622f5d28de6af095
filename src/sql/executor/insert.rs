use super::{OperatorKind, PhysicalOperator};
use crate::records::Record;
use crate::sql::tuple::Tuple;
use crate::storage::{Relation, TrxRef};
use crate::types::Value;
use eyre::{Result, WrapErr};
use tracing::{debug, warn};

/// Inserts a fixed list of rows at `open()`.
///
/// Every row is validated into a record before the first write, and a write
/// failure part-way through deletes the rows already inserted, so the
/// statement either inserts every row or none.
pub struct InsertOperator {
    relation: Relation,
    rows: Vec<Vec<Value<'static>>>,
    inserted: usize,
}

impl InsertOperator {
    pub fn new(relation: Relation, rows: Vec<Vec<Value<'static>>>) -> Self {
        Self {
            relation,
            rows,
            inserted: 0,
        }
    }

    pub fn affected_rows(&self) -> usize {
        self.inserted
    }

    fn undo(&self, trx: &TrxRef, inserted: &[Record]) {
        for record in inserted.iter().rev() {
            if let Err(err) = trx.delete_record(&self.relation, record) {
                warn!(
                    relation = self.relation.name(),
                    rid = %record.rid(),
                    error = %err,
                    "failed to undo insert"
                );
            }
        }
    }
}

impl PhysicalOperator for InsertOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Insert
    }

    fn open(&mut self, trx: TrxRef) -> Result<()> {
        self.inserted = 0;
        let mut records = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                self.relation
                    .make_record(row)
                    .wrap_err_with(|| format!("row {} of insert into '{}'", i + 1, self.relation.name()))
            })
            .collect::<Result<Vec<_>>>()?;

        for done in 0..records.len() {
            if let Err(err) = trx.insert_record(&self.relation, &mut records[done]) {
                self.undo(&trx, &records[..done]);
                return Err(err).wrap_err_with(|| {
                    format!("row {} of insert into '{}'", done + 1, self.relation.name())
                });
            }
        }

        self.inserted = records.len();
        debug!(relation = self.relation.name(), rows = records.len(), "inserted rows");
        Ok(())
    }

    fn next(&mut self) -> Result<bool> {
        Ok(false)
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    fn current_tuple(&self) -> Option<&dyn Tuple> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorCode, ExecError};
    use crate::records::FieldDef;
    use crate::storage::{Table, VacuousTrx};

    #[test]
    fn inserts_every_row() {
        let table = Table::create("t", vec![FieldDef::int("a")]).unwrap();
        let rows = vec![vec![Value::Int(1)], vec![Value::Int(2)]];
        let mut op = InsertOperator::new(Relation::from(table.clone()), rows);
        op.open(VacuousTrx::shared()).unwrap();
        assert!(!op.next().unwrap());
        op.close().unwrap();
        assert_eq!(op.affected_rows(), 2);
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn invalid_row_inserts_nothing() {
        let table = Table::create("t", vec![FieldDef::int("a")]).unwrap();
        let rows = vec![vec![Value::Int(1)], vec![Value::Null]];
        let mut op = InsertOperator::new(Relation::from(table.clone()), rows);
        let err = op.open(VacuousTrx::shared()).unwrap_err();
        assert_eq!(ExecError::code_of(&err), Some(ErrorCode::NotNullableValue));
        assert_eq!(table.row_count(), 0);
    }
}
