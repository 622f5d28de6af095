//! Sequential scan over a base table.
//!
//! The RID list is snapshotted at `open()`; rows deleted afterwards are
//! skipped when their slot no longer resolves.

use super::{attach_trx_all, filter_row, OperatorKind, PhysicalOperator};
use crate::error::{ErrorCode, ExecError};
use crate::records::Rid;
use crate::sql::expr::Expression;
use crate::sql::tuple::{RowTuple, Tuple, ValueListTuple};
use crate::storage::{ReadWriteMode, Relation, Table, TrxRef, Visibility};
use eyre::{eyre, Result};
use std::sync::Arc;
use tracing::trace;

/// Walks a RID list, resolving each RID to a visible, filtered row.
pub(super) struct RidCursor {
    table: Arc<Table>,
    relation: Relation,
    alias: Option<String>,
    mode: ReadWriteMode,
    predicates: Vec<Expression>,
    rids: Vec<Rid>,
    pos: usize,
    trx: Option<TrxRef>,
    parent: Option<ValueListTuple>,
    current: Option<RowTuple>,
}

impl RidCursor {
    pub(super) fn new(
        table: Arc<Table>,
        alias: Option<String>,
        mode: ReadWriteMode,
        predicates: Vec<Expression>,
    ) -> Self {
        Self {
            relation: Relation::Table(table.clone()),
            table,
            alias,
            mode,
            predicates,
            rids: Vec::new(),
            pos: 0,
            trx: None,
            parent: None,
            current: None,
        }
    }

    pub(super) fn table(&self) -> &Arc<Table> {
        &self.table
    }

    pub(super) fn start(&mut self, trx: TrxRef, rids: Vec<Rid>) {
        attach_trx_all(&self.predicates, &trx);
        self.trx = Some(trx);
        self.rids = rids;
        self.pos = 0;
        self.current = None;
    }

    pub(super) fn advance(&mut self) -> Result<bool> {
        let trx = self
            .trx
            .as_ref()
            .ok_or_else(|| eyre!(ExecError::Internal(format!("scan of '{}' is not open", self.table.name()))))?;

        while self.pos < self.rids.len() {
            let rid = self.rids[self.pos];
            self.pos += 1;

            let record = match self.table.get_record(rid) {
                Ok(record) => record,
                Err(err) if ExecError::code_of(&err) == Some(ErrorCode::NotFound) => {
                    trace!(table = self.table.name(), %rid, "row vanished since open, skipping");
                    continue;
                }
                Err(err) => return Err(err),
            };
            if trx.visit_record(&self.relation, &record, self.mode)? == Visibility::Invisible {
                trace!(table = self.table.name(), %rid, "row invisible to transaction");
                continue;
            }

            let row = RowTuple::from_table(&self.table, self.alias.as_deref(), record);
            if filter_row(&self.predicates, &row, self.parent.as_ref())? {
                self.current = Some(row);
                return Ok(true);
            }
        }
        self.current = None;
        Ok(false)
    }

    pub(super) fn finish(&mut self) {
        self.rids.clear();
        self.pos = 0;
        self.current = None;
        self.trx = None;
    }

    pub(super) fn current(&self) -> Option<&dyn Tuple> {
        self.current.as_ref().map(|t| t as &dyn Tuple)
    }

    pub(super) fn set_parent(&mut self, parent: Option<ValueListTuple>) {
        self.parent = parent;
    }
}

pub struct TableScanOperator {
    cursor: RidCursor,
}

impl TableScanOperator {
    pub fn new(
        table: Arc<Table>,
        alias: Option<String>,
        mode: ReadWriteMode,
        predicates: Vec<Expression>,
    ) -> Self {
        Self {
            cursor: RidCursor::new(table, alias, mode, predicates),
        }
    }
}

impl PhysicalOperator for TableScanOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::TableScan
    }

    fn open(&mut self, trx: TrxRef) -> Result<()> {
        let rids = self.cursor.table().scan_rids();
        trace!(table = self.cursor.table().name(), rows = rids.len(), "opening table scan");
        self.cursor.start(trx, rids);
        Ok(())
    }

    fn next(&mut self) -> Result<bool> {
        self.cursor.advance()
    }

    fn close(&mut self) -> Result<()> {
        self.cursor.finish();
        Ok(())
    }

    fn current_tuple(&self) -> Option<&dyn Tuple> {
        self.cursor.current()
    }

    fn set_parent_tuple(&mut self, parent: Option<ValueListTuple>) {
        self.cursor.set_parent(parent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{FieldDef, Record};
    use crate::sql::executor::collect_rows;
    use crate::sql::expr::{CompOp, ComparisonExpr, FieldExpr, ValueExpr};
    use crate::storage::{Trx, VacuousTrx};
    use crate::types::{DataType, Value};

    fn numbers(n: i32) -> Arc<Table> {
        let table = Table::create("t", vec![FieldDef::int("id"), FieldDef::int("v")]).unwrap();
        for i in 0..n {
            let mut r = table.make_record(&[Value::Int(i), Value::Int(i * 10)]).unwrap();
            table.insert_record(&mut r).unwrap();
        }
        table
    }

    /// Hides rows whose `id` is odd.
    struct EvenOnly;

    impl Trx for EvenOnly {
        fn insert_record(&self, relation: &Relation, record: &mut Record) -> Result<()> {
            relation.insert_record(record)
        }
        fn delete_record(&self, relation: &Relation, record: &Record) -> Result<()> {
            relation.delete_record(record)
        }
        fn update_record(&self, relation: &Relation, old: &Record, new: &Record) -> Result<()> {
            relation.update_record(old, new)
        }
        fn visit_record(&self, relation: &Relation, record: &Record, _: ReadWriteMode) -> Result<Visibility> {
            let id = record.get_field(relation.meta().field("id").unwrap())?.get_int();
            Ok(if id % 2 == 0 { Visibility::Visible } else { Visibility::Invisible })
        }
    }

    #[test]
    fn scan_returns_rows_in_physical_order() {
        let table = numbers(3);
        let mut op = TableScanOperator::new(table, None, ReadWriteMode::ReadOnly, vec![]);
        let rows = collect_rows(&mut op, VacuousTrx::shared()).unwrap();
        let ids: Vec<i32> = rows.iter().map(|r| r.cells()[0].get_int()).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(rows[0].specs()[1].table, "t");
    }

    #[test]
    fn predicates_filter_rows() {
        let table = numbers(5);
        let pred = Expression::from(ComparisonExpr::new(
            CompOp::GreaterThan,
            FieldExpr::new("t", "v", DataType::Ints).into(),
            ValueExpr::new(Value::Int(20)).into(),
        ));
        let mut op = TableScanOperator::new(table, None, ReadWriteMode::ReadOnly, vec![pred]);
        let rows = collect_rows(&mut op, VacuousTrx::shared()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cells()[0], Value::Int(3));
    }

    #[test]
    fn invisible_rows_are_skipped() {
        let table = numbers(5);
        let mut op = TableScanOperator::new(table, None, ReadWriteMode::ReadOnly, vec![]);
        let rows = collect_rows(&mut op, Arc::new(EvenOnly)).unwrap();
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn rows_deleted_after_open_are_skipped() {
        let table = numbers(3);
        let mut op = TableScanOperator::new(table.clone(), None, ReadWriteMode::ReadOnly, vec![]);
        op.open(VacuousTrx::shared()).unwrap();
        table.delete_record(table.scan_rids()[1]).unwrap();
        let mut seen = 0;
        while op.next().unwrap() {
            seen += 1;
        }
        op.close().unwrap();
        assert_eq!(seen, 2);
    }

    #[test]
    fn alias_renames_cells() {
        let table = numbers(1);
        let mut op = TableScanOperator::new(table, Some("a".into()), ReadWriteMode::ReadOnly, vec![]);
        let rows = collect_rows(&mut op, VacuousTrx::shared()).unwrap();
        assert_eq!(rows[0].specs()[0].table, "a");
    }

    #[test]
    fn next_before_open_is_an_error() {
        let mut op = TableScanOperator::new(numbers(1), None, ReadWriteMode::ReadOnly, vec![]);
        assert!(op.next().is_err());
    }
}
