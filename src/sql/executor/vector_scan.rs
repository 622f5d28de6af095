//! Scan driven by an IVFFLAT index.
//!
//! `open()` runs one `ann_search` and the operator then walks the returned
//! RIDs in index order (nearest first), exactly like a table scan walks the
//! heap.

use super::table_scan::RidCursor;
use super::{OperatorKind, PhysicalOperator};
use crate::ivfflat::IndexHandle;
use crate::sql::expr::Expression;
use crate::sql::tuple::{Tuple, ValueListTuple};
use crate::storage::{ReadWriteMode, Table, TrxRef};
use eyre::Result;
use std::sync::Arc;
use tracing::debug;

pub struct VectorScanOperator {
    cursor: RidCursor,
    index: IndexHandle,
    base_vector: Vec<f32>,
    limit: usize,
}

impl VectorScanOperator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        table: Arc<Table>,
        alias: Option<String>,
        index: IndexHandle,
        base_vector: Vec<f32>,
        limit: usize,
        mode: ReadWriteMode,
        predicates: Vec<Expression>,
    ) -> Self {
        Self {
            cursor: RidCursor::new(table, alias, mode, predicates),
            index,
            base_vector,
            limit,
        }
    }
}

impl PhysicalOperator for VectorScanOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::VectorScan
    }

    fn open(&mut self, trx: TrxRef) -> Result<()> {
        let rids = self.index.read().ann_search(&self.base_vector, self.limit)?;
        debug!(
            table = self.cursor.table().name(),
            limit = self.limit,
            candidates = rids.len(),
            "opening vector index scan"
        );
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
    use crate::config::IvfflatOptions;
    use crate::ivfflat::DistanceFunction;
    use crate::records::FieldDef;
    use crate::sql::executor::collect_rows;
    use crate::storage::VacuousTrx;
    use crate::types::Value;

    fn indexed() -> (Arc<Table>, IndexHandle) {
        let table = Table::create("items", vec![FieldDef::int("id"), FieldDef::vector("v", 2)]).unwrap();
        for (id, v) in [(1, "[0,0]"), (2, "[1,1]"), (3, "[5,5]")] {
            let mut r = table.make_record(&[Value::Int(id), Value::chars(v)]).unwrap();
            table.insert_record(&mut r).unwrap();
        }
        let index = table
            .create_ivfflat_index("idx", "v", DistanceFunction::L2, IvfflatOptions::new(1, 1).unwrap())
            .unwrap();
        (table, index)
    }

    #[test]
    fn rows_come_back_nearest_first() {
        let (table, index) = indexed();
        let mut op = VectorScanOperator::new(
            table,
            None,
            index,
            vec![4.0, 4.0],
            2,
            ReadWriteMode::ReadOnly,
            vec![],
        );
        let rows = collect_rows(&mut op, VacuousTrx::shared()).unwrap();
        let ids: Vec<i32> = rows.iter().map(|r| r.cells()[0].get_int()).collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[test]
    fn wrong_dimension_fails_at_open() {
        let (table, index) = indexed();
        let mut op = VectorScanOperator::new(
            table,
            None,
            index,
            vec![1.0, 2.0, 3.0],
            1,
            ReadWriteMode::ReadOnly,
            vec![],
        );
        assert!(op.open(VacuousTrx::shared()).is_err());
    }
}
