//! Scan over a view.
//!
//! The child is the view's defining plan. Each child row is rebuilt as a
//! record of the view's schema and tagged with the base RIDs it came from,
//! so DML above the scan can route changes back to the base tables.

use super::{attach_trx_all, current_of, filter_row, OperatorKind, PhysicalOperator};
use crate::error::ExecError;
use crate::sql::expr::Expression;
use crate::sql::tuple::{RowTuple, Tuple, ValueListTuple};
use crate::storage::{ReadWriteMode, Relation, TrxRef, View, Visibility};
use eyre::{bail, eyre, Result};
use std::sync::Arc;

pub struct ViewScanOperator {
    view: Arc<View>,
    relation: Relation,
    alias: Option<String>,
    child: Box<dyn PhysicalOperator>,
    predicates: Vec<Expression>,
    mode: ReadWriteMode,
    trx: Option<TrxRef>,
    parent: Option<ValueListTuple>,
    current: Option<RowTuple>,
}

impl ViewScanOperator {
    pub fn new(
        view: Arc<View>,
        alias: Option<String>,
        child: Box<dyn PhysicalOperator>,
        predicates: Vec<Expression>,
        mode: ReadWriteMode,
    ) -> Self {
        Self {
            relation: Relation::View(view.clone()),
            view,
            alias,
            child,
            predicates,
            mode,
            trx: None,
            parent: None,
            current: None,
        }
    }
}

impl PhysicalOperator for ViewScanOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::ViewScan
    }

    fn open(&mut self, trx: TrxRef) -> Result<()> {
        self.child.open(trx.clone())?;
        attach_trx_all(&self.predicates, &trx);
        self.trx = Some(trx);
        self.current = None;
        Ok(())
    }

    fn next(&mut self) -> Result<bool> {
        let trx = self
            .trx
            .as_ref()
            .ok_or_else(|| eyre!(ExecError::Internal(format!("scan of view '{}' is not open", self.view.name()))))?;

        while self.child.next()? {
            let tuple = current_of(&*self.child)?;
            let field_num = self.view.meta().field_num();
            if tuple.cell_num() != field_num {
                bail!(ExecError::Internal(format!(
                    "view '{}' has {} fields but its plan produced {} cells",
                    self.view.name(),
                    field_num,
                    tuple.cell_num()
                )));
            }
            let values = (0..field_num)
                .map(|i| tuple.cell_at(i))
                .collect::<Result<Vec<_>>>()?;
            let mut record = self.view.make_record(&values)?;
            record.set_base_rids(tuple.base_rids());

            if trx.visit_record(&self.relation, &record, self.mode)? == Visibility::Invisible {
                continue;
            }
            let name = self.alias.clone().unwrap_or_else(|| self.view.name().to_string());
            let row = RowTuple::with_table_name(name, self.view.meta().clone(), record);
            if filter_row(&self.predicates, &row, self.parent.as_ref())? {
                self.current = Some(row);
                return Ok(true);
            }
        }
        self.current = None;
        Ok(false)
    }

    fn close(&mut self) -> Result<()> {
        self.current = None;
        self.trx = None;
        self.child.close()
    }

    fn current_tuple(&self) -> Option<&dyn Tuple> {
        self.current.as_ref().map(|t| t as &dyn Tuple)
    }

    fn set_parent_tuple(&mut self, parent: Option<ValueListTuple>) {
        self.parent = parent;
    }
}
