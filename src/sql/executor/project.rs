//! Select-list evaluation.
//!
//! `*` and `t.*` expand to the matching cells of the child row. Every other
//! expression becomes one output cell named after the expression, so
//! `ORDER BY` and `HAVING` above the projection can find it by alias. Field
//! cells also keep their table and field so qualified references still
//! resolve.

use super::{attach_trx_all, current_of, OperatorKind, PhysicalOperator};
use crate::sql::expr::Expression;
use crate::sql::tuple::{JoinedTuple, Tuple, TupleCellSpec, ValueListTuple};
use crate::storage::TrxRef;
use eyre::Result;

pub struct ProjectOperator {
    child: Box<dyn PhysicalOperator>,
    exprs: Vec<Expression>,
    parent: Option<ValueListTuple>,
    current: Option<ValueListTuple>,
}

impl ProjectOperator {
    pub fn new(child: Box<dyn PhysicalOperator>, exprs: Vec<Expression>) -> Self {
        Self {
            child,
            exprs,
            parent: None,
            current: None,
        }
    }

    pub fn exprs(&self) -> &[Expression] {
        &self.exprs
    }
}

impl PhysicalOperator for ProjectOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::Project
    }

    fn open(&mut self, trx: TrxRef) -> Result<()> {
        attach_trx_all(&self.exprs, &trx);
        self.current = None;
        self.child.open(trx)
    }

    fn next(&mut self) -> Result<bool> {
        if !self.child.next()? {
            self.current = None;
            return Ok(false);
        }
        let tuple = current_of(&*self.child)?;
        let joined = JoinedTuple::new(tuple, self.parent.as_ref().map(|p| p as &dyn Tuple));

        let mut specs = Vec::with_capacity(self.exprs.len());
        let mut cells = Vec::with_capacity(self.exprs.len());
        for expr in &self.exprs {
            match expr {
                Expression::Star(star) => {
                    for i in 0..tuple.cell_num() {
                        let spec = tuple.spec_at(i)?;
                        let wanted = star
                            .table
                            .as_deref()
                            .map_or(true, |t| t.eq_ignore_ascii_case(&spec.table));
                        if wanted {
                            cells.push(tuple.cell_at(i)?.into_owned());
                            specs.push(spec);
                        }
                    }
                }
                Expression::Field(field) => {
                    cells.push(expr.get_value(&joined)?.into_owned());
                    specs.push(TupleCellSpec::with_alias(&field.table, &field.field, &field.field));
                }
                _ => {
                    cells.push(expr.get_value(&joined)?.into_owned());
                    specs.push(TupleCellSpec::from_alias(&expr.name()));
                }
            }
        }

        let base_rids = tuple.base_rids();
        self.current = Some(ValueListTuple::new(specs, cells)?.with_base_rids(base_rids));
        Ok(true)
    }

    fn close(&mut self) -> Result<()> {
        self.current = None;
        self.child.close()
    }

    fn current_tuple(&self) -> Option<&dyn Tuple> {
        self.current.as_ref().map(|t| t as &dyn Tuple)
    }

    fn set_parent_tuple(&mut self, parent: Option<ValueListTuple>) {
        self.parent = parent.clone();
        self.child.set_parent_tuple(parent);
    }
}
