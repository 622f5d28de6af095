//! Sort operator.
//!
//! The child is drained at `open()`; each row is snapshotted with its sort
//! keys and the buffer is stable-sorted. NULL sorts before every non-NULL
//! value in ascending order and after it in descending order. Rows with equal
//! keys keep their input order.

use super::{close_after_error, current_of, OperatorKind, PhysicalOperator};
use crate::sql::expr::Expression;
use crate::sql::tuple::{JoinedTuple, Tuple, ValueListTuple};
use crate::storage::TrxRef;
use crate::types::Value;
use eyre::Result;
use std::cmp::Ordering;
use tracing::trace;

#[derive(Debug)]
pub struct OrderByUnit {
    pub expr: Expression,
    pub ascending: bool,
}

impl OrderByUnit {
    pub fn new(expr: Expression, ascending: bool) -> Self {
        Self { expr, ascending }
    }

    pub fn asc(expr: Expression) -> Self {
        Self::new(expr, true)
    }

    pub fn desc(expr: Expression) -> Self {
        Self::new(expr, false)
    }
}

type SortEntry = (Vec<Value<'static>>, ValueListTuple);

pub struct OrderByOperator {
    child: Box<dyn PhysicalOperator>,
    units: Vec<OrderByUnit>,
    parent: Option<ValueListTuple>,
    rows: Vec<ValueListTuple>,
    pos: usize,
}

impl OrderByOperator {
    pub fn new(child: Box<dyn PhysicalOperator>, units: Vec<OrderByUnit>) -> Self {
        Self {
            child,
            units,
            parent: None,
            rows: Vec::new(),
            pos: 0,
        }
    }

    fn fill(&mut self) -> Result<()> {
        let mut entries: Vec<SortEntry> = Vec::new();
        while self.child.next()? {
            let tuple = current_of(&*self.child)?;
            let joined = JoinedTuple::new(tuple, self.parent.as_ref().map(|p| p as &dyn Tuple));
            let keys = self
                .units
                .iter()
                .map(|unit| unit.expr.get_value(&joined).map(Value::into_owned))
                .collect::<Result<Vec<_>>>()?;
            entries.push((keys, ValueListTuple::snapshot(tuple)?));
        }

        let mut failure = None;
        entries.sort_by(|a, b| match compare_keys(&self.units, &a.0, &b.0) {
            Ok(ordering) => ordering,
            Err(err) => {
                failure.get_or_insert(err);
                Ordering::Equal
            }
        });
        if let Some(err) = failure {
            return Err(err);
        }

        trace!(rows = entries.len(), keys = self.units.len(), "sorted input");
        self.rows = entries.into_iter().map(|(_, row)| row).collect();
        Ok(())
    }
}

fn compare_keys(units: &[OrderByUnit], a: &[Value<'_>], b: &[Value<'_>]) -> Result<Ordering> {
    for ((unit, x), y) in units.iter().zip(a).zip(b) {
        let ordering = match (x.is_null(), y.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => x.compare(y)?,
        };
        let ordering = if unit.ascending { ordering } else { ordering.reverse() };
        if ordering != Ordering::Equal {
            return Ok(ordering);
        }
    }
    Ok(Ordering::Equal)
}

impl PhysicalOperator for OrderByOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::OrderBy
    }

    fn open(&mut self, trx: TrxRef) -> Result<()> {
        for unit in &self.units {
            unit.expr.attach_trx(&trx);
        }
        self.child.open(trx)?;
        self.rows.clear();
        self.pos = 0;
        if let Err(err) = self.fill() {
            return Err(close_after_error(&mut *self.child, err));
        }
        Ok(())
    }

    fn next(&mut self) -> Result<bool> {
        if self.pos >= self.rows.len() {
            self.pos = self.rows.len() + 1;
            return Ok(false);
        }
        self.pos += 1;
        Ok(true)
    }

    fn close(&mut self) -> Result<()> {
        self.rows.clear();
        self.pos = 0;
        self.child.close()
    }

    fn current_tuple(&self) -> Option<&dyn Tuple> {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.rows.get(i))
            .map(|t| t as &dyn Tuple)
    }

    fn set_parent_tuple(&mut self, parent: Option<ValueListTuple>) {
        self.parent = parent.clone();
        self.child.set_parent_tuple(parent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::FieldDef;
    use crate::sql::executor::{collect_rows, TableScanOperator};
    use crate::sql::expr::FieldExpr;
    use crate::storage::{ReadWriteMode, Table, VacuousTrx};
    use crate::types::DataType;

    fn scan(rows: &[(Value<'static>, i32)]) -> Box<dyn PhysicalOperator> {
        let table = Table::create("t", vec![FieldDef::int("k").nullable(), FieldDef::int("seq")]).unwrap();
        for (k, seq) in rows {
            let mut r = table.make_record(&[k.clone(), Value::Int(*seq)]).unwrap();
            table.insert_record(&mut r).unwrap();
        }
        Box::new(TableScanOperator::new(table, None, ReadWriteMode::ReadOnly, vec![]))
    }

    fn key() -> Expression {
        FieldExpr::new("t", "k", DataType::Ints).into()
    }

    fn seqs(op: &mut OrderByOperator) -> Vec<i32> {
        collect_rows(op, VacuousTrx::shared())
            .unwrap()
            .iter()
            .map(|r| r.cells()[1].get_int())
            .collect()
    }

    #[test]
    fn ascending_puts_null_first_and_is_stable() {
        let input = [(Value::Int(2), 0), (Value::Null, 1), (Value::Int(1), 2), (Value::Int(2), 3)];
        let mut op = OrderByOperator::new(scan(&input), vec![OrderByUnit::asc(key())]);
        assert_eq!(seqs(&mut op), vec![1, 2, 0, 3]);
    }

    #[test]
    fn descending_puts_null_last() {
        let input = [(Value::Null, 0), (Value::Int(1), 1), (Value::Int(3), 2)];
        let mut op = OrderByOperator::new(scan(&input), vec![OrderByUnit::desc(key())]);
        assert_eq!(seqs(&mut op), vec![2, 1, 0]);
    }

    #[test]
    fn secondary_key_breaks_ties() {
        let input = [(Value::Int(1), 0), (Value::Int(1), 1), (Value::Int(0), 2)];
        let units = vec![
            OrderByUnit::asc(key()),
            OrderByUnit::desc(FieldExpr::new("t", "seq", DataType::Ints).into()),
        ];
        let mut op = OrderByOperator::new(scan(&input), units);
        assert_eq!(seqs(&mut op), vec![2, 1, 0]);
    }

    #[test]
    fn empty_input() {
        let mut op = OrderByOperator::new(scan(&[]), vec![OrderByUnit::asc(key())]);
        assert!(seqs(&mut op).is_empty());
    }
}
