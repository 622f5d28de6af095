//! Hash aggregation.
//!
//! Rows are grouped by the byte encoding of their group-by values
//! ([`Value::encode_key`]), so two NULLs fall into the same group. Groups are
//! emitted in the order their first row arrived. Without group-by
//! expressions the operator is a scalar aggregate and always yields one row,
//! even over empty input.
//!
//! Output cells are the group-by values followed by the aggregate results,
//! named after their expressions (`COUNT(*)`, `SUM(t.a)` etc. via
//! `AggregateExpr::name`).

use super::{close_after_error, current_of, OperatorKind, PhysicalOperator};
use crate::sql::aggregate::Aggregator;
use crate::sql::expr::{AggregateExpr, Expression};
use crate::sql::tuple::{JoinedTuple, Tuple, TupleCellSpec, ValueListTuple};
use crate::storage::TrxRef;
use crate::types::Value;
use eyre::Result;
use hashbrown::HashMap;
use tracing::trace;

struct Group {
    keys: Vec<Value<'static>>,
    aggregators: Vec<Box<dyn Aggregator>>,
}

pub struct GroupByOperator {
    child: Box<dyn PhysicalOperator>,
    group_by: Vec<Expression>,
    aggregates: Vec<AggregateExpr>,
    parent: Option<ValueListTuple>,
    output: Vec<ValueListTuple>,
    pos: usize,
}

impl GroupByOperator {
    pub fn new(
        child: Box<dyn PhysicalOperator>,
        group_by: Vec<Expression>,
        aggregates: Vec<AggregateExpr>,
    ) -> Self {
        Self {
            child,
            group_by,
            aggregates,
            parent: None,
            output: Vec::new(),
            pos: 0,
        }
    }

    fn new_group(&self, keys: Vec<Value<'static>>) -> Group {
        Group {
            keys,
            aggregators: self.aggregates.iter().map(AggregateExpr::create_aggregator).collect(),
        }
    }

    fn output_specs(&self) -> Vec<TupleCellSpec> {
        let keys = self.group_by.iter().map(|expr| match expr {
            Expression::Field(f) => TupleCellSpec::with_alias(&f.table, &f.field, &f.field),
            other => TupleCellSpec::from_alias(&other.name()),
        });
        let aggregates = self
            .aggregates
            .iter()
            .map(|agg| TupleCellSpec::from_alias(&agg.name()));
        keys.chain(aggregates).collect()
    }

    fn aggregate(&mut self) -> Result<()> {
        let mut slots: HashMap<Vec<u8>, usize> = HashMap::new();
        let mut groups: Vec<Group> = Vec::new();
        let mut key_buf = Vec::new();

        while self.child.next()? {
            let tuple = current_of(&*self.child)?;
            let joined = JoinedTuple::new(tuple, self.parent.as_ref().map(|p| p as &dyn Tuple));

            let keys = self
                .group_by
                .iter()
                .map(|expr| expr.get_value(&joined).map(Value::into_owned))
                .collect::<Result<Vec<_>>>()?;
            key_buf.clear();
            for key in &keys {
                key.encode_key(&mut key_buf);
            }

            let slot = match slots.get(key_buf.as_slice()) {
                Some(&slot) => slot,
                None => {
                    groups.push(self.new_group(keys));
                    slots.insert(key_buf.clone(), groups.len() - 1);
                    groups.len() - 1
                }
            };
            let group = &mut groups[slot];
            for (agg, aggregator) in self.aggregates.iter().zip(group.aggregators.iter_mut()) {
                let value = agg.child.get_value(&joined)?;
                aggregator.accumulate(&value)?;
            }
        }

        if groups.is_empty() && self.group_by.is_empty() {
            groups.push(self.new_group(Vec::new()));
        }
        trace!(groups = groups.len(), aggregates = self.aggregates.len(), "aggregated input");

        let specs = self.output_specs();
        self.output = groups
            .into_iter()
            .map(|group| {
                let mut cells = group.keys;
                cells.extend(group.aggregators.iter().map(|a| a.evaluate()));
                ValueListTuple::new(specs.clone(), cells)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(())
    }
}

impl PhysicalOperator for GroupByOperator {
    fn kind(&self) -> OperatorKind {
        OperatorKind::GroupBy
    }

    fn open(&mut self, trx: TrxRef) -> Result<()> {
        for expr in &self.group_by {
            expr.attach_trx(&trx);
        }
        for agg in &self.aggregates {
            agg.child.attach_trx(&trx);
        }
        self.child.open(trx)?;
        self.output.clear();
        self.pos = 0;
        if let Err(err) = self.aggregate() {
            return Err(close_after_error(&mut *self.child, err));
        }
        Ok(())
    }

    fn next(&mut self) -> Result<bool> {
        if self.pos >= self.output.len() {
            self.pos = self.output.len() + 1;
            return Ok(false);
        }
        self.pos += 1;
        Ok(true)
    }

    fn close(&mut self) -> Result<()> {
        self.output.clear();
        self.pos = 0;
        self.child.close()
    }

    fn current_tuple(&self) -> Option<&dyn Tuple> {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.output.get(i))
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
    use crate::sql::aggregate::AggregateKind;
    use crate::sql::executor::{collect_rows, TableScanOperator};
    use crate::sql::expr::{FieldExpr, ValueExpr};
    use crate::storage::{ReadWriteMode, Table, VacuousTrx};
    use crate::types::DataType;

    fn scan(rows: &[(&str, Value<'static>)]) -> Box<dyn PhysicalOperator> {
        let table = Table::create("t", vec![FieldDef::chars("g", 4), FieldDef::int("x").nullable()]).unwrap();
        for (g, x) in rows {
            let mut r = table.make_record(&[Value::chars(*g), x.clone()]).unwrap();
            table.insert_record(&mut r).unwrap();
        }
        Box::new(TableScanOperator::new(table, None, ReadWriteMode::ReadOnly, vec![]))
    }

    fn x() -> Expression {
        FieldExpr::new("t", "x", DataType::Ints).into()
    }

    fn count_star() -> AggregateExpr {
        AggregateExpr::new(AggregateKind::Count, ValueExpr::named(Value::Int(1), "*").into())
    }

    #[test]
    fn groups_in_first_seen_order() {
        let input = [
            ("b", Value::Int(1)),
            ("a", Value::Int(2)),
            ("b", Value::Int(3)),
            ("a", Value::Null),
        ];
        let mut op = GroupByOperator::new(
            scan(&input),
            vec![FieldExpr::new("t", "g", DataType::Chars).into()],
            vec![count_star(), AggregateExpr::new(AggregateKind::Sum, x())],
        );
        let rows = collect_rows(&mut op, VacuousTrx::shared()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cells(), &[Value::chars("b"), Value::Int(2), Value::Int(4)]);
        assert_eq!(rows[1].cells(), &[Value::chars("a"), Value::Int(2), Value::Int(2)]);
        assert_eq!(rows[0].specs()[1].alias, "COUNT(*)");
    }

    #[test]
    fn scalar_aggregate_over_empty_input_yields_one_row() {
        let mut op = GroupByOperator::new(
            scan(&[]),
            vec![],
            vec![count_star(), AggregateExpr::new(AggregateKind::Max, x())],
        );
        let rows = collect_rows(&mut op, VacuousTrx::shared()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cells()[0], Value::Int(0));
        assert!(rows[0].cells()[1].is_null());
    }

    #[test]
    fn grouped_aggregate_over_empty_input_yields_nothing() {
        let mut op = GroupByOperator::new(
            scan(&[]),
            vec![FieldExpr::new("t", "g", DataType::Chars).into()],
            vec![count_star()],
        );
        assert!(collect_rows(&mut op, VacuousTrx::shared()).unwrap().is_empty());
    }

    #[test]
    fn null_keys_form_one_group() {
        let input = [("a", Value::Null), ("b", Value::Null), ("c", Value::Int(1))];
        let mut op = GroupByOperator::new(scan(&input), vec![x()], vec![count_star()]);
        let rows = collect_rows(&mut op, VacuousTrx::shared()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cells(), &[Value::Null, Value::Int(2)]);
    }
}
