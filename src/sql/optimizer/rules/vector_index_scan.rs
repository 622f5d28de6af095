//! # Vector Index Scan Rule
//!
//! Replaces an exact nearest-neighbour plan with an IVFFLAT probe:
//!
//! ```text
//! Limit(n)                                    VectorScan(t, index, q, n)
//!   └── OrderBy(distance(t.v, q) ASC)   ==>     [t's predicates kept]
//!         └── TableGet(t)
//! ```
//!
//! ## Match Conditions
//!
//! All of the following must hold, otherwise the plan is left untouched:
//!
//! - exactly one ascending ORDER BY key
//! - the key is `l2_distance`, `cosine_distance` or `inner_product`
//! - one argument is a field of the scanned table, the other a constant
//!   that is a vector or a string that parses as one
//! - the field is NOT NULL, since NULL distances sort first and the index
//!   never holds NULL vectors
//! - the table has an index on that field with the same distance function
//! - the constant has the index's dimension

use crate::error::ExecError;
use crate::ivfflat::IndexHandle;
use crate::sql::expr::{Expression, FieldExpr};
use crate::sql::optimizer::RewriteRule;
use crate::sql::planner::{
    LogicalLimit, LogicalOperator, LogicalOrderBy, LogicalTableGet, LogicalVectorScan,
};
use crate::types::{parse_vector, Value};
use eyre::{bail, Result};
use std::mem;
use tracing::debug;

pub struct VectorIndexScanRule;

struct Probe {
    index: IndexHandle,
    base_vector: Vec<f32>,
}

impl RewriteRule for VectorIndexScanRule {
    fn name(&self) -> &'static str {
        "vector_index_scan"
    }

    fn apply(&self, plan: &mut LogicalOperator) -> Result<bool> {
        let Some(probe) = find_probe(plan) else {
            return Ok(false);
        };

        let rebuilt = match mem::take(plan) {
            LogicalOperator::Limit(LogicalLimit { child, limit }) => match *child {
                LogicalOperator::OrderBy(LogicalOrderBy { child, .. }) => match *child {
                    LogicalOperator::TableGet(get) => {
                        debug!(
                            table = get.table.name(),
                            limit,
                            dim = probe.base_vector.len(),
                            "rewrote order-by-distance into vector index scan"
                        );
                        LogicalOperator::VectorScan(LogicalVectorScan {
                            table: get.table,
                            alias: get.alias,
                            index: probe.index,
                            base_vector: probe.base_vector,
                            limit,
                            predicates: get.predicates,
                            mode: get.mode,
                        })
                    }
                    other => bail!(shape_changed(&other)),
                },
                other => bail!(shape_changed(&other)),
            },
            other => bail!(shape_changed(&other)),
        };
        *plan = rebuilt;
        Ok(true)
    }
}

fn shape_changed(node: &LogicalOperator) -> ExecError {
    ExecError::Internal(format!("unexpected {} while building vector scan", node.name()))
}

fn find_probe(plan: &LogicalOperator) -> Option<Probe> {
    let LogicalOperator::Limit(limit) = plan else {
        return None;
    };
    let LogicalOperator::OrderBy(order) = &*limit.child else {
        return None;
    };
    let LogicalOperator::TableGet(get) = &*order.child else {
        return None;
    };
    let [unit] = order.units.as_slice() else {
        debug!(keys = order.units.len(), "vector rewrite skipped: needs exactly one order key");
        return None;
    };
    if !unit.ascending {
        debug!("vector rewrite skipped: descending order");
        return None;
    }
    let Expression::Function(call) = &unit.expr else {
        return None;
    };
    let distance_fn = call.func.distance_function()?;

    let (field, constant) = match call.args.as_slice() {
        [Expression::Field(f), other] | [other, Expression::Field(f)] if other.is_constant() => {
            (f, other)
        }
        _ => return None,
    };
    if !belongs_to(field, get) {
        debug!(field = %field.spec(), table = get.table.name(), "vector rewrite skipped: field of another table");
        return None;
    }
    if get.table.meta().field(&field.field).map_or(true, |f| f.nullable) {
        debug!(field = field.field.as_str(), "vector rewrite skipped: nullable field");
        return None;
    }
    let base_vector = constant_vector(constant)?;

    let Some(index) = get.table.find_vector_index(distance_fn, &field.field) else {
        debug!(
            table = get.table.name(),
            field = field.field.as_str(),
            distance = distance_fn.name(),
            "vector rewrite skipped: no matching index"
        );
        return None;
    };
    let dim = index.read().dim();
    if dim != base_vector.len() {
        debug!(dim, query_dim = base_vector.len(), "vector rewrite skipped: dimension mismatch");
        return None;
    }
    Some(Probe { index, base_vector })
}

fn belongs_to(field: &FieldExpr, get: &LogicalTableGet) -> bool {
    field.table.is_empty()
        || field.table.eq_ignore_ascii_case(get.visible_name())
        || field.table.eq_ignore_ascii_case(get.table.name())
}

fn constant_vector(expr: &Expression) -> Option<Vec<f32>> {
    match expr.try_get_value().ok()? {
        Value::Vector(v) => Some(v.into_owned()),
        Value::Char(s) | Value::Text(s) => parse_vector(&s).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IvfflatOptions;
    use crate::ivfflat::DistanceFunction;
    use crate::records::FieldDef;
    use crate::sql::executor::OrderByUnit;
    use crate::sql::expr::FunctionExpr;
    use crate::sql::functions::BuiltinFunction;
    use crate::storage::Table;
    use crate::types::DataType;
    use std::sync::Arc;

    fn items() -> Arc<Table> {
        let table = Table::create("items", vec![FieldDef::int("id"), FieldDef::vector("v", 2)]).unwrap();
        table
            .create_ivfflat_index("idx_v", "v", DistanceFunction::L2, IvfflatOptions::default())
            .unwrap();
        table
    }

    fn distance(func: BuiltinFunction, args: Vec<Expression>) -> Expression {
        FunctionExpr::new(func, args).into()
    }

    fn v() -> Expression {
        FieldExpr::new("items", "v", DataType::Vectors).into()
    }

    fn nearest(table: Arc<Table>, units: Vec<OrderByUnit>) -> LogicalOperator {
        LogicalOperator::limit(
            LogicalOperator::order_by(LogicalOperator::table_get(table), units),
            3,
        )
    }

    #[test]
    fn rewrites_matching_plan() {
        let key = distance(BuiltinFunction::L2Distance, vec![v(), Value::chars("[1,2]").into()]);
        let mut plan = nearest(items(), vec![OrderByUnit::asc(key)]);
        assert!(VectorIndexScanRule.apply(&mut plan).unwrap());
        let LogicalOperator::VectorScan(scan) = &plan else {
            panic!("expected vector scan, got {}", plan.name());
        };
        assert_eq!(scan.limit, 3);
        assert_eq!(scan.base_vector, vec![1.0, 2.0]);
    }

    #[test]
    fn field_may_be_either_argument() {
        let key = distance(BuiltinFunction::L2Distance, vec![Value::from(vec![0.0, 0.0]).into(), v()]);
        let mut plan = nearest(items(), vec![OrderByUnit::asc(key)]);
        assert!(VectorIndexScanRule.apply(&mut plan).unwrap());
    }

    #[test]
    fn non_matching_plans_are_untouched() {
        let cases = vec![
            vec![OrderByUnit::desc(distance(BuiltinFunction::L2Distance, vec![v(), Value::chars("[1,2]").into()]))],
            vec![OrderByUnit::asc(distance(BuiltinFunction::CosineDistance, vec![v(), Value::chars("[1,2]").into()]))],
            vec![OrderByUnit::asc(distance(BuiltinFunction::L2Distance, vec![v(), Value::chars("[1,2,3]").into()]))],
            vec![OrderByUnit::asc(distance(BuiltinFunction::L2Distance, vec![v(), v()]))],
            vec![OrderByUnit::asc(v())],
            vec![
                OrderByUnit::asc(distance(BuiltinFunction::L2Distance, vec![v(), Value::chars("[1,2]").into()])),
                OrderByUnit::asc(FieldExpr::new("items", "id", DataType::Ints).into()),
            ],
        ];
        for units in cases {
            let mut plan = nearest(items(), units);
            assert!(!VectorIndexScanRule.apply(&mut plan).unwrap());
            assert_eq!(plan.name(), "LIMIT");
        }
    }

    #[test]
    fn nullable_field_is_not_rewritten() {
        let table = Table::create("items", vec![FieldDef::int("id"), FieldDef::vector("v", 2).nullable()]).unwrap();
        table
            .create_ivfflat_index("idx_v", "v", DistanceFunction::L2, IvfflatOptions::default())
            .unwrap();
        let key = distance(BuiltinFunction::L2Distance, vec![v(), Value::chars("[1,2]").into()]);
        let mut plan = nearest(table, vec![OrderByUnit::asc(key)]);
        assert!(!VectorIndexScanRule.apply(&mut plan).unwrap());
        assert_eq!(plan.name(), "LIMIT");
    }

    #[test]
    fn field_of_other_table_is_not_rewritten() {
        let other = FieldExpr::new("other", "v", DataType::Vectors).into();
        let key = distance(BuiltinFunction::L2Distance, vec![other, Value::chars("[1,2]").into()]);
        let mut plan = nearest(items(), vec![OrderByUnit::asc(key)]);
        assert!(!VectorIndexScanRule.apply(&mut plan).unwrap());
    }
}
