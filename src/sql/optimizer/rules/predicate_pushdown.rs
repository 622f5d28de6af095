//! # Predicate Pushdown Rule
//!
//! Folds a `Predicate` node into the access node directly below it, so the
//! scan filters rows before they leave it.
//!
//! ## Transformations
//!
//! | Before | After |
//! |--------|-------|
//! | `Predicate(TableGet)` | `TableGet[predicates += p]` |
//! | `Predicate(ViewGet)` | `ViewGet[predicates += p]` |
//! | `Predicate(VectorScan)` | `VectorScan[predicates += p]` |
//!
//! A top-level AND is split into its conjuncts. Predicates never move past
//! `Limit`, `OrderBy`, `GroupBy` or a join.

use crate::sql::expr::{ConjunctionType, Expression, ValueExpr};
use crate::sql::optimizer::RewriteRule;
use crate::sql::planner::LogicalOperator;
use crate::types::Value;
use eyre::Result;
use std::mem;

pub struct PredicatePushdownRule;

impl RewriteRule for PredicatePushdownRule {
    fn name(&self) -> &'static str {
        "predicate_pushdown"
    }

    fn apply(&self, plan: &mut LogicalOperator) -> Result<bool> {
        let LogicalOperator::Predicate(filter) = plan else {
            return Ok(false);
        };
        let predicates = match &mut *filter.child {
            LogicalOperator::TableGet(get) => &mut get.predicates,
            LogicalOperator::ViewGet(get) => &mut get.predicates,
            LogicalOperator::VectorScan(scan) => &mut scan.predicates,
            _ => return Ok(false),
        };

        let placeholder = Expression::from(ValueExpr::new(Value::Boolean(true)));
        match mem::replace(&mut filter.predicate, placeholder) {
            Expression::Conjunction(conj) if conj.kind() == ConjunctionType::And => {
                predicates.extend(conj.into_children());
            }
            predicate => predicates.push(predicate),
        }

        let child = mem::take(&mut *filter.child);
        *plan = child;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::FieldDef;
    use crate::sql::expr::{CompOp, ComparisonExpr, ConjunctionExpr, FieldExpr};
    use crate::storage::Table;
    use crate::types::DataType;

    fn cmp(v: i32) -> Expression {
        ComparisonExpr::new(
            CompOp::GreaterThan,
            FieldExpr::new("t", "a", DataType::Ints).into(),
            Value::Int(v).into(),
        )
        .into()
    }

    fn scan() -> LogicalOperator {
        LogicalOperator::table_get(Table::create("t", vec![FieldDef::int("a")]).unwrap())
    }

    #[test]
    fn folds_filter_into_scan_and_splits_and() {
        let pred = ConjunctionExpr::and(vec![cmp(1), cmp(2)]);
        let mut plan = LogicalOperator::predicate(scan(), pred.into());
        assert!(PredicatePushdownRule.apply(&mut plan).unwrap());
        let LogicalOperator::TableGet(get) = &plan else {
            panic!("expected table get, got {}", plan.name());
        };
        assert_eq!(get.predicates.len(), 2);
    }

    #[test]
    fn does_not_cross_limit() {
        let mut plan = LogicalOperator::predicate(LogicalOperator::limit(scan(), 1), cmp(0));
        assert!(!PredicatePushdownRule.apply(&mut plan).unwrap());
        assert_eq!(plan.name(), "PREDICATE");
    }
}
