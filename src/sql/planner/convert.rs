//! # Logical to Physical Conversion
//!
//! `PhysicalPlanGenerator::create` maps every logical node to exactly one
//! physical operator, bottom-up. No access-path choice happens here: the
//! vector index decision has already been made by the rewriter, which
//! replaces the access node with `VectorScan`.
//!
//! | Logical | Physical |
//! |---------|----------|
//! | `TableGet` | `TableScanOperator` |
//! | `ViewGet` | `ViewScanOperator` over the view's plan |
//! | `VectorScan` | `VectorScanOperator` |
//! | `Predicate` | `PredicateOperator` |
//! | `Project` | `ProjectOperator` |
//! | `Join` | `NestedLoopJoinOperator` |
//! | `OrderBy` | `OrderByOperator` |
//! | `Limit` | `LimitOperator` |
//! | `GroupBy` | `GroupByOperator` |
//! | `Insert` / `Update` / `Delete` | the DML operator of the same name |

use super::logical::LogicalOperator;
use crate::error::ExecError;
use crate::sql::executor::{
    DeleteOperator, GroupByOperator, InsertOperator, LimitOperator, NestedLoopJoinOperator,
    OrderByOperator, PhysicalOperator, PredicateOperator, ProjectOperator, TableScanOperator,
    UpdateOperator, VectorScanOperator, ViewScanOperator,
};
use eyre::{bail, Result};
use tracing::trace;

pub struct PhysicalPlanGenerator;

impl PhysicalPlanGenerator {
    pub fn create(plan: LogicalOperator) -> Result<Box<dyn PhysicalOperator>> {
        trace!(node = plan.name(), "generating physical operator");
        let op: Box<dyn PhysicalOperator> = match plan {
            LogicalOperator::Empty => {
                bail!(ExecError::Internal("empty logical node reached plan generation".to_string()))
            }
            LogicalOperator::TableGet(get) => Box::new(TableScanOperator::new(
                get.table,
                get.alias,
                get.mode,
                get.predicates,
            )),
            LogicalOperator::ViewGet(get) => {
                let child = Self::create(*get.child)?;
                Box::new(ViewScanOperator::new(
                    get.view,
                    get.alias,
                    child,
                    get.predicates,
                    get.mode,
                ))
            }
            LogicalOperator::VectorScan(scan) => Box::new(VectorScanOperator::new(
                scan.table,
                scan.alias,
                scan.index,
                scan.base_vector,
                scan.limit,
                scan.mode,
                scan.predicates,
            )),
            LogicalOperator::Predicate(op) => {
                Box::new(PredicateOperator::new(Self::create(*op.child)?, op.predicate))
            }
            LogicalOperator::Project(op) => {
                Box::new(ProjectOperator::new(Self::create(*op.child)?, op.exprs))
            }
            LogicalOperator::Join(op) => Box::new(NestedLoopJoinOperator::new(
                Self::create(*op.left)?,
                Self::create(*op.right)?,
                op.condition,
            )),
            LogicalOperator::OrderBy(op) => {
                Box::new(OrderByOperator::new(Self::create(*op.child)?, op.units))
            }
            LogicalOperator::Limit(op) => {
                Box::new(LimitOperator::new(Self::create(*op.child)?, op.limit))
            }
            LogicalOperator::GroupBy(op) => Box::new(GroupByOperator::new(
                Self::create(*op.child)?,
                op.group_by,
                op.aggregates,
            )),
            LogicalOperator::Insert(op) => Box::new(InsertOperator::new(op.relation, op.rows)),
            LogicalOperator::Update(op) => Box::new(UpdateOperator::new(
                Self::create(*op.child)?,
                op.relation,
                op.assignments,
            )?),
            LogicalOperator::Delete(op) => {
                Box::new(DeleteOperator::new(Self::create(*op.child)?, op.relation))
            }
        };
        Ok(op)
    }
}
