//! # Logical Operators
//!
//! The logical plan says what a statement computes without fixing how. Each
//! variant carries its own struct; children are boxed and owned by the
//! parent, so rewrite rules can take a subtree out with `std::mem::take` and
//! put a new one back.
//!
//! ## Operator Categories
//!
//! - **Access**: `TableGet`, `ViewGet`, `VectorScan`
//! - **Selection**: `Predicate`
//! - **Projection**: `Project`
//! - **Joining**: `Join`
//! - **Ordering**: `OrderBy`, `Limit`
//! - **Aggregation**: `GroupBy`
//! - **DML**: `Insert`, `Update`, `Delete`
//!
//! `VectorScan` never comes out of plan construction; only the vector index
//! rewrite produces it.

use crate::ivfflat::IndexHandle;
use crate::sql::executor::OrderByUnit;
use crate::sql::expr::{AggregateExpr, Expression};
use crate::storage::{ReadWriteMode, Relation, Table, View};
use crate::types::Value;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Default)]
pub enum LogicalOperator {
    /// Placeholder left behind while a rule rebuilds a subtree.
    #[default]
    Empty,
    TableGet(LogicalTableGet),
    ViewGet(LogicalViewGet),
    VectorScan(LogicalVectorScan),
    Predicate(LogicalPredicate),
    Project(LogicalProject),
    Join(LogicalJoin),
    OrderBy(LogicalOrderBy),
    Limit(LogicalLimit),
    GroupBy(LogicalGroupBy),
    Insert(LogicalInsert),
    Update(LogicalUpdate),
    Delete(LogicalDelete),
}

#[derive(Debug)]
pub struct LogicalTableGet {
    pub table: Arc<Table>,
    pub alias: Option<String>,
    pub predicates: Vec<Expression>,
    pub mode: ReadWriteMode,
}

impl LogicalTableGet {
    /// The name cells of this scan report: the alias when there is one.
    pub fn visible_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(self.table.name())
    }
}

#[derive(Debug)]
pub struct LogicalViewGet {
    pub view: Arc<View>,
    pub alias: Option<String>,
    /// The view's defining plan.
    pub child: Box<LogicalOperator>,
    pub predicates: Vec<Expression>,
    pub mode: ReadWriteMode,
}

#[derive(Debug)]
pub struct LogicalVectorScan {
    pub table: Arc<Table>,
    pub alias: Option<String>,
    pub index: IndexHandle,
    pub base_vector: Vec<f32>,
    pub limit: usize,
    pub predicates: Vec<Expression>,
    pub mode: ReadWriteMode,
}

#[derive(Debug)]
pub struct LogicalPredicate {
    pub child: Box<LogicalOperator>,
    pub predicate: Expression,
}

#[derive(Debug)]
pub struct LogicalProject {
    pub child: Box<LogicalOperator>,
    pub exprs: Vec<Expression>,
}

#[derive(Debug)]
pub struct LogicalJoin {
    pub left: Box<LogicalOperator>,
    pub right: Box<LogicalOperator>,
    pub condition: Option<Expression>,
}

#[derive(Debug)]
pub struct LogicalOrderBy {
    pub child: Box<LogicalOperator>,
    pub units: Vec<OrderByUnit>,
}

#[derive(Debug)]
pub struct LogicalLimit {
    pub child: Box<LogicalOperator>,
    pub limit: usize,
}

#[derive(Debug)]
pub struct LogicalGroupBy {
    pub child: Box<LogicalOperator>,
    pub group_by: Vec<Expression>,
    pub aggregates: Vec<AggregateExpr>,
}

#[derive(Debug)]
pub struct LogicalInsert {
    pub relation: Relation,
    pub rows: Vec<Vec<Value<'static>>>,
}

#[derive(Debug)]
pub struct LogicalUpdate {
    pub child: Box<LogicalOperator>,
    pub relation: Relation,
    pub assignments: Vec<(String, Expression)>,
}

#[derive(Debug)]
pub struct LogicalDelete {
    pub child: Box<LogicalOperator>,
    pub relation: Relation,
}

impl LogicalOperator {
    pub fn table_get(table: Arc<Table>) -> Self {
        LogicalOperator::TableGet(LogicalTableGet {
            table,
            alias: None,
            predicates: Vec::new(),
            mode: ReadWriteMode::ReadOnly,
        })
    }

    pub fn predicate(child: LogicalOperator, predicate: Expression) -> Self {
        LogicalOperator::Predicate(LogicalPredicate {
            child: Box::new(child),
            predicate,
        })
    }

    pub fn project(child: LogicalOperator, exprs: Vec<Expression>) -> Self {
        LogicalOperator::Project(LogicalProject {
            child: Box::new(child),
            exprs,
        })
    }

    pub fn join(left: LogicalOperator, right: LogicalOperator, condition: Option<Expression>) -> Self {
        LogicalOperator::Join(LogicalJoin {
            left: Box::new(left),
            right: Box::new(right),
            condition,
        })
    }

    pub fn order_by(child: LogicalOperator, units: Vec<OrderByUnit>) -> Self {
        LogicalOperator::OrderBy(LogicalOrderBy {
            child: Box::new(child),
            units,
        })
    }

    pub fn limit(child: LogicalOperator, limit: usize) -> Self {
        LogicalOperator::Limit(LogicalLimit {
            child: Box::new(child),
            limit,
        })
    }

    pub fn group_by(
        child: LogicalOperator,
        group_by: Vec<Expression>,
        aggregates: Vec<AggregateExpr>,
    ) -> Self {
        LogicalOperator::GroupBy(LogicalGroupBy {
            child: Box::new(child),
            group_by,
            aggregates,
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            LogicalOperator::Empty => "EMPTY",
            LogicalOperator::TableGet(_) => "TABLE_GET",
            LogicalOperator::ViewGet(_) => "VIEW_GET",
            LogicalOperator::VectorScan(_) => "VECTOR_SCAN",
            LogicalOperator::Predicate(_) => "PREDICATE",
            LogicalOperator::Project(_) => "PROJECT",
            LogicalOperator::Join(_) => "JOIN",
            LogicalOperator::OrderBy(_) => "ORDER_BY",
            LogicalOperator::Limit(_) => "LIMIT",
            LogicalOperator::GroupBy(_) => "GROUP_BY",
            LogicalOperator::Insert(_) => "INSERT",
            LogicalOperator::Update(_) => "UPDATE",
            LogicalOperator::Delete(_) => "DELETE",
        }
    }

    pub fn children_mut(&mut self) -> Vec<&mut LogicalOperator> {
        match self {
            LogicalOperator::Empty
            | LogicalOperator::TableGet(_)
            | LogicalOperator::VectorScan(_)
            | LogicalOperator::Insert(_) => Vec::new(),
            LogicalOperator::ViewGet(op) => vec![&mut *op.child],
            LogicalOperator::Predicate(op) => vec![&mut *op.child],
            LogicalOperator::Project(op) => vec![&mut *op.child],
            LogicalOperator::Join(op) => vec![&mut *op.left, &mut *op.right],
            LogicalOperator::OrderBy(op) => vec![&mut *op.child],
            LogicalOperator::Limit(op) => vec![&mut *op.child],
            LogicalOperator::GroupBy(op) => vec![&mut *op.child],
            LogicalOperator::Update(op) => vec![&mut *op.child],
            LogicalOperator::Delete(op) => vec![&mut *op.child],
        }
    }

    pub fn children(&self) -> Vec<&LogicalOperator> {
        match self {
            LogicalOperator::Empty
            | LogicalOperator::TableGet(_)
            | LogicalOperator::VectorScan(_)
            | LogicalOperator::Insert(_) => Vec::new(),
            LogicalOperator::ViewGet(op) => vec![&*op.child],
            LogicalOperator::Predicate(op) => vec![&*op.child],
            LogicalOperator::Project(op) => vec![&*op.child],
            LogicalOperator::Join(op) => vec![&*op.left, &*op.right],
            LogicalOperator::OrderBy(op) => vec![&*op.child],
            LogicalOperator::Limit(op) => vec![&*op.child],
            LogicalOperator::GroupBy(op) => vec![&*op.child],
            LogicalOperator::Update(op) => vec![&*op.child],
            LogicalOperator::Delete(op) => vec![&*op.child],
        }
    }

    fn fmt_tree(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        write!(f, "{:indent$}{}", "", self.name(), indent = depth * 2)?;
        match self {
            LogicalOperator::TableGet(op) => write!(f, "({})", op.visible_name())?,
            LogicalOperator::ViewGet(op) => write!(f, "({})", op.view.name())?,
            LogicalOperator::VectorScan(op) => {
                write!(f, "({}, limit={})", op.table.name(), op.limit)?
            }
            LogicalOperator::Limit(op) => write!(f, "({})", op.limit)?,
            _ => {}
        }
        writeln!(f)?;
        for child in self.children() {
            child.fmt_tree(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_tree(f, 0)
    }
}
