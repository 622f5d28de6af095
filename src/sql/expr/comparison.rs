//! # Comparison Expressions
//!
//! `ComparisonExpr` evaluates to BOOLEAN. NULL handling deliberately
//! collapses three-valued logic:
//!
//! | Operator | NULL operand |
//! |----------|--------------|
//! | `IS` / `IS NOT` | tested directly; the right side must be the NULL literal |
//! | `IN` / `NOT IN` | NULL left side is FALSE; a NULL element makes `NOT IN` FALSE |
//! | everything else | FALSE |
//!
//! The right side of IN / NOT IN is a [`ListExpr`](super::ListExpr), a
//! subquery iterated row by row, or a single value. Scalar subqueries on
//! either side of the other operators must produce at most one row.

use super::Expression;
use crate::error::ExecError;
use crate::sql::tuple::Tuple;
use crate::types::Value;
use eyre::{bail, Result};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompOp {
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
    Like,
    NotLike,
    Is,
    IsNot,
    In,
    NotIn,
}

impl CompOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompOp::Equal => "=",
            CompOp::NotEqual => "<>",
            CompOp::LessThan => "<",
            CompOp::LessEqual => "<=",
            CompOp::GreaterThan => ">",
            CompOp::GreaterEqual => ">=",
            CompOp::Like => " LIKE ",
            CompOp::NotLike => " NOT LIKE ",
            CompOp::Is => " IS ",
            CompOp::IsNot => " IS NOT ",
            CompOp::In => " IN ",
            CompOp::NotIn => " NOT IN ",
        }
    }

    /// Operators whose operands are compared by value and may be cast to a
    /// common type.
    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            CompOp::Equal
                | CompOp::NotEqual
                | CompOp::LessThan
                | CompOp::LessEqual
                | CompOp::GreaterThan
                | CompOp::GreaterEqual
        )
    }

    fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            CompOp::Equal => ordering == Ordering::Equal,
            CompOp::NotEqual => ordering != Ordering::Equal,
            CompOp::LessThan => ordering == Ordering::Less,
            CompOp::LessEqual => ordering != Ordering::Greater,
            CompOp::GreaterThan => ordering == Ordering::Greater,
            CompOp::GreaterEqual => ordering != Ordering::Less,
            _ => false,
        }
    }
}

impl fmt::Display for CompOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol().trim())
    }
}

#[derive(Debug)]
pub struct ComparisonExpr {
    op: CompOp,
    left: Box<Expression>,
    right: Box<Expression>,
}

impl ComparisonExpr {
    pub fn new(op: CompOp, left: Expression, right: Expression) -> Self {
        Self {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn op(&self) -> CompOp {
        self.op
    }

    pub fn left(&self) -> &Expression {
        &self.left
    }

    pub fn right(&self) -> &Expression {
        &self.right
    }

    pub fn into_parts(self) -> (CompOp, Expression, Expression) {
        (self.op, *self.left, *self.right)
    }

    pub fn name(&self) -> String {
        format!("{}{}{}", self.left.name(), self.op.symbol(), self.right.name())
    }

    pub(super) fn get_value<'t>(&self, tuple: &'t dyn Tuple) -> Result<Value<'t>> {
        let result = match self.op {
            CompOp::Is | CompOp::IsNot => self.eval_is(tuple)?,
            CompOp::In | CompOp::NotIn => self.eval_in(tuple)?,
            _ => {
                let left = self.left.get_value(tuple)?;
                let right = self.right.get_value(tuple)?;
                self.compare_values(&left, &right)?
            }
        };
        Ok(Value::Boolean(result))
    }

    fn eval_is(&self, tuple: &dyn Tuple) -> Result<bool> {
        let right_is_null = matches!(&*self.right, Expression::Value(v) if v.value.is_null());
        if !right_is_null {
            bail!(ExecError::NotNullAfterIs);
        }
        let is_null = self.left.get_value(tuple)?.is_null();
        Ok(if self.op == CompOp::Is { is_null } else { !is_null })
    }

    fn eval_in(&self, tuple: &dyn Tuple) -> Result<bool> {
        let left = self.left.get_value(tuple)?;
        if left.is_null() {
            return Ok(false);
        }
        let negated = self.op == CompOp::NotIn;

        match &*self.right {
            Expression::List(list) => {
                for item in &list.items {
                    let value = item.get_value(tuple)?;
                    if let Some(result) = in_step(&left, &value, negated)? {
                        return Ok(result);
                    }
                }
            }
            Expression::Subquery(sub) => {
                let guard = sub.open(tuple)?;
                while let Some(value) = sub.next_value()? {
                    if let Some(result) = in_step(&left, &value, negated)? {
                        guard.close()?;
                        return Ok(result);
                    }
                }
                guard.close()?;
            }
            other => {
                let value = other.get_value(tuple)?;
                if let Some(result) = in_step(&left, &value, negated)? {
                    return Ok(result);
                }
            }
        }
        Ok(negated)
    }

    fn compare_values(&self, left: &Value<'_>, right: &Value<'_>) -> Result<bool> {
        if left.is_null() || right.is_null() {
            return Ok(false);
        }
        match self.op {
            CompOp::Like => left.like(right),
            CompOp::NotLike => left.like(right).map(|matched| !matched),
            op => Ok(op.accepts(left.compare(right)?)),
        }
    }
}

/// One element of an IN scan; `Some` ends the scan with that result.
fn in_step(left: &Value<'_>, item: &Value<'_>, negated: bool) -> Result<Option<bool>> {
    if item.is_null() {
        return Ok(if negated { Some(false) } else { None });
    }
    if left.compare(item)? == Ordering::Equal {
        return Ok(Some(!negated));
    }
    Ok(None)
}
