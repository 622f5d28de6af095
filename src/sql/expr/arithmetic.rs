//! Binary `+ - * /` and unary minus.
//!
//! Result typing:
//!
//! | Operands | `+ - *` | `/` |
//! |----------|---------|-----|
//! | INT, INT | INT | FLOAT |
//! | VECTOR, VECTOR | VECTOR | unsupported |
//! | otherwise numeric | FLOAT | FLOAT |
//!
//! A NULL operand makes the result NULL. Unary minus keeps its operand's type.

use super::Expression;
use crate::error::ExecError;
use crate::sql::tuple::Tuple;
use crate::types::{DataType, Value};
use eyre::{bail, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Mul,
    Div,
    Negative,
}

impl ArithmeticOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            ArithmeticOp::Add => "+",
            ArithmeticOp::Sub | ArithmeticOp::Negative => "-",
            ArithmeticOp::Mul => "*",
            ArithmeticOp::Div => "/",
        }
    }
}

#[derive(Debug)]
pub struct ArithmeticExpr {
    op: ArithmeticOp,
    left: Box<Expression>,
    right: Option<Box<Expression>>,
}

impl ArithmeticExpr {
    /// `right` is `None` only for [`ArithmeticOp::Negative`].
    pub fn new(op: ArithmeticOp, left: Expression, right: Option<Expression>) -> Self {
        Self {
            op,
            left: Box::new(left),
            right: right.map(Box::new),
        }
    }

    pub fn negative(child: Expression) -> Self {
        Self::new(ArithmeticOp::Negative, child, None)
    }

    pub fn op(&self) -> ArithmeticOp {
        self.op
    }

    pub fn left(&self) -> &Expression {
        &self.left
    }

    pub fn right(&self) -> Option<&Expression> {
        self.right.as_deref()
    }

    pub fn into_parts(self) -> (ArithmeticOp, Expression, Option<Expression>) {
        (self.op, *self.left, self.right.map(|r| *r))
    }

    pub fn name(&self) -> String {
        match &self.right {
            Some(right) => format!("{}{}{}", self.left.name(), self.op.symbol(), right.name()),
            None => format!("-{}", self.left.name()),
        }
    }

    pub fn value_type(&self) -> DataType {
        let left = self.left.value_type();
        let Some(right) = self.right.as_deref().map(Expression::value_type) else {
            return left;
        };
        match (left, right) {
            (DataType::Ints, DataType::Ints) if self.op != ArithmeticOp::Div => DataType::Ints,
            (DataType::Vectors, DataType::Vectors) => DataType::Vectors,
            _ => DataType::Floats,
        }
    }

    pub(super) fn get_value<'t>(&self, tuple: &'t dyn Tuple) -> Result<Value<'t>> {
        let left = self.left.get_value(tuple)?;
        let Some(right) = self.right.as_deref() else {
            if self.op != ArithmeticOp::Negative {
                bail!(ExecError::Internal(format!(
                    "binary '{}' without a right operand",
                    self.op.symbol()
                )));
            }
            return left.negative();
        };
        let right = right.get_value(tuple)?;
        if left.is_null() || right.is_null() {
            return Ok(Value::Null);
        }
        match self.op {
            ArithmeticOp::Add => left.add(&right),
            ArithmeticOp::Sub => left.subtract(&right),
            ArithmeticOp::Mul => left.multiply(&right),
            ArithmeticOp::Div => left.divide(&right),
            ArithmeticOp::Negative => bail!(ExecError::Internal(
                "unary minus with two operands".into()
            )),
        }
    }
}
