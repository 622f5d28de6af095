//! AND / OR over any number of children, evaluated left to right with
//! short-circuit. A NULL child counts as FALSE.

use super::Expression;
use crate::sql::tuple::Tuple;
use crate::types::Value;
use eyre::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConjunctionType {
    And,
    Or,
}

#[derive(Debug)]
pub struct ConjunctionExpr {
    kind: ConjunctionType,
    children: Vec<Expression>,
}

impl ConjunctionExpr {
    pub fn new(kind: ConjunctionType, children: Vec<Expression>) -> Self {
        Self { kind, children }
    }

    pub fn and(children: Vec<Expression>) -> Self {
        Self::new(ConjunctionType::And, children)
    }

    pub fn or(children: Vec<Expression>) -> Self {
        Self::new(ConjunctionType::Or, children)
    }

    pub fn kind(&self) -> ConjunctionType {
        self.kind
    }

    pub fn children(&self) -> &[Expression] {
        &self.children
    }

    pub fn into_children(self) -> Vec<Expression> {
        self.children
    }

    pub fn name(&self) -> String {
        let sep = match self.kind {
            ConjunctionType::And => " AND ",
            ConjunctionType::Or => " OR ",
        };
        let parts: Vec<String> = self.children.iter().map(Expression::name).collect();
        parts.join(sep)
    }

    pub(super) fn get_value<'t>(&self, tuple: &'t dyn Tuple) -> Result<Value<'t>> {
        // AND stops at the first FALSE, OR at the first TRUE.
        let stop_on = self.kind == ConjunctionType::Or;
        for child in &self.children {
            if child.get_value(tuple)?.get_boolean() == stop_on {
                return Ok(Value::Boolean(stop_on));
            }
        }
        Ok(Value::Boolean(!stop_on))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::expr::{FieldExpr, FunctionExpr};
    use crate::sql::functions::BuiltinFunction;
    use crate::sql::tuple::ValueListTuple;
    use crate::types::DataType;

    fn eval(expr: ConjunctionExpr) -> Value<'static> {
        expr.get_value(&ValueListTuple::default()).unwrap().into_owned()
    }

    /// Fails when evaluated: the empty tuple has no field `missing`.
    fn exploding() -> Expression {
        FieldExpr::new("t", "missing", DataType::Booleans).into()
    }

    #[test]
    fn empty_conjunctions() {
        assert_eq!(eval(ConjunctionExpr::and(vec![])), Value::Boolean(true));
        assert_eq!(eval(ConjunctionExpr::or(vec![])), Value::Boolean(false));
    }

    #[test]
    fn and_short_circuits_on_false() {
        let expr = ConjunctionExpr::and(vec![Value::Boolean(false).into(), exploding()]);
        assert_eq!(eval(expr), Value::Boolean(false));

        let expr = ConjunctionExpr::and(vec![Value::Boolean(true).into(), exploding()]);
        assert!(expr.get_value(&ValueListTuple::default()).is_err());
    }

    #[test]
    fn or_short_circuits_on_true() {
        let expr = ConjunctionExpr::or(vec![Value::Boolean(true).into(), exploding()]);
        assert_eq!(eval(expr), Value::Boolean(true));
    }

    #[test]
    fn null_child_counts_as_false() {
        let expr = ConjunctionExpr::or(vec![Value::Null.into(), Value::Boolean(false).into()]);
        assert_eq!(eval(expr), Value::Boolean(false));
        let expr = ConjunctionExpr::and(vec![
            Value::Boolean(true).into(),
            FunctionExpr::new(BuiltinFunction::Length, vec![Value::Null.into()]).into(),
        ]);
        assert_eq!(eval(expr), Value::Boolean(false));
    }
}
