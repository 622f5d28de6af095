//! # Expression Binder
//!
//! Turns parsed expression trees into evaluable ones:
//!
//! - `UnboundFunctionExpr` becomes an `AggregateExpr` or a `FunctionExpr`
//! - ordering comparisons between different types get a `CastExpr` on the
//!   side that is cheaper to convert, folded right away when constant
//!
//! Binding is bottom-up, so an aggregate nested inside another aggregate's
//! argument is already bound when the outer call is checked.

use crate::error::ExecError;
use crate::sql::aggregate::AggregateKind;
use crate::sql::expr::{
    AggregateExpr, ArithmeticExpr, CastExpr, CompOp, ComparisonExpr, ConjunctionExpr, Expression, FunctionExpr,
    ListExpr, ValueExpr,
};
use crate::sql::functions::BuiltinFunction;
use crate::types::{cast_cost, DataType, Value, CAST_COST_UNSUPPORTED};
use eyre::{bail, Result};
use tracing::trace;

pub fn bind_expression(expr: Expression) -> Result<Expression> {
    let bound = match expr {
        Expression::UnboundFunction(func) => {
            let args = bind_all(func.args)?;
            bind_function(&func.name, args)?
        }
        Expression::Comparison(cmp) => {
            let (op, left, right) = cmp.into_parts();
            bind_comparison(op, bind_expression(left)?, bind_expression(right)?)?
        }
        Expression::Conjunction(conj) => {
            let kind = conj.kind();
            ConjunctionExpr::new(kind, bind_all(conj.into_children())?).into()
        }
        Expression::Arithmetic(arith) => {
            let (op, left, right) = arith.into_parts();
            let right = right.map(bind_expression).transpose()?;
            ArithmeticExpr::new(op, bind_expression(left)?, right).into()
        }
        Expression::Cast(cast) => CastExpr::new(bind_expression(*cast.child)?, cast.target).into(),
        Expression::Function(func) => FunctionExpr::new(func.func, bind_all(func.args)?).into(),
        Expression::List(list) => ListExpr::new(bind_all(list.items)?).into(),
        other => other,
    };
    Ok(bound)
}

fn bind_all(exprs: Vec<Expression>) -> Result<Vec<Expression>> {
    exprs.into_iter().map(bind_expression).collect()
}

/// Resolves a call by name. `args` must already be bound.
pub fn bind_function(name: &str, mut args: Vec<Expression>) -> Result<Expression> {
    if let Some(kind) = AggregateKind::from_name(name) {
        if args.len() != 1 {
            bail!(ExecError::InvalidArgument(format!(
                "{} takes exactly one argument, got {}",
                kind,
                args.len()
            )));
        }
        let arg = match args.remove(0) {
            Expression::Star(_) if kind == AggregateKind::Count => {
                ValueExpr::named(Value::Int(1), "*").into()
            }
            Expression::Star(_) => bail!(ExecError::InvalidArgument(format!(
                "{}(*) is not supported",
                kind
            ))),
            other => other,
        };
        if arg.contains_aggregate() {
            bail!(ExecError::InvalidArgument(format!(
                "aggregate call nested inside {}",
                kind
            )));
        }
        if matches!(kind, AggregateKind::Sum | AggregateKind::Avg) {
            let ty = arg.value_type();
            if !(ty.is_numeric() || matches!(ty, DataType::Undefined | DataType::Nulls)) {
                bail!(ExecError::InvalidArgument(format!(
                    "{} needs a numeric argument, got {}",
                    kind, ty
                )));
            }
        }
        return Ok(AggregateExpr::new(kind, arg).into());
    }

    match BuiltinFunction::from_name(name) {
        Some(func) => {
            func.check_arity(args.len())?;
            Ok(FunctionExpr::new(func, args).into())
        }
        None => bail!(ExecError::InvalidArgument(format!("unknown function '{}'", name))),
    }
}

/// Builds a comparison, casting one operand when the types differ.
pub fn bind_comparison(op: CompOp, left: Expression, right: Expression) -> Result<Expression> {
    let (lt, rt) = (left.value_type(), right.value_type());
    let comparable_as_is = lt == rt
        || (lt.is_string() && rt.is_string())
        || [lt, rt]
            .iter()
            .any(|t| matches!(t, DataType::Undefined | DataType::Nulls));
    if !op.is_ordering() || comparable_as_is {
        return Ok(ComparisonExpr::new(op, left, right).into());
    }

    let left_cost = cast_cost(lt, rt);
    let right_cost = cast_cost(rt, lt);
    if left_cost == CAST_COST_UNSUPPORTED && right_cost == CAST_COST_UNSUPPORTED {
        return Ok(ComparisonExpr::new(op, left, right).into());
    }

    let (left, right) = if left_cost <= right_cost {
        trace!(from = %lt, to = %rt, "casting left comparison operand");
        (cast_and_fold(left, rt)?, right)
    } else {
        trace!(from = %rt, to = %lt, "casting right comparison operand");
        (left, cast_and_fold(right, lt)?)
    };
    Ok(ComparisonExpr::new(op, left, right).into())
}

fn cast_and_fold(expr: Expression, target: DataType) -> Result<Expression> {
    let constant = expr.is_constant();
    let cast: Expression = CastExpr::new(expr, target).into();
    if constant {
        return Ok(ValueExpr::new(cast.try_get_value()?).into());
    }
    Ok(cast)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::sql::expr::{FieldExpr, StarExpr, UnboundFunctionExpr};
    use crate::sql::tuple::{TupleCellSpec, ValueListTuple};

    fn field(name: &str, ty: DataType) -> Expression {
        FieldExpr::new("t", name, ty).into()
    }

    fn code(result: Result<Expression>) -> Option<ErrorCode> {
        ExecError::code_of(&result.unwrap_err())
    }

    #[test]
    fn count_star_counts_a_literal() {
        let expr = bind_function("count", vec![StarExpr::default().into()]).unwrap();
        let Expression::Aggregate(agg) = &expr else {
            panic!("expected aggregate, got {:?}", expr);
        };
        assert_eq!(agg.kind, AggregateKind::Count);
        assert_eq!(expr.name(), "COUNT(*)");
        assert_eq!(agg.child.try_get_value().unwrap(), Value::Int(1));
    }

    #[test]
    fn aggregate_argument_checks() {
        assert_eq!(code(bind_function("sum", vec![])), Some(ErrorCode::InvalidArgument));
        assert_eq!(
            code(bind_function("sum", vec![StarExpr::default().into()])),
            Some(ErrorCode::InvalidArgument)
        );
        assert_eq!(
            code(bind_function("avg", vec![field("name", DataType::Chars)])),
            Some(ErrorCode::InvalidArgument)
        );
        assert!(bind_function("max", vec![field("name", DataType::Chars)]).is_ok());
    }

    #[test]
    fn nested_aggregate_is_rejected() {
        let inner = UnboundFunctionExpr::new("min", vec![field("id", DataType::Ints)]);
        let outer = UnboundFunctionExpr::new("sum", vec![inner.into()]);
        assert_eq!(code(bind_expression(outer.into())), Some(ErrorCode::InvalidArgument));
    }

    #[test]
    fn builtin_resolution() {
        let expr = bind_expression(
            UnboundFunctionExpr::new("Length", vec![Value::chars("abcd").into()]).into(),
        )
        .unwrap();
        assert!(matches!(expr, Expression::Function(_)));
        assert_eq!(expr.try_get_value().unwrap(), Value::Int(4));

        assert_eq!(code(bind_function("nope", vec![])), Some(ErrorCode::InvalidArgument));
        assert_eq!(
            code(bind_function("length", vec![Value::Int(1).into(), Value::Int(2).into()])),
            Some(ErrorCode::InvalidArgument)
        );
    }

    #[test]
    fn string_literal_is_cast_to_field_type() {
        let expr = bind_comparison(CompOp::Equal, field("d", DataType::Dates), Value::chars("2024-1-5").into()).unwrap();
        let Expression::Comparison(cmp) = &expr else {
            panic!("expected comparison");
        };
        assert!(matches!(cmp.right(), Expression::Value(v) if v.value == Value::Date(20240105)));

        let row = ValueListTuple::new(vec![TupleCellSpec::new("t", "d")], vec![Value::Date(20240105)]).unwrap();
        assert!(expr.get_value(&row).unwrap().get_boolean());
    }

    #[test]
    fn non_constant_side_gets_cast_node() {
        let expr = bind_comparison(CompOp::LessThan, field("name", DataType::Chars), field("id", DataType::Ints)).unwrap();
        let Expression::Comparison(cmp) = &expr else {
            panic!("expected comparison");
        };
        assert!(matches!(cmp.left(), Expression::Cast(c) if c.target == DataType::Ints));

        let row = ValueListTuple::new(
            vec![TupleCellSpec::new("t", "name"), TupleCellSpec::new("t", "id")],
            vec![Value::chars("3"), Value::Int(4)],
        )
        .unwrap();
        assert!(expr.get_value(&row).unwrap().get_boolean());
    }

    #[test]
    fn invalid_constant_cast_fails_at_bind_time() {
        let err = bind_comparison(CompOp::Equal, field("d", DataType::Dates), Value::chars("2023-02-29").into())
            .unwrap_err();
        assert_eq!(ExecError::code_of(&err), Some(ErrorCode::InvalidDate));
    }

    #[test]
    fn is_and_in_are_left_untouched() {
        let expr = bind_comparison(CompOp::Is, field("id", DataType::Ints), Value::Null.into()).unwrap();
        let Expression::Comparison(cmp) = &expr else {
            panic!("expected comparison");
        };
        assert!(matches!(cmp.left(), Expression::Field(_)));
    }
}
