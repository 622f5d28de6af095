//! # Expression Tree
//!
//! This module provides the bound expression tree evaluated by the physical
//! operators. An [`Expression`] is a closed enum; each node owns its children,
//! so a tree is built once and never shared.
//!
//! ## Node Kinds
//!
//! | Variant | Evaluates to |
//! |---------|--------------|
//! | `Star` | never evaluated, expanded by projection |
//! | `Field` | the matching cell of the input tuple |
//! | `Value` | a literal |
//! | `Cast` | the child cast to a target type |
//! | `Comparison` | BOOLEAN, see [`comparison`] |
//! | `Conjunction` | BOOLEAN AND/OR with short-circuit |
//! | `Arithmetic` | `+ - * /` and unary minus |
//! | `UnboundFunction` | never evaluated, replaced by the binder |
//! | `Aggregate` | the group-by cell named after the aggregate |
//! | `Function` | a builtin scalar function |
//! | `Subquery` | the single value of a scalar subquery |
//! | `List` | IN-list elements |
//!
//! ## Evaluation Paths
//!
//! - `get_value(tuple)` evaluates against one row. Values borrowed from the
//!   tuple keep the tuple's lifetime.
//! - `try_get_value()` folds constant trees. Trees containing a field, a
//!   subquery or an aggregate fail with `Unimplemented`.
//!
//! ## Usage
//!
//! ```ignore
//! let expr = Expression::from(ComparisonExpr::new(
//!     CompOp::GreaterThan,
//!     FieldExpr::new("t", "id", DataType::Ints).into(),
//!     ValueExpr::new(Value::Int(1)).into(),
//! ));
//! assert!(expr.get_value(&row)?.get_boolean());
//! ```

pub mod arithmetic;
pub mod comparison;
pub mod conjunction;
pub mod subquery;

pub use arithmetic::{ArithmeticExpr, ArithmeticOp};
pub use comparison::{CompOp, ComparisonExpr};
pub use conjunction::{ConjunctionExpr, ConjunctionType};
pub use subquery::{SubqueryExpr, SubqueryGuard};

use crate::error::ExecError;
use crate::records::FieldMeta;
use crate::sql::aggregate::{AggregateKind, Aggregator};
use crate::sql::functions::{eval_function, BuiltinFunction};
use crate::sql::tuple::{Tuple, TupleCellSpec, ValueListTuple};
use crate::storage::TrxRef;
use crate::types::{DataType, Value};
use eyre::{bail, Result};

#[derive(Debug)]
pub enum Expression {
    Star(StarExpr),
    Field(FieldExpr),
    Value(ValueExpr),
    Cast(CastExpr),
    Comparison(ComparisonExpr),
    Conjunction(ConjunctionExpr),
    Arithmetic(ArithmeticExpr),
    UnboundFunction(UnboundFunctionExpr),
    Aggregate(AggregateExpr),
    Function(FunctionExpr),
    Subquery(SubqueryExpr),
    List(ListExpr),
}

impl Expression {
    pub fn get_value<'t>(&self, tuple: &'t dyn Tuple) -> Result<Value<'t>> {
        match self {
            Expression::Field(e) => e.get_value(tuple),
            Expression::Value(e) => Ok(e.value.clone()),
            Expression::Cast(e) => e.get_value(tuple),
            Expression::Comparison(e) => e.get_value(tuple),
            Expression::Conjunction(e) => e.get_value(tuple),
            Expression::Arithmetic(e) => e.get_value(tuple),
            Expression::Aggregate(e) => e.get_value(tuple),
            Expression::Function(e) => e.get_value(tuple),
            Expression::Subquery(e) => e.get_value(tuple),
            Expression::List(e) => e.get_value(tuple),
            Expression::Star(_) | Expression::UnboundFunction(_) => bail!(ExecError::Internal(
                format!("'{}' must be bound before evaluation", self.name())
            )),
        }
    }

    /// Evaluates a tree that depends on no row.
    pub fn try_get_value(&self) -> Result<Value<'static>> {
        if let Expression::Value(e) = self {
            return Ok(e.value.clone());
        }
        if !self.is_constant() {
            bail!(ExecError::Unimplemented(format!(
                "'{}' cannot be evaluated without a row",
                self.name()
            )));
        }
        let empty = ValueListTuple::default();
        self.get_value(&empty).map(Value::into_owned)
    }

    pub fn value_type(&self) -> DataType {
        match self {
            Expression::Star(_) | Expression::UnboundFunction(_) | Expression::List(_) => {
                DataType::Undefined
            }
            Expression::Field(e) => e.data_type,
            Expression::Value(e) => e.value.data_type(),
            Expression::Cast(e) => e.target,
            Expression::Comparison(_) | Expression::Conjunction(_) => DataType::Booleans,
            Expression::Arithmetic(e) => e.value_type(),
            Expression::Aggregate(e) => e.value_type(),
            Expression::Function(e) => e.func.return_type(),
            Expression::Subquery(e) => e.value_type(),
        }
    }

    pub fn name(&self) -> String {
        match self {
            Expression::Star(e) => match &e.table {
                Some(table) => format!("{}.*", table),
                None => "*".to_string(),
            },
            Expression::Field(e) => e.field.clone(),
            Expression::Value(e) => e.name(),
            Expression::Cast(e) => e.child.name(),
            Expression::Comparison(e) => e.name(),
            Expression::Conjunction(e) => e.name(),
            Expression::Arithmetic(e) => e.name(),
            Expression::UnboundFunction(e) => call_name(&e.name, &e.args),
            Expression::Aggregate(e) => e.name(),
            Expression::Function(e) => call_name(e.func.name(), &e.args),
            Expression::Subquery(_) => "(subquery)".to_string(),
            Expression::List(e) => {
                let items: Vec<String> = e.items.iter().map(Expression::name).collect();
                format!("({})", items.join(","))
            }
        }
    }

    /// Direct children, left to right. Subquery operator trees are not
    /// expressions and are not visited.
    pub fn children(&self) -> Vec<&Expression> {
        match self {
            Expression::Star(_)
            | Expression::Field(_)
            | Expression::Value(_)
            | Expression::Subquery(_) => Vec::new(),
            Expression::Cast(e) => vec![&*e.child],
            Expression::Comparison(e) => vec![e.left(), e.right()],
            Expression::Conjunction(e) => e.children().iter().collect(),
            Expression::Arithmetic(e) => {
                let mut out = vec![e.left()];
                out.extend(e.right());
                out
            }
            Expression::UnboundFunction(e) => e.args.iter().collect(),
            Expression::Aggregate(e) => vec![&*e.child],
            Expression::Function(e) => e.args.iter().collect(),
            Expression::List(e) => e.items.iter().collect(),
        }
    }

    /// Pre-order traversal.
    pub fn walk(&self, visit: &mut dyn FnMut(&Expression)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }

    pub fn any(&self, pred: &dyn Fn(&Expression) -> bool) -> bool {
        let mut found = false;
        self.walk(&mut |e| found |= pred(e));
        found
    }

    /// No field, subquery, aggregate or unbound node anywhere in the tree.
    pub fn is_constant(&self) -> bool {
        !self.any(&|e| {
            matches!(
                e,
                Expression::Star(_)
                    | Expression::Field(_)
                    | Expression::Subquery(_)
                    | Expression::Aggregate(_)
                    | Expression::UnboundFunction(_)
            )
        })
    }

    pub fn contains_aggregate(&self) -> bool {
        self.any(&|e| matches!(e, Expression::Aggregate(_)))
    }

    /// Hands `trx` to every subquery in the tree.
    pub fn attach_trx(&self, trx: &TrxRef) {
        self.walk(&mut |e| {
            if let Expression::Subquery(sub) = e {
                sub.attach_trx(trx.clone());
            }
        });
    }
}

fn call_name(func: &str, args: &[Expression]) -> String {
    let args: Vec<String> = args.iter().map(Expression::name).collect();
    format!("{}({})", func, args.join(","))
}

/// `*` or `t.*` in a select list.
#[derive(Debug, Clone, Default)]
pub struct StarExpr {
    pub table: Option<String>,
}

impl StarExpr {
    pub fn new(table: Option<&str>) -> Self {
        Self {
            table: table.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldExpr {
    pub table: String,
    pub field: String,
    pub data_type: DataType,
}

impl FieldExpr {
    pub fn new(table: &str, field: &str, data_type: DataType) -> Self {
        Self {
            table: table.to_string(),
            field: field.to_string(),
            data_type,
        }
    }

    pub fn from_meta(table: &str, field: &FieldMeta) -> Self {
        Self::new(table, &field.name, field.data_type)
    }

    pub fn spec(&self) -> TupleCellSpec {
        TupleCellSpec::new(&self.table, &self.field)
    }

    fn get_value<'t>(&self, tuple: &'t dyn Tuple) -> Result<Value<'t>> {
        match tuple.find_cell(&self.spec())? {
            Some(value) => Ok(value),
            None => bail!(ExecError::SchemaFieldMissing(self.spec().to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValueExpr {
    pub value: Value<'static>,
    alias: Option<String>,
}

impl ValueExpr {
    pub fn new(value: Value<'static>) -> Self {
        Self { value, alias: None }
    }

    /// A literal reported under `name`, e.g. the `1` standing in for `*` in
    /// `COUNT(*)`.
    pub fn named(value: Value<'static>, name: &str) -> Self {
        Self {
            value,
            alias: Some(name.to_string()),
        }
    }

    pub fn name(&self) -> String {
        match &self.alias {
            Some(alias) => alias.clone(),
            None => self.value.to_string(),
        }
    }
}

#[derive(Debug)]
pub struct CastExpr {
    pub child: Box<Expression>,
    pub target: DataType,
}

impl CastExpr {
    pub fn new(child: Expression, target: DataType) -> Self {
        Self {
            child: Box::new(child),
            target,
        }
    }

    fn get_value<'t>(&self, tuple: &'t dyn Tuple) -> Result<Value<'t>> {
        let value = self.child.get_value(tuple)?;
        if value.data_type() == self.target {
            return Ok(value);
        }
        value.cast_to(self.target, true)
    }
}

/// A function call as parsed: a bare name and its arguments.
#[derive(Debug)]
pub struct UnboundFunctionExpr {
    pub name: String,
    pub args: Vec<Expression>,
}

impl UnboundFunctionExpr {
    pub fn new(name: &str, args: Vec<Expression>) -> Self {
        Self {
            name: name.to_string(),
            args,
        }
    }
}

#[derive(Debug)]
pub struct AggregateExpr {
    pub kind: AggregateKind,
    pub child: Box<Expression>,
}

impl AggregateExpr {
    pub fn new(kind: AggregateKind, child: Expression) -> Self {
        Self {
            kind,
            child: Box::new(child),
        }
    }

    pub fn name(&self) -> String {
        format!("{}({})", self.kind.name(), self.child.name())
    }

    pub fn value_type(&self) -> DataType {
        match self.kind {
            AggregateKind::Count => DataType::Ints,
            AggregateKind::Avg => DataType::Floats,
            AggregateKind::Sum | AggregateKind::Max | AggregateKind::Min => {
                self.child.value_type()
            }
        }
    }

    pub fn create_aggregator(&self) -> Box<dyn Aggregator> {
        self.kind.create_aggregator()
    }

    /// Reads the aggregate's result from a group-by output row.
    fn get_value<'t>(&self, tuple: &'t dyn Tuple) -> Result<Value<'t>> {
        let name = self.name();
        match tuple.find_cell(&TupleCellSpec::from_alias(&name))? {
            Some(value) => Ok(value),
            None => bail!(ExecError::NotFound(format!(
                "aggregate '{}' is not computed below this operator",
                name
            ))),
        }
    }
}

#[derive(Debug)]
pub struct FunctionExpr {
    pub func: BuiltinFunction,
    pub args: Vec<Expression>,
}

impl FunctionExpr {
    pub fn new(func: BuiltinFunction, args: Vec<Expression>) -> Self {
        Self { func, args }
    }

    fn get_value<'t>(&self, tuple: &'t dyn Tuple) -> Result<Value<'t>> {
        let args = self
            .args
            .iter()
            .map(|arg| arg.get_value(tuple))
            .collect::<Result<Vec<_>>>()?;
        eval_function(self.func, &args)
    }
}

/// Right-hand operand of IN / NOT IN.
#[derive(Debug)]
pub struct ListExpr {
    pub items: Vec<Expression>,
}

impl ListExpr {
    pub fn new(items: Vec<Expression>) -> Self {
        Self { items }
    }

    fn get_value<'t>(&self, tuple: &'t dyn Tuple) -> Result<Value<'t>> {
        match self.items.as_slice() {
            [single] => single.get_value(tuple),
            items => bail!(ExecError::InvalidArgument(format!(
                "a list of {} values is not a scalar",
                items.len()
            ))),
        }
    }
}

macro_rules! impl_from_node {
    ($($node:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$node> for Expression {
                fn from(node: $node) -> Self {
                    Expression::$variant(node)
                }
            }
        )*
    };
}

impl_from_node! {
    StarExpr => Star,
    FieldExpr => Field,
    ValueExpr => Value,
    CastExpr => Cast,
    ComparisonExpr => Comparison,
    ConjunctionExpr => Conjunction,
    ArithmeticExpr => Arithmetic,
    UnboundFunctionExpr => UnboundFunction,
    AggregateExpr => Aggregate,
    FunctionExpr => Function,
    SubqueryExpr => Subquery,
    ListExpr => List,
}

impl From<Value<'static>> for Expression {
    fn from(value: Value<'static>) -> Self {
        Expression::Value(ValueExpr::new(value))
    }
}
