//! # SQL Functions Module
//!
//! Builtin scalar functions, organized by category. Each category has its
//! own submodule:
//!
//! - `numeric`: `LENGTH`, `ROUND`
//! - `datetime`: `YEAR`, `MONTH`, `DAY`, `DATE_FORMAT`
//! - `vector`: `L2_DISTANCE`, `COSINE_DISTANCE`, `INNER_PRODUCT`,
//!   `STRING_TO_VECTOR`, `VECTOR_TO_STRING`, `VECTOR_DIM`
//!
//! ## Dispatch
//!
//! Names are resolved case-insensitively to a [`BuiltinFunction`] at bind
//! time. `eval_function` checks the argument count, short-circuits NULL
//! arguments to NULL and routes to the category module.
//!
//! ## Adding New Functions
//!
//! 1. Add a variant to `BuiltinFunction` with its name, arity and return type
//! 2. Implement it in the category module's dispatch function
//! 3. Route the variant in `eval_function`

pub mod datetime;
pub mod numeric;
pub mod vector;

use crate::error::ExecError;
use crate::ivfflat::DistanceFunction;
use crate::types::{DataType, Value};
use eyre::{bail, Result};
use std::fmt;
use std::ops::RangeInclusive;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinFunction {
    Length,
    Round,
    Year,
    Month,
    Day,
    DateFormat,
    L2Distance,
    CosineDistance,
    InnerProduct,
    StringToVector,
    VectorToString,
    VectorDim,
}

impl BuiltinFunction {
    pub fn from_name(name: &str) -> Option<Self> {
        let func = match name.trim().to_ascii_uppercase().as_str() {
            "LENGTH" => BuiltinFunction::Length,
            "ROUND" => BuiltinFunction::Round,
            "YEAR" => BuiltinFunction::Year,
            "MONTH" => BuiltinFunction::Month,
            "DAY" => BuiltinFunction::Day,
            "DATE_FORMAT" => BuiltinFunction::DateFormat,
            "L2_DISTANCE" => BuiltinFunction::L2Distance,
            "COSINE_DISTANCE" => BuiltinFunction::CosineDistance,
            "INNER_PRODUCT" => BuiltinFunction::InnerProduct,
            "STRING_TO_VECTOR" => BuiltinFunction::StringToVector,
            "VECTOR_TO_STRING" => BuiltinFunction::VectorToString,
            "VECTOR_DIM" => BuiltinFunction::VectorDim,
            _ => return None,
        };
        Some(func)
    }

    pub fn name(&self) -> &'static str {
        match self {
            BuiltinFunction::Length => "LENGTH",
            BuiltinFunction::Round => "ROUND",
            BuiltinFunction::Year => "YEAR",
            BuiltinFunction::Month => "MONTH",
            BuiltinFunction::Day => "DAY",
            BuiltinFunction::DateFormat => "DATE_FORMAT",
            BuiltinFunction::L2Distance => "L2_DISTANCE",
            BuiltinFunction::CosineDistance => "COSINE_DISTANCE",
            BuiltinFunction::InnerProduct => "INNER_PRODUCT",
            BuiltinFunction::StringToVector => "STRING_TO_VECTOR",
            BuiltinFunction::VectorToString => "VECTOR_TO_STRING",
            BuiltinFunction::VectorDim => "VECTOR_DIM",
        }
    }

    pub fn arity(&self) -> RangeInclusive<usize> {
        match self {
            BuiltinFunction::Round => 1..=2,
            BuiltinFunction::DateFormat
            | BuiltinFunction::L2Distance
            | BuiltinFunction::CosineDistance
            | BuiltinFunction::InnerProduct => 2..=2,
            _ => 1..=1,
        }
    }

    pub fn return_type(&self) -> DataType {
        match self {
            BuiltinFunction::Length
            | BuiltinFunction::Year
            | BuiltinFunction::Month
            | BuiltinFunction::Day
            | BuiltinFunction::VectorDim => DataType::Ints,
            BuiltinFunction::Round
            | BuiltinFunction::L2Distance
            | BuiltinFunction::CosineDistance
            | BuiltinFunction::InnerProduct => DataType::Floats,
            BuiltinFunction::DateFormat | BuiltinFunction::VectorToString => DataType::Chars,
            BuiltinFunction::StringToVector => DataType::Vectors,
        }
    }

    /// The index metric matching a distance builtin.
    pub fn distance_function(&self) -> Option<DistanceFunction> {
        match self {
            BuiltinFunction::L2Distance => Some(DistanceFunction::L2),
            BuiltinFunction::CosineDistance => Some(DistanceFunction::Cosine),
            BuiltinFunction::InnerProduct => Some(DistanceFunction::InnerProduct),
            _ => None,
        }
    }

    pub fn check_arity(&self, count: usize) -> Result<()> {
        let arity = self.arity();
        if !arity.contains(&count) {
            bail!(ExecError::InvalidArgument(format!(
                "{} expects {} to {} arguments, got {}",
                self.name(),
                arity.start(),
                arity.end(),
                count
            )));
        }
        Ok(())
    }
}

impl fmt::Display for BuiltinFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Evaluates a builtin over already-evaluated arguments.
pub fn eval_function(func: BuiltinFunction, args: &[Value<'_>]) -> Result<Value<'static>> {
    func.check_arity(args.len())?;
    if args.iter().any(Value::is_null) {
        return Ok(Value::Null);
    }

    match func {
        BuiltinFunction::Length | BuiltinFunction::Round => {
            numeric::eval_numeric_function(func, args)
        }
        BuiltinFunction::Year
        | BuiltinFunction::Month
        | BuiltinFunction::Day
        | BuiltinFunction::DateFormat => datetime::eval_datetime_function(func, args),
        BuiltinFunction::L2Distance
        | BuiltinFunction::CosineDistance
        | BuiltinFunction::InnerProduct
        | BuiltinFunction::StringToVector
        | BuiltinFunction::VectorToString
        | BuiltinFunction::VectorDim => vector::eval_vector_function(func, args),
    }
}

pub(crate) fn type_error(func: BuiltinFunction, arg: &Value<'_>) -> eyre::Report {
    eyre::eyre!(ExecError::InvalidArgument(format!(
        "{} does not accept {}",
        func.name(),
        arg.data_type()
    )))
}
