//! # Vector Functions Module
//!
//! ## Distances
//! - `L2_DISTANCE(a, b)` - `sqrt(Σ(aᵢ−bᵢ)²)`
//! - `COSINE_DISTANCE(a, b)` - `1 − a·b / (‖a‖‖b‖)`, NULL when either norm is
//!   below `EPSILON`
//! - `INNER_PRODUCT(a, b)` - `Σ aᵢbᵢ`
//!
//! Distance arguments may be VECTOR values or vector literals such as
//! `'[1,2,3]'`; both sides must have the same dimension.
//!
//! ## Conversion
//! - `STRING_TO_VECTOR(s)` - parse a literal
//! - `VECTOR_TO_STRING(v)` - render as `[a,b,...]`
//! - `VECTOR_DIM(v)` - element count; also accepts a literal

use super::{type_error, BuiltinFunction};
use crate::config::EPSILON;
use crate::error::ExecError;
use crate::ivfflat::distance::{inner_product, l2_distance, norm};
use crate::types::{format_vector, parse_vector, Value};
use eyre::{bail, Result};
use std::borrow::Cow;

pub fn eval_vector_function(func: BuiltinFunction, args: &[Value<'_>]) -> Result<Value<'static>> {
    match func {
        BuiltinFunction::L2Distance
        | BuiltinFunction::CosineDistance
        | BuiltinFunction::InnerProduct => eval_distance(func, &args[0], &args[1]),
        BuiltinFunction::StringToVector => match &args[0] {
            Value::Char(s) | Value::Text(s) => Ok(Value::Vector(Cow::Owned(parse_vector(s)?))),
            other => Err(type_error(func, other)),
        },
        BuiltinFunction::VectorToString => match &args[0] {
            Value::Vector(v) => Ok(Value::Char(Cow::Owned(format_vector(v)))),
            other => Err(type_error(func, other)),
        },
        BuiltinFunction::VectorDim => Ok(Value::Int(coerce_vector(func, &args[0])?.len() as i32)),
        other => bail!(ExecError::Internal(format!("{} is not a vector function", other))),
    }
}

fn coerce_vector<'v>(func: BuiltinFunction, value: &'v Value<'_>) -> Result<Cow<'v, [f32]>> {
    match value {
        Value::Vector(v) => Ok(Cow::Borrowed(v.as_ref())),
        Value::Char(s) | Value::Text(s) => Ok(Cow::Owned(parse_vector(s)?)),
        other => Err(type_error(func, other)),
    }
}

fn eval_distance(func: BuiltinFunction, a: &Value<'_>, b: &Value<'_>) -> Result<Value<'static>> {
    let a = coerce_vector(func, a)?;
    let b = coerce_vector(func, b)?;
    if a.len() != b.len() {
        bail!(ExecError::VectorDimMismatch {
            left: a.len(),
            right: b.len()
        });
    }

    let distance = match func {
        BuiltinFunction::L2Distance => l2_distance(&a, &b),
        BuiltinFunction::InnerProduct => inner_product(&a, &b),
        BuiltinFunction::CosineDistance => {
            let (norm_a, norm_b) = (norm(&a), norm(&b));
            if norm_a < EPSILON || norm_b < EPSILON {
                return Ok(Value::Null);
            }
            1.0 - inner_product(&a, &b) / (norm_a * norm_b)
        }
        other => bail!(ExecError::Internal(format!("{} is not a distance", other))),
    };
    Ok(Value::Float(distance))
}
