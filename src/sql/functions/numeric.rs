//! # Numeric Functions Module
//!
//! - `LENGTH(s)` - byte length of a CHAR or TEXT value
//! - `ROUND(n)` / `ROUND(n, d)` - round to `d` decimals (default 0)
//!
//! ## ROUND
//!
//! When the scaled value has a fractional part of exactly ±0.5, the result
//! rounds to even: an even integer part is kept, an odd one moves one step
//! away from zero. Every other value uses ordinary round-half-away-from-zero.
//!
//! | Call | Result |
//! |------|--------|
//! | `ROUND(2.5)` | 2 |
//! | `ROUND(3.5)` | 4 |
//! | `ROUND(-2.5)` | -2 |
//! | `ROUND(2.49)` | 2 |
//! | `ROUND(1.25, 1)` | 1.2 |

use super::{type_error, BuiltinFunction};
use crate::error::ExecError;
use crate::types::Value;
use eyre::{bail, Result};

pub fn eval_numeric_function(func: BuiltinFunction, args: &[Value<'_>]) -> Result<Value<'static>> {
    match func {
        BuiltinFunction::Length => eval_length(args),
        BuiltinFunction::Round => eval_round(args),
        other => bail!(ExecError::Internal(format!("{} is not a numeric function", other))),
    }
}

fn eval_length(args: &[Value<'_>]) -> Result<Value<'static>> {
    match &args[0] {
        Value::Char(s) | Value::Text(s) => Ok(Value::Int(s.len() as i32)),
        other => Err(type_error(BuiltinFunction::Length, other)),
    }
}

fn eval_round(args: &[Value<'_>]) -> Result<Value<'static>> {
    let number = match &args[0] {
        Value::Float(f) => *f,
        Value::Int(i) => *i as f32,
        other => return Err(type_error(BuiltinFunction::Round, other)),
    };
    let decimals = match args.get(1) {
        None => 0,
        Some(Value::Int(d)) => *d,
        Some(other) => return Err(type_error(BuiltinFunction::Round, other)),
    };
    Ok(Value::Float(round_half_even_at_boundary(number, decimals)))
}

pub fn round_half_even_at_boundary(number: f32, decimals: i32) -> f32 {
    let factor = 10f64.powi(decimals);
    let scaled = f64::from(number) * factor;
    let integer = scaled.trunc();
    let fraction = scaled - integer;

    let rounded = if fraction == 0.5 || fraction == -0.5 {
        if (integer as i64) % 2 == 0 {
            integer
        } else {
            integer + scaled.signum()
        }
    } else {
        scaled.round()
    };
    (rounded / factor) as f32
}
