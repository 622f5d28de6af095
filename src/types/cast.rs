//! # Type Conversion
//!
//! `Value::cast_to` converts a value to another `DataType`; `cast_cost` ranks
//! implicit conversions so the binder can cast the cheaper side of a
//! comparison.
//!
//! ## Conversion Table
//!
//! | From | To | Rule |
//! |------|----|------|
//! | CHAR/TEXT | INT | longest float prefix; exact integers stay INT, others promote to FLOAT or truncate |
//! | CHAR/TEXT | FLOAT | longest float prefix, `0` when unparsable |
//! | CHAR/TEXT | DATE | strict `Y-M-D` with calendar validation |
//! | CHAR | TEXT | fails beyond `MAX_TEXT_LENGTH` bytes |
//! | CHAR/TEXT | VECTOR | `[a,b,...]` |
//! | INT | FLOAT/CHAR/TEXT/BOOLEAN | direct |
//! | FLOAT | INT | round to nearest |
//! | FLOAT | CHAR/TEXT/BOOLEAN | two decimals / non-zero |
//! | BOOLEAN | INT/FLOAT/CHAR/TEXT | `1`/`0`, `TRUE`/`FALSE` |
//! | DATE | CHAR/TEXT | `YYYY-MM-DD` |
//! | VECTOR | CHAR/TEXT | `[a,b]` |
//! | NULL | any | NULL |

use super::date::parse_date;
use super::value::{format_float, format_vector};
use super::{DataType, Value};
use crate::config::{EPSILON, MAX_TEXT_LENGTH};
use crate::error::ExecError;
use eyre::{bail, Result};
use std::borrow::Cow;

/// Cost reported for a conversion that is not supported.
pub const CAST_COST_UNSUPPORTED: i32 = i32::MAX;

impl<'a> Value<'a> {
    pub fn cast_to(&self, target: DataType, allow_promotion: bool) -> Result<Value<'a>> {
        if self.is_null() || target == DataType::Nulls {
            return Ok(Value::Null);
        }
        if self.data_type() == target || target == DataType::Undefined {
            return Ok(self.clone());
        }

        let cast = match (self, target) {
            (Value::Char(s) | Value::Text(s), DataType::Ints) => {
                let parsed = parse_float_prefix(s);
                let truncated = parsed as i32;
                if f64::from(truncated) == parsed || !allow_promotion {
                    Value::Int(truncated)
                } else {
                    Value::Float(parsed as f32)
                }
            }
            (Value::Char(s) | Value::Text(s), DataType::Floats) => {
                Value::Float(parse_float_prefix(s) as f32)
            }
            (Value::Char(s) | Value::Text(s), DataType::Dates) => Value::Date(parse_date(s)?),
            (Value::Char(s), DataType::Texts) => {
                if s.len() > MAX_TEXT_LENGTH {
                    bail!(ExecError::ValueTooLong(format!(
                        "text of {} bytes exceeds {}",
                        s.len(),
                        MAX_TEXT_LENGTH
                    )));
                }
                Value::Text(s.clone())
            }
            (Value::Text(s), DataType::Chars) => Value::Char(s.clone()),
            (Value::Char(s) | Value::Text(s), DataType::Vectors) => {
                Value::Vector(Cow::Owned(parse_vector(s)?))
            }

            (Value::Int(i), DataType::Floats) => Value::Float(*i as f32),
            (Value::Int(i), DataType::Chars) => Value::Char(Cow::Owned(i.to_string())),
            (Value::Int(i), DataType::Texts) => Value::Text(Cow::Owned(i.to_string())),
            (Value::Int(i), DataType::Booleans) => Value::Boolean(*i != 0),

            (Value::Float(f), DataType::Ints) => Value::Int(f.round() as i32),
            (Value::Float(f), DataType::Chars) => Value::Char(Cow::Owned(format_float(*f))),
            (Value::Float(f), DataType::Texts) => Value::Text(Cow::Owned(format_float(*f))),
            (Value::Float(f), DataType::Booleans) => Value::Boolean(f.abs() >= EPSILON),

            (Value::Boolean(b), DataType::Ints) => Value::Int(i32::from(*b)),
            (Value::Boolean(b), DataType::Floats) => Value::Float(if *b { 1.0 } else { 0.0 }),
            (Value::Boolean(_), DataType::Chars) => Value::Char(Cow::Owned(self.to_string())),
            (Value::Boolean(_), DataType::Texts) => Value::Text(Cow::Owned(self.to_string())),

            (Value::Date(_), DataType::Chars) => Value::Char(Cow::Owned(self.to_string())),
            (Value::Date(_), DataType::Texts) => Value::Text(Cow::Owned(self.to_string())),

            (Value::Vector(v), DataType::Chars) => Value::Char(Cow::Owned(format_vector(v))),
            (Value::Vector(v), DataType::Texts) => Value::Text(Cow::Owned(format_vector(v))),

            (value, target) => bail!(ExecError::Unsupported(format!(
                "cannot cast {} to {}",
                value.data_type(),
                target
            ))),
        };
        Ok(cast)
    }
}

/// Relative cost of implicitly converting `from` into `to`.
pub fn cast_cost(from: DataType, to: DataType) -> i32 {
    if from == to {
        return 0;
    }
    match (from, to) {
        (DataType::Nulls, _) => 0,
        (DataType::Chars | DataType::Texts, DataType::Chars | DataType::Texts) => 0,
        (DataType::Chars | DataType::Texts, DataType::Dates | DataType::Ints | DataType::Floats) => 1,
        (DataType::Ints, DataType::Floats | DataType::Booleans) => 1,
        (DataType::Ints, DataType::Chars) => 2,
        (DataType::Floats, DataType::Booleans) => 1,
        _ => CAST_COST_UNSUPPORTED,
    }
}

/// Parses the longest prefix of `s` that forms a decimal float literal.
///
/// Leading whitespace is skipped. An input without a numeric prefix is `0`.
pub fn parse_float_prefix(s: &str) -> f64 {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0usize;

    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return 0.0;
    }
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().unwrap_or(0.0)
}

/// Parses `[a, b, ...]` into its elements.
pub fn parse_vector(s: &str) -> Result<Vec<f32>> {
    let trimmed = s.trim();
    let body = trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| {
            ExecError::InvalidArgument(format!("vector literal must be bracketed: '{}'", s))
        })?;
    if body.trim().is_empty() {
        bail!(ExecError::InvalidArgument("vector literal is empty".into()));
    }

    body.split(',')
        .map(|item| {
            item.trim().parse::<f32>().map_err(|_| {
                ExecError::InvalidArgument(format!("invalid vector element '{}'", item.trim()))
                    .into()
            })
        })
        .collect()
}
