//! # Runtime Value Representation
//!
//! This module provides `Value<'a>`, the runtime representation for SQL values.
//! Values use `Cow` for CHAR/TEXT/VECTOR payloads so a string read out of a
//! record can be borrowed without copying, while values produced during
//! evaluation own their data.
//!
//! ## Value Variants
//!
//! | Variant | Rust Type | Description |
//! |---------|-----------|-------------|
//! | Null | - | SQL NULL |
//! | Int | i32 | 32-bit signed integer |
//! | Float | f32 | 32-bit floating point |
//! | Boolean | bool | TRUE / FALSE |
//! | Char | Cow<str> | fixed-length string field |
//! | Text | Cow<str> | long string field |
//! | Date | i32 | packed `y*10000 + m*100 + d` |
//! | Vector | Cow<[f32]> | float32 vector |
//!
//! ## Comparison Semantics
//!
//! `compare` is only defined inside one family:
//!
//! - Int / Float / Boolean compare numerically with each other
//! - Char / Text compare lexicographically with each other
//! - Date compares with Date
//! - Vector compares with Vector: the shorter vector sorts first, equal
//!   lengths compare element by element
//!
//! NULL is not comparable at this layer. Callers such as `ComparisonExpr`
//! special-case NULL before they get here; a direct comparison against NULL
//! fails with `Unsupported`.
//!
//! ## Arithmetic
//!
//! `add`, `subtract` and `multiply` keep INT when both sides are INT, otherwise
//! compute in FLOAT. `divide` always produces FLOAT and yields NULL when the
//! divisor is within `EPSILON` of zero. VECTOR arithmetic is element-wise and
//! requires equal lengths.

use super::date::format_date;
use super::DataType;
use crate::config::{EPSILON, FLOAT_DISPLAY_PRECISION, SCALAR_FIELD_LEN, VECTOR_ELEMENT_LEN};
use crate::error::ExecError;
use eyre::{bail, Result};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

/// Runtime value representation for SQL values.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value<'a> {
    #[default]
    Null,
    Int(i32),
    Float(f32),
    Boolean(bool),
    Char(Cow<'a, str>),
    Text(Cow<'a, str>),
    Date(i32),
    Vector(Cow<'a, [f32]>),
}

impl<'a> Value<'a> {
    pub fn chars(s: impl Into<Cow<'a, str>>) -> Self {
        Value::Char(s.into())
    }

    pub fn text(s: impl Into<Cow<'a, str>>) -> Self {
        Value::Text(s.into())
    }

    pub fn vector(v: impl Into<Cow<'a, [f32]>>) -> Self {
        Value::Vector(v.into())
    }

    /// Returns true if this value is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_str(&self) -> bool {
        matches!(self, Value::Char(_) | Value::Text(_))
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Value::Null => DataType::Nulls,
            Value::Int(_) => DataType::Ints,
            Value::Float(_) => DataType::Floats,
            Value::Boolean(_) => DataType::Booleans,
            Value::Char(_) => DataType::Chars,
            Value::Text(_) => DataType::Texts,
            Value::Date(_) => DataType::Dates,
            Value::Vector(_) => DataType::Vectors,
        }
    }

    /// Byte length of the payload in its storage encoding.
    pub fn length(&self) -> usize {
        match self {
            Value::Null => 0,
            Value::Int(_) | Value::Float(_) | Value::Date(_) => SCALAR_FIELD_LEN,
            Value::Boolean(_) => 1,
            Value::Char(s) | Value::Text(s) => s.len(),
            Value::Vector(v) => v.len() * VECTOR_ELEMENT_LEN,
        }
    }

    /// Detaches the value from any borrowed record bytes.
    pub fn into_owned(self) -> Value<'static> {
        match self {
            Value::Null => Value::Null,
            Value::Int(i) => Value::Int(i),
            Value::Float(f) => Value::Float(f),
            Value::Boolean(b) => Value::Boolean(b),
            Value::Char(s) => Value::Char(Cow::Owned(s.into_owned())),
            Value::Text(s) => Value::Text(Cow::Owned(s.into_owned())),
            Value::Date(d) => Value::Date(d),
            Value::Vector(v) => Value::Vector(Cow::Owned(v.into_owned())),
        }
    }

    pub fn to_owned_value(&self) -> Value<'static> {
        self.clone().into_owned()
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Char(s) | Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_vector(&self) -> Option<&[f32]> {
        match self {
            Value::Vector(v) => Some(v),
            _ => None,
        }
    }

    pub fn get_int(&self) -> i32 {
        match self {
            Value::Null => 0,
            Value::Int(i) | Value::Date(i) => *i,
            Value::Float(f) => *f as i32,
            Value::Boolean(b) => i32::from(*b),
            Value::Char(s) | Value::Text(s) => super::cast::parse_float_prefix(s) as i32,
            Value::Vector(_) => 0,
        }
    }

    pub fn get_float(&self) -> f32 {
        match self {
            Value::Null => 0.0,
            Value::Int(i) | Value::Date(i) => *i as f32,
            Value::Float(f) => *f,
            Value::Boolean(b) => f32::from(u8::from(*b)),
            Value::Char(s) | Value::Text(s) => super::cast::parse_float_prefix(s) as f32,
            Value::Vector(_) => 0.0,
        }
    }

    pub fn get_boolean(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Int(i) | Value::Date(i) => *i != 0,
            Value::Float(f) => f.abs() >= EPSILON,
            Value::Char(s) | Value::Text(s) => {
                let t = s.trim();
                t.eq_ignore_ascii_case("true") || super::cast::parse_float_prefix(t) != 0.0
            }
            Value::Vector(v) => !v.is_empty(),
        }
    }

    /// Three-way comparison inside one type family.
    pub fn compare(&self, other: &Value<'_>) -> Result<Ordering> {
        let ordering = match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            (a, b) if a.is_numeric_like() && b.is_numeric_like() => {
                let (x, y) = (a.numeric_f64(), b.numeric_f64());
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            }
            (Value::Char(a) | Value::Text(a), Value::Char(b) | Value::Text(b)) => {
                a.as_ref().cmp(b.as_ref())
            }
            (Value::Vector(a), Value::Vector(b)) => compare_vectors(a, b),
            (a, b) => bail!(ExecError::Unsupported(format!(
                "cannot compare {} with {}",
                a.data_type(),
                b.data_type()
            ))),
        };
        Ok(ordering)
    }

    fn is_numeric_like(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_) | Value::Boolean(_))
    }

    /// Exact for every INT and FLOAT, unlike `get_float`.
    fn numeric_f64(&self) -> f64 {
        match self {
            Value::Int(i) => f64::from(*i),
            Value::Float(f) => f64::from(*f),
            Value::Boolean(b) => f64::from(u8::from(*b)),
            _ => 0.0,
        }
    }

    /// SQL LIKE with `%` (any run) and `_` (one character).
    pub fn like(&self, pattern: &Value<'_>) -> Result<bool> {
        match (self.as_str(), pattern.as_str()) {
            (Some(s), Some(p)) => Ok(like_match(s, p)),
            _ => bail!(ExecError::InvalidArgument(format!(
                "LIKE requires string operands, got {} and {}",
                self.data_type(),
                pattern.data_type()
            ))),
        }
    }

    pub fn add(&self, rhs: &Value<'_>) -> Result<Value<'static>> {
        self.numeric_binary(rhs, "+", i32::wrapping_add, |a, b| a + b)
    }

    pub fn subtract(&self, rhs: &Value<'_>) -> Result<Value<'static>> {
        self.numeric_binary(rhs, "-", i32::wrapping_sub, |a, b| a - b)
    }

    pub fn multiply(&self, rhs: &Value<'_>) -> Result<Value<'static>> {
        self.numeric_binary(rhs, "*", i32::wrapping_mul, |a, b| a * b)
    }

    pub fn divide(&self, rhs: &Value<'_>) -> Result<Value<'static>> {
        match (self, rhs) {
            (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
            (a, b) if a.is_numeric_like() && b.is_numeric_like() => {
                let divisor = b.get_float();
                if divisor.abs() < EPSILON {
                    return Ok(Value::Null);
                }
                Ok(Value::Float(a.get_float() / divisor))
            }
            (a, b) => bail!(ExecError::Unsupported(format!(
                "cannot apply / to {} and {}",
                a.data_type(),
                b.data_type()
            ))),
        }
    }

    pub fn negative(&self) -> Result<Value<'static>> {
        match self {
            Value::Null => Ok(Value::Null),
            Value::Int(i) => Ok(Value::Int(i.wrapping_neg())),
            Value::Float(f) => Ok(Value::Float(-f)),
            Value::Vector(v) => Ok(Value::Vector(Cow::Owned(v.iter().map(|x| -x).collect()))),
            other => bail!(ExecError::Unsupported(format!(
                "cannot negate {}",
                other.data_type()
            ))),
        }
    }

    fn numeric_binary(
        &self,
        rhs: &Value<'_>,
        op: &str,
        int_op: fn(i32, i32) -> i32,
        float_op: fn(f32, f32) -> f32,
    ) -> Result<Value<'static>> {
        match (self, rhs) {
            (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(int_op(*a, *b))),
            (a, b) if a.is_numeric_like() && b.is_numeric_like() => {
                Ok(Value::Float(float_op(a.get_float(), b.get_float())))
            }
            (Value::Vector(a), Value::Vector(b)) => {
                if a.len() != b.len() {
                    bail!(ExecError::VectorDimMismatch {
                        left: a.len(),
                        right: b.len()
                    });
                }
                let out: Vec<f32> = a.iter().zip(b.iter()).map(|(x, y)| float_op(*x, *y)).collect();
                Ok(Value::Vector(Cow::Owned(out)))
            }
            (a, b) => bail!(ExecError::Unsupported(format!(
                "cannot apply {} to {} and {}",
                op,
                a.data_type(),
                b.data_type()
            ))),
        }
    }

    /// Appends a type-tagged encoding used as a hash key for grouping.
    pub fn encode_key(&self, buf: &mut Vec<u8>) {
        buf.push(self.data_type() as u8);
        match self {
            Value::Null => {}
            Value::Int(i) | Value::Date(i) => buf.extend_from_slice(&i.to_le_bytes()),
            Value::Float(f) => buf.extend_from_slice(&f.to_bits().to_le_bytes()),
            Value::Boolean(b) => buf.push(u8::from(*b)),
            Value::Char(s) | Value::Text(s) => {
                buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
                buf.extend_from_slice(s.as_bytes());
            }
            Value::Vector(v) => {
                buf.extend_from_slice(&(v.len() as u32).to_le_bytes());
                for x in v.iter() {
                    buf.extend_from_slice(&x.to_bits().to_le_bytes());
                }
            }
        }
    }
}

fn compare_vectors(a: &[f32], b: &[f32]) -> Ordering {
    match a.len().cmp(&b.len()) {
        Ordering::Equal => {}
        other => return other,
    }
    for (x, y) in a.iter().zip(b.iter()) {
        match x.partial_cmp(y).unwrap_or(Ordering::Equal) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

fn like_match(s: &str, pattern: &str) -> bool {
    let s: Vec<char> = s.chars().collect();
    let p: Vec<char> = pattern.chars().collect();
    let (mut si, mut pi) = (0usize, 0usize);
    let mut backtrack: Option<(usize, usize)> = None;

    while si < s.len() {
        if pi < p.len() && (p[pi] == '_' || p[pi] == s[si]) {
            si += 1;
            pi += 1;
        } else if pi < p.len() && p[pi] == '%' {
            backtrack = Some((pi, si));
            pi += 1;
        } else if let Some((star_pi, star_si)) = backtrack {
            pi = star_pi + 1;
            si = star_si + 1;
            backtrack = Some((star_pi, star_si + 1));
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|c| *c == '%')
}

/// Renders a float with two decimals, trimming trailing zeros.
pub fn format_float(f: f32) -> String {
    let mut s = format!("{:.*}", FLOAT_DISPLAY_PRECISION, f);
    if s.contains('.') {
        while s.ends_with('0') {
            s.pop();
        }
        if s.ends_with('.') {
            s.pop();
        }
    }
    if s == "-0" {
        s = "0".to_string();
    }
    s
}

pub fn format_vector(v: &[f32]) -> String {
    let body: Vec<String> = v.iter().map(|x| format_float(*x)).collect();
    format!("[{}]", body.join(","))
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => f.write_str(&format_float(*x)),
            Value::Boolean(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            Value::Char(s) | Value::Text(s) => f.write_str(s),
            Value::Date(d) => f.write_str(&format_date(*d)),
            Value::Vector(v) => f.write_str(&format_vector(v)),
        }
    }
}

impl From<i32> for Value<'static> {
    fn from(i: i32) -> Self {
        Value::Int(i)
    }
}

impl From<f32> for Value<'static> {
    fn from(f: f32) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value<'static> {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(s: &'a str) -> Self {
        Value::Char(Cow::Borrowed(s))
    }
}

impl From<Vec<f32>> for Value<'static> {
    fn from(v: Vec<f32>) -> Self {
        Value::Vector(Cow::Owned(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn compare_is_antisymmetric_within_families() {
        let samples: Vec<(Value, Value)> = vec![
            (Value::Int(1), Value::Int(2)),
            (Value::Int(3), Value::Float(2.5)),
            (Value::Float(-1.0), Value::Boolean(true)),
            (Value::chars("abc"), Value::text("abd")),
            (Value::Date(20240101), Value::Date(20231231)),
            (Value::from(vec![1.0, 2.0]), Value::from(vec![1.0, 3.0])),
            (Value::from(vec![9.0]), Value::from(vec![1.0, 1.0])),
        ];
        for (a, b) in samples {
            let ab = a.compare(&b).unwrap();
            let ba = b.compare(&a).unwrap();
            assert_eq!(ab, ba.reverse(), "{} vs {}", a, b);
        }
    }

    #[test]
    fn shorter_vector_sorts_first() {
        let short = Value::from(vec![100.0]);
        let long = Value::from(vec![0.0, 0.0]);
        assert_eq!(short.compare(&long).unwrap(), Ordering::Less);
    }

    #[test]
    fn large_int_against_float_is_exact() {
        let big = Value::Int(16_777_217);
        assert_eq!(big.compare(&Value::Float(16_777_216.0)).unwrap(), Ordering::Greater);
        assert_eq!(Value::Float(16_777_216.0).compare(&big).unwrap(), Ordering::Less);
        assert_eq!(Value::Int(16_777_216).compare(&Value::Float(16_777_216.0)).unwrap(), Ordering::Equal);
    }

    #[test]
    fn compare_against_null_is_unsupported() {
        let err = Value::Int(1).compare(&Value::Null).unwrap_err();
        assert_eq!(ExecError::code_of(&err), Some(ErrorCode::Unsupported));
        assert!(Value::Int(1).compare(&Value::chars("1")).is_err());
    }

    #[test]
    fn int_arithmetic_stays_int_except_division() {
        assert_eq!(Value::Int(2).add(&Value::Int(3)).unwrap(), Value::Int(5));
        assert_eq!(Value::Int(2).multiply(&Value::Int(3)).unwrap(), Value::Int(6));
        assert_eq!(Value::Int(7).divide(&Value::Int(2)).unwrap(), Value::Float(3.5));
        assert_eq!(Value::Int(1).add(&Value::Float(0.5)).unwrap(), Value::Float(1.5));
    }

    #[test]
    fn division_by_near_zero_is_null() {
        assert_eq!(Value::Float(1.0).divide(&Value::Float(0.0)).unwrap(), Value::Null);
        assert_eq!(Value::Int(1).divide(&Value::Float(1e-7)).unwrap(), Value::Null);
    }

    #[test]
    fn null_operand_makes_arithmetic_null() {
        assert_eq!(Value::Null.add(&Value::Int(1)).unwrap(), Value::Null);
        assert_eq!(Value::Int(1).subtract(&Value::Null).unwrap(), Value::Null);
        assert_eq!(Value::Null.negative().unwrap(), Value::Null);
    }

    #[test]
    fn vector_arithmetic_requires_equal_length() {
        let a = Value::from(vec![1.0, 2.0]);
        let b = Value::from(vec![3.0, 4.0]);
        assert_eq!(a.add(&b).unwrap(), Value::from(vec![4.0, 6.0]));
        assert_eq!(a.multiply(&b).unwrap(), Value::from(vec![3.0, 8.0]));

        let c = Value::from(vec![1.0]);
        let err = a.subtract(&c).unwrap_err();
        assert_eq!(ExecError::code_of(&err), Some(ErrorCode::VectorDimMismatch));
    }

    #[test]
    fn like_wildcards() {
        let s = Value::chars("hello world");
        assert!(s.like(&Value::chars("hello%")).unwrap());
        assert!(s.like(&Value::chars("%o w%")).unwrap());
        assert!(s.like(&Value::chars("h_llo world")).unwrap());
        assert!(!s.like(&Value::chars("world%")).unwrap());
        assert!(s.like(&Value::chars("%")).unwrap());
        assert!(Value::Int(1).like(&Value::chars("%")).is_err());
    }

    #[test]
    fn display_formats() {
        assert_eq!(Value::Float(1.5).to_string(), "1.5");
        assert_eq!(Value::Float(2.0).to_string(), "2");
        assert_eq!(Value::Float(0.126).to_string(), "0.13");
        assert_eq!(Value::Boolean(true).to_string(), "TRUE");
        assert_eq!(Value::Date(20240105).to_string(), "2024-01-05");
        assert_eq!(Value::from(vec![1.0, 0.5]).to_string(), "[1,0.5]");
        assert_eq!(Value::Null.to_string(), "NULL");
    }

    #[test]
    fn length_matches_encoding() {
        assert_eq!(Value::from(vec![1.0, 2.0, 3.0]).length(), 12);
        assert_eq!(Value::chars("abcd").length(), 4);
        assert_eq!(Value::Int(7).length(), 4);
    }

    #[test]
    fn into_owned_detaches_borrowed_text() {
        let backing = String::from("borrowed");
        let v = Value::text(backing.as_str());
        let owned: Value<'static> = v.into_owned();
        drop(backing);
        assert_eq!(owned.as_str(), Some("borrowed"));
    }
}
