//! # DateTime Functions Module
//!
//! ## Date Extraction
//! - `YEAR(date)`, `MONTH(date)`, `DAY(date)`
//!
//! ## Formatting
//! - `DATE_FORMAT(date, format)`
//!
//! Every function accepts a DATE or a CHAR/TEXT date string in `Y-M-D` form;
//! strings are parsed with the same strict rules as a cast to DATE.
//!
//! ## DATE_FORMAT Specifiers
//!
//! | Specifier | Output | Example (2024-03-01) |
//! |-----------|--------|----------------------|
//! | `%Y` | 4-digit year | `2024` |
//! | `%y` | 2-digit year | `24` |
//! | `%m` | 2-digit month | `03` |
//! | `%c` | month, no padding | `3` |
//! | `%M` | month name | `March` |
//! | `%d` | 2-digit day | `01` |
//! | `%e` | day, no padding | `1` |
//! | `%D` | day with ordinal suffix | `1st` |
//!
//! Any other character after `%` is emitted as is; a trailing `%` is kept.

use super::{type_error, BuiltinFunction};
use crate::error::ExecError;
use crate::types::date::{check_date, month_name, ordinal_suffix, parse_date, unpack};
use crate::types::Value;
use eyre::{bail, Result};
use std::borrow::Cow;

pub fn eval_datetime_function(func: BuiltinFunction, args: &[Value<'_>]) -> Result<Value<'static>> {
    match func {
        BuiltinFunction::Year => Ok(Value::Int(date_parts(func, &args[0])?.0)),
        BuiltinFunction::Month => Ok(Value::Int(date_parts(func, &args[0])?.1)),
        BuiltinFunction::Day => Ok(Value::Int(date_parts(func, &args[0])?.2)),
        BuiltinFunction::DateFormat => eval_date_format(args),
        other => bail!(ExecError::Internal(format!("{} is not a date function", other))),
    }
}

fn date_parts(func: BuiltinFunction, value: &Value<'_>) -> Result<(i32, i32, i32)> {
    let packed = match value {
        Value::Date(d) => *d,
        Value::Char(s) | Value::Text(s) => parse_date(s)?,
        other => return Err(type_error(func, other)),
    };
    let (year, month, day) = unpack(packed);
    if !check_date(year, month, day) {
        bail!(ExecError::InvalidDate(packed.to_string()));
    }
    Ok((year, month, day))
}

fn eval_date_format(args: &[Value<'_>]) -> Result<Value<'static>> {
    let (year, month, day) = date_parts(BuiltinFunction::DateFormat, &args[0])?;
    let Some(format) = args[1].as_str() else {
        return Err(type_error(BuiltinFunction::DateFormat, &args[1]));
    };
    Ok(Value::Char(Cow::Owned(format_date_parts(format, year, month, day))))
}

pub fn format_date_parts(format: &str, year: i32, month: i32, day: i32) -> String {
    let mut out = String::with_capacity(format.len() + 8);
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('Y') => out.push_str(&year.to_string()),
            Some('y') => out.push_str(&format!("{:02}", year % 100)),
            Some('m') => out.push_str(&format!("{:02}", month)),
            Some('c') => out.push_str(&month.to_string()),
            Some('M') => out.push_str(month_name(month)),
            Some('d') => out.push_str(&format!("{:02}", day)),
            Some('e') => out.push_str(&day.to_string()),
            Some('D') => {
                out.push_str(&day.to_string());
                out.push_str(ordinal_suffix(day));
            }
            Some(other) => out.push(other),
            None => out.push('%'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn format(date: &str, fmt: &str) -> String {
        match eval_date_format(&[Value::chars(date), Value::chars(fmt)]).unwrap() {
            Value::Char(s) => s.into_owned(),
            other => panic!("expected char, got {:?}", other),
        }
    }

    #[test]
    fn extracts_parts_from_date_and_string() {
        assert_eq!(
            eval_datetime_function(BuiltinFunction::Year, &[Value::Date(20240229)]).unwrap(),
            Value::Int(2024)
        );
        assert_eq!(
            eval_datetime_function(BuiltinFunction::Month, &[Value::chars("2019-9-17")]).unwrap(),
            Value::Int(9)
        );
        assert_eq!(
            eval_datetime_function(BuiltinFunction::Day, &[Value::chars("2019-09-17")]).unwrap(),
            Value::Int(17)
        );
    }

    #[test]
    fn invalid_date_string_is_rejected() {
        let err = eval_datetime_function(BuiltinFunction::Year, &[Value::chars("2023-2-29")]).unwrap_err();
        assert_eq!(ExecError::code_of(&err), Some(ErrorCode::InvalidDate));
        let err = eval_datetime_function(BuiltinFunction::Year, &[Value::Int(3)]).unwrap_err();
        assert_eq!(ExecError::code_of(&err), Some(ErrorCode::InvalidArgument));
    }

    #[test]
    fn date_format_specifiers() {
        assert_eq!(format("2024-3-1", "%Y/%m/%d"), "2024/03/01");
        assert_eq!(format("2024-3-1", "%y %c %e"), "24 3 1");
        assert_eq!(format("2024-3-1", "%M %D"), "March 1st");
        assert_eq!(format("2024-11-22", "%D"), "22nd");
        assert_eq!(format("2024-11-11", "%D"), "11th");
        assert_eq!(format("2024-11-13", "%D of %M"), "13th of November");
        assert_eq!(format("2024-11-23", "%D"), "23rd");
    }

    #[test]
    fn unknown_specifier_is_copied() {
        assert_eq!(format("2024-3-1", "%Q %% 100%"), "Q % 100%");
    }
}
