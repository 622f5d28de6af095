//! # Attribute Data Types
//!
//! `DataType` is the type tag shared by field metadata, expression typing and
//! runtime values.
//!
//! ## Type Categories
//!
//! | Category | Types | Fixed Size |
//! |----------|-------|------------|
//! | **Numeric** | Ints, Floats | 4 bytes |
//! | **Boolean** | Booleans | 1 byte |
//! | **Date** | Dates (packed `y*10000 + m*100 + d`) | 4 bytes |
//! | **String** | Chars, Texts | declared length |
//! | **Vector** | Vectors (`f32` elements) | `4 * dim` bytes |
//! | **Markers** | Undefined, Nulls | - |
//!
//! `Undefined` is the type of an expression whose type cannot be known before
//! execution (an unresolved subquery or list). `Nulls` is the type of a NULL
//! literal.

use crate::config::{BOOLEAN_FIELD_LEN, SCALAR_FIELD_LEN};
use crate::error::ExecError;
use eyre::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DataType {
    #[default]
    Undefined = 0,
    Chars = 1,
    Ints = 2,
    Floats = 3,
    Booleans = 4,
    Dates = 5,
    Texts = 6,
    Vectors = 7,
    Nulls = 8,
}

impl DataType {
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Undefined => "UNDEFINED",
            DataType::Chars => "CHARS",
            DataType::Ints => "INTS",
            DataType::Floats => "FLOATS",
            DataType::Booleans => "BOOLEANS",
            DataType::Dates => "DATES",
            DataType::Texts => "TEXTS",
            DataType::Vectors => "VECTORS",
            DataType::Nulls => "NULLS",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        let ty = match name.to_ascii_uppercase().as_str() {
            "CHARS" | "CHAR" => DataType::Chars,
            "INTS" | "INT" => DataType::Ints,
            "FLOATS" | "FLOAT" => DataType::Floats,
            "BOOLEANS" | "BOOLEAN" | "BOOL" => DataType::Booleans,
            "DATES" | "DATE" => DataType::Dates,
            "TEXTS" | "TEXT" => DataType::Texts,
            "VECTORS" | "VECTOR" => DataType::Vectors,
            "NULLS" | "NULL" => DataType::Nulls,
            "UNDEFINED" => DataType::Undefined,
            _ => bail!(ExecError::InvalidArgument(format!(
                "unknown data type '{}'",
                name
            ))),
        };
        Ok(ty)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Ints | DataType::Floats)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, DataType::Chars | DataType::Texts)
    }

    /// Storage width for fixed-size types, `None` for declared-length types.
    pub fn fixed_len(&self) -> Option<usize> {
        match self {
            DataType::Ints | DataType::Floats | DataType::Dates => Some(SCALAR_FIELD_LEN),
            DataType::Booleans => Some(BOOLEAN_FIELD_LEN),
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_name_accepts_sql_spellings() {
        assert_eq!(DataType::from_name("int").unwrap(), DataType::Ints);
        assert_eq!(DataType::from_name("Vector").unwrap(), DataType::Vectors);
        assert_eq!(DataType::from_name("TEXTS").unwrap(), DataType::Texts);
        assert!(DataType::from_name("blob").is_err());
    }

    #[test]
    fn categories() {
        assert!(DataType::Ints.is_numeric());
        assert!(DataType::Floats.is_numeric());
        assert!(!DataType::Dates.is_numeric());
        assert!(DataType::Texts.is_string());
        assert_eq!(DataType::Booleans.fixed_len(), Some(1));
        assert_eq!(DataType::Chars.fixed_len(), None);
    }

    #[test]
    fn serializes_as_uppercase_name() {
        let json = serde_json::to_string(&DataType::Vectors).unwrap();
        assert_eq!(json, "\"VECTORS\"");
    }
}
