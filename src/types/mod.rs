//! # Type System
//!
//! This module provides the value and type layer every other subsystem builds
//! on.
//!
//! ## Module Structure
//!
//! - `data_type`: `DataType` tag shared by fields, expressions and values
//! - `value`: Runtime `Value<'a>` with zero-copy string payloads
//! - `cast`: `cast_to` conversions and `cast_cost` ranking
//! - `date`: packed DATE parsing, validation and formatting
//!
//! ## Key Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | `DataType` | Type discriminant |
//! | `Value<'a>` | Runtime value (borrowed from records or owned) |
//!
//! ## Usage
//!
//! ```ignore
//! use turvec::types::{DataType, Value};
//!
//! let v = Value::chars("12").cast_to(DataType::Ints, true)?;
//! assert_eq!(v, Value::Int(12));
//! ```

mod cast;
mod data_type;
pub mod date;
mod value;

pub use cast::{cast_cost, parse_float_prefix, parse_vector, CAST_COST_UNSUPPORTED};
pub use data_type::DataType;
pub use value::{format_float, format_vector, Value};
