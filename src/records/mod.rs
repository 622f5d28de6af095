//! # Fixed-Layout Records
//!
//! This module provides the physical row representation used by the operator
//! tree: a `Record` is a byte buffer laid out according to a `TableMeta`, plus
//! its `Rid` and, for view rows, the base-table rows it was derived from.
//!
//! ## Record Binary Layout
//!
//! Every field has a fixed offset and length computed when the table is
//! defined:
//!
//! ```text
//! +-----------+-----------+--------------------+------------+
//! | id: INT   | score:FLT | name: CHAR(8)      | v: VEC(2)  |
//! | 4 bytes   | 4 + flag  | 8 bytes, NUL pad   | 8 bytes    |
//! +-----------+-----------+--------------------+------------+
//! ```
//!
//! | Type | Encoding |
//! |------|----------|
//! | INT / DATE | little-endian `i32` |
//! | FLOAT | little-endian `f32` |
//! | BOOLEAN | one byte, non-zero is TRUE |
//! | CHAR / TEXT | UTF-8 bytes, NUL padded |
//! | VECTOR | `dim` little-endian `f32` |
//!
//! A nullable field reserves one trailing flag byte. The flag holds `b'1'`
//! when the field is NULL.
//!
//! ## Module Structure
//!
//! - `rid`: `Rid` row identifier
//! - `schema`: `FieldMeta`, `TableMeta`, `IndexMeta`
//! - `record`: `Record` and the validating `make_record`

mod record;
mod rid;
mod schema;

pub(crate) use record::decode_vector;
pub use record::{coerce_value, make_record, Record};
pub use rid::Rid;
pub use schema::{FieldDef, FieldMeta, IndexMeta, IndexType, TableMeta};
