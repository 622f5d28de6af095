//! # Schema Definition
//!
//! `TableMeta` describes the byte layout of one relation's records. Offsets are
//! computed once from a list of `FieldDef`s, so record access is a slice of a
//! known range.
//!
//! `IndexMeta` is the persisted description of one index and serializes to the
//! catalog JSON form:
//!
//! ```json
//! {"name":"idx_v","index_type":"ivfflat","fields":["v"],"fields_total_len":8,
//!  "unique":false,"distance_fn":"l2_distance","lists":4,"probes":2}
//! ```

use crate::config::VECTOR_ELEMENT_LEN;
use crate::error::ExecError;
use crate::ivfflat::DistanceFunction;
use crate::types::DataType;
use eyre::{bail, Result};
use serde::{Deserialize, Serialize};

/// Declaration of one field before layout.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub data_type: DataType,
    /// Payload length in bytes; for VECTOR this is `dim * 4`.
    pub len: usize,
    pub nullable: bool,
    pub mutable: bool,
}

impl FieldDef {
    pub fn new(name: &str, data_type: DataType, len: usize) -> Self {
        Self {
            name: name.to_string(),
            data_type,
            len,
            nullable: false,
            mutable: true,
        }
    }

    pub fn int(name: &str) -> Self {
        Self::new(name, DataType::Ints, 4)
    }

    pub fn float(name: &str) -> Self {
        Self::new(name, DataType::Floats, 4)
    }

    pub fn date(name: &str) -> Self {
        Self::new(name, DataType::Dates, 4)
    }

    pub fn boolean(name: &str) -> Self {
        Self::new(name, DataType::Booleans, 1)
    }

    pub fn chars(name: &str, len: usize) -> Self {
        Self::new(name, DataType::Chars, len)
    }

    pub fn text(name: &str, len: usize) -> Self {
        Self::new(name, DataType::Texts, len)
    }

    pub fn vector(name: &str, dim: usize) -> Self {
        Self::new(name, DataType::Vectors, dim * VECTOR_ELEMENT_LEN)
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn immutable(mut self) -> Self {
        self.mutable = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMeta {
    pub name: String,
    pub data_type: DataType,
    pub offset: usize,
    /// Stored length, including the null flag byte when `nullable`.
    pub len: usize,
    pub nullable: bool,
    pub visible: bool,
    pub field_id: usize,
    pub mutable: bool,
}

impl FieldMeta {
    /// Bytes available to the value itself.
    pub fn payload_len(&self) -> usize {
        self.len - usize::from(self.nullable)
    }

    pub fn vector_dim(&self) -> usize {
        self.payload_len() / VECTOR_ELEMENT_LEN
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableMeta {
    name: String,
    fields: Vec<FieldMeta>,
    record_size: usize,
}

impl TableMeta {
    pub fn new(name: &str, defs: Vec<FieldDef>) -> Result<Self> {
        if name.trim().is_empty() {
            bail!(ExecError::InvalidArgument("relation name cannot be empty".into()));
        }
        if defs.is_empty() {
            bail!(ExecError::InvalidArgument(format!(
                "relation '{}' needs at least one field",
                name
            )));
        }

        let mut fields = Vec::with_capacity(defs.len());
        let mut offset = 0usize;
        for (field_id, def) in defs.into_iter().enumerate() {
            if def.len == 0 {
                bail!(ExecError::InvalidArgument(format!(
                    "field '{}' has zero length",
                    def.name
                )));
            }
            if let Some(fixed) = def.data_type.fixed_len() {
                if def.len != fixed {
                    bail!(ExecError::InvalidArgument(format!(
                        "field '{}' of type {} must be {} bytes",
                        def.name, def.data_type, fixed
                    )));
                }
            }
            if fields
                .iter()
                .any(|f: &FieldMeta| f.name.eq_ignore_ascii_case(&def.name))
            {
                bail!(ExecError::InvalidArgument(format!(
                    "duplicate field '{}'",
                    def.name
                )));
            }

            let len = def.len + usize::from(def.nullable);
            fields.push(FieldMeta {
                name: def.name,
                data_type: def.data_type,
                offset,
                len,
                nullable: def.nullable,
                visible: true,
                field_id,
                mutable: def.mutable,
            });
            offset += len;
        }

        Ok(Self {
            name: name.to_string(),
            fields,
            record_size: offset,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldMeta] {
        &self.fields
    }

    pub fn field_num(&self) -> usize {
        self.fields.len()
    }

    pub fn record_size(&self) -> usize {
        self.record_size
    }

    pub fn field(&self, name: &str) -> Option<&FieldMeta> {
        self.fields.iter().find(|f| f.name.eq_ignore_ascii_case(name))
    }

    pub fn field_by_index(&self, index: usize) -> Option<&FieldMeta> {
        self.fields.get(index)
    }

    pub fn visible_fields(&self) -> impl Iterator<Item = &FieldMeta> {
        self.fields.iter().filter(|f| f.visible)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexType {
    BTree,
    Ivfflat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMeta {
    pub name: String,
    pub index_type: IndexType,
    pub fields: Vec<String>,
    pub fields_total_len: usize,
    pub unique: bool,
    pub distance_fn: Option<DistanceFunction>,
    pub lists: usize,
    pub probes: usize,
}

impl IndexMeta {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
