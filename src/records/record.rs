//! # Record Buffer
//!
//! A `Record` owns the bytes of one row. Field values are written with
//! `set_field` and read back with `get_field`; string payloads are borrowed
//! from the buffer, numeric payloads are decoded through `zerocopy`'s
//! little-endian wrappers so no alignment is assumed.
//!
//! ## make_record
//!
//! `make_record` is the single validating path from a list of values to a
//! record. Checks run per field in this order:
//!
//! 1. value count equals field count (`SchemaFieldMissing`)
//! 2. NULL only into nullable fields (`NotNullableValue`)
//! 3. CHAR into TEXT is taken as is, everything else is cast without promotion
//! 4. payload fits `len - nullable` (`ValueTooLong`)
//! 5. vector dimension equals the field's (`VectorDimMismatch`)

use super::{FieldMeta, Rid, TableMeta};
use crate::config::{NULL_FLAG, SCALAR_FIELD_LEN, VECTOR_ELEMENT_LEN};
use crate::error::{ErrorCode, ExecError};
use crate::storage::BaseRid;
use crate::types::{DataType, Value};
use eyre::{bail, ensure, eyre, Result};
use std::borrow::Cow;
use zerocopy::little_endian::{F32, I32};
use zerocopy::{FromBytes, IntoBytes};

#[derive(Debug, Clone, Default)]
pub struct Record {
    rid: Rid,
    data: Vec<u8>,
    base_rids: Vec<BaseRid>,
}

impl Record {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            rid: Rid::default(),
            data,
            base_rids: Vec::new(),
        }
    }

    pub fn with_rid(rid: Rid, data: Vec<u8>) -> Self {
        Self {
            rid,
            data,
            base_rids: Vec::new(),
        }
    }

    pub fn rid(&self) -> Rid {
        self.rid
    }

    pub fn set_rid(&mut self, rid: Rid) {
        self.rid = rid;
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn base_rids(&self) -> &[BaseRid] {
        &self.base_rids
    }

    pub fn set_base_rids(&mut self, base_rids: Vec<BaseRid>) {
        self.base_rids = base_rids;
    }

    fn field_range(&self, offset: usize, len: usize) -> Result<std::ops::Range<usize>> {
        let end = offset
            .checked_add(len)
            .ok_or_else(|| eyre!(ExecError::Internal("field range overflows".into())))?;
        ensure!(
            end <= self.data.len(),
            ExecError::Internal(format!(
                "field [{}, {}) outside record of {} bytes",
                offset,
                end,
                self.data.len()
            ))
        );
        Ok(offset..end)
    }

    /// Copies the value payload into `[offset, offset + len)`.
    ///
    /// At most `len` bytes are copied. A shorter payload is followed by a NUL
    /// byte, which also clears the null flag of a nullable field.
    pub fn set_field(&mut self, offset: usize, len: usize, value: &Value<'_>) -> Result<()> {
        let range = self.field_range(offset, len)?;
        let payload = encode_payload(value);
        let copy = payload.len().min(len);
        let slot = &mut self.data[range];
        slot[..copy].copy_from_slice(&payload[..copy]);
        if copy < len {
            slot[copy] = 0;
        }
        Ok(())
    }

    pub fn set_null(&mut self, field: &FieldMeta) -> Result<()> {
        ensure!(
            field.nullable,
            ExecError::NotNullableValue(field.name.clone())
        );
        let range = self.field_range(field.offset, field.len)?;
        self.data[range.end - 1] = NULL_FLAG;
        Ok(())
    }

    /// Writes `value` into `field`, setting or clearing its null flag.
    pub fn write_value(&mut self, field: &FieldMeta, value: &Value<'_>) -> Result<()> {
        if value.is_null() {
            return self.set_null(field);
        }
        if value.length() > field.payload_len() {
            bail!(ExecError::ValueTooLong(format!(
                "field '{}' holds {} bytes, value has {}",
                field.name,
                field.payload_len(),
                value.length()
            )));
        }
        self.set_field(field.offset, field.len, value)?;
        if field.nullable {
            let range = self.field_range(field.offset, field.len)?;
            self.data[range.end - 1] = 0;
        }
        Ok(())
    }

    pub fn field_bytes(&self, field: &FieldMeta) -> Result<&[u8]> {
        let range = self.field_range(field.offset, field.len)?;
        Ok(&self.data[range])
    }

    pub fn is_field_null(&self, field: &FieldMeta) -> Result<bool> {
        let bytes = self.field_bytes(field)?;
        Ok(field.nullable && bytes.last() == Some(&NULL_FLAG))
    }

    pub fn get_field(&self, field: &FieldMeta) -> Result<Value<'_>> {
        if self.is_field_null(field)? {
            return Ok(Value::Null);
        }
        let bytes = self.field_bytes(field)?;
        decode_payload(field, &bytes[..field.payload_len()])
    }
}

fn encode_payload(value: &Value<'_>) -> Vec<u8> {
    match value {
        Value::Null => Vec::new(),
        Value::Int(i) | Value::Date(i) => I32::new(*i).as_bytes().to_vec(),
        Value::Float(f) => F32::new(*f).as_bytes().to_vec(),
        Value::Boolean(b) => vec![u8::from(*b)],
        Value::Char(s) | Value::Text(s) => s.as_bytes().to_vec(),
        Value::Vector(v) => {
            let encoded: Vec<F32> = v.iter().map(|x| F32::new(*x)).collect();
            encoded.as_bytes().to_vec()
        }
    }
}

/// Decodes a field payload; vector payloads are `f32` decoded from unaligned
/// little-endian bytes.
pub(crate) fn decode_vector(payload: &[u8]) -> Result<Vec<f32>> {
    let elements = <[F32]>::ref_from_bytes(payload).map_err(|_| {
        eyre!(ExecError::Internal(format!(
            "vector payload of {} bytes is not a multiple of {}",
            payload.len(),
            VECTOR_ELEMENT_LEN
        )))
    })?;
    Ok(elements.iter().map(|x| x.get()).collect())
}

fn decode_scalar<T: FromBytes>(payload: &[u8], field: &FieldMeta) -> Result<T> {
    let head = payload.get(..SCALAR_FIELD_LEN).ok_or_else(|| {
        eyre!(ExecError::Internal(format!(
            "field '{}' shorter than {} bytes",
            field.name, SCALAR_FIELD_LEN
        )))
    })?;
    T::read_from_bytes(head)
        .map_err(|_| eyre!(ExecError::Internal(format!("cannot decode field '{}'", field.name))))
}

fn decode_payload<'a>(field: &FieldMeta, payload: &'a [u8]) -> Result<Value<'a>> {
    let value = match field.data_type {
        DataType::Ints => Value::Int(decode_scalar::<I32>(payload, field)?.get()),
        DataType::Dates => Value::Date(decode_scalar::<I32>(payload, field)?.get()),
        DataType::Floats => Value::Float(decode_scalar::<F32>(payload, field)?.get()),
        DataType::Booleans => Value::Boolean(payload.first().is_some_and(|b| *b != 0)),
        DataType::Chars => Value::Char(decode_str(payload)),
        DataType::Texts => Value::Text(decode_str(payload)),
        DataType::Vectors => Value::Vector(Cow::Owned(decode_vector(payload)?)),
        other => bail!(ExecError::Internal(format!(
            "field '{}' has non-storable type {}",
            field.name, other
        ))),
    };
    Ok(value)
}

fn decode_str(payload: &[u8]) -> Cow<'_, str> {
    let end = payload.iter().position(|b| *b == 0).unwrap_or(payload.len());
    String::from_utf8_lossy(&payload[..end])
}

/// Builds a record for `meta` from one value per field.
pub fn make_record(meta: &TableMeta, values: &[Value<'_>]) -> Result<Record> {
    if values.len() != meta.field_num() {
        bail!(ExecError::SchemaFieldMissing(format!(
            "relation '{}' expects {} values, got {}",
            meta.name(),
            meta.field_num(),
            values.len()
        )));
    }

    let mut record = Record::new(vec![0u8; meta.record_size()]);
    for (field, value) in meta.fields().iter().zip(values) {
        let stored = coerce_value(field, value)?;
        if stored.is_null() {
            record.set_null(field)?;
        } else {
            record.set_field(field.offset, field.len, &stored)?;
        }
    }
    Ok(record)
}

/// Converts `value` into what `field` stores, without promotion.
///
/// NULL needs a nullable field. A value whose type cannot be cast to the
/// field type is `SchemaFieldTypeMismatch`.
pub fn coerce_value<'v>(field: &FieldMeta, value: &Value<'v>) -> Result<Value<'v>> {
    if value.is_null() {
        if !field.nullable {
            bail!(ExecError::NotNullableValue(field.name.clone()));
        }
        return Ok(Value::Null);
    }

    let stored = if field.data_type == DataType::Texts && value.data_type() == DataType::Chars {
        value.clone()
    } else {
        value.cast_to(field.data_type, false).map_err(|err| {
            match ExecError::code_of(&err) {
                Some(ErrorCode::Unsupported) => eyre!(ExecError::SchemaFieldTypeMismatch(format!(
                    "field '{}' is {}, value is {}",
                    field.name,
                    field.data_type,
                    value.data_type()
                ))),
                _ => err,
            }
        })?
    };

    if stored.length() > field.payload_len() {
        bail!(ExecError::ValueTooLong(format!(
            "field '{}' holds {} bytes, value has {}",
            field.name,
            field.payload_len(),
            stored.length()
        )));
    }
    if let Value::Vector(v) = &stored {
        if v.len() != field.vector_dim() {
            bail!(ExecError::VectorDimMismatch {
                left: v.len(),
                right: field.vector_dim()
            });
        }
    }
    Ok(stored)
}
