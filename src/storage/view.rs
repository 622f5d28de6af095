//! # Views
//!
//! A `View` is a named projection over one or more base tables. Each view
//! field either maps to a `(base table, field id)` pair or is computed by an
//! expression. Rows produced by a view scan carry the base-table RIDs they
//! came from, which is how writes are routed back:
//!
//! | Operation | Routing |
//! |-----------|---------|
//! | insert | split the view row into one base record per base table; unmapped base fields are NULL |
//! | delete | delete every `(table, rid)` in the row's `base_rids` |
//! | update | re-read each base row, overwrite the mutable mapped fields, update it |
//!
//! Views defined with aggregates or GROUP BY are read-only.

use crate::error::ExecError;
use crate::records::{make_record, FieldDef, FieldMeta, Record, TableMeta};
use crate::storage::{BaseRid, Table};
use crate::types::{DataType, Value};
use eyre::{bail, Result, WrapErr};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone)]
pub enum ViewColumn {
    /// A base-table field, found by name in the view's tables in order.
    Field(String),
    /// A computed column; never written back.
    Computed {
        name: String,
        data_type: DataType,
        len: usize,
    },
}

impl ViewColumn {
    pub fn field(name: &str) -> Self {
        ViewColumn::Field(name.to_string())
    }

    pub fn computed(name: &str, data_type: DataType, len: usize) -> Self {
        ViewColumn::Computed {
            name: name.to_string(),
            data_type,
            len,
        }
    }
}

pub struct View {
    meta: Arc<TableMeta>,
    tables: Vec<Arc<Table>>,
    field_index: Vec<Option<(Arc<Table>, usize)>>,
    read_only: bool,
}

impl View {
    pub fn create(
        name: &str,
        tables: Vec<Arc<Table>>,
        columns: Vec<ViewColumn>,
        read_only: bool,
    ) -> Result<Self> {
        let mut defs = Vec::with_capacity(columns.len());
        let mut field_index = Vec::with_capacity(columns.len());

        for column in columns {
            match column {
                ViewColumn::Field(field_name) => {
                    let found = tables.iter().find_map(|table| {
                        table
                            .meta()
                            .field(&field_name)
                            .map(|f| (table.clone(), f.clone()))
                    });
                    let Some((table, base)) = found else {
                        bail!(ExecError::SchemaFieldMissing(format!(
                            "view field '{}' not found in any base table",
                            field_name
                        )));
                    };
                    let mut def = FieldDef::new(&base.name, base.data_type, base.payload_len());
                    def.nullable = base.nullable;
                    def.mutable = base.mutable && !read_only;
                    defs.push(def);
                    field_index.push(Some((table, base.field_id)));
                }
                ViewColumn::Computed {
                    name,
                    data_type,
                    len,
                } => {
                    defs.push(FieldDef::new(&name, data_type, len).nullable().immutable());
                    field_index.push(None);
                }
            }
        }

        let meta = TableMeta::new(name, defs).wrap_err_with(|| format!("defining view '{}'", name))?;
        Ok(Self {
            meta: Arc::new(meta),
            tables,
            field_index,
            read_only,
        })
    }

    pub fn name(&self) -> &str {
        self.meta.name()
    }

    pub fn meta(&self) -> &Arc<TableMeta> {
        &self.meta
    }

    pub fn tables(&self) -> &[Arc<Table>] {
        &self.tables
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn make_record(&self, values: &[Value<'_>]) -> Result<Record> {
        make_record(&self.meta, values)
    }

    fn ensure_writable(&self, op: &str) -> Result<()> {
        if self.read_only {
            bail!(ExecError::Unsupported(format!(
                "cannot {} through read-only view '{}'",
                op,
                self.name()
            )));
        }
        Ok(())
    }

    fn mapped_fields<'v>(
        &'v self,
        table: &'v Arc<Table>,
    ) -> impl Iterator<Item = (&'v FieldMeta, usize)> + 'v {
        self.meta
            .fields()
            .iter()
            .zip(&self.field_index)
            .filter_map(move |(field, mapping)| match mapping {
                Some((base, idx)) if Arc::ptr_eq(base, table) => Some((field, *idx)),
                _ => None,
            })
    }

    /// Inserts one base record per base table and records their RIDs as the
    /// view row's base RIDs.
    pub fn insert_record(&self, record: &mut Record) -> Result<()> {
        self.ensure_writable("insert")?;
        let mut base_rids = Vec::with_capacity(self.tables.len());
        for table in &self.tables {
            if let Err(err) = self.insert_base(table, record, &mut base_rids) {
                for base in base_rids.iter().rev() {
                    if let Err(undo) = base.table.delete_record(base.rid) {
                        warn!(view = self.name(), base = ?base, error = %undo, "failed to undo base insert");
                    }
                }
                return Err(err);
            }
        }
        record.set_base_rids(base_rids);
        Ok(())
    }

    fn insert_base(&self, table: &Arc<Table>, record: &Record, base_rids: &mut Vec<BaseRid>) -> Result<()> {
        let mut values = vec![Value::Null; table.meta().field_num()];
        for (field, idx) in self.mapped_fields(table) {
            values[idx] = record.get_field(field)?.into_owned();
        }
        let mut base = table
            .make_record(&values)
            .wrap_err_with(|| format!("inserting into '{}' through view '{}'", table.name(), self.name()))?;
        table.insert_record(&mut base)?;
        base_rids.push(BaseRid::new(table.clone(), base.rid()));
        Ok(())
    }

    pub fn delete_record(&self, record: &Record) -> Result<()> {
        self.ensure_writable("delete")?;
        for base in record.base_rids() {
            base.table.delete_record(base.rid)?;
        }
        Ok(())
    }

    pub fn update_record(&self, old: &Record, new: &Record) -> Result<()> {
        self.ensure_writable("update")?;
        for base in old.base_rids() {
            let base_old = base.table.get_record(base.rid)?;
            let mut base_new = base_old.clone();
            for (field, idx) in self.mapped_fields(&base.table) {
                if !field.mutable {
                    continue;
                }
                let Some(base_field) = base.table.meta().field_by_index(idx) else {
                    bail!(ExecError::Internal(format!(
                        "view '{}' maps to missing field {} of '{}'",
                        self.name(),
                        idx,
                        base.table.name()
                    )));
                };
                let value = new.get_field(field)?;
                base_new.write_value(base_field, &value)?;
            }
            base.table.update_record(&base_old, &base_new)?;
        }
        Ok(())
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("name", &self.name())
            .field("tables", &self.tables.iter().map(|t| t.name()).collect::<Vec<_>>())
            .field("read_only", &self.read_only)
            .finish()
    }
}
