//! # Tuples
//!
//! A `Tuple` is the row view expressions are evaluated against. Cells are
//! addressed by position or by a [`TupleCellSpec`]:
//!
//! | Implementation | Cells | Owns data |
//! |----------------|-------|-----------|
//! | `RowTuple` | visible fields of one record | yes (the `Record`) |
//! | `ValueListTuple` | evaluated values | yes |
//! | `JoinedTuple` | left cells then right cells | no |
//!
//! Lookups resolve to the first matching cell; ambiguity is rejected when the
//! plan is bound, not here.

use crate::error::ExecError;
use crate::records::{FieldMeta, Record, TableMeta};
use crate::storage::{BaseRid, Table};
use crate::types::Value;
use eyre::{bail, Result};
use std::fmt;
use std::sync::Arc;

/// Name of one tuple cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TupleCellSpec {
    pub table: String,
    pub field: String,
    pub alias: String,
}

impl TupleCellSpec {
    pub fn new(table: &str, field: &str) -> Self {
        Self {
            table: table.to_string(),
            field: field.to_string(),
            alias: String::new(),
        }
    }

    pub fn with_alias(table: &str, field: &str, alias: &str) -> Self {
        Self {
            table: table.to_string(),
            field: field.to_string(),
            alias: alias.to_string(),
        }
    }

    pub fn from_alias(alias: &str) -> Self {
        Self {
            alias: alias.to_string(),
            ..Self::default()
        }
    }

    /// Whether this cell answers `query`.
    ///
    /// A query naming a field matches on field, and on table when the query
    /// names one. A query carrying an alias also matches the cell's alias.
    pub fn matches(&self, query: &TupleCellSpec) -> bool {
        if !query.field.is_empty()
            && self.field.eq_ignore_ascii_case(&query.field)
            && (query.table.is_empty() || self.table.eq_ignore_ascii_case(&query.table))
        {
            return true;
        }
        !query.alias.is_empty() && self.alias.eq_ignore_ascii_case(&query.alias)
    }
}

impl fmt::Display for TupleCellSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.table.is_empty(), self.field.is_empty()) {
            (_, true) => f.write_str(&self.alias),
            (true, false) => f.write_str(&self.field),
            (false, false) => write!(f, "{}.{}", self.table, self.field),
        }
    }
}

pub trait Tuple {
    fn cell_num(&self) -> usize;

    fn cell_at(&self, index: usize) -> Result<Value<'_>>;

    fn spec_at(&self, index: usize) -> Result<TupleCellSpec>;

    fn find_cell(&self, spec: &TupleCellSpec) -> Result<Option<Value<'_>>> {
        for i in 0..self.cell_num() {
            if self.spec_at(i)?.matches(spec) {
                return self.cell_at(i).map(Some);
            }
        }
        Ok(None)
    }

    /// The stored record behind this tuple, for DML operators.
    fn record(&self) -> Option<&Record> {
        None
    }

    /// Base-table rows this tuple was derived from.
    fn base_rids(&self) -> Vec<BaseRid> {
        Vec::new()
    }
}

fn out_of_range(index: usize, len: usize) -> eyre::Report {
    eyre::eyre!(ExecError::InvalidArgument(format!(
        "cell {} out of range for tuple of {} cells",
        index, len
    )))
}

/// One stored row of a table or view.
#[derive(Debug, Clone)]
pub struct RowTuple {
    table: String,
    meta: Arc<TableMeta>,
    source: Option<Arc<Table>>,
    fields: Vec<usize>,
    record: Record,
}

impl RowTuple {
    pub fn new(meta: Arc<TableMeta>, record: Record) -> Self {
        Self::with_table_name(meta.name().to_string(), meta, record)
    }

    /// A row read from `table`; its base RID is the record's own RID.
    pub fn from_table(table: &Arc<Table>, alias: Option<&str>, record: Record) -> Self {
        let name = alias.unwrap_or(table.name()).to_string();
        let mut tuple = Self::with_table_name(name, table.meta().clone(), record);
        tuple.source = Some(table.clone());
        tuple
    }

    /// Cells report `table` instead of the relation's own name.
    pub fn with_table_name(table: String, meta: Arc<TableMeta>, record: Record) -> Self {
        let fields = meta
            .fields()
            .iter()
            .enumerate()
            .filter(|(_, f)| f.visible)
            .map(|(i, _)| i)
            .collect();
        Self {
            table,
            meta,
            source: None,
            fields,
            record,
        }
    }

    pub fn meta(&self) -> &Arc<TableMeta> {
        &self.meta
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn into_record(self) -> Record {
        self.record
    }

    fn field(&self, index: usize) -> Result<&FieldMeta> {
        self.fields
            .get(index)
            .and_then(|&i| self.meta.field_by_index(i))
            .ok_or_else(|| out_of_range(index, self.fields.len()))
    }
}

impl Tuple for RowTuple {
    fn cell_num(&self) -> usize {
        self.fields.len()
    }

    fn cell_at(&self, index: usize) -> Result<Value<'_>> {
        let field = self.field(index)?;
        self.record.get_field(field)
    }

    fn spec_at(&self, index: usize) -> Result<TupleCellSpec> {
        let field = self.field(index)?;
        Ok(TupleCellSpec::with_alias(&self.table, &field.name, &field.name))
    }

    fn find_cell(&self, spec: &TupleCellSpec) -> Result<Option<Value<'_>>> {
        if !spec.field.is_empty()
            && !spec.table.is_empty()
            && !spec.table.eq_ignore_ascii_case(&self.table)
        {
            return Ok(None);
        }
        let name = if spec.field.is_empty() { &spec.alias } else { &spec.field };
        match self.meta.field(name) {
            Some(field) if field.visible => self.record.get_field(field).map(Some),
            _ => Ok(None),
        }
    }

    fn record(&self) -> Option<&Record> {
        Some(&self.record)
    }

    fn base_rids(&self) -> Vec<BaseRid> {
        match &self.source {
            Some(table) => vec![BaseRid::new(table.clone(), self.record.rid())],
            None => self.record.base_rids().to_vec(),
        }
    }
}

/// An owned row of evaluated cells.
#[derive(Debug, Clone, Default)]
pub struct ValueListTuple {
    specs: Vec<TupleCellSpec>,
    cells: Vec<Value<'static>>,
    base_rids: Vec<BaseRid>,
}

impl ValueListTuple {
    pub fn new(specs: Vec<TupleCellSpec>, cells: Vec<Value<'static>>) -> Result<Self> {
        if specs.len() != cells.len() {
            bail!(ExecError::Internal(format!(
                "{} cell specs for {} cells",
                specs.len(),
                cells.len()
            )));
        }
        Ok(Self {
            specs,
            cells,
            base_rids: Vec::new(),
        })
    }

    pub fn with_base_rids(mut self, base_rids: Vec<BaseRid>) -> Self {
        self.base_rids = base_rids;
        self
    }

    /// Copies every cell of `tuple` into an owned list.
    pub fn snapshot(tuple: &dyn Tuple) -> Result<Self> {
        let n = tuple.cell_num();
        let mut specs = Vec::with_capacity(n);
        let mut cells = Vec::with_capacity(n);
        for i in 0..n {
            specs.push(tuple.spec_at(i)?);
            cells.push(tuple.cell_at(i)?.into_owned());
        }
        Ok(Self {
            specs,
            cells,
            base_rids: tuple.base_rids(),
        })
    }

    pub fn cells(&self) -> &[Value<'static>] {
        &self.cells
    }

    pub fn specs(&self) -> &[TupleCellSpec] {
        &self.specs
    }

    pub fn into_cells(self) -> Vec<Value<'static>> {
        self.cells
    }
}

impl Tuple for ValueListTuple {
    fn cell_num(&self) -> usize {
        self.cells.len()
    }

    fn cell_at(&self, index: usize) -> Result<Value<'_>> {
        self.cells
            .get(index)
            .cloned()
            .ok_or_else(|| out_of_range(index, self.cells.len()))
    }

    fn spec_at(&self, index: usize) -> Result<TupleCellSpec> {
        self.specs
            .get(index)
            .cloned()
            .ok_or_else(|| out_of_range(index, self.specs.len()))
    }

    fn base_rids(&self) -> Vec<BaseRid> {
        self.base_rids.clone()
    }
}

/// Left cells followed by right cells; lookups try the left side first.
pub struct JoinedTuple<'a> {
    left: &'a dyn Tuple,
    right: Option<&'a dyn Tuple>,
}

impl<'a> JoinedTuple<'a> {
    pub fn new(left: &'a dyn Tuple, right: Option<&'a dyn Tuple>) -> Self {
        Self { left, right }
    }
}

impl Tuple for JoinedTuple<'_> {
    fn cell_num(&self) -> usize {
        self.left.cell_num() + self.right.map_or(0, |r| r.cell_num())
    }

    fn cell_at(&self, index: usize) -> Result<Value<'_>> {
        let left = self.left.cell_num();
        if index < left {
            return self.left.cell_at(index);
        }
        match self.right {
            Some(right) => right.cell_at(index - left),
            None => Err(out_of_range(index, left)),
        }
    }

    fn spec_at(&self, index: usize) -> Result<TupleCellSpec> {
        let left = self.left.cell_num();
        if index < left {
            return self.left.spec_at(index);
        }
        match self.right {
            Some(right) => right.spec_at(index - left),
            None => Err(out_of_range(index, left)),
        }
    }

    fn find_cell(&self, spec: &TupleCellSpec) -> Result<Option<Value<'_>>> {
        if let Some(value) = self.left.find_cell(spec)? {
            return Ok(Some(value));
        }
        match self.right {
            Some(right) => right.find_cell(spec),
            None => Ok(None),
        }
    }

    fn record(&self) -> Option<&Record> {
        self.left.record()
    }

    fn base_rids(&self) -> Vec<BaseRid> {
        let mut rids = self.left.base_rids();
        if let Some(right) = self.right {
            rids.extend(right.base_rids());
        }
        rids
    }
}
