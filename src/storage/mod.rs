//! # Storage Module
//!
//! In-memory relations and the transaction seam the operators write through.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │        Relation (Table | View)               │
//! ├──────────────────────┬───────────────────────┤
//! │ Table                │ View                  │
//! │  ├─ TableMeta        │  ├─ TableMeta         │
//! │  ├─ RecordFileHandler│  └─ field_index ──┐   │
//! │  └─ IVFFLAT indexes  │     (table, field)│   │
//! ├──────────────────────┴───────────────────┼───┤
//! │            Trx (insert/update/delete/visit)  │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Operators never touch a `Table` directly for writes: every insert, update
//! and delete goes through a [`Trx`] so a transaction implementation can
//! record, reject or hide changes. [`VacuousTrx`] applies writes directly and
//! sees every row.
//!
//! ## Base RIDs
//!
//! A record read through a view carries one [`BaseRid`] per contributing base
//! row. Deletes and updates through the view follow these back to the tables.

mod heap;
mod table;
mod trx;
mod view;

pub use heap::RecordFileHandler;
pub use table::Table;
pub use trx::{ReadWriteMode, Trx, TrxRef, VacuousTrx, Visibility};
pub use view::{View, ViewColumn};

use crate::records::{Record, Rid, TableMeta};
use crate::types::Value;
use eyre::Result;
use std::fmt;
use std::sync::Arc;

/// Location of one base-table row behind a view row.
#[derive(Clone)]
pub struct BaseRid {
    pub table: Arc<Table>,
    pub rid: Rid,
}

impl BaseRid {
    pub fn new(table: Arc<Table>, rid: Rid) -> Self {
        Self { table, rid }
    }
}

impl fmt::Debug for BaseRid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.table.name(), self.rid)
    }
}

/// A named source of rows: a base table or a view.
#[derive(Debug, Clone)]
pub enum Relation {
    Table(Arc<Table>),
    View(Arc<View>),
}

impl Relation {
    pub fn name(&self) -> &str {
        match self {
            Relation::Table(t) => t.name(),
            Relation::View(v) => v.name(),
        }
    }

    pub fn meta(&self) -> &Arc<TableMeta> {
        match self {
            Relation::Table(t) => t.meta(),
            Relation::View(v) => v.meta(),
        }
    }

    pub fn is_view(&self) -> bool {
        matches!(self, Relation::View(_))
    }

    pub fn make_record(&self, values: &[Value<'_>]) -> Result<Record> {
        match self {
            Relation::Table(t) => t.make_record(values),
            Relation::View(v) => v.make_record(values),
        }
    }

    pub fn insert_record(&self, record: &mut Record) -> Result<()> {
        match self {
            Relation::Table(t) => t.insert_record(record),
            Relation::View(v) => v.insert_record(record),
        }
    }

    pub fn delete_record(&self, record: &Record) -> Result<()> {
        match self {
            Relation::Table(t) => t.delete_record(record.rid()),
            Relation::View(v) => v.delete_record(record),
        }
    }

    pub fn update_record(&self, old: &Record, new: &Record) -> Result<()> {
        match self {
            Relation::Table(t) => t.update_record(old, new),
            Relation::View(v) => v.update_record(old, new),
        }
    }
}

impl From<Arc<Table>> for Relation {
    fn from(table: Arc<Table>) -> Self {
        Relation::Table(table)
    }
}

impl From<Arc<View>> for Relation {
    fn from(view: Arc<View>) -> Self {
        Relation::View(view)
    }
}
