//! # Base Tables
//!
//! A `Table` couples a `TableMeta`, the record heap and the vector indexes
//! built on its fields. Every write goes through the table so index
//! maintenance cannot be skipped:
//!
//! ```text
//! insert_record ──> heap.insert_record ──> index.insert_entry (each index)
//! update_record ──> heap.update_record ──> index.delete_entry + insert_entry
//! delete_record ──> index.delete_entry (each index) ──> heap.delete_record
//! ```

use super::RecordFileHandler;
use crate::config::IvfflatOptions;
use crate::error::ExecError;
use crate::ivfflat::{DistanceFunction, IndexHandle, IvfflatIndex};
use crate::records::{make_record, FieldDef, IndexMeta, Record, Rid, TableMeta};
use crate::types::{DataType, Value};
use eyre::{bail, Result, WrapErr};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct Table {
    meta: Arc<TableMeta>,
    heap: RecordFileHandler,
    indexes: RwLock<Vec<IndexHandle>>,
}

impl Table {
    pub fn new(meta: TableMeta) -> Self {
        let heap = RecordFileHandler::new(meta.record_size());
        Self {
            meta: Arc::new(meta),
            heap,
            indexes: RwLock::new(Vec::new()),
        }
    }

    pub fn create(name: &str, fields: Vec<FieldDef>) -> Result<Arc<Table>> {
        let meta = TableMeta::new(name, fields)?;
        debug!(table = name, record_size = meta.record_size(), "created table");
        Ok(Arc::new(Self::new(meta)))
    }

    pub fn name(&self) -> &str {
        self.meta.name()
    }

    pub fn meta(&self) -> &Arc<TableMeta> {
        &self.meta
    }

    pub fn record_handler(&self) -> &RecordFileHandler {
        &self.heap
    }

    pub fn make_record(&self, values: &[Value<'_>]) -> Result<Record> {
        make_record(&self.meta, values)
    }

    pub fn get_record(&self, rid: Rid) -> Result<Record> {
        self.heap.get_record(rid)
    }

    pub fn insert_record(&self, record: &mut Record) -> Result<()> {
        let rid = self.heap.insert_record(record.data())?;
        record.set_rid(rid);

        let indexes = self.indexes.read().clone();
        for (done, index) in indexes.iter().enumerate() {
            if let Err(err) = index.write().insert_entry(record.data(), rid) {
                for inserted in &indexes[..done] {
                    if let Err(undo) = inserted.write().delete_entry(record.data(), rid) {
                        warn!(table = self.name(), %rid, error = %undo, "failed to undo index entry");
                    }
                }
                if let Err(undo) = self.heap.delete_record(rid) {
                    warn!(table = self.name(), %rid, error = %undo, "failed to undo heap insert");
                }
                return Err(err).wrap_err_with(|| format!("maintaining indexes of '{}'", self.name()));
            }
        }
        Ok(())
    }

    pub fn delete_record(&self, rid: Rid) -> Result<()> {
        let record = self.heap.get_record(rid)?;
        for index in self.indexes.read().iter() {
            index.write().delete_entry(record.data(), rid)?;
        }
        self.heap.delete_record(rid)
    }

    pub fn update_record(&self, old: &Record, new: &Record) -> Result<()> {
        let rid = old.rid();
        self.heap.update_record(rid, new.data())?;
        for index in self.indexes.read().iter() {
            let mut index = index.write();
            index.delete_entry(old.data(), rid)?;
            index.insert_entry(new.data(), rid)?;
        }
        Ok(())
    }

    /// Visible RIDs in physical order, snapshotted at call time.
    pub fn scan_rids(&self) -> Vec<Rid> {
        self.heap.rids()
    }

    pub fn row_count(&self) -> usize {
        self.heap.len()
    }

    /// Builds an IVFFLAT index over `field_name` from the rows present now.
    pub fn create_ivfflat_index(
        &self,
        index_name: &str,
        field_name: &str,
        distance_fn: DistanceFunction,
        options: IvfflatOptions,
    ) -> Result<IndexHandle> {
        let field = self.meta.field(field_name).ok_or_else(|| {
            ExecError::SchemaFieldMissing(format!("{}.{}", self.name(), field_name))
        })?;
        if field.data_type != DataType::Vectors {
            bail!(ExecError::InvalidArgument(format!(
                "vector index needs a VECTOR field, '{}' is {}",
                field.name, field.data_type
            )));
        }
        if self
            .indexes
            .read()
            .iter()
            .any(|i| i.read().meta().name.eq_ignore_ascii_case(index_name))
        {
            bail!(ExecError::InvalidArgument(format!(
                "index '{}' already exists",
                index_name
            )));
        }

        let mut data = Vec::with_capacity(self.heap.len());
        for rid in self.heap.rids() {
            let record = self.heap.get_record(rid)?;
            if let Value::Vector(v) = record.get_field(field)? {
                data.push((v.into_owned(), rid));
            }
        }

        let mut index = IvfflatIndex::create(index_name, field)?;
        index.build_index(&data, distance_fn, options)?;
        info!(
            table = self.name(),
            index = index_name,
            points = data.len(),
            lists = options.lists,
            probes = options.probes,
            "built ivfflat index"
        );

        let handle: IndexHandle = Arc::new(RwLock::new(index));
        self.indexes.write().push(handle.clone());
        Ok(handle)
    }

    pub fn find_vector_index(
        &self,
        distance_fn: DistanceFunction,
        field_name: &str,
    ) -> Option<IndexHandle> {
        self.indexes
            .read()
            .iter()
            .find(|index| {
                let index = index.read();
                index.distance_fn() == distance_fn
                    && index.field().name.eq_ignore_ascii_case(field_name)
            })
            .cloned()
    }

    pub fn index_metas(&self) -> Vec<IndexMeta> {
        self.indexes.read().iter().map(|i| i.read().meta().clone()).collect()
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.name())
            .field("fields", &self.meta.field_num())
            .field("rows", &self.heap.len())
            .finish()
    }
}
