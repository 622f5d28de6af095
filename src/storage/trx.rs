//! Transaction seam used by the DML operators and the scans.

use super::Relation;
use crate::records::Record;
use eyre::Result;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadWriteMode {
    ReadOnly,
    ReadWrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    /// Not visible to this transaction; scans skip the row.
    Invisible,
}

pub trait Trx: Send + Sync {
    fn insert_record(&self, relation: &Relation, record: &mut Record) -> Result<()>;

    fn delete_record(&self, relation: &Relation, record: &Record) -> Result<()>;

    fn update_record(&self, relation: &Relation, old: &Record, new: &Record) -> Result<()>;

    fn visit_record(
        &self,
        relation: &Relation,
        record: &Record,
        mode: ReadWriteMode,
    ) -> Result<Visibility>;
}

pub type TrxRef = Arc<dyn Trx>;

/// Applies every write directly to the relation and sees every row.
#[derive(Debug, Default, Clone, Copy)]
pub struct VacuousTrx;

impl VacuousTrx {
    pub fn shared() -> TrxRef {
        Arc::new(VacuousTrx)
    }
}

impl Trx for VacuousTrx {
    fn insert_record(&self, relation: &Relation, record: &mut Record) -> Result<()> {
        relation.insert_record(record)
    }

    fn delete_record(&self, relation: &Relation, record: &Record) -> Result<()> {
        relation.delete_record(record)
    }

    fn update_record(&self, relation: &Relation, old: &Record, new: &Record) -> Result<()> {
        relation.update_record(old, new)
    }

    fn visit_record(
        &self,
        _relation: &Relation,
        _record: &Record,
        _mode: ReadWriteMode,
    ) -> Result<Visibility> {
        Ok(Visibility::Visible)
    }
}
