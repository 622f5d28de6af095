//! # Record Heap
//!
//! `RecordFileHandler` stores fixed-size records in pages of
//! `HEAP_SLOTS_PER_PAGE` slots. Slots freed by deletes are not reused, so a RID
//! stays unique for the lifetime of the heap.
//!
//! ```text
//! page 0: [slot 0][slot 1] ... [slot 63]
//! page 1: [slot 0][  --  ] ...            <- `--` = deleted
//! ```
//!
//! All methods take `&self`; the page list sits behind a `parking_lot::RwLock`.

use crate::config::HEAP_SLOTS_PER_PAGE;
use crate::error::ExecError;
use crate::records::{Record, Rid};
use eyre::{bail, Result};
use parking_lot::RwLock;

type Page = Vec<Option<Vec<u8>>>;

#[derive(Debug)]
pub struct RecordFileHandler {
    record_size: usize,
    pages: RwLock<Vec<Page>>,
}

impl RecordFileHandler {
    pub fn new(record_size: usize) -> Self {
        Self {
            record_size,
            pages: RwLock::new(Vec::new()),
        }
    }

    pub fn record_size(&self) -> usize {
        self.record_size
    }

    fn check_size(&self, data: &[u8]) -> Result<()> {
        if data.len() != self.record_size {
            bail!(ExecError::Internal(format!(
                "record of {} bytes does not match heap record size {}",
                data.len(),
                self.record_size
            )));
        }
        Ok(())
    }

    pub fn insert_record(&self, data: &[u8]) -> Result<Rid> {
        self.check_size(data)?;
        let mut pages = self.pages.write();
        if pages.last().map_or(true, |p| p.len() >= HEAP_SLOTS_PER_PAGE) {
            pages.push(Vec::with_capacity(HEAP_SLOTS_PER_PAGE));
        }
        let page_num = pages.len() - 1;
        let page = &mut pages[page_num];
        page.push(Some(data.to_vec()));
        Ok(Rid::new(page_num as u32, (page.len() - 1) as u32))
    }

    pub fn get_record(&self, rid: Rid) -> Result<Record> {
        let pages = self.pages.read();
        match slot(&pages, rid) {
            Some(Some(data)) => Ok(Record::with_rid(rid, data.clone())),
            _ => bail!(ExecError::NotFound(format!("record {}", rid))),
        }
    }

    pub fn update_record(&self, rid: Rid, data: &[u8]) -> Result<()> {
        self.check_size(data)?;
        let mut pages = self.pages.write();
        match slot_mut(&mut pages, rid) {
            Some(Some(existing)) => {
                existing.copy_from_slice(data);
                Ok(())
            }
            _ => bail!(ExecError::NotFound(format!("record {}", rid))),
        }
    }

    pub fn delete_record(&self, rid: Rid) -> Result<()> {
        let mut pages = self.pages.write();
        match slot_mut(&mut pages, rid) {
            Some(entry) if entry.is_some() => {
                *entry = None;
                Ok(())
            }
            _ => bail!(ExecError::NotFound(format!("record {}", rid))),
        }
    }

    /// Snapshot of live RIDs in physical order.
    pub fn rids(&self) -> Vec<Rid> {
        let pages = self.pages.read();
        pages
            .iter()
            .enumerate()
            .flat_map(|(page_num, page)| {
                page.iter().enumerate().filter_map(move |(slot_num, entry)| {
                    entry
                        .as_ref()
                        .map(|_| Rid::new(page_num as u32, slot_num as u32))
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.pages
            .read()
            .iter()
            .map(|p| p.iter().filter(|e| e.is_some()).count())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn slot(pages: &[Page], rid: Rid) -> Option<&Option<Vec<u8>>> {
    pages
        .get(rid.page_num as usize)
        .and_then(|p| p.get(rid.slot_num as usize))
}

fn slot_mut(pages: &mut [Page], rid: Rid) -> Option<&mut Option<Vec<u8>>> {
    pages
        .get_mut(rid.page_num as usize)
        .and_then(|p| p.get_mut(rid.slot_num as usize))
}
