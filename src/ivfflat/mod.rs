//! # IVFFLAT Vector Index
//!
//! An inverted-file index over one VECTOR field: the vectors are clustered
//! into `lists` buckets around k-means centroids, and a query scans only the
//! buckets of its `probes` nearest centroids.
//!
//! ## Structure
//!
//! ```text
//! centroids:  [c0]            [c1]            [c2]
//!              │               │               │
//! buckets:  (v,rid)(v,rid)  (v,rid)         (v,rid)(v,rid)(v,rid)
//! ```
//!
//! ## Lifecycle
//!
//! 1. `IvfflatIndex::create` binds the index to a field.
//! 2. `build_index` trains centroids on the rows present at `CREATE INDEX`
//!    time and buckets every point under its nearest centroid.
//! 3. `insert_entry` appends a new point to its nearest centroid's bucket.
//!    Centroids are never recomputed afterwards, so clusters drift as data
//!    grows. While fewer than `lists` centroids exist (an index built on a
//!    small or empty table), each new point becomes a centroid of its own.
//! 4. `delete_entry` drops the entry with the given RID.
//! 5. `ann_search` probes and ranks, see [`search`].
//!
//! ## Approximation
//!
//! Points in buckets that are not probed are never considered. With
//! `probes == lists` every bucket is probed and the result is exact.
//!
//! ## Distance Functions
//!
//! | Variant | SQL name | Catalog tag |
//! |---------|----------|-------------|
//! | `L2` | `L2_DISTANCE` | `l2_distance` |
//! | `Cosine` | `COSINE_DISTANCE` | `cosine_distance` |
//! | `InnerProduct` | `INNER_PRODUCT` | `inner_product` |

pub mod distance;
pub mod kmeans;
pub mod search;

use crate::config::{IvfflatOptions, NULL_FLAG};
use crate::error::ExecError;
use crate::records::{decode_vector, FieldMeta, IndexMeta, IndexType, Rid};
use crate::types::DataType;
use distance::{rank_distance, select_distance_fn, DistanceFn};
use eyre::{bail, Result};
use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::SeedableRng;
use search::{probe_order, Candidate, TopK};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum DistanceFunction {
    #[default]
    #[serde(rename = "l2_distance")]
    L2 = 0,
    #[serde(rename = "cosine_distance")]
    Cosine = 1,
    #[serde(rename = "inner_product")]
    InnerProduct = 2,
}

impl DistanceFunction {
    pub fn name(&self) -> &'static str {
        match self {
            DistanceFunction::L2 => "l2_distance",
            DistanceFunction::Cosine => "cosine_distance",
            DistanceFunction::InnerProduct => "inner_product",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "l2_distance" => Ok(DistanceFunction::L2),
            "cosine_distance" => Ok(DistanceFunction::Cosine),
            "inner_product" => Ok(DistanceFunction::InnerProduct),
            other => bail!(ExecError::Unsupported(format!(
                "unknown distance function '{}'",
                other
            ))),
        }
    }

    pub fn kernel(&self) -> DistanceFn {
        select_distance_fn(*self)
    }

    pub fn compute(&self, a: &[f32], b: &[f32]) -> f32 {
        (self.kernel())(a, b)
    }
}

impl fmt::Display for DistanceFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub type IndexHandle = Arc<RwLock<IvfflatIndex>>;

type Entry = (Vec<f32>, Rid);

pub struct IvfflatIndex {
    meta: IndexMeta,
    field: FieldMeta,
    distance_fn: DistanceFunction,
    lists: usize,
    probes: usize,
    centroids: Vec<Vec<f32>>,
    buckets: Vec<Vec<Entry>>,
}

impl IvfflatIndex {
    pub fn create(name: &str, field: &FieldMeta) -> Result<Self> {
        if field.data_type != DataType::Vectors {
            bail!(ExecError::InvalidArgument(format!(
                "ivfflat index '{}' needs a VECTOR field, '{}' is {}",
                name, field.name, field.data_type
            )));
        }
        let options = IvfflatOptions::default();
        let meta = IndexMeta {
            name: name.to_string(),
            index_type: IndexType::Ivfflat,
            fields: vec![field.name.clone()],
            fields_total_len: field.payload_len(),
            unique: false,
            distance_fn: None,
            lists: options.lists,
            probes: options.probes,
        };
        Ok(Self {
            meta,
            field: field.clone(),
            distance_fn: DistanceFunction::default(),
            lists: options.lists,
            probes: options.probes,
            centroids: Vec::new(),
            buckets: Vec::new(),
        })
    }

    pub fn meta(&self) -> &IndexMeta {
        &self.meta
    }

    pub fn field(&self) -> &FieldMeta {
        &self.field
    }

    pub fn distance_fn(&self) -> DistanceFunction {
        self.distance_fn
    }

    /// Configured cluster count. Build trains at most one centroid per
    /// point, so `centroids().len()` can be smaller until inserts seed the
    /// missing lists.
    pub fn lists(&self) -> usize {
        self.lists
    }

    pub fn probes(&self) -> usize {
        self.probes
    }

    pub fn centroids(&self) -> &[Vec<f32>] {
        &self.centroids
    }

    pub fn dim(&self) -> usize {
        self.field.vector_dim()
    }

    /// Number of indexed entries across all buckets.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_dim(&self, v: &[f32]) -> Result<()> {
        if v.len() != self.dim() {
            bail!(ExecError::VectorDimMismatch {
                left: v.len(),
                right: self.dim()
            });
        }
        Ok(())
    }

    pub fn build_index(
        &mut self,
        data: &[(Vec<f32>, Rid)],
        distance_fn: DistanceFunction,
        options: IvfflatOptions,
    ) -> Result<()> {
        options.validate()?;
        for (v, _) in data {
            self.check_dim(v)?;
        }

        self.distance_fn = distance_fn;
        self.lists = options.lists;
        self.probes = options.probes;
        self.meta.distance_fn = Some(distance_fn);
        self.meta.lists = options.lists;
        self.meta.probes = options.probes;
        self.centroids.clear();
        self.buckets.clear();

        if data.is_empty() {
            debug!(index = %self.meta.name, "built ivfflat index on empty input");
            return Ok(());
        }

        let mut rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let points: Vec<&[f32]> = data.iter().map(|(v, _)| v.as_slice()).collect();
        let kernel = distance_fn.kernel();
        self.centroids = kmeans::train(&points, self.lists, kernel, &mut rng);

        self.buckets = vec![Vec::new(); self.centroids.len()];
        for (v, rid) in data {
            let i = kmeans::nearest_centroid(v, &self.centroids, kernel);
            self.buckets[i].push((v.clone(), *rid));
        }

        debug!(
            index = %self.meta.name,
            distance = %distance_fn,
            centroids = self.centroids.len(),
            points = data.len(),
            "trained ivfflat centroids"
        );
        Ok(())
    }

    fn vector_of(&self, record: &[u8]) -> Result<Option<Vec<f32>>> {
        let field = &self.field;
        let Some(bytes) = record.get(field.offset..field.offset + field.len) else {
            bail!(ExecError::Internal(format!(
                "record of {} bytes has no field '{}' at {}",
                record.len(),
                field.name,
                field.offset
            )));
        };
        if field.nullable && bytes.last() == Some(&NULL_FLAG) {
            return Ok(None);
        }
        decode_vector(&bytes[..field.payload_len()]).map(Some)
    }

    pub fn insert_entry(&mut self, record: &[u8], rid: Rid) -> Result<()> {
        let Some(v) = self.vector_of(record)? else {
            trace!(index = %self.meta.name, %rid, "skipping NULL vector");
            return Ok(());
        };

        if self.centroids.len() < self.lists {
            self.centroids.push(v.clone());
            self.buckets.push(vec![(v, rid)]);
            return Ok(());
        }

        let i = kmeans::nearest_centroid(&v, &self.centroids, self.distance_fn.kernel());
        self.buckets[i].push((v, rid));
        Ok(())
    }

    pub fn delete_entry(&mut self, record: &[u8], rid: Rid) -> Result<()> {
        if self.vector_of(record)?.is_none() {
            return Ok(());
        }
        for bucket in &mut self.buckets {
            if let Some(pos) = bucket.iter().position(|(_, r)| *r == rid) {
                bucket.swap_remove(pos);
                return Ok(());
            }
        }
        trace!(index = %self.meta.name, %rid, "no entry to delete");
        Ok(())
    }

    /// RIDs of up to `limit` approximate nearest neighbours, nearest first.
    pub fn ann_search(&self, query: &[f32], limit: usize) -> Result<Vec<Rid>> {
        self.check_dim(query)?;
        let kernel = self.distance_fn.kernel();

        let mut top = TopK::new(limit);
        for i in probe_order(query, &self.centroids, self.probes, kernel) {
            for (v, rid) in &self.buckets[i] {
                top.push(Candidate::new(*rid, rank_distance(self.distance_fn, query, v)));
            }
        }
        trace!(index = %self.meta.name, limit, found = top.len(), "ann search");
        Ok(top.into_sorted().into_iter().map(|c| c.rid).collect())
    }
}

impl fmt::Debug for IvfflatIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IvfflatIndex")
            .field("name", &self.meta.name)
            .field("field", &self.field.name)
            .field("distance_fn", &self.distance_fn)
            .field("lists", &self.lists)
            .field("probes", &self.probes)
            .field("entries", &self.len())
            .finish()
    }
}
