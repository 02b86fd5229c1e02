//! Chunk subsets and data chunks
//!
//! A [`ChunkSubset`] binds one SFC range to one mesh representation: the octree of refined
//! cells or the root mesh. A [`DataChunk`] groups subsets for iteration.

mod octree;
mod particles;
mod root_mesh;

pub use octree::OctreeSubset;
pub use particles::ParticleData;
pub use root_mesh::RootMeshSubset;

use crate::dataset::Dataset;
use crate::traits::{Fileset, Selector};
use crate::types::{FieldId, Result, SfcRange};
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

/// State shared by both subset variants
pub(crate) struct SubsetBase<'a, F: Fileset> {
    dataset: &'a Dataset<F>,
    base_selector: Rc<dyn Selector>,
    range: SfcRange,
    handler: Rc<F::RangeHandler>,
    data_size: Cell<Option<usize>>,
}

impl<'a, F: Fileset> SubsetBase<'a, F> {
    pub(crate) fn new(
        dataset: &'a Dataset<F>,
        base_selector: Rc<dyn Selector>,
        range: SfcRange,
        handler: Rc<F::RangeHandler>,
    ) -> Self {
        Self {
            dataset,
            base_selector,
            range,
            handler,
            data_size: Cell::new(None),
        }
    }
}

/// A contiguous SFC range bound to one mesh representation
pub enum ChunkSubset<'a, F: Fileset> {
    /// Refined cells of the range
    Octree(OctreeSubset<'a, F>),
    /// Root cells of the range
    RootMesh(RootMeshSubset<'a, F>),
}

impl<'a, F: Fileset> ChunkSubset<'a, F> {
    fn base(&self) -> &SubsetBase<'a, F> {
        match self {
            ChunkSubset::Octree(s) => &s.base,
            ChunkSubset::RootMesh(s) => &s.base,
        }
    }

    /// The SFC range covered
    pub fn sfc_range(&self) -> SfcRange {
        self.base().range
    }

    /// The selection this subset was built for
    pub fn base_selector(&self) -> &Rc<dyn Selector> {
        &self.base().base_selector
    }

    /// The range handler owning the mesh structures
    pub fn range_handler(&self) -> &Rc<F::RangeHandler> {
        &self.base().handler
    }

    /// The dataset
    pub fn dataset(&self) -> &'a Dataset<F> {
        self.base().dataset
    }

    /// Number of cells selected by the last fill, `None` before any fill
    pub fn data_size(&self) -> Option<usize> {
        self.base().data_size.get()
    }

    /// Zones per axis of each region: 1 for the root mesh, 2 for the octree
    pub fn num_zones(&self) -> usize {
        match self {
            ChunkSubset::Octree(_) => 2,
            ChunkSubset::RootMesh(_) => 1,
        }
    }

    /// Fill fluid fields for the selected cells
    pub fn fill(
        &self,
        fields: &[FieldId],
        selector: &dyn Selector,
    ) -> Result<HashMap<FieldId, Vec<f64>>> {
        match self {
            ChunkSubset::Octree(s) => s.fill(fields, selector),
            ChunkSubset::RootMesh(s) => s.fill(fields, selector),
        }
    }

    /// Fill particle fields given as (particle type, field name) pairs
    pub fn fill_particles(&self, fields: &[(&str, &str)]) -> Result<ParticleData> {
        let base = self.base();
        particles::fill_particles(base.dataset, base.handler.as_ref(), fields)
    }

    /// Centres of the selected cells, in fill order
    pub fn fcoords(&self, selector: &dyn Selector) -> Vec<[f64; 3]> {
        match self {
            ChunkSubset::Octree(s) => s.fcoords(selector),
            ChunkSubset::RootMesh(s) => s.fcoords(selector),
        }
    }

    /// The root mesh subset, the only variant supporting deposition
    pub fn as_root_mesh(&self) -> Option<&RootMeshSubset<'a, F>> {
        match self {
            ChunkSubset::RootMesh(s) => Some(s),
            ChunkSubset::Octree(_) => None,
        }
    }
}

/// How a data chunk groups subsets
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkKind {
    /// Every subset of a request
    All,
    /// One subset, for spatial operations
    Spatial,
    /// One subset, for disk reads
    Io,
}

/// An ordered group of subsets yielded by chunk iteration
pub struct DataChunk<'a, F: Fileset> {
    /// Grouping
    pub kind: ChunkKind,
    /// Subsets of the chunk
    pub objs: Vec<Rc<ChunkSubset<'a, F>>>,
    /// Whether fields read for the chunk may be cached
    pub cache: bool,
}

impl<'a, F: Fileset> Clone for DataChunk<'a, F> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            objs: self.objs.clone(),
            cache: self.cache,
        }
    }
}

impl<'a, F: Fileset> DataChunk<'a, F> {
    /// Create a chunk
    pub fn new(kind: ChunkKind, objs: Vec<Rc<ChunkSubset<'a, F>>>, cache: bool) -> Self {
        Self { kind, objs, cache }
    }

    /// Total number of cells selected by the subsets, once every subset has been filled
    pub fn data_size(&self) -> Option<usize> {
        self.objs.iter().map(|o| o.data_size()).sum()
    }
}
