//! An in-memory fileset
//!
//! Holds a complete octree AMR snapshot in memory and serves it through the [`Fileset`] query
//! surface. Range handlers copy the cells of their range into flat oct and root cell lists
//! when their mesh is constructed, the way a disk-backed reader would load them.

mod builder;
mod octree;
mod range_handler;
mod root_mesh;

pub use builder::MemoryFilesetBuilder;
pub use octree::MemoryOctree;
pub use range_handler::MemoryRangeHandler;
pub use root_mesh::MemoryRootMesh;

use crate::dataset::DomainGeometry;
use crate::sfc;
use crate::traits::{Fileset, Selector};
use crate::types::{Error, FieldArray, ParameterTable, Result, SfcRange};
use std::collections::BTreeMap;
use std::rc::Rc;

/// A mesh cell and, if refined, its eight children
///
/// Child `c` lies at offset `(c & 1, (c >> 1) & 1, (c >> 2) & 1)` within its parent.
#[derive(Clone, Debug)]
pub struct CellData {
    /// One value per grid variable
    pub values: Vec<f64>,
    /// Children of a refined cell
    pub children: Option<Box<[CellData; 8]>>,
}

impl CellData {
    /// An unrefined cell
    pub fn leaf(values: Vec<f64>) -> Self {
        Self {
            values,
            children: None,
        }
    }

    /// Depth of the subtree below the cell
    pub fn depth(&self) -> u32 {
        match &self.children {
            Some(children) => 1 + children.iter().map(|c| c.depth()).max().unwrap_or(0),
            None => 0,
        }
    }
}

/// Particles of one species
#[derive(Clone, Debug)]
pub struct SpeciesData {
    /// On-disk species label
    pub label: String,
    /// Arrays by on-disk variable label, all of the same length
    pub variables: BTreeMap<String, FieldArray>,
}

impl SpeciesData {
    /// Number of particles
    pub fn len(&self) -> usize {
        self.variables.values().next().map_or(0, |v| v.len())
    }

    /// Check if the species has no particles
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn positions(&self) -> Result<Vec<[f64; 3]>> {
        let axes = ["POSITION_X", "POSITION_Y", "POSITION_Z"]
            .iter()
            .map(|label| {
                self.variables
                    .get(*label)
                    .map(|v| v.to_f64())
                    .ok_or_else(|| Error::RangeHandler(format!("{} has no {}", self.label, label)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok((0..self.len())
            .map(|i| [axes[0][i], axes[1][i], axes[2][i]])
            .collect())
    }
}

/// Snapshot shared by a fileset and its range handlers
#[derive(Debug)]
pub(crate) struct FilesetData {
    pub(crate) num_grid: usize,
    pub(crate) nbits: u32,
    /// Root cells indexed by SFC index
    pub(crate) root_cells: Vec<CellData>,
    pub(crate) species: Vec<SpeciesData>,
}

impl FilesetData {
    pub(crate) fn num_root_cells(&self) -> i64 {
        self.root_cells.len() as i64
    }
}

/// Copy the elements at `indices`
pub(crate) fn gather(array: &FieldArray, indices: &[usize]) -> FieldArray {
    match array {
        FieldArray::F64(v) => FieldArray::F64(indices.iter().map(|i| v[*i]).collect()),
        FieldArray::F32(v) => FieldArray::F32(indices.iter().map(|i| v[*i]).collect()),
        FieldArray::I64(v) => FieldArray::I64(indices.iter().map(|i| v[*i]).collect()),
        FieldArray::I32(v) => FieldArray::I32(indices.iter().map(|i| v[*i]).collect()),
    }
}

/// An in-memory fileset
pub struct MemoryFileset {
    data: Rc<FilesetData>,
    parameters: ParameterTable,
}

impl MemoryFileset {
    pub(crate) fn new(data: FilesetData, parameters: ParameterTable) -> Self {
        Self {
            data: Rc::new(data),
            parameters,
        }
    }

    /// Number of root cells
    pub fn num_root_cells(&self) -> i64 {
        self.data.num_root_cells()
    }
}

impl Fileset for MemoryFileset {
    type RangeHandler = MemoryRangeHandler;

    fn num_grid(&self) -> usize {
        self.data.num_grid
    }

    fn parameters(&self) -> &ParameterTable {
        &self.parameters
    }

    fn has_particles(&self) -> bool {
        !self.data.species.is_empty()
    }

    fn root_sfc_ranges_all(&self, max_range_size: i64) -> Result<Vec<SfcRange>> {
        Ok(sfc::whole_domain(self.num_root_cells(), max_range_size))
    }

    fn root_sfc_ranges(
        &self,
        selector: &dyn Selector,
        max_range_size: i64,
    ) -> Result<Vec<SfcRange>> {
        let geometry = DomainGeometry::cubic(self.data.num_grid);
        let dx = geometry.root_dx();
        let selected = (0..self.num_root_cells()).filter(|index| {
            let coords = sfc::decode(*index, self.data.nbits);
            let left = [0, 1, 2].map(|i| geometry.left_edge[i] + coords[i] as f64 * dx);
            let right = left.map(|l| l + dx);
            selector.select_bbox(left, right)
        });
        Ok(sfc::split(&sfc::coalesce(selected), max_range_size))
    }

    fn range_handler(
        &self,
        geometry: &DomainGeometry,
        range: SfcRange,
    ) -> Result<MemoryRangeHandler> {
        if range.start < 0 || range.end >= self.num_root_cells() || range.start > range.end {
            return Err(Error::RangeHandler(format!(
                "SFC range {} outside of [0, {})",
                range,
                self.num_root_cells()
            )));
        }
        Ok(MemoryRangeHandler::new(
            self.data.clone(),
            geometry.clone(),
            range,
        ))
    }
}
