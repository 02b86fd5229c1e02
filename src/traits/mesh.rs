//! Per-range mesh structures

use super::{DepositOperator, Selector};
use crate::types::{FieldArray, Result, SfcRange};
use std::collections::HashMap;

/// Location of every selected octree cell, in selection traversal order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OctCellIndices {
    /// Refinement level of each cell
    pub levels: Vec<u32>,
    /// Index of each cell within its oct (0 to 7)
    pub cell_inds: Vec<u8>,
    /// Index of the oct holding each cell within the range's file ordering
    pub file_inds: Vec<usize>,
}

impl OctCellIndices {
    /// Number of cells
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Check if there are no cells
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Refined cells (levels >= 1) of one SFC range
pub trait OctreeContainer {
    /// Number of octs
    fn total_octs(&self) -> usize;

    /// Number of selected unrefined cells
    fn count_cells(&self, selector: &dyn Selector) -> usize;

    /// Level, cell index and file index of each selected unrefined cell
    fn file_index_octs(
        &self,
        selector: &dyn Selector,
        cell_count: usize,
    ) -> Result<OctCellIndices>;

    /// Number of selected cells per file domain
    fn domain_count(&self, selector: &dyn Selector) -> Vec<usize>;

    /// Fill one output array per variable index in a single pass over the cells
    fn fill_sfc(
        &self,
        indices: &OctCellIndices,
        domain_counts: &[usize],
        field_indices: &[usize],
        out: &mut [Vec<f64>],
    ) -> Result<()>;

    /// Centres of the selected unrefined cells, in fill order
    fn fcoords(&self, selector: &dyn Selector) -> Vec<[f64; 3]>;
}

/// Root cells of one SFC range
pub trait RootMeshContainer {
    /// Number of selected unrefined root cells
    fn count_cells(&self, selector: &dyn Selector) -> usize;

    /// One array per variable index with a value per selected unrefined root cell
    fn fill_sfc(&self, selector: &dyn Selector, field_indices: &[usize]) -> Result<Vec<Vec<f64>>>;

    /// Centres of the selected unrefined root cells, in fill order
    fn fcoords(&self, selector: &dyn Selector) -> Vec<[f64; 3]>;

    /// Deposit particles into the selected root cells
    ///
    /// The region index passed to the operator is the ordinal of the root cell among the
    /// selected root cells of the range.
    fn deposit(
        &self,
        op: &mut dyn DepositOperator,
        selector: &dyn Selector,
        positions: &[[f64; 3]],
        fields: &[Vec<f64>],
    ) -> Result<()>;
}

/// Owner of the octree and root mesh of one SFC range
pub trait SfcRangeHandler {
    /// Octree type
    type Octree: OctreeContainer;
    /// Root mesh type
    type RootMesh: RootMeshContainer;

    /// The range handled
    fn range(&self) -> SfcRange;

    /// Read the cells of the range and build both meshes
    fn construct_mesh(&mut self) -> Result<()>;

    /// Number of octs below the root level
    fn total_octs(&self) -> usize;

    /// The octree
    fn octree(&self) -> &Self::Octree;

    /// The root mesh
    fn root_mesh(&self) -> &Self::RootMesh;

    /// Read the particles of the range for each (species index, on-disk variable) pair
    ///
    /// Pairs whose species does not carry the variable are absent from the result.
    fn fill_particles(
        &self,
        requests: &[(usize, String)],
    ) -> Result<HashMap<(usize, String), FieldArray>>;
}
