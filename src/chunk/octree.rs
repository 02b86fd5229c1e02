//! Subset over the refined cells of an SFC range
use super::SubsetBase;
use crate::traits::{Fileset, OctreeContainer, Selector, SfcRangeHandler};
use crate::types::{FieldId, Result};
use itertools::izip;
use std::collections::HashMap;

/// The octree of one SFC range
pub struct OctreeSubset<'a, F: Fileset> {
    pub(crate) base: SubsetBase<'a, F>,
}

impl<'a, F: Fileset> OctreeSubset<'a, F> {
    pub(crate) fn new(base: SubsetBase<'a, F>) -> Self {
        Self { base }
    }

    /// Fill fluid fields, one value per selected cell in selection traversal order
    ///
    /// All arrays share the selected cell count, which is recorded as the subset's data size.
    pub fn fill(
        &self,
        fields: &[FieldId],
        selector: &dyn Selector,
    ) -> Result<HashMap<FieldId, Vec<f64>>> {
        if fields.is_empty() {
            return Ok(HashMap::new());
        }
        let field_indices = fields
            .iter()
            .map(|f| self.base.dataset.grid_variable_index(&f.name))
            .collect::<Result<Vec<_>>>()?;

        let octree = self.base.handler.octree();
        let cell_count = octree.count_cells(selector);
        self.base.data_size.set(Some(cell_count));

        let indices = octree.file_index_octs(selector, cell_count)?;
        let domain_counts = octree.domain_count(selector);
        let mut tr = vec![vec![0.0; cell_count]; fields.len()];
        octree.fill_sfc(&indices, &domain_counts, &field_indices, &mut tr)?;

        Ok(izip!(fields.iter().cloned(), tr).collect())
    }

    /// Centres of the selected cells
    pub fn fcoords(&self, selector: &dyn Selector) -> Vec<[f64; 3]> {
        self.base.handler.octree().fcoords(selector)
    }
}
