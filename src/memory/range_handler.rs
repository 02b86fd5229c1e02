//! Range handler of the in-memory fileset
use super::{gather, FilesetData, MemoryOctree, MemoryRootMesh};
use crate::dataset::DomainGeometry;
use crate::sfc;
use crate::traits::{OctreeContainer, SfcRangeHandler};
use crate::types::{FieldArray, Result, SfcRange};
use log::debug;
use std::collections::HashMap;
use std::rc::Rc;

/// Octree, root mesh and particles of one SFC range
pub struct MemoryRangeHandler {
    data: Rc<FilesetData>,
    geometry: DomainGeometry,
    range: SfcRange,
    octree: MemoryOctree,
    root_mesh: MemoryRootMesh,
    /// Indices of the particles of each species lying in the range
    particles: Vec<Vec<usize>>,
}

impl MemoryRangeHandler {
    pub(crate) fn new(data: Rc<FilesetData>, geometry: DomainGeometry, range: SfcRange) -> Self {
        let root_mesh = MemoryRootMesh::new(
            geometry.left_edge,
            geometry.root_dx(),
            data.num_grid,
            data.nbits,
        );
        Self {
            data,
            geometry,
            range,
            octree: MemoryOctree::default(),
            root_mesh,
            particles: vec![],
        }
    }
}

impl SfcRangeHandler for MemoryRangeHandler {
    type Octree = MemoryOctree;
    type RootMesh = MemoryRootMesh;

    fn range(&self) -> SfcRange {
        self.range
    }

    fn construct_mesh(&mut self) -> Result<()> {
        let dx = self.geometry.root_dx();
        let mut octree = MemoryOctree::default();
        let mut root_mesh = MemoryRootMesh::new(
            self.geometry.left_edge,
            dx,
            self.data.num_grid,
            self.data.nbits,
        );
        for sfc_index in self.range.start..=self.range.end {
            let cell = &self.data.root_cells[sfc_index as usize];
            let coords = sfc::decode(sfc_index, self.data.nbits);
            let left = [0, 1, 2].map(|i| self.geometry.left_edge[i] + coords[i] as f64 * dx);
            root_mesh.push(sfc_index, left, cell.values.clone(), cell.children.is_some());
            octree.push_root(cell, left.map(|l| l + 0.5 * dx), dx);
        }

        let mut particles = Vec::with_capacity(self.data.species.len());
        for species in &self.data.species {
            let in_range = species
                .positions()?
                .iter()
                .enumerate()
                .filter(|(_, pos)| {
                    root_mesh
                        .sfc_of_point(**pos)
                        .map_or(false, |s| self.range.contains(s))
                })
                .map(|(i, _)| i)
                .collect();
            particles.push(in_range);
        }

        debug!(
            "Constructed mesh for {}: {} root cells, {} octs",
            self.range,
            root_mesh.len(),
            octree.total_octs()
        );
        self.octree = octree;
        self.root_mesh = root_mesh;
        self.particles = particles;
        Ok(())
    }

    fn total_octs(&self) -> usize {
        self.octree.total_octs()
    }

    fn octree(&self) -> &MemoryOctree {
        &self.octree
    }

    fn root_mesh(&self) -> &MemoryRootMesh {
        &self.root_mesh
    }

    fn fill_particles(
        &self,
        requests: &[(usize, String)],
    ) -> Result<HashMap<(usize, String), FieldArray>> {
        let mut tr = HashMap::new();
        for (species, label) in requests {
            let (Some(data), Some(indices)) =
                (self.data.species.get(*species), self.particles.get(*species))
            else {
                continue;
            };
            if let Some(array) = data.variables.get(label) {
                tr.insert((*species, label.clone()), gather(array, indices));
            }
        }
        Ok(tr)
    }
}
