//! Root cells of one SFC range
use crate::sfc;
use crate::traits::{DepositOperator, RootMeshContainer, Selector};
use crate::types::{Error, Result, SfcIndex};
use std::collections::HashMap;

#[derive(Clone, Debug)]
struct RootCell {
    sfc: SfcIndex,
    left: [f64; 3],
    centre: [f64; 3],
    values: Vec<f64>,
    refined: bool,
}

/// Root cells of one SFC range in SFC order
#[derive(Clone, Debug, Default)]
pub struct MemoryRootMesh {
    cells: Vec<RootCell>,
    dx: f64,
    domain_left: [f64; 3],
    num_grid: usize,
    nbits: u32,
}

impl MemoryRootMesh {
    pub(crate) fn new(domain_left: [f64; 3], dx: f64, num_grid: usize, nbits: u32) -> Self {
        Self {
            cells: vec![],
            dx,
            domain_left,
            num_grid,
            nbits,
        }
    }

    pub(crate) fn push(&mut self, sfc: SfcIndex, left: [f64; 3], values: Vec<f64>, refined: bool) {
        let dx = self.dx;
        self.cells.push(RootCell {
            sfc,
            left,
            centre: left.map(|l| l + 0.5 * dx),
            values,
            refined,
        });
    }

    /// Number of root cells, refined or not
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if the mesh has no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn selected<'s>(&'s self, selector: &'s dyn Selector) -> impl Iterator<Item = &'s RootCell> {
        self.cells
            .iter()
            .filter(move |c| !c.refined && selector.select_cell(c.centre, self.dx, 0))
    }

    /// SFC index of the root cell containing a point, if it lies in the domain
    pub(crate) fn sfc_of_point(&self, pos: [f64; 3]) -> Option<SfcIndex> {
        let mut coords = [0u64; 3];
        for i in 0..3 {
            let c = ((pos[i] - self.domain_left[i]) / self.dx).floor();
            if !(0.0..self.num_grid as f64).contains(&c) {
                return None;
            }
            coords[i] = c as u64;
        }
        Some(sfc::encode(coords, self.nbits))
    }
}

impl RootMeshContainer for MemoryRootMesh {
    fn count_cells(&self, selector: &dyn Selector) -> usize {
        self.selected(selector).count()
    }

    fn fill_sfc(&self, selector: &dyn Selector, field_indices: &[usize]) -> Result<Vec<Vec<f64>>> {
        let mut tr = vec![Vec::new(); field_indices.len()];
        for cell in self.selected(selector) {
            for (out, &var) in tr.iter_mut().zip(field_indices) {
                out.push(
                    *cell
                        .values
                        .get(var)
                        .ok_or_else(|| Error::RangeHandler(format!("no grid variable {var}")))?,
                );
            }
        }
        Ok(tr)
    }

    fn fcoords(&self, selector: &dyn Selector) -> Vec<[f64; 3]> {
        self.selected(selector).map(|c| c.centre).collect()
    }

    fn deposit(
        &self,
        op: &mut dyn DepositOperator,
        selector: &dyn Selector,
        positions: &[[f64; 3]],
        fields: &[Vec<f64>],
    ) -> Result<()> {
        if fields.iter().any(|f| f.len() != positions.len()) {
            return Err(Error::ShapeMismatch(
                "deposit fields and positions differ in length".to_string(),
            ));
        }
        let regions: HashMap<SfcIndex, (usize, &RootCell)> = self
            .selected(selector)
            .enumerate()
            .map(|(region, cell)| (cell.sfc, (region, cell)))
            .collect();
        let nz = op.dims()[0] as f64;
        let mut values = vec![0.0; fields.len()];
        for (p, pos) in positions.iter().enumerate() {
            let Some((region, cell)) = self.sfc_of_point(*pos).and_then(|sfc| regions.get(&sfc))
            else {
                continue;
            };
            let offset = [0, 1, 2].map(|i| (pos[i] - cell.left[i]) / self.dx * nz);
            for (v, f) in values.iter_mut().zip(fields) {
                *v = f[p];
            }
            op.process(*region, offset, &values);
        }
        Ok(())
    }
}
