//! Flattened octs of one SFC range
use super::CellData;
use crate::traits::{OctCellIndices, OctreeContainer, Selector};
use crate::types::{Error, Result};

/// Eight cells sharing a refined parent
#[derive(Clone, Debug)]
pub(crate) struct Oct {
    /// Level of the cells of the oct
    level: u32,
    /// Centre of the oct, which is the centre of its parent cell
    centre: [f64; 3],
    /// Width of one cell
    dx: f64,
    values: [Vec<f64>; 8],
    refined: [bool; 8],
}

impl Oct {
    fn cell_centre(&self, cell: usize) -> [f64; 3] {
        let mut c = self.centre;
        for (i, x) in c.iter_mut().enumerate() {
            let bit = ((cell >> i) & 1) as f64;
            *x += (bit - 0.5) * self.dx;
        }
        c
    }
}

/// Octs of one SFC range in depth-first file order
#[derive(Clone, Debug, Default)]
pub struct MemoryOctree {
    octs: Vec<Oct>,
}

impl MemoryOctree {
    /// Add the octs below a root cell
    pub(crate) fn push_root(&mut self, root: &CellData, centre: [f64; 3], root_dx: f64) {
        self.push_children(root, centre, root_dx / 2.0, 1);
    }

    fn push_children(&mut self, parent: &CellData, centre: [f64; 3], dx: f64, level: u32) {
        let Some(children) = &parent.children else {
            return;
        };
        let oct = Oct {
            level,
            centre,
            dx,
            values: std::array::from_fn(|c| children[c].values.clone()),
            refined: std::array::from_fn(|c| children[c].children.is_some()),
        };
        let centres: [[f64; 3]; 8] = std::array::from_fn(|c| oct.cell_centre(c));
        self.octs.push(oct);
        for (child, child_centre) in children.iter().zip(centres) {
            self.push_children(child, child_centre, dx / 2.0, level + 1);
        }
    }

    /// Visit the selected unrefined cells as (file index, cell index)
    fn selected<'s>(
        &'s self,
        selector: &'s dyn Selector,
    ) -> impl Iterator<Item = (usize, usize)> + 's {
        self.octs.iter().enumerate().flat_map(move |(file, oct)| {
            (0..8)
                .filter(move |&c| {
                    !oct.refined[c] && selector.select_cell(oct.cell_centre(c), oct.dx, oct.level)
                })
                .map(move |c| (file, c))
        })
    }
}

impl OctreeContainer for MemoryOctree {
    fn total_octs(&self) -> usize {
        self.octs.len()
    }

    fn count_cells(&self, selector: &dyn Selector) -> usize {
        self.selected(selector).count()
    }

    fn file_index_octs(
        &self,
        selector: &dyn Selector,
        cell_count: usize,
    ) -> Result<OctCellIndices> {
        let mut indices = OctCellIndices {
            levels: Vec::with_capacity(cell_count),
            cell_inds: Vec::with_capacity(cell_count),
            file_inds: Vec::with_capacity(cell_count),
        };
        for (file, cell) in self.selected(selector) {
            indices.levels.push(self.octs[file].level);
            indices.cell_inds.push(cell as u8);
            indices.file_inds.push(file);
        }
        if indices.len() != cell_count {
            return Err(Error::ShapeMismatch(format!(
                "selector picked {} cells, expected {}",
                indices.len(),
                cell_count
            )));
        }
        Ok(indices)
    }

    fn domain_count(&self, selector: &dyn Selector) -> Vec<usize> {
        vec![self.count_cells(selector)]
    }

    fn fill_sfc(
        &self,
        indices: &OctCellIndices,
        domain_counts: &[usize],
        field_indices: &[usize],
        out: &mut [Vec<f64>],
    ) -> Result<()> {
        if domain_counts.iter().sum::<usize>() != indices.len() {
            return Err(Error::ShapeMismatch(
                "domain counts do not match the cell count".to_string(),
            ));
        }
        if out.len() != field_indices.len() || out.iter().any(|o| o.len() != indices.len()) {
            return Err(Error::ShapeMismatch(
                "output arrays do not match the requested cells".to_string(),
            ));
        }
        for (i, (&level, &cell, &file)) in
            itertools::izip!(&indices.levels, &indices.cell_inds, &indices.file_inds).enumerate()
        {
            let oct = self
                .octs
                .get(file)
                .filter(|o| o.level == level)
                .ok_or_else(|| Error::RangeHandler(format!("no oct {file} at level {level}")))?;
            let values = &oct.values[cell as usize];
            for (o, &var) in out.iter_mut().zip(field_indices) {
                o[i] = *values
                    .get(var)
                    .ok_or_else(|| Error::RangeHandler(format!("no grid variable {var}")))?;
            }
        }
        Ok(())
    }

    fn fcoords(&self, selector: &dyn Selector) -> Vec<[f64; 3]> {
        self.selected(selector)
            .map(|(file, cell)| self.octs[file].cell_centre(cell))
            .collect()
    }
}
