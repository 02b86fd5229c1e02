//! Subset over the root cells of an SFC range
use super::SubsetBase;
use crate::deposit::DepositRegistry;
use crate::traits::{DepositGrid, Fileset, RootMeshContainer, Selector, SfcRangeHandler};
use crate::types::{DType, Error, FieldArray, FieldId, Result};
use itertools::izip;
use log::debug;
use num::ToPrimitive;
use std::collections::HashMap;

/// The root mesh of one SFC range
pub struct RootMeshSubset<'a, F: Fileset> {
    pub(crate) base: SubsetBase<'a, F>,
}

impl<'a, F: Fileset> RootMeshSubset<'a, F> {
    pub(crate) fn new(base: SubsetBase<'a, F>) -> Self {
        Self { base }
    }

    /// Zones per axis of a region
    pub fn nz(&self) -> usize {
        1
    }

    /// Fill fluid fields, one value per selected root cell
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
        let tr = self
            .base
            .handler
            .root_mesh()
            .fill_sfc(selector, &field_indices)?;
        self.base
            .data_size
            .set(Some(tr.first().map_or(0, |v| v.len())));
        Ok(izip!(fields.iter().cloned(), tr).collect())
    }

    /// Centres of the selected root cells
    pub fn fcoords(&self, selector: &dyn Selector) -> Vec<[f64; 3]> {
        self.base.handler.root_mesh().fcoords(selector)
    }

    /// Deposit particles onto the root cells selected by the base selection
    ///
    /// The grid has shape `[nz, nz, nz, nregions]`, one region per selected root cell. `None`
    /// means no particle fell into the subset.
    pub fn deposit<P: ToPrimitive + Copy>(
        &self,
        positions: &[[P; 3]],
        fields: &[FieldArray],
        method: &str,
        registry: &DepositRegistry,
    ) -> Result<Option<DepositGrid>> {
        let root_mesh = self.base.handler.root_mesh();
        let selector = self.base.base_selector.as_ref();
        let nz = self.nz();
        let nregions = root_mesh.count_cells(selector);
        let mut op = registry.create(method, [nz, nz, nz, nregions])?;
        op.initialize();
        debug!(
            "Depositing {} ({}^3) particles into {} Root Mesh",
            positions.len(),
            (positions.len() as f64).cbrt(),
            nregions
        );

        let pos = positions
            .iter()
            .map(|p| -> Result<[f64; 3]> {
                let mut out = [0.0; 3];
                for (o, v) in out.iter_mut().zip(p.iter()) {
                    *o = v.to_f64().ok_or(Error::Cast(DType::F64))?;
                }
                Ok(out)
            })
            .collect::<Result<Vec<_>>>()?;
        let f64s = fields.iter().map(|f| f.to_f64()).collect::<Vec<_>>();
        for f in &f64s {
            if f.len() != pos.len() {
                return Err(Error::ShapeMismatch(format!(
                    "{} deposit values for {} particles",
                    f.len(),
                    pos.len()
                )));
            }
        }

        root_mesh.deposit(op.as_mut(), selector, &pos, &f64s)?;
        Ok(op.finalize())
    }
}
