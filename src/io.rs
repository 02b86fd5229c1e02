//! Default fluid I/O backend
use crate::chunk::DataChunk;
use crate::traits::{Fileset, IoHandler, Selector};
use crate::types::{FieldId, Result};
use std::collections::HashMap;

/// Reads fluid fields by filling every subset of every chunk in turn
///
/// Arrays are concatenated in chunk order, then subset order within a chunk.
#[derive(Clone, Copy, Debug, Default)]
pub struct SubsetIo;

impl<'a, F: Fileset> IoHandler<'a, F> for SubsetIo {
    fn read_fluid_selection(
        &self,
        chunks: &mut dyn Iterator<Item = DataChunk<'a, F>>,
        selector: &dyn Selector,
        fields: &[FieldId],
    ) -> Result<HashMap<FieldId, Vec<f64>>> {
        let mut tr: HashMap<FieldId, Vec<f64>> =
            fields.iter().map(|f| (f.clone(), vec![])).collect();
        for chunk in chunks {
            for subset in &chunk.objs {
                for (field, values) in subset.fill(fields, selector)? {
                    tr.entry(field).or_default().extend(values);
                }
            }
        }
        Ok(tr)
    }
}
