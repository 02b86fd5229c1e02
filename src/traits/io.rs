//! Fluid I/O backends

use super::{Fileset, Selector};
use crate::chunk::DataChunk;
use crate::types::{FieldId, Result};
use std::collections::HashMap;

/// Reads fluid fields over a sequence of I/O chunks
pub trait IoHandler<'a, F: Fileset> {
    /// Read `fields` for every chunk, returning one concatenated array per field
    fn read_fluid_selection(
        &self,
        chunks: &mut dyn Iterator<Item = DataChunk<'a, F>>,
        selector: &dyn Selector,
        fields: &[FieldId],
    ) -> Result<HashMap<FieldId, Vec<f64>>>;
}
