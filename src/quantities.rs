//! Reductions over the cells selected by a request
use crate::index::{DataRequest, Index};
use crate::traits::Fileset;
use crate::types::{Error, FieldId, Result};
use itertools::izip;
use std::slice;

/// The maximum of a fluid field and the centre of the first cell holding it
pub fn max_location<'a, F: Fileset>(
    index: &Index<'a, F>,
    request: &mut DataRequest<'a, F>,
    field: &FieldId,
) -> Result<(f64, [f64; 3])> {
    index.identify_base_chunk(request)?;
    let selector = request.selector().clone();
    let mut best: Option<(f64, [f64; 3])> = None;
    for chunk in index.chunk_io(request, false) {
        for subset in &chunk.objs {
            let values = subset.fill(slice::from_ref(field), selector.as_ref())?;
            let coords = subset.fcoords(selector.as_ref());
            if let Some(values) = values.get(field) {
                for (value, pos) in izip!(values, coords) {
                    if best.map_or(true, |(b, _)| *value > b) {
                        best = Some((*value, pos));
                    }
                }
            }
        }
    }
    best.ok_or_else(|| Error::EmptySelection(format!("maximum of {field}")))
}
