//! Aggregation of per-species particle arrays into particle-type arrays
use crate::dataset::Dataset;
use crate::definitions;
use crate::traits::{Fileset, SfcRangeHandler};
use crate::types::{DType, FieldArray, Result};
use log::debug;
use std::collections::BTreeMap;

/// Particle type to field name to array
pub type ParticleData = BTreeMap<String, BTreeMap<String, FieldArray>>;

/// Fill particle fields of one range
///
/// Every requested (type, field) pair gets the concatenation of the arrays of the species of
/// that type that carry the field, in species order. Species lacking the field are skipped. The
/// element type is the one of the last contributing species; with no contributing species the
/// array is empty and has type `f64`. Unknown field names are an error.
pub(crate) fn fill_particles<F: Fileset>(
    dataset: &Dataset<F>,
    handler: &F::RangeHandler,
    fields: &[(&str, &str)],
) -> Result<ParticleData> {
    let mut tr = ParticleData::new();
    if fields.is_empty() {
        return Ok(tr);
    }
    let meta = dataset.particles();

    let mut disk_names = Vec::with_capacity(fields.len());
    let mut art_fields: Vec<(usize, String)> = Vec::new();
    for (ptype, field) in fields {
        let label = definitions::to_disk(field)?;
        disk_names.push(label);
        for &species in meta.species_of(ptype) {
            let key = (species, label.to_string());
            if meta.has_variable(species, label) && !art_fields.contains(&key) {
                art_fields.push(key);
            }
        }
    }
    let species_data = handler.fill_particles(&art_fields)?;

    for ((ptype, field), label) in fields.iter().zip(disk_names) {
        let mut count = 0;
        let mut dtype = DType::F64;
        let mut contributors = Vec::new();
        for &species in meta.species_of(ptype) {
            if let Some(v) = species_data.get(&(species, label.to_string())) {
                count += v.len();
                dtype = v.dtype();
                contributors.push(v);
            }
        }
        if contributors.is_empty() {
            debug!("No species of type {} carry {}", ptype, label);
        }
        let mut out = FieldArray::zeros(dtype, count);
        let mut cp = 0;
        for v in contributors {
            out.write_at(cp, v)?;
            cp += v.len();
        }
        tr.entry(ptype.to_string())
            .or_default()
            .insert(field.to_string(), out);
    }
    Ok(tr)
}
