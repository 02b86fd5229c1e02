//! Fixed vocabulary between analysis-layer names and ARTIO labels
//!
//! Every entry is a pair (analysis name, on-disk label). The table is a bijection, so both
//! directions are exact lookups.

use crate::types::{Error, Result};
use std::collections::HashMap;

/// Field type marker of per-cell fluid fields
pub const FLUID_TYPE: &str = "artio";

/// Particle type that aggregates every species
pub const ALL_PARTICLES: &str = "all";

/// On-disk label of dark matter species, the only species carrying a mass variable
pub const NBODY_LABEL: &str = "N-BODY";

/// Variables present for every species
pub const BASE_PARTICLE_VARIABLES: [&str; 2] = ["PID", "SPECIES"];

const VOCABULARY: [(&str, &str); 30] = [
    ("Density", "HVAR_GAS_DENSITY"),
    ("TotalEnergy", "HVAR_GAS_ENERGY"),
    ("GasEnergy", "HVAR_INTERNAL_ENERGY"),
    ("Pressure", "HVAR_PRESSURE"),
    ("XMomentumDensity", "HVAR_MOMENTUM_X"),
    ("YMomentumDensity", "HVAR_MOMENTUM_Y"),
    ("ZMomentumDensity", "HVAR_MOMENTUM_Z"),
    ("Gamma", "HVAR_GAMMA"),
    ("MetalDensitySNIa", "HVAR_METAL_DENSITY_Ia"),
    ("MetalDensitySNII", "HVAR_METAL_DENSITY_II"),
    ("Potential", "VAR_POTENTIAL"),
    ("PotentialHydro", "VAR_POTENTIAL_HYDRO"),
    ("particle_position_x", "POSITION_X"),
    ("particle_position_y", "POSITION_Y"),
    ("particle_position_z", "POSITION_Z"),
    ("particle_velocity_x", "VELOCITY_X"),
    ("particle_velocity_y", "VELOCITY_Y"),
    ("particle_velocity_z", "VELOCITY_Z"),
    ("particle_mass", "MASS"),
    ("particle_index", "PID"),
    ("particle_species", "SPECIES"),
    ("creation_time", "BIRTH_TIME"),
    ("particle_mass_initial", "INITIAL_MASS"),
    ("particle_metallicity1", "METALLICITY_SNIa"),
    ("particle_metallicity2", "METALLICITY_SNII"),
    ("stars", "STAR"),
    ("nbody", "N-BODY"),
    ("particle_potential", "POTENTIAL"),
    ("particle_ionizing_rate", "IONIZING_RATE"),
    ("particle_birth_mass", "BIRTH_MASS"),
];

lazy_static! {
    static ref ANALYSIS_TO_DISK: HashMap<&'static str, &'static str> =
        VOCABULARY.iter().copied().collect();
    static ref DISK_TO_ANALYSIS: HashMap<&'static str, &'static str> =
        VOCABULARY.iter().map(|(a, d)| (*d, *a)).collect();
}

/// Translate an analysis-layer name to its on-disk label
pub fn to_disk(name: &str) -> Result<&'static str> {
    ANALYSIS_TO_DISK
        .get(name)
        .copied()
        .ok_or_else(|| Error::UnknownField(name.to_string()))
}

/// Translate an on-disk label to its analysis-layer name
pub fn to_analysis(label: &str) -> Option<&'static str> {
    DISK_TO_ANALYSIS.get(label).copied()
}

/// Iterate over all (analysis name, on-disk label) pairs
pub fn vocabulary() -> impl Iterator<Item = (&'static str, &'static str)> {
    VOCABULARY.iter().copied()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_vocabulary_is_bijective() {
        assert_eq!(ANALYSIS_TO_DISK.len(), VOCABULARY.len());
        assert_eq!(DISK_TO_ANALYSIS.len(), VOCABULARY.len());
        for (name, label) in vocabulary() {
            assert_eq!(to_disk(name).unwrap(), label);
            assert_eq!(to_analysis(label).unwrap(), name);
        }
    }

    #[test]
    fn test_unknown_name() {
        assert!(matches!(
            to_disk("particle_colour"),
            Err(Error::UnknownField(_))
        ));
        assert_eq!(to_analysis("NOT_A_LABEL"), None);
    }
}
