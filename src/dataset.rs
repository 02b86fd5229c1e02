//! An opened ARTIO dataset: domain geometry, particle species metadata and parameters
use crate::config::IndexConfig;
use crate::definitions::{self, ALL_PARTICLES, BASE_PARTICLE_VARIABLES, NBODY_LABEL};
use crate::traits::Fileset;
use crate::types::{Error, ParameterTable, ParameterValue, Result};
use log::debug;
use std::cell::{Ref, RefCell, RefMut};
use std::collections::BTreeMap;

/// Suffix of an ARTIO header file
pub const HEADER_SUFFIX: &str = ".art";

/// Geometry of the root mesh in code units
#[derive(Clone, Debug, PartialEq)]
pub struct DomainGeometry {
    /// Number of root cells along each axis
    pub dimensions: [usize; 3],
    /// Lower corner of the domain
    pub left_edge: [f64; 3],
    /// Upper corner of the domain
    pub right_edge: [f64; 3],
}

impl DomainGeometry {
    /// A cubic domain of `num_grid` unit root cells per axis
    pub fn cubic(num_grid: usize) -> Self {
        Self {
            dimensions: [num_grid; 3],
            left_edge: [0.0; 3],
            right_edge: [num_grid as f64; 3],
        }
    }

    /// Total number of root cells
    pub fn num_root_cells(&self) -> i64 {
        self.dimensions.iter().map(|d| *d as i64).product()
    }

    /// Width of a root cell
    pub fn root_dx(&self) -> f64 {
        (self.right_edge[0] - self.left_edge[0]) / self.dimensions[0] as f64
    }

    /// Check if a box equals the domain bounds
    pub fn is_whole_domain(&self, left: &[f64; 3], right: &[f64; 3]) -> bool {
        *left == self.left_edge && *right == self.right_edge
    }
}

/// Particle species metadata
#[derive(Clone, Debug, Default)]
pub struct ParticleMetadata {
    /// On-disk label of each species
    pub species_labels: Vec<String>,
    /// On-disk variable labels available for each species
    pub variables: Vec<Vec<String>>,
    /// Analysis-layer particle type to the ordered species indices contributing to it
    pub type_map: BTreeMap<String, Vec<usize>>,
}

impl ParticleMetadata {
    fn from_parameters(parameters: &ParameterTable) -> Result<Self> {
        let num_species = parameters.int("num_particle_species")? as usize;
        let species_labels = parameters.strings("particle_species_labels")?.to_vec();
        if species_labels.len() != num_species {
            return Err(Error::MissingParameter(format!(
                "particle_species_labels has {} entries for {} species",
                species_labels.len(),
                num_species
            )));
        }
        let num_primary = parameters.ints("num_primary_variables")?;
        let num_secondary = parameters.ints("num_secondary_variables")?;

        let mut variables = Vec::with_capacity(num_species);
        let mut type_map: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (species, label) in species_labels.iter().enumerate() {
            let ptype = definitions::to_analysis(label)
                .ok_or_else(|| Error::UnknownSpeciesLabel(label.clone()))?;
            type_map.entry(ptype.to_string()).or_default().push(species);

            let mut vars: Vec<String> = BASE_PARTICLE_VARIABLES
                .iter()
                .map(|v| v.to_string())
                .collect();
            // Mass is stored per species for dark matter only
            if label == NBODY_LABEL {
                vars.push("MASS".to_string());
            }
            if num_primary.get(species).copied().unwrap_or(0) > 0 {
                vars.extend_from_slice(
                    parameters.strings(&format!("species_{species:02}_primary_variable_labels"))?,
                );
            }
            if num_secondary.get(species).copied().unwrap_or(0) > 0 {
                vars.extend_from_slice(parameters.strings(&format!(
                    "species_{species:02}_secondary_variable_labels"
                ))?);
            }
            variables.push(vars);
        }
        if num_species > 0 {
            type_map.insert(ALL_PARTICLES.to_string(), (0..num_species).collect());
        }
        Ok(Self {
            species_labels,
            variables,
            type_map,
        })
    }

    /// Number of species
    pub fn num_species(&self) -> usize {
        self.species_labels.len()
    }

    /// Particle types, including the `all` union
    pub fn particle_types(&self) -> Vec<String> {
        self.type_map.keys().cloned().collect()
    }

    /// Species indices of a particle type
    pub fn species_of(&self, ptype: &str) -> &[usize] {
        self.type_map.get(ptype).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Check if a species carries an on-disk variable
    pub fn has_variable(&self, species: usize, label: &str) -> bool {
        self.variables[species].iter().any(|v| v == label)
    }
}

/// An opened dataset
///
/// The index built on a dataset borrows it, so it can never outlive it.
pub struct Dataset<F: Fileset> {
    handle: F,
    config: IndexConfig,
    geometry: DomainGeometry,
    max_level: u32,
    grid_variable_labels: Vec<String>,
    particles: ParticleMetadata,
    parameters: RefCell<ParameterTable>,
}

/// Derive the fileset prefix from a header file name
pub fn fileset_prefix(filename: &str) -> Result<&str> {
    match filename.strip_suffix(HEADER_SUFFIX) {
        Some(prefix) if !prefix.is_empty() => Ok(prefix),
        _ => Err(Error::InvalidFileset(format!(
            "{filename} is not an ARTIO header file"
        ))),
    }
}

/// Check if a file name names a valid fileset according to `validate`
pub fn is_valid(filename: &str, validate: impl Fn(&str) -> bool) -> bool {
    match fileset_prefix(filename) {
        Ok(prefix) => validate(prefix),
        Err(_) => false,
    }
}

impl<F: Fileset> Dataset<F> {
    /// Open a dataset from its header file name
    ///
    /// `opener` receives the fileset prefix and opens the fileset.
    pub fn open(
        filename: &str,
        config: IndexConfig,
        opener: impl FnOnce(&str) -> Result<F>,
    ) -> Result<Self> {
        let prefix = fileset_prefix(filename)?;
        debug!("Opening ARTIO fileset {}", prefix);
        Self::new(opener(prefix)?, config)
    }

    /// Create a dataset from an opened fileset
    pub fn new(handle: F, config: IndexConfig) -> Result<Self> {
        let geometry = DomainGeometry::cubic(handle.num_grid());
        let header = handle.parameters();
        let max_level = header.int("max_refinement_level")? as u32;
        let grid_variable_labels = header.strings("grid_variable_labels")?.to_vec();
        let particles = if handle.has_particles() {
            ParticleMetadata::from_parameters(header)?
        } else {
            ParticleMetadata::default()
        };

        let mut parameters = ParameterTable::new();
        parameters.insert(
            "HydroMethod",
            ParameterValue::Str(vec![definitions::FLUID_TYPE.to_string()]),
        );

        Ok(Self {
            handle,
            config,
            geometry,
            max_level,
            grid_variable_labels,
            particles,
            parameters: RefCell::new(parameters),
        })
    }

    /// The fileset
    pub fn handle(&self) -> &F {
        &self.handle
    }

    /// The configuration
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Maximum number of root cells in one SFC range
    pub fn max_range(&self) -> i64 {
        self.config.max_range
    }

    /// Domain geometry
    pub fn geometry(&self) -> &DomainGeometry {
        &self.geometry
    }

    /// Coarsest refinement level
    pub fn min_level(&self) -> u32 {
        0
    }

    /// Finest refinement level
    pub fn max_level(&self) -> u32 {
        self.max_level
    }

    /// Width of the smallest cell in code units
    pub fn smallest_dx(&self) -> f64 {
        self.geometry.root_dx() / 2f64.powi(self.max_level as i32)
    }

    /// Per-cell variable labels in file order
    pub fn grid_variable_labels(&self) -> &[String] {
        &self.grid_variable_labels
    }

    /// File position of a per-cell variable
    pub fn grid_variable_index(&self, label: &str) -> Result<usize> {
        self.grid_variable_labels
            .iter()
            .position(|l| l == label)
            .ok_or_else(|| Error::UnknownVariable(label.to_string()))
    }

    /// Particle species metadata
    pub fn particles(&self) -> &ParticleMetadata {
        &self.particles
    }

    /// Dataset parameters
    pub fn parameters(&self) -> Ref<'_, ParameterTable> {
        self.parameters.borrow()
    }

    /// Mutable dataset parameters
    pub fn parameters_mut(&self) -> RefMut<'_, ParameterTable> {
        self.parameters.borrow_mut()
    }
}
