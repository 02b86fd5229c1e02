//! Builder for in-memory filesets
use super::{CellData, FilesetData, MemoryFileset, SpeciesData};
use crate::dataset::DomainGeometry;
use crate::sfc;
use crate::types::{Error, FieldArray, ParameterTable, ParameterValue, Result};
use std::collections::BTreeMap;

/// Builds a [`MemoryFileset`]
///
/// Root cells start unrefined with all variables zero. Coordinates are code units, in which
/// the domain spans `[0, num_grid]` along each axis.
pub struct MemoryFilesetBuilder {
    num_grid: usize,
    grid_variable_labels: Vec<String>,
    root_cells: Vec<CellData>,
    species: Vec<SpeciesData>,
}

impl MemoryFilesetBuilder {
    /// Create a builder for a domain of `num_grid` root cells per axis
    pub fn new(num_grid: usize, grid_variable_labels: &[&str]) -> Result<Self> {
        let nbits = sfc::bits_per_axis(num_grid)?;
        let ncells = 1usize << (3 * nbits);
        let nvars = grid_variable_labels.len();
        Ok(Self {
            num_grid,
            grid_variable_labels: grid_variable_labels.iter().map(|l| l.to_string()).collect(),
            root_cells: vec![CellData::leaf(vec![0.0; nvars]); ncells],
            species: vec![],
        })
    }

    fn nbits(&self) -> u32 {
        self.num_grid.trailing_zeros()
    }

    /// Set the values of every root cell from its centre
    pub fn root_values(mut self, values: impl Fn([f64; 3]) -> Vec<f64>) -> Self {
        let nbits = self.nbits();
        for (sfc_index, cell) in self.root_cells.iter_mut().enumerate() {
            let coords = sfc::decode(sfc_index as i64, nbits);
            cell.values = values(coords.map(|c| c as f64 + 0.5));
        }
        self
    }

    /// Refine the cells containing `point` down to `level`
    ///
    /// Newly created cells take their values from `values(centre, level)`. Cells that are
    /// already refined keep their children.
    pub fn refine(
        mut self,
        point: [f64; 3],
        level: u32,
        values: impl Fn([f64; 3], u32) -> Vec<f64>,
    ) -> Result<Self> {
        let geometry = DomainGeometry::cubic(self.num_grid);
        if (0..3).any(|i| point[i] < geometry.left_edge[i] || point[i] >= geometry.right_edge[i]) {
            return Err(Error::ShapeMismatch(format!(
                "point {point:?} is outside the domain"
            )));
        }
        let coords = point.map(|p| p.floor() as u64);
        let nbits = self.nbits();
        let mut cell = &mut self.root_cells[sfc::encode(coords, nbits) as usize];
        let mut centre = coords.map(|c| c as f64 + 0.5);
        let mut dx = 1.0;
        for child_level in 1..=level {
            dx /= 2.0;
            let parent_centre = centre;
            let children = cell.children.get_or_insert_with(|| {
                Box::new(std::array::from_fn(|c| {
                    let child_centre = child_centre(parent_centre, c, dx);
                    CellData::leaf(values(child_centre, child_level))
                }))
            });
            let c = (0..3).fold(0, |acc, i| {
                acc | (usize::from(point[i] >= parent_centre[i]) << i)
            });
            centre = child_centre(parent_centre, c, dx);
            cell = &mut children[c];
        }
        Ok(self)
    }

    /// Add a particle species
    ///
    /// `variables` must include `POSITION_X`, `POSITION_Y` and `POSITION_Z`. `PID` and
    /// `SPECIES` are generated when absent.
    pub fn species(mut self, label: &str, variables: Vec<(&str, FieldArray)>) -> Result<Self> {
        let mut vars: BTreeMap<String, FieldArray> = variables
            .into_iter()
            .map(|(l, v)| (l.to_string(), v))
            .collect();
        for axis in ["POSITION_X", "POSITION_Y", "POSITION_Z"] {
            if !vars.contains_key(axis) {
                return Err(Error::MissingParameter(format!("{label} species {axis}")));
            }
        }
        let len = vars.values().next().map_or(0, |v| v.len());
        if vars.values().any(|v| v.len() != len) {
            return Err(Error::ShapeMismatch(format!(
                "{label} species variables differ in length"
            )));
        }
        let index = self.species.len();
        let offset: usize = self.species.iter().map(|s| s.len()).sum();
        vars.entry("PID".to_string())
            .or_insert_with(|| FieldArray::I64((0..len).map(|i| (offset + i) as i64).collect()));
        vars.entry("SPECIES".to_string())
            .or_insert_with(|| FieldArray::I32(vec![index as i32; len]));
        self.species.push(SpeciesData {
            label: label.to_string(),
            variables: vars,
        });
        Ok(self)
    }

    /// Build the fileset
    pub fn build(self) -> MemoryFileset {
        let nbits = self.nbits();
        let max_level = self.root_cells.iter().map(|c| c.depth()).max().unwrap_or(0);

        let mut parameters = ParameterTable::new();
        parameters.insert(
            "num_root_cells",
            ParameterValue::Int(vec![self.root_cells.len() as i64]),
        );
        parameters.insert(
            "max_refinement_level",
            ParameterValue::Int(vec![max_level as i64]),
        );
        parameters.insert(
            "grid_variable_labels",
            ParameterValue::Str(self.grid_variable_labels.clone()),
        );
        if !self.species.is_empty() {
            parameters.insert(
                "num_particle_species",
                ParameterValue::Int(vec![self.species.len() as i64]),
            );
            parameters.insert(
                "particle_species_labels",
                ParameterValue::Str(self.species.iter().map(|s| s.label.clone()).collect()),
            );
            let mut num_primary = Vec::with_capacity(self.species.len());
            for (i, species) in self.species.iter().enumerate() {
                let labels: Vec<String> = species
                    .variables
                    .keys()
                    .filter(|l| !["PID", "SPECIES"].contains(&l.as_str()))
                    .cloned()
                    .collect();
                num_primary.push(labels.len() as i64);
                parameters.insert(
                    &format!("species_{i:02}_primary_variable_labels"),
                    ParameterValue::Str(labels),
                );
            }
            parameters.insert("num_primary_variables", ParameterValue::Int(num_primary));
            parameters.insert(
                "num_secondary_variables",
                ParameterValue::Int(vec![0; self.species.len()]),
            );
        }

        MemoryFileset::new(
            FilesetData {
                num_grid: self.num_grid,
                nbits,
                root_cells: self.root_cells,
                species: self.species,
            },
            parameters,
        )
    }
}

fn child_centre(parent_centre: [f64; 3], child: usize, dx: f64) -> [f64; 3] {
    let mut c = parent_centre;
    for (i, x) in c.iter_mut().enumerate() {
        *x += (((child >> i) & 1) as f64 - 0.5) * dx;
    }
    c
}
