//! Particle deposition operators and their registry
use crate::traits::{DepositGrid, DepositOperator};
use crate::types::{Error, Result};
use rlst::{rlst_dynamic_array4, RandomAccessMut};
use std::collections::BTreeMap;

/// Constructor of a deposition operator for a grid shape
pub type OperatorFactory = Box<dyn Fn([usize; 4]) -> Box<dyn DepositOperator>>;

/// Deposition operators by name
pub struct DepositRegistry {
    factories: BTreeMap<String, OperatorFactory>,
}

impl Default for DepositRegistry {
    /// A registry holding the `count`, `sum`, `nearest` and `cic` operators
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("count", Box::new(|dims| Box::new(CountDeposit::new(dims))));
        registry.register("sum", Box::new(|dims| Box::new(SumDeposit::new(dims))));
        registry.register(
            "nearest",
            Box::new(|dims| Box::new(NearestDeposit::new(dims))),
        );
        registry.register("cic", Box::new(|dims| Box::new(CicDeposit::new(dims))));
        registry
    }
}

impl DepositRegistry {
    /// A registry with no operators
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Register an operator, replacing any operator of the same name
    pub fn register(&mut self, name: &str, factory: OperatorFactory) {
        self.factories.insert(name.to_string(), factory);
    }

    /// Check if an operator is registered
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Names of the registered operators
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(|k| k.as_str())
    }

    /// Create an operator for a grid of shape `dims`
    pub fn create(&self, name: &str, dims: [usize; 4]) -> Result<Box<dyn DepositOperator>> {
        self.factories
            .get(name)
            .map(|factory| factory(dims))
            .ok_or_else(|| Error::DepositionNotImplemented(name.to_string()))
    }
}

/// Grid storage shared by the built-in operators
struct Accumulator {
    dims: [usize; 4],
    grid: DepositGrid,
    processed: usize,
}

impl Accumulator {
    fn new(dims: [usize; 4]) -> Self {
        Self {
            dims,
            grid: rlst_dynamic_array4!(f64, dims),
            processed: 0,
        }
    }

    fn reset(&mut self) {
        self.grid = rlst_dynamic_array4!(f64, self.dims);
        self.processed = 0;
    }

    /// Zone containing an offset, clamped to the block
    fn zone(&self, offset: [f64; 3]) -> [usize; 3] {
        let nz = self.dims[0] as isize;
        offset.map(|o| (o.floor() as isize).clamp(0, nz - 1) as usize)
    }

    fn add(&mut self, zone: [usize; 3], region: usize, value: f64) {
        if let Some(v) = self.grid.get_mut([zone[0], zone[1], zone[2], region]) {
            *v += value;
        }
    }

    fn set(&mut self, zone: [usize; 3], region: usize, value: f64) {
        if let Some(v) = self.grid.get_mut([zone[0], zone[1], zone[2], region]) {
            *v = value;
        }
    }

    fn flat_index(&self, zone: [usize; 3], region: usize) -> usize {
        let nz = self.dims[0];
        zone[0] + nz * (zone[1] + nz * (zone[2] + nz * region))
    }

    fn finish(&mut self) -> Option<DepositGrid> {
        if self.processed == 0 {
            return None;
        }
        self.processed = 0;
        Some(std::mem::replace(
            &mut self.grid,
            rlst_dynamic_array4!(f64, self.dims),
        ))
    }
}

/// Number of particles per zone
pub struct CountDeposit {
    acc: Accumulator,
}

impl CountDeposit {
    /// Create the operator
    pub fn new(dims: [usize; 4]) -> Self {
        Self {
            acc: Accumulator::new(dims),
        }
    }
}

impl DepositOperator for CountDeposit {
    fn dims(&self) -> [usize; 4] {
        self.acc.dims
    }
    fn initialize(&mut self) {
        self.acc.reset();
    }
    fn process(&mut self, region: usize, offset: [f64; 3], _values: &[f64]) {
        let zone = self.acc.zone(offset);
        self.acc.add(zone, region, 1.0);
        self.acc.processed += 1;
    }
    fn finalize(&mut self) -> Option<DepositGrid> {
        self.acc.finish()
    }
}

/// Sum of the first field per zone
pub struct SumDeposit {
    acc: Accumulator,
}

impl SumDeposit {
    /// Create the operator
    pub fn new(dims: [usize; 4]) -> Self {
        Self {
            acc: Accumulator::new(dims),
        }
    }
}

impl DepositOperator for SumDeposit {
    fn dims(&self) -> [usize; 4] {
        self.acc.dims
    }
    fn initialize(&mut self) {
        self.acc.reset();
    }
    fn process(&mut self, region: usize, offset: [f64; 3], values: &[f64]) {
        let zone = self.acc.zone(offset);
        self.acc.add(zone, region, values.first().copied().unwrap_or(0.0));
        self.acc.processed += 1;
    }
    fn finalize(&mut self) -> Option<DepositGrid> {
        self.acc.finish()
    }
}

/// Value of the first field of the particle nearest each zone centre
///
/// Ties keep the particle processed first.
pub struct NearestDeposit {
    acc: Accumulator,
    distances: Vec<f64>,
}

impl NearestDeposit {
    /// Create the operator
    pub fn new(dims: [usize; 4]) -> Self {
        Self {
            acc: Accumulator::new(dims),
            distances: vec![f64::INFINITY; dims.iter().product()],
        }
    }
}

impl DepositOperator for NearestDeposit {
    fn dims(&self) -> [usize; 4] {
        self.acc.dims
    }
    fn initialize(&mut self) {
        self.acc.reset();
        self.distances.fill(f64::INFINITY);
    }
    fn process(&mut self, region: usize, offset: [f64; 3], values: &[f64]) {
        let zone = self.acc.zone(offset);
        let r2 = (0..3)
            .map(|i| (offset[i] - (zone[i] as f64 + 0.5)).powi(2))
            .sum::<f64>();
        let index = self.acc.flat_index(zone, region);
        if r2 < self.distances[index] {
            self.distances[index] = r2;
            self.acc
                .set(zone, region, values.first().copied().unwrap_or(0.0));
        }
        self.acc.processed += 1;
    }
    fn finalize(&mut self) -> Option<DepositGrid> {
        self.distances.fill(f64::INFINITY);
        self.acc.finish()
    }
}

/// Cloud-in-cell deposition of the first field
///
/// Each particle is a cube of one zone width; its value is shared between the up to eight
/// zones it overlaps. Weight falling outside the block goes to the nearest zone of the block.
pub struct CicDeposit {
    acc: Accumulator,
}

impl CicDeposit {
    /// Create the operator
    pub fn new(dims: [usize; 4]) -> Self {
        Self {
            acc: Accumulator::new(dims),
        }
    }
}

impl DepositOperator for CicDeposit {
    fn dims(&self) -> [usize; 4] {
        self.acc.dims
    }
    fn initialize(&mut self) {
        self.acc.reset();
    }
    fn process(&mut self, region: usize, offset: [f64; 3], values: &[f64]) {
        let value = values.first().copied().unwrap_or(0.0);
        let nz = self.acc.dims[0] as isize;
        let mut lower = [0isize; 3];
        let mut frac = [0.0; 3];
        for i in 0..3 {
            let x = offset[i] - 0.5;
            lower[i] = x.floor() as isize;
            frac[i] = x - x.floor();
        }
        for corner in 0..8 {
            let mut weight = 1.0;
            let mut zone = [0usize; 3];
            for i in 0..3 {
                let upper = (corner >> i) & 1 == 1;
                weight *= if upper { frac[i] } else { 1.0 - frac[i] };
                let z = lower[i] + if upper { 1 } else { 0 };
                zone[i] = z.clamp(0, nz - 1) as usize;
            }
            if weight > 0.0 {
                self.acc.add(zone, region, value * weight);
            }
        }
        self.acc.processed += 1;
    }
    fn finalize(&mut self) -> Option<DepositGrid> {
        self.acc.finish()
    }
}
