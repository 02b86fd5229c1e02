//! Particle deposition operators

use rlst::{Array, BaseArray, VectorContainer};

/// Column-major grid of shape `[nz, nz, nz, nregions]` produced by deposition
pub type DepositGrid = Array<f64, BaseArray<f64, VectorContainer<f64>, 4>, 4>;

/// An accumulator that reduces particles onto a fixed voxel grid
pub trait DepositOperator {
    /// The grid shape `[nz, nz, nz, nregions]`
    fn dims(&self) -> [usize; 4];

    /// Reset the accumulator
    fn initialize(&mut self);

    /// Accumulate one particle
    ///
    /// `offset` is the particle position inside the block of `region`, in zone units, so
    /// each component lies in `[0, nz)`. `values` holds one value per deposited field.
    fn process(&mut self, region: usize, offset: [f64; 3], values: &[f64]);

    /// Produce the grid, or `None` if no particle was processed
    fn finalize(&mut self) -> Option<DepositGrid>;
}
