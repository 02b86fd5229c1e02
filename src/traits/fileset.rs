//! Query surface of an opened ARTIO fileset

use super::{Selector, SfcRangeHandler};
use crate::dataset::DomainGeometry;
use crate::types::{ParameterTable, Result, SfcRange};

/// An opened fileset
pub trait Fileset {
    /// The range handler type built for one SFC range
    type RangeHandler: SfcRangeHandler;

    /// Number of root cells along each axis
    fn num_grid(&self) -> usize;

    /// Header parameters
    fn parameters(&self) -> &ParameterTable;

    /// Check if the fileset stores particles
    fn has_particles(&self) -> bool;

    /// All SFC ranges covering the whole domain, none longer than `max_range_size`
    fn root_sfc_ranges_all(&self, max_range_size: i64) -> Result<Vec<SfcRange>>;

    /// SFC ranges of the root cells intersecting the selection, none longer than `max_range_size`
    fn root_sfc_ranges(
        &self,
        selector: &dyn Selector,
        max_range_size: i64,
    ) -> Result<Vec<SfcRange>>;

    /// Create the range handler for one SFC range
    ///
    /// The handler's meshes are empty until [`SfcRangeHandler::construct_mesh`] is called.
    fn range_handler(
        &self,
        geometry: &DomainGeometry,
        range: SfcRange,
    ) -> Result<Self::RangeHandler>;
}
