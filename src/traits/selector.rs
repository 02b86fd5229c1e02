//! Spatial selection predicates

/// A spatial selection predicate
///
/// Coordinates are in code units, where a root cell has unit width.
pub trait Selector {
    /// Check if any part of the axis-aligned box `[left, right]` may be selected
    fn select_bbox(&self, left: [f64; 3], right: [f64; 3]) -> bool;

    /// Check if a cell with the given centre, width and refinement level is selected
    fn select_cell(&self, centre: [f64; 3], dx: f64, level: u32) -> bool;

    /// The bounding box of the selection, if it is a box
    ///
    /// A selection whose bounds equal the domain bounds selects the whole domain.
    fn bounds(&self) -> Option<([f64; 3], [f64; 3])> {
        None
    }
}
