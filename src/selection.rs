//! Concrete selection predicates
use crate::traits::Selector;
use std::rc::Rc;

/// Selects every cell of a domain
#[derive(Clone, Debug)]
pub struct AllSelector {
    left_edge: [f64; 3],
    right_edge: [f64; 3],
}

impl AllSelector {
    /// Create a selector for the domain `[left_edge, right_edge]`
    pub fn new(left_edge: [f64; 3], right_edge: [f64; 3]) -> Self {
        Self {
            left_edge,
            right_edge,
        }
    }
}

impl Selector for AllSelector {
    fn select_bbox(&self, _left: [f64; 3], _right: [f64; 3]) -> bool {
        true
    }
    fn select_cell(&self, _centre: [f64; 3], _dx: f64, _level: u32) -> bool {
        true
    }
    fn bounds(&self) -> Option<([f64; 3], [f64; 3])> {
        Some((self.left_edge, self.right_edge))
    }
}

/// Selects the cells whose centres lie in a half-open box `[left_edge, right_edge)`
#[derive(Clone, Debug)]
pub struct RegionSelector {
    left_edge: [f64; 3],
    right_edge: [f64; 3],
}

impl RegionSelector {
    /// Create a region selector
    pub fn new(left_edge: [f64; 3], right_edge: [f64; 3]) -> Self {
        for i in 0..3 {
            assert!(left_edge[i] <= right_edge[i], "Inverted region bounds");
        }
        Self {
            left_edge,
            right_edge,
        }
    }
}

impl Selector for RegionSelector {
    fn select_bbox(&self, left: [f64; 3], right: [f64; 3]) -> bool {
        (0..3).all(|i| left[i] < self.right_edge[i] && right[i] > self.left_edge[i])
    }
    fn select_cell(&self, centre: [f64; 3], _dx: f64, _level: u32) -> bool {
        (0..3).all(|i| centre[i] >= self.left_edge[i] && centre[i] < self.right_edge[i])
    }
    fn bounds(&self) -> Option<([f64; 3], [f64; 3])> {
        Some((self.left_edge, self.right_edge))
    }
}

/// Restricts another selector to cells at or above a refinement level
pub struct MinLevelSelector {
    inner: Rc<dyn Selector>,
    min_level: u32,
}

impl MinLevelSelector {
    /// Create a level-restricted selector
    pub fn new(inner: Rc<dyn Selector>, min_level: u32) -> Self {
        Self { inner, min_level }
    }

    /// The lowest selected level
    pub fn min_level(&self) -> u32 {
        self.min_level
    }
}

impl Selector for MinLevelSelector {
    fn select_bbox(&self, left: [f64; 3], right: [f64; 3]) -> bool {
        self.inner.select_bbox(left, right)
    }
    fn select_cell(&self, centre: [f64; 3], dx: f64, level: u32) -> bool {
        level >= self.min_level && self.inner.select_cell(centre, dx, level)
    }
    fn bounds(&self) -> Option<([f64; 3], [f64; 3])> {
        self.inner.bounds()
    }
}
