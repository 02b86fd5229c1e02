//! Index configuration

/// Default cap on the number of root cells in one SFC range
pub const DEFAULT_MAX_RANGE: i64 = 1024;

/// Default number of finest levels searched by [`crate::index::Index::find_max`]
pub const DEFAULT_FINEST_LEVELS: u32 = 3;

/// Settings shared by a dataset and its index
#[derive(Clone, Debug, PartialEq)]
pub struct IndexConfig {
    /// Maximum number of root cells in one SFC range
    pub max_range: i64,
    /// Number of finest levels searched by default in extremum search
    pub finest_levels: u32,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            max_range: DEFAULT_MAX_RANGE,
            finest_levels: DEFAULT_FINEST_LEVELS,
        }
    }
}

impl IndexConfig {
    /// Set the maximum range size
    pub fn with_max_range(mut self, max_range: i64) -> Self {
        assert!(max_range > 0, "max_range must be positive");
        self.max_range = max_range;
        self
    }

    /// Set the default number of finest levels
    pub fn with_finest_levels(mut self, finest_levels: u32) -> Self {
        self.finest_levels = finest_levels;
        self
    }
}
