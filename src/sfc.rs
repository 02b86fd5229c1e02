//! Morton space-filling curve over the root mesh and helpers for SFC ranges.
use crate::types::{Error, Result, SfcIndex, SfcRange};
use itertools::Itertools;

/// Number of bits per axis needed to index `num_grid` root cells along one axis
pub fn bits_per_axis(num_grid: usize) -> Result<u32> {
    if num_grid == 0 || !num_grid.is_power_of_two() {
        return Err(Error::InvalidFileset(format!(
            "root grid size {num_grid} is not a power of two"
        )));
    }
    Ok(num_grid.trailing_zeros())
}

/// Interleave the bits of a root cell coordinate into an SFC index
///
/// Bit `b` of x, y and z land at positions `3b + 2`, `3b + 1` and `3b` respectively.
pub fn encode(coords: [u64; 3], nbits: u32) -> SfcIndex {
    let mut key: u64 = 0;
    for b in 0..nbits {
        key |= ((coords[0] >> b) & 1) << (3 * b + 2);
        key |= ((coords[1] >> b) & 1) << (3 * b + 1);
        key |= ((coords[2] >> b) & 1) << (3 * b);
    }
    key as SfcIndex
}

/// Recover the root cell coordinate of an SFC index
pub fn decode(sfc: SfcIndex, nbits: u32) -> [u64; 3] {
    let key = sfc as u64;
    let mut coords = [0u64; 3];
    for b in 0..nbits {
        coords[0] |= ((key >> (3 * b + 2)) & 1) << b;
        coords[1] |= ((key >> (3 * b + 1)) & 1) << b;
        coords[2] |= ((key >> (3 * b)) & 1) << b;
    }
    coords
}

/// Collapse ascending SFC indices into maximal contiguous ranges
pub fn coalesce(indices: impl IntoIterator<Item = SfcIndex>) -> Vec<SfcRange> {
    let mut ranges: Vec<SfcRange> = Vec::new();
    for sfc in indices.into_iter().dedup() {
        match ranges.last_mut() {
            Some(last) if last.end + 1 == sfc => last.end = sfc,
            _ => ranges.push(SfcRange::new(sfc, sfc)),
        }
    }
    ranges
}

/// Split ranges so that none covers more than `max_range_size` root cells
pub fn split(ranges: &[SfcRange], max_range_size: i64) -> Vec<SfcRange> {
    assert!(max_range_size > 0);
    let mut out = Vec::with_capacity(ranges.len());
    for range in ranges {
        let mut start = range.start;
        while start <= range.end {
            let end = std::cmp::min(start + max_range_size - 1, range.end);
            out.push(SfcRange::new(start, end));
            start = end + 1;
        }
    }
    out
}

/// Merge adjacent ranges back together
pub fn merge(ranges: &[SfcRange]) -> Vec<SfcRange> {
    let mut out: Vec<SfcRange> = Vec::new();
    for range in ranges.iter().sorted() {
        match out.last_mut() {
            Some(last) if last.end + 1 >= range.start => {
                last.end = std::cmp::max(last.end, range.end)
            }
            _ => out.push(*range),
        }
    }
    out
}

/// Ranges covering every root cell of a domain
pub fn whole_domain(num_root_cells: i64, max_range_size: i64) -> Vec<SfcRange> {
    if num_root_cells == 0 {
        return vec![];
    }
    split(&[SfcRange::new(0, num_root_cells - 1)], max_range_size)
}
