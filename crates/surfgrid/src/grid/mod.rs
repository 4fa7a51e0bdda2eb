//! Coordinate normalization, uniform binning and the dense map type shared by
//! every downstream stage.

mod artifact;
mod binning;
mod height_map;

pub use artifact::{format_xyz_lines, write_xyz_file};
pub use binning::{bin_samples, normalize_samples, BinnedGrid, GridAxis, ScanCenter};
pub use height_map::HeightMap;

/// `round` with ties to even, matching the rounding used when the binning and
/// window-size conventions were established.
pub(crate) fn round_half_even(v: f64) -> f64 {
    v.round_ties_even()
}
