//! Local slope estimation.
//!
//! Interior cells use centered differences, boundary cells a one-sided
//! difference across the boundary they sit on, and the four corners a plane
//! fit over their (clipped) 3×3 neighborhood. An axis whose stencil touches
//! an undefined cell stays undefined; the magnitude then falls back to the
//! other axis alone.

use crate::grid::HeightMap;
use crate::plane::fit_plane;

/// Radians to microradians.
pub const URAD_PER_RAD: f64 = 1e6;

/// Slope maps in µrad on the input lattice.
#[derive(Debug, Clone)]
pub struct TiltResult {
    pub slope_x: HeightMap,
    pub slope_y: HeightMap,
    /// `hypot(slope_x, slope_y)`, or `|slope|` of the single defined axis.
    pub magnitude: HeightMap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Start,
    End,
    Inside,
}

fn side(i: usize, len: usize) -> Side {
    if i == 0 {
        Side::Start
    } else if i + 1 == len {
        Side::End
    } else {
        Side::Inside
    }
}

/// Difference along one axis. `at(k)` reads the neighbor `k` steps away.
fn axis_slope(side: Side, z: f64, step: f64, at: impl Fn(isize) -> Option<f64>) -> Option<f64> {
    match side {
        Side::Start => at(1).map(|n| (n - z) / step),
        Side::End => at(-1).map(|p| (z - p) / step),
        Side::Inside => match (at(-1), at(1)) {
            (Some(p), Some(n)) => Some((n - p) / (2.0 * step)),
            _ => None,
        },
    }
}

fn corner_slopes(map: &HeightMap, row: usize, col: usize) -> Option<(f64, f64)> {
    let [px, py] = map.pitch();
    let mut support = Vec::with_capacity(9);
    for dr in -1isize..=1 {
        for dc in -1isize..=1 {
            let (r, c) = (row as isize + dr, col as isize + dc);
            if let Some(z) = map.get_signed(r, c) {
                support.push([c as f64 * px, r as f64 * py, z]);
            }
        }
    }
    let plane = fit_plane(&support)?;
    Some((plane.slope_x, plane.slope_y))
}

/// Combine per-axis slopes into a magnitude.
pub fn combine_slopes(sx: Option<f64>, sy: Option<f64>) -> Option<f64> {
    match (sx, sy) {
        (Some(x), Some(y)) => Some(x.hypot(y)),
        (Some(v), None) | (None, Some(v)) => Some(v.abs()),
        (None, None) => None,
    }
}

/// Estimate the local slope of every defined cell of `map`.
pub fn estimate_tilt(map: &HeightMap) -> TiltResult {
    let (rows, cols) = (map.rows(), map.cols());
    let [px, py] = map.pitch();
    let mut slope_x = map.empty_like();
    let mut slope_y = map.empty_like();
    let mut magnitude = map.empty_like();

    for (r, c, z) in map.iter_defined() {
        let (ri, ci) = (r as isize, c as isize);
        let row_side = side(r, rows);
        let col_side = side(c, cols);

        let (sx, sy) = if row_side != Side::Inside && col_side != Side::Inside {
            match corner_slopes(map, r, c) {
                Some((sx, sy)) => (Some(sx), Some(sy)),
                None => (None, None),
            }
        } else {
            (
                axis_slope(col_side, z, px, |k| map.get_signed(ri, ci + k)),
                axis_slope(row_side, z, py, |k| map.get_signed(ri + k, ci)),
            )
        };

        let sx = sx.map(|v| v * URAD_PER_RAD);
        let sy = sy.map(|v| v * URAD_PER_RAD);
        slope_x.set(r, c, sx);
        slope_y.set(r, c, sy);
        magnitude.set(r, c, combine_slopes(sx, sy));
    }

    tracing::debug!(
        defined = magnitude.n_defined(),
        cells = map.n_defined(),
        "tilt map estimated"
    );

    TiltResult {
        slope_x,
        slope_y,
        magnitude,
    }
}
