//! Dynamic sub-aperture form simulation.
//!
//! A rectangular slit is swept over the height map in serpentine order. At
//! every stop the local best-fit plane is removed and the residual is
//! accumulated per cell; cells seen by several stops end up with the mean of
//! their residuals.

mod accumulator;
mod traversal;

pub use traversal::{placements, SlitGeometry, WindowPlacement};

use accumulator::WindowAccumulator;

use crate::config::SfmaConfig;
use crate::grid::HeightMap;
use crate::plane::fit_plane;

/// Output of [`simulate_sfma`].
#[derive(Debug, Clone)]
pub struct SfmaResult {
    /// Slit-averaged residual; undefined where no fitted stop reached.
    pub map: HeightMap,
    pub geometry: SlitGeometry,
    pub windows_fitted: usize,
    /// Stops with fewer valid cells than `min_window_points`.
    pub windows_skipped: usize,
    /// Stops whose support admitted no plane fit.
    pub windows_degenerate: usize,
}

/// Sweep the configured slit over `map`.
pub fn simulate_sfma(map: &HeightMap, config: &SfmaConfig) -> SfmaResult {
    let geometry = SlitGeometry::from_config(config, map.pitch());
    let mut acc = WindowAccumulator::new(map.rows(), map.cols());
    let mut windows_fitted = 0usize;
    let mut windows_skipped = 0usize;
    let mut windows_degenerate = 0usize;

    let mut cells: Vec<(usize, usize, [f64; 3])> = Vec::new();
    for win in placements(&geometry, map.rows(), map.cols()) {
        cells.clear();
        for r in win.row_start..win.row_end {
            for c in win.col_start..win.col_end {
                if let Some(z) = map.get(r, c) {
                    cells.push((r, c, [map.x_at(c), map.y_at(r), z]));
                }
            }
        }
        if cells.len() < config.min_window_points {
            windows_skipped += 1;
            continue;
        }

        let support: Vec<[f64; 3]> = cells.iter().map(|&(_, _, p)| p).collect();
        let Some(plane) = fit_plane(&support) else {
            windows_degenerate += 1;
            continue;
        };
        for &(r, c, p) in &cells {
            acc.add(r, c, plane.residual(p));
        }
        windows_fitted += 1;
    }

    tracing::debug!(
        width_px = geometry.width_px,
        height_px = geometry.height_px,
        windows_fitted,
        windows_skipped,
        windows_degenerate,
        "slit sweep finished"
    );

    SfmaResult {
        map: acc.freeze(map),
        geometry,
        windows_fitted,
        windows_skipped,
        windows_degenerate,
    }
}
