//! Serpentine slit traversal.

use serde::{Deserialize, Serialize};

use crate::config::SfmaConfig;
use crate::grid::round_half_even;

/// Slit size and stride in grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlitGeometry {
    pub width_px: usize,
    pub height_px: usize,
    pub step_px_x: usize,
    pub step_px_y: usize,
}

fn to_cells(length: f64, pitch: f64) -> usize {
    (round_half_even(length / pitch) as usize).max(1)
}

impl SlitGeometry {
    /// Convert physical slit size and stride to cell counts. Every count is
    /// at least one cell.
    pub fn from_config(config: &SfmaConfig, pitch: [f64; 2]) -> Self {
        Self {
            width_px: to_cells(config.slit_width, pitch[0]),
            height_px: to_cells(config.slit_height, pitch[1]),
            step_px_x: to_cells(config.slit_step_x, pitch[0]),
            step_px_y: to_cells(config.slit_step_y, pitch[1]),
        }
    }
}

/// One slit stop: rows `row_start..row_end`, columns `col_start..col_end`,
/// already clipped to the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPlacement {
    /// Index of the column band, counted over every band start including
    /// bands that clip to nothing.
    pub band: usize,
    pub row_start: usize,
    pub row_end: usize,
    pub col_start: usize,
    pub col_end: usize,
}

/// Window placements in sweep order.
///
/// Band starts run from `-width_px` up to (excluding) `cols`, so the first and
/// last columns are reached by partially off-grid bands. Even bands sweep rows
/// upward from 0, odd bands downward from `rows - height_px`. When the row
/// stride does not land on the far end, a closing stop flush with it is added.
/// Rows never leave the grid, so a slit taller than the grid produces no
/// placement.
pub fn placements(geometry: &SlitGeometry, rows: usize, cols: usize) -> Vec<WindowPlacement> {
    let w = geometry.width_px as i64;
    let h = geometry.height_px;
    let mut out = Vec::new();

    let band_starts = (-w..cols as i64).step_by(geometry.step_px_x);
    for (band, col_start) in band_starts.enumerate() {
        let col_lo = col_start.max(0) as usize;
        let col_hi = (col_start + w).min(cols as i64).max(0) as usize;
        if col_lo >= col_hi || h > rows {
            continue;
        }

        let last = rows - h;
        let mut offsets: Vec<usize> = (0..=last).step_by(geometry.step_px_y).collect();
        if last % geometry.step_px_y != 0 {
            offsets.push(last);
        }
        for offset in offsets {
            let row_start = if band % 2 == 0 { offset } else { last - offset };
            out.push(WindowPlacement {
                band,
                row_start,
                row_end: row_start + h,
                col_start: col_lo,
                col_end: col_hi,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geom(w: usize, h: usize, sx: usize, sy: usize) -> SlitGeometry {
        SlitGeometry {
            width_px: w,
            height_px: h,
            step_px_x: sx,
            step_px_y: sy,
        }
    }

    #[test]
    fn physical_sizes_round_to_cells() {
        let g = SlitGeometry::from_config(&SfmaConfig::default(), [0.0034, 0.0005]);
        // 0.026 / 0.0034 = 7.65, 0.008 / 0.0005 = 16, 0.013 / 0.0034 = 3.82, 0.001 / 0.0005 = 2
        assert_eq!(g, geom(8, 16, 4, 2));
    }

    #[test]
    fn strides_never_collapse_to_zero() {
        let cfg = SfmaConfig {
            slit_step_x: 1e-9,
            slit_step_y: 1e-9,
            ..SfmaConfig::default()
        };
        let g = SlitGeometry::from_config(&cfg, [1.0, 1.0]);
        assert_eq!((g.step_px_x, g.step_px_y), (1, 1));
    }

    #[test]
    fn bands_start_off_grid_and_clip() {
        let p = placements(&geom(3, 2, 2, 1), 4, 5);
        let bands: Vec<(usize, usize, usize)> = p
            .iter()
            .filter(|w| w.row_start == 0)
            .map(|w| (w.band, w.col_start, w.col_end))
            .collect();
        // starts -3 (clips to nothing), -1, 1, 3
        assert_eq!(bands, vec![(1, 0, 2), (2, 1, 4), (3, 3, 5)]);
    }

    #[test]
    fn serpentine_row_order() {
        let p = placements(&geom(2, 2, 2, 1), 5, 4);
        let rows_of = |band: usize| -> Vec<usize> {
            p.iter()
                .filter(|w| w.band == band)
                .map(|w| w.row_start)
                .collect()
        };
        // band 0 starts at -2 and is skipped, but still counts for parity.
        assert!(rows_of(0).is_empty());
        assert_eq!(rows_of(1), vec![3, 2, 1, 0]);
        assert_eq!(rows_of(2), vec![0, 1, 2, 3]);
        assert!(rows_of(3).is_empty());
    }

    #[test]
    fn strided_sweeps_keep_their_anchor() {
        // starts -1 (band 0, clipped away), 0 (band 1), 1 (band 2)
        let p = placements(&geom(1, 2, 1, 2), 5, 2);
        let rows_of = |band: usize| -> Vec<usize> {
            p.iter()
                .filter(|w| w.band == band)
                .map(|w| w.row_start)
                .collect()
        };
        // stride 2 over last = 3 misses the far end; a flush stop closes it
        assert_eq!(rows_of(1), vec![3, 1, 0]);
        assert_eq!(rows_of(2), vec![0, 2, 3]);
    }

    fn uncovered(g: &SlitGeometry, rows: usize, cols: usize) -> Vec<(usize, usize)> {
        let mut hit = vec![false; rows * cols];
        for w in placements(g, rows, cols) {
            assert!(w.row_end <= rows && w.col_end <= cols);
            for r in w.row_start..w.row_end {
                for c in w.col_start..w.col_end {
                    hit[r * cols + c] = true;
                }
            }
        }
        (0..rows)
            .flat_map(|r| (0..cols).map(move |c| (r, c)))
            .filter(|&(r, c)| !hit[r * cols + c])
            .collect()
    }

    #[test]
    fn every_cell_is_covered_with_unit_strides() {
        assert!(uncovered(&geom(3, 4, 1, 1), 7, 9).is_empty());
    }

    #[test]
    fn every_cell_is_covered_when_stride_misses_the_far_end() {
        // (11 - 4) % 4 = 3 and (13 - 3) % 3 = 1
        assert!(uncovered(&geom(4, 4, 4, 4), 11, 8).is_empty());
        assert!(uncovered(&geom(3, 3, 2, 3), 13, 7).is_empty());
    }

    #[test]
    fn closing_stop_keeps_serpentine_direction() {
        let p = placements(&geom(4, 4, 4, 4), 11, 8);
        let rows_of = |band: usize| -> Vec<usize> {
            p.iter()
                .filter(|w| w.band == band)
                .map(|w| w.row_start)
                .collect()
        };
        // band starts -4, 0, 4
        assert!(rows_of(0).is_empty());
        assert_eq!(rows_of(1), vec![7, 3, 0]);
        assert_eq!(rows_of(2), vec![0, 4, 7]);
    }

    #[test]
    fn slit_taller_than_grid_has_no_stops() {
        assert!(placements(&geom(2, 10, 1, 1), 4, 4).is_empty());
    }
}
