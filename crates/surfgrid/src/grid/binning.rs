//! Index → physical coordinate conversion and uniform-step binning.

use serde::{Deserialize, Serialize};

use super::{round_half_even, HeightMap};
use crate::config::GridConfig;
use crate::error::ScanError;
use crate::scan::RawSample;

/// Midpoint of the valid index range, in index units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanCenter {
    pub x: f64,
    pub y: f64,
}

/// Convert valid samples to physical `[x, y, z]` meters.
///
/// Missing samples are dropped before the index range is measured. The Y axis
/// is flipped so that increasing index rows map to decreasing `y`.
pub fn normalize_samples(
    samples: &[RawSample],
    scale: f64,
) -> Result<(ScanCenter, Vec<[f64; 3]>), ScanError> {
    let valid: Vec<(i64, i64, f64)> = samples
        .iter()
        .filter_map(|s| s.height.value().map(|h| (s.index_x, s.index_y, h)))
        .collect();
    if valid.is_empty() {
        return Err(ScanError::EmptyInput);
    }

    let (mut min_ix, mut max_ix) = (i64::MAX, i64::MIN);
    let (mut min_iy, mut max_iy) = (i64::MAX, i64::MIN);
    for &(ix, iy, _) in &valid {
        min_ix = min_ix.min(ix);
        max_ix = max_ix.max(ix);
        min_iy = min_iy.min(iy);
        max_iy = max_iy.max(iy);
    }
    let center = ScanCenter {
        x: (min_ix as f64 + max_ix as f64) / 2.0,
        y: (min_iy as f64 + max_iy as f64) / 2.0,
    };

    let points = valid
        .into_iter()
        .map(|(ix, iy, z_um)| {
            [
                (ix as f64 - center.x) * scale,
                (center.y - iy as f64) * scale,
                z_um * 1e-6,
            ]
        })
        .collect();
    Ok((center, points))
}

/// One axis of the bin lattice.
///
/// Bin `k` sits at `start + k * step`; only `k` in `min_k..min_k + len` is
/// populated by at least one bin somewhere along the other axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridAxis {
    /// `floor(min_coord / step) * step`.
    pub start: f64,
    pub step: f64,
    pub min_k: i64,
    pub len: usize,
}

impl GridAxis {
    fn from_coords(coords: impl Iterator<Item = f64> + Clone, step: f64) -> Self {
        let min = coords.clone().fold(f64::INFINITY, f64::min);
        let start = (min / step).floor() * step;
        let (mut min_k, mut max_k) = (i64::MAX, i64::MIN);
        for c in coords {
            let k = Self::key(start, step, c);
            min_k = min_k.min(k);
            max_k = max_k.max(k);
        }
        Self {
            start,
            step,
            min_k,
            len: (max_k - min_k + 1) as usize,
        }
    }

    fn key(start: f64, step: f64, coord: f64) -> i64 {
        round_half_even((coord - start) / step) as i64
    }

    /// Dense index of `coord`'s bin.
    fn index_of(&self, coord: f64) -> usize {
        (Self::key(self.start, self.step, coord) - self.min_k) as usize
    }

    /// Physical coordinate of dense index `i`.
    pub fn coord(&self, i: usize) -> f64 {
        self.start + (self.min_k + i as i64) as f64 * self.step
    }
}

/// Uniform grid of averaged heights.
#[derive(Debug, Clone, PartialEq)]
pub struct BinnedGrid {
    center: ScanCenter,
    x: GridAxis,
    y: GridAxis,
    sums: Vec<f64>,
    counts: Vec<u32>,
    n_samples: usize,
}

/// Normalize samples and accumulate them into `config.step_x × config.step_y`
/// bins.
pub fn bin_samples(samples: &[RawSample], config: &GridConfig) -> Result<BinnedGrid, ScanError> {
    let (center, points) = normalize_samples(samples, config.scale)?;

    let x = GridAxis::from_coords(points.iter().map(|p| p[0]), config.step_x);
    let y = GridAxis::from_coords(points.iter().map(|p| p[1]), config.step_y);

    let mut sums = vec![0.0f64; x.len * y.len];
    let mut counts = vec![0u32; x.len * y.len];
    for p in &points {
        let idx = y.index_of(p[1]) * x.len + x.index_of(p[0]);
        sums[idx] += p[2];
        counts[idx] += 1;
    }

    let grid = BinnedGrid {
        center,
        x,
        y,
        sums,
        counts,
        n_samples: points.len(),
    };
    tracing::info!(
        "binned {} samples into {} bins ({}x{} grid, center index ({:.1}, {:.1}))",
        grid.n_samples,
        grid.n_bins(),
        grid.rows(),
        grid.cols(),
        center.x,
        center.y
    );
    Ok(grid)
}

impl BinnedGrid {
    pub fn center(&self) -> ScanCenter {
        self.center
    }

    pub fn x_axis(&self) -> &GridAxis {
        &self.x
    }

    pub fn y_axis(&self) -> &GridAxis {
        &self.y
    }

    pub fn rows(&self) -> usize {
        self.y.len
    }

    pub fn cols(&self) -> usize {
        self.x.len
    }

    /// Number of valid samples that were binned.
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    /// Number of populated bins.
    pub fn n_bins(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    /// Samples accumulated in bin `(row, col)`.
    pub fn count(&self, row: usize, col: usize) -> u32 {
        self.counts[row * self.x.len + col]
    }

    /// Mean height of bin `(row, col)`, `None` when nothing landed there.
    pub fn value(&self, row: usize, col: usize) -> Option<f64> {
        let idx = row * self.x.len + col;
        (self.counts[idx] > 0).then(|| self.sums[idx] / self.counts[idx] as f64)
    }

    /// Populated bins as `[x, y, z]`, row-major (row ascending, then column).
    pub fn points(&self) -> Vec<[f64; 3]> {
        let mut out = Vec::with_capacity(self.n_bins());
        for row in 0..self.rows() {
            for col in 0..self.cols() {
                if let Some(z) = self.value(row, col) {
                    out.push([self.x.coord(col), self.y.coord(row), z]);
                }
            }
        }
        out
    }

    /// Dense view of the bin means; empty bins stay undefined.
    pub fn to_height_map(&self) -> HeightMap {
        let xs = (0..self.cols()).map(|i| self.x.coord(i)).collect();
        let ys = (0..self.rows()).map(|i| self.y.coord(i)).collect();
        let mut map = HeightMap::with_axes(xs, ys, [self.x.step, self.y.step]);
        for row in 0..self.rows() {
            for col in 0..self.cols() {
                map.set(row, col, self.value(row, col));
            }
        }
        map
    }
}
