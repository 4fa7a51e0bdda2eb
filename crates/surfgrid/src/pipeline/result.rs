use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::grid::{BinnedGrid, HeightMap, ScanCenter};
use crate::metrics::SurfaceMetrics;
use crate::nce::{FieldGrid, NceResult};
use crate::plane::FormRemoval;
use crate::sfma::SfmaResult;
use crate::tilt::TiltResult;

/// Shape and placement of the binned grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSummary {
    pub rows: usize,
    pub cols: usize,
    /// Valid samples that went into the bins.
    pub n_samples: usize,
    /// Populated bins.
    pub n_bins: usize,
    /// Index-space center used for normalization.
    pub center: ScanCenter,
    /// Physical coordinate of bin `(0, 0)`.
    pub origin: [f64; 2],
    pub step: [f64; 2],
}

impl GridSummary {
    pub fn from_grid(grid: &BinnedGrid) -> Self {
        Self {
            rows: grid.rows(),
            cols: grid.cols(),
            n_samples: grid.n_samples(),
            n_bins: grid.n_bins(),
            center: grid.center(),
            origin: [grid.x_axis().coord(0), grid.y_axis().coord(0)],
            step: [grid.x_axis().step, grid.y_axis().step],
        }
    }
}

/// Everything one analysis run produces.
#[derive(Debug, Clone)]
pub struct SurfaceReport {
    pub metrics: SurfaceMetrics,
    pub grid: GridSummary,
    /// Binned `[x, y, z]` points, row-major; the processed artifact content.
    pub points: Vec<[f64; 3]>,
    /// Binned heights on the dense lattice.
    pub heights: HeightMap,
    /// Global plane removal; absent when the grid admits no plane.
    pub form: Option<FormRemoval>,
    /// Slit-averaged residual, computed from the global residual.
    pub sfma: Option<SfmaResult>,
    /// Local slope of the global residual.
    pub tilt: Option<TiltResult>,
    /// Per-field residual over [`points`](Self::points).
    pub nce: NceResult,
    /// Overlay drawn over the NCE view.
    pub nce_display: FieldGrid,
    /// Tilt cells above the tilt threshold, `[x, y, µrad]`.
    pub high_tilt: Vec<[f64; 3]>,
    /// SFMA cells above the SFMA threshold, `[x, y, m]`.
    pub high_sfma: Vec<[f64; 3]>,
}

impl SurfaceReport {
    /// Metric name → scalar.
    pub fn metric_map(&self) -> BTreeMap<&'static str, f64> {
        self.metrics.as_map()
    }

    /// Defined cells of the global residual.
    pub fn residual_points(&self) -> Vec<[f64; 3]> {
        self.form
            .as_ref()
            .map(|f| f.residual.points())
            .unwrap_or_default()
    }

    pub fn nce_points(&self) -> Vec<[f64; 3]> {
        self.nce.points(&self.points)
    }

    pub fn sfma_points(&self) -> Vec<[f64; 3]> {
        self.sfma
            .as_ref()
            .map(|s| s.map.points())
            .unwrap_or_default()
    }

    pub fn tilt_points(&self) -> Vec<[f64; 3]> {
        self.tilt
            .as_ref()
            .map(|t| t.magnitude.points())
            .unwrap_or_default()
    }
}
