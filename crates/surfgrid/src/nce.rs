//! Non-correctable error: per-field plane removal.
//!
//! The surface is tiled into exposure fields. Every sufficiently populated
//! field gets its own best-fit plane removed; what remains (mostly the steps
//! between fields) is the error a per-field correction cannot take out.

use serde::{Deserialize, Serialize};

use crate::config::NceConfig;
use crate::metrics::median;
use crate::plane::fit_plane;

/// Field boundary lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldGrid {
    pub x_edges: Vec<f64>,
    pub y_edges: Vec<f64>,
}

impl FieldGrid {
    /// Number of fields along X and Y.
    pub fn shape(&self) -> (usize, usize) {
        (
            self.x_edges.len().saturating_sub(1),
            self.y_edges.len().saturating_sub(1),
        )
    }

    /// Field `(ix, iy)` holding `(x, y)` under `[start, end)` membership.
    pub fn locate(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        Some((interval_index(&self.x_edges, x)?, interval_index(&self.y_edges, y)?))
    }
}

fn interval_index(edges: &[f64], v: f64) -> Option<usize> {
    let above = edges.partition_point(|&e| e <= v);
    (above >= 1 && above < edges.len()).then(|| above - 1)
}

fn edges(start: f64, size: f64, n: usize) -> Vec<f64> {
    (0..=n).map(|i| start + i as f64 * size).collect()
}

/// Median gap between sorted distinct values; `None` with fewer than two.
pub fn native_spacing(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let mut sorted: Vec<f64> = values.into_iter().collect();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup();
    let gaps: Vec<f64> = sorted.windows(2).map(|w| w[1] - w[0]).collect();
    median(&gaps)
}

/// Output of [`partition_fields`].
#[derive(Debug, Clone)]
pub struct NceResult {
    /// Per-point residual in input order; `None` outside fitted fields.
    pub residuals: Vec<Option<f64>>,
    pub fields: FieldGrid,
    /// Member count a field must exceed to be fitted.
    pub min_points: usize,
    pub fields_fitted: usize,
    pub fields_skipped: usize,
    pub fields_degenerate: usize,
}

impl NceResult {
    /// Defined residuals, input order.
    pub fn values(&self) -> Vec<f64> {
        self.residuals.iter().flatten().copied().collect()
    }

    /// `[x, y, residual]` for points with a defined residual.
    pub fn points(&self, points: &[[f64; 3]]) -> Vec<[f64; 3]> {
        points
            .iter()
            .zip(&self.residuals)
            .filter_map(|(p, r)| r.map(|r| [p[0], p[1], r]))
            .collect()
    }
}

/// Member-count threshold: the configured floor, or the fill fraction of a
/// fully populated field when that is larger.
fn min_field_points(points: &[[f64; 3]], config: &NceConfig) -> usize {
    let spacing = native_spacing(points.iter().map(|p| p[0]))
        .zip(native_spacing(points.iter().map(|p| p[1])));
    let expected = match spacing {
        Some((dx, dy)) if dx > 0.0 && dy > 0.0 => {
            config.field_size[0] * config.field_size[1] / (dx * dy)
        }
        _ => 0.0,
    };
    config
        .min_field_points
        .max((expected * config.min_fill_fraction) as usize)
}

/// Tile `points` into fields and remove a plane per field.
///
/// X edges start at `min_x + offset_x` and reach one field past the data; Y
/// edges start at `min_y` and stop at the last edge not below `max_y`, so
/// points on the final Y edge fall outside every field.
pub fn partition_fields(points: &[[f64; 3]], config: &NceConfig) -> NceResult {
    let mut residuals = vec![None; points.len()];
    if points.is_empty() {
        return NceResult {
            residuals,
            fields: FieldGrid::default(),
            min_points: config.min_field_points,
            fields_fitted: 0,
            fields_skipped: 0,
            fields_degenerate: 0,
        };
    }

    let (mut min_x, mut max_x) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut min_y, mut max_y) = (f64::INFINITY, f64::NEG_INFINITY);
    for p in points {
        min_x = min_x.min(p[0]);
        max_x = max_x.max(p[0]);
        min_y = min_y.min(p[1]);
        max_y = max_y.max(p[1]);
    }

    let [fx, fy] = config.field_size;
    let start_x = min_x + config.offset_x;
    let nx = (((max_x - start_x) / fx).ceil() + 1.0).max(0.0) as usize;
    let ny = ((max_y - min_y) / fy).ceil().max(0.0) as usize;
    let fields = FieldGrid {
        x_edges: edges(start_x, fx, nx),
        y_edges: edges(min_y, fy, ny),
    };
    let min_points = min_field_points(points, config);

    let mut members: Vec<Vec<usize>> = vec![Vec::new(); nx * ny];
    for (i, p) in points.iter().enumerate() {
        if let Some((ix, iy)) = fields.locate(p[0], p[1]) {
            members[iy * nx + ix].push(i);
        }
    }

    let mut fields_fitted = 0usize;
    let mut fields_skipped = 0usize;
    let mut fields_degenerate = 0usize;
    let mut support = Vec::new();
    for field in &members {
        if field.len() <= min_points {
            fields_skipped += 1;
            continue;
        }
        support.clear();
        support.extend(field.iter().map(|&i| points[i]));
        let Some(plane) = fit_plane(&support) else {
            fields_degenerate += 1;
            continue;
        };
        for &i in field {
            residuals[i] = Some(plane.residual(points[i]));
        }
        fields_fitted += 1;
    }

    tracing::debug!(
        nx,
        ny,
        min_points,
        fields_fitted,
        fields_skipped,
        fields_degenerate,
        "field partition finished"
    );

    NceResult {
        residuals,
        fields,
        min_points,
        fields_fitted,
        fields_skipped,
        fields_degenerate,
    }
}

/// Symmetric overlay grid around the origin, `cell` sized, wide enough to
/// cover the largest `|x|` and `|y|`.
pub fn display_grid(points: &[[f64; 3]], cell: [f64; 2]) -> FieldGrid {
    let reach = |axis: usize| points.iter().map(|p| p[axis].abs()).fold(0.0, f64::max);
    let symmetric = |extent: f64, size: f64| -> Vec<f64> {
        let n = (extent / size).ceil() as i64;
        (-n..=n).map(|i| i as f64 * size).collect()
    };
    FieldGrid {
        x_edges: symmetric(reach(0), cell[0]),
        y_edges: symmetric(reach(1), cell[1]),
    }
}
