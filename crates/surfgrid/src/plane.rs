//! Least-squares plane fitting and detrending.
//!
//! The fit is ordinary least squares on `z = a·x + b·y + c`. Coordinates are
//! normalized (centroid shift, isotropic scale so the mean distance from the
//! centroid is √2) before the normal equations are formed, which keeps the
//! system well conditioned for meter-scale lateral coordinates and
//! nanometer-scale residuals.

use nalgebra::{Matrix3, SymmetricEigen, Vector3};
use serde::{Deserialize, Serialize};

use crate::grid::HeightMap;
use crate::metrics::peak_to_valley;

/// Smallest accepted ratio between the extreme eigenvalues of the normalized
/// normal matrix. Collinear or coincident supports fall below it.
const MIN_EIGEN_RATIO: f64 = 1e-10;

/// Fitted plane, stored around the centroid of its support.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneFit {
    /// ∂z/∂x.
    pub slope_x: f64,
    /// ∂z/∂y.
    pub slope_y: f64,
    /// Centroid `[x, y]` of the support points.
    pub centroid: [f64; 2],
    /// Plane height at the centroid.
    pub level: f64,
}

impl PlaneFit {
    /// Plane height at `(x, y)`.
    pub fn eval(&self, x: f64, y: f64) -> f64 {
        self.level + self.slope_x * (x - self.centroid[0]) + self.slope_y * (y - self.centroid[1])
    }

    /// Constant term `c` of `z = a·x + b·y + c`.
    pub fn offset(&self) -> f64 {
        self.level - self.slope_x * self.centroid[0] - self.slope_y * self.centroid[1]
    }

    /// `z − plane(x, y)`.
    pub fn residual(&self, p: [f64; 3]) -> f64 {
        p[2] - self.eval(p[0], p[1])
    }
}

/// Normalization parameters for a point set: (mean_x, mean_y, mean_z, scale).
fn normalization_params(points: &[[f64; 3]]) -> Option<(f64, f64, f64, f64)> {
    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| p[0]).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| p[1]).sum::<f64>() / n;
    let mean_z = points.iter().map(|p| p[2]).sum::<f64>() / n;

    let mean_dist = points
        .iter()
        .map(|p| ((p[0] - mean_x).powi(2) + (p[1] - mean_y).powi(2)).sqrt())
        .sum::<f64>()
        / n;
    if !(mean_dist > 1e-15) {
        return None;
    }
    Some((mean_x, mean_y, mean_z, std::f64::consts::SQRT_2 / mean_dist))
}

/// Fit `z = a·x + b·y + c` to `points`.
///
/// Returns `None` with fewer than 3 points, when the support is collinear or
/// coincident, or when the solution is not finite.
pub fn fit_plane(points: &[[f64; 3]]) -> Option<PlaneFit> {
    if points.len() < 3 {
        return None;
    }
    let (mx, my, mz, s) = normalization_params(points)?;

    let mut ata = Matrix3::<f64>::zeros();
    let mut atz = Vector3::<f64>::zeros();
    for p in points {
        let row = Vector3::new((p[0] - mx) * s, (p[1] - my) * s, 1.0);
        ata += row * row.transpose();
        atz += row * (p[2] - mz);
    }

    let eig = SymmetricEigen::new(ata);
    let max_eig = eig.eigenvalues.max();
    let min_eig = eig.eigenvalues.min();
    if !(max_eig > 0.0 && min_eig > max_eig * MIN_EIGEN_RATIO) {
        return None;
    }

    let sol = ata.cholesky()?.solve(&atz);
    let fit = PlaneFit {
        slope_x: sol[0] * s,
        slope_y: sol[1] * s,
        centroid: [mx, my],
        // Normalized coordinates are centered, so sol[2] is the mean residual
        // of the centered heights.
        level: mz + sol[2],
    };
    (fit.slope_x.is_finite() && fit.slope_y.is_finite() && fit.level.is_finite()).then_some(fit)
}

/// Fit a plane and return it with the per-point residuals (input order).
pub fn detrend(points: &[[f64; 3]]) -> Option<(PlaneFit, Vec<f64>)> {
    let plane = fit_plane(points)?;
    let residuals = points.iter().map(|&p| plane.residual(p)).collect();
    Some((plane, residuals))
}

/// Global first-order form removal over a height map.
#[derive(Debug, Clone)]
pub struct FormRemoval {
    pub plane: PlaneFit,
    /// Same lattice as the input; defined exactly where the input is.
    pub residual: HeightMap,
    /// `max − min` of the residual.
    pub pv: f64,
}

/// Remove the best-fit plane from every defined cell of `map`.
pub fn remove_form(map: &HeightMap) -> Option<FormRemoval> {
    let points = map.points();
    let plane = fit_plane(&points)?;
    let residual = map.map_defined(|r, c, z| Some(plane.residual([map.x_at(c), map.y_at(r), z])));
    let pv = peak_to_valley(&residual.values())?;
    Some(FormRemoval {
        plane,
        residual,
        pv,
    })
}
