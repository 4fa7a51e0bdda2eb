//! Pipeline configuration.
//!
//! All lengths are in meters. Thresholds are expressed in the unit of the map
//! they are applied to: meters for SFMA, microradians for tilt.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ScanError;

/// Lateral resolution used when the scan header does not carry a parseable
/// value.
pub const FALLBACK_HEADER_SCALE: f64 = 0.000_174_52;

/// Coordinate normalization and binning parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Physical size of one index unit (m).
    pub scale: f64,
    /// Bin size along X (m).
    pub step_x: f64,
    /// Bin size along Y (m).
    pub step_y: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            scale: 0.000_175,
            step_x: 0.0034,
            step_y: 0.0005,
        }
    }
}

/// Sliding slit (sub-aperture) parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SfmaConfig {
    /// Slit extent along X (m).
    pub slit_width: f64,
    /// Slit extent along Y (m).
    pub slit_height: f64,
    /// Advance between column bands (m).
    pub slit_step_x: f64,
    /// Advance between placements inside a band (m).
    pub slit_step_y: f64,
    /// Placements with fewer valid cells are not fitted.
    pub min_window_points: usize,
}

impl Default for SfmaConfig {
    fn default() -> Self {
        Self {
            slit_width: 0.026,
            slit_height: 0.008,
            slit_step_x: 0.013,
            slit_step_y: 0.001,
            min_window_points: 10,
        }
    }
}

/// Exposure-field tiling used for non-correctable error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NceConfig {
    /// Field size `[x, y]` (m).
    pub field_size: [f64; 2],
    /// Shift of the first X edge relative to the data minimum (m). Its magnitude
    /// must stay below `field_size[0]`.
    pub offset_x: f64,
    /// Lower bound on the member count a field needs to be fitted.
    pub min_field_points: usize,
    /// Fraction of a fully-populated field's expected count that must be present.
    pub min_fill_fraction: f64,
    /// Cell size `[x, y]` of the symmetric overlay drawn over the NCE view (m).
    pub display_field: [f64; 2],
}

impl Default for NceConfig {
    fn default() -> Self {
        Self {
            field_size: [0.026, 0.008],
            offset_x: 0.0,
            min_field_points: 10,
            min_fill_fraction: 0.1,
            display_field: [0.026, 0.033],
        }
    }
}

/// Reporting thresholds and artifact options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Reserved edge filter radius (m). Carried through, not applied.
    pub edge_clearance: f64,
    /// SFMA cells above this value (m) are reported as high-SFMA points.
    pub sfma_threshold: f64,
    /// Tilt cells above this value (µrad) are reported as high-tilt points.
    pub tilt_threshold: f64,
    /// Write `-residual`, `-nce`, `-sfma` and `-tilt` map files next to the
    /// processed artifact.
    pub write_map_artifacts: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            edge_clearance: 0.0,
            sfma_threshold: 7.5e-9,
            tilt_threshold: 3.0,
            write_map_artifacts: true,
        }
    }
}

/// Full pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub grid: GridConfig,
    pub sfma: SfmaConfig,
    pub nce: NceConfig,
    pub report: ReportConfig,
}

impl AnalysisConfig {
    /// Load a configuration from JSON. Missing keys take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every length is positive and finite.
    pub fn validate(&self) -> Result<(), ScanError> {
        let positive = [
            ("grid.scale", self.grid.scale),
            ("grid.step_x", self.grid.step_x),
            ("grid.step_y", self.grid.step_y),
            ("sfma.slit_width", self.sfma.slit_width),
            ("sfma.slit_height", self.sfma.slit_height),
            ("sfma.slit_step_x", self.sfma.slit_step_x),
            ("sfma.slit_step_y", self.sfma.slit_step_y),
            ("nce.field_size[0]", self.nce.field_size[0]),
            ("nce.field_size[1]", self.nce.field_size[1]),
            ("nce.display_field[0]", self.nce.display_field[0]),
            ("nce.display_field[1]", self.nce.display_field[1]),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ScanError::InvalidConfig(format!(
                    "{} must be positive and finite, got {}",
                    name, value
                )));
            }
        }
        if !(self.nce.offset_x.is_finite()
            && self.nce.offset_x.abs() < self.nce.field_size[0])
        {
            return Err(ScanError::InvalidConfig(format!(
                "nce.offset_x must be finite and smaller than one field width, got {}",
                self.nce.offset_x
            )));
        }
        if !(0.0..=1.0).contains(&self.nce.min_fill_fraction) {
            return Err(ScanError::InvalidConfig(format!(
                "nce.min_fill_fraction must be in [0, 1], got {}",
                self.nce.min_fill_fraction
            )));
        }
        if !(self.report.edge_clearance.is_finite() && self.report.edge_clearance >= 0.0) {
            return Err(ScanError::InvalidConfig(format!(
                "report.edge_clearance must be non-negative, got {}",
                self.report.edge_clearance
            )));
        }
        Ok(())
    }
}
