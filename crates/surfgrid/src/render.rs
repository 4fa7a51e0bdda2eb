//! Views handed to an external heatmap renderer.
//!
//! The pipeline does not draw anything. It describes each map as a
//! [`HeatmapView`] and passes it to a [`HeatmapSink`].

use serde::{Deserialize, Serialize};

use crate::nce::FieldGrid;

/// Which map a view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
    Residual,
    Nce,
    Sfma,
    Tilt,
    HighTilt,
    HighSfma,
}

impl ViewKind {
    /// Emission order used by the pipeline.
    pub const ALL: [ViewKind; 6] = [
        Self::Residual,
        Self::Nce,
        Self::Sfma,
        Self::Tilt,
        Self::HighTilt,
        Self::HighSfma,
    ];

    /// Stable short name, used for file names.
    pub fn name(self) -> &'static str {
        match self {
            Self::Residual => "residual",
            Self::Nce => "nce",
            Self::Sfma => "sfma",
            Self::Tilt => "tilt",
            Self::HighTilt => "tilt-high",
            Self::HighSfma => "sfma-high",
        }
    }

    /// Scatter views show a thresholded subset rather than a full map.
    pub fn is_scatter(self) -> bool {
        matches!(self, Self::HighTilt | Self::HighSfma)
    }
}

/// One map ready to render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeatmapView {
    pub kind: ViewKind,
    /// Scalar shown in the title (the map's metric).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<f64>,
    /// Defined cells as `[x, y, value]`.
    pub points: Vec<[f64; 3]>,
    /// Grid lines drawn over the map.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlay: Option<FieldGrid>,
    /// Selection threshold for scatter views.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
}

impl HeatmapView {
    pub fn new(kind: ViewKind, metric: Option<f64>, points: Vec<[f64; 3]>) -> Self {
        Self {
            kind,
            metric,
            points,
            overlay: None,
            threshold: None,
        }
    }

    pub fn with_overlay(mut self, overlay: FieldGrid) -> Self {
        self.overlay = Some(overlay);
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }
}

/// Consumer of rendered views. Errors are reported back to the pipeline,
/// which logs them and carries on.
pub trait HeatmapSink {
    fn render(&mut self, view: &HeatmapView) -> Result<(), Box<dyn std::error::Error>>;
}

/// Sink that keeps every view in memory.
#[derive(Debug, Clone, Default)]
pub struct CollectingSink {
    pub views: Vec<HeatmapView>,
}

impl HeatmapSink for CollectingSink {
    fn render(&mut self, view: &HeatmapView) -> Result<(), Box<dyn std::error::Error>> {
        self.views.push(view.clone());
        Ok(())
    }
}
