//! surfgrid — surface-quality metrics from optical-profiler height scans.
//!
//! A scan is a list of index-addressed height samples. The pipeline stages
//! are:
//!
//! 1. **Scan** – header and data-line decoding, `No` samples kept as missing.
//! 2. **Grid** – index → physical coordinates, uniform-step binning.
//! 3. **Plane** – least-squares plane removal; global PV.
//! 4. **NCE** – per-exposure-field plane removal.
//! 5. **SFMA** – serpentine slit sweep with local plane removal and overlap
//!    averaging.
//! 6. **Tilt** – local slope with edge and corner fallbacks.
//! 7. **Metrics** – `median + 3σ` reductions, clipped for NCE.
//!
//! # Public API
//! - [`SurfaceAnalyzer`] as the primary entry point
//! - [`AnalysisConfig`] for tuning
//! - [`HeatmapSink`] for consuming the rendered views
//! - stage functions for callers that run parts of the pipeline

mod api;
mod config;
mod error;
pub mod grid;
pub mod metrics;
pub mod nce;
mod pipeline;
pub mod plane;
mod render;
pub mod scan;
pub mod sfma;
pub mod tilt;

#[cfg(test)]
pub(crate) mod test_utils;

pub use api::SurfaceAnalyzer;
pub use config::{
    AnalysisConfig, GridConfig, NceConfig, ReportConfig, SfmaConfig, FALLBACK_HEADER_SCALE,
};
pub use error::ScanError;
pub use metrics::{SigmaStat, SurfaceMetrics};
pub use pipeline::{
    analyze_grid, analyze_samples, build_views, emit_views, process_scan_file, sibling_path,
    write_map_artifacts, GridSummary, SurfaceReport,
};
pub use render::{CollectingSink, HeatmapSink, HeatmapView, ViewKind};
pub use scan::{Height, RawSample, ScanData, ScanHeader};
