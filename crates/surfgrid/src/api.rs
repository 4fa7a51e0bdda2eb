//! High-level analysis API.
//!
//! [`SurfaceAnalyzer`] is the primary entry point. It wraps an
//! [`AnalysisConfig`] and runs the full pipeline on scan files or on samples
//! that were decoded elsewhere.

use std::path::Path;

use crate::config::AnalysisConfig;
use crate::error::ScanError;
use crate::pipeline::{self, SurfaceReport};
use crate::render::HeatmapSink;
use crate::scan::RawSample;

/// Primary analysis interface.
///
/// Create once, process many scans.
///
/// # Examples
///
/// ```no_run
/// use surfgrid::SurfaceAnalyzer;
/// use std::path::Path;
///
/// let analyzer = SurfaceAnalyzer::new();
/// match analyzer.process_file(Path::new("scan.xyz"), Path::new("scan-processed.txt")) {
///     Ok(Some(report)) => println!("{:?}", report.metric_map()),
///     Ok(None) => println!("no valid samples"),
///     Err(e) => eprintln!("{}", e),
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct SurfaceAnalyzer {
    config: AnalysisConfig,
}

impl SurfaceAnalyzer {
    /// Analyzer with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with full config control.
    pub fn with_config(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Load a JSON configuration and create an analyzer in one step.
    pub fn from_config_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self::with_config(AnalysisConfig::from_json_file(path)?))
    }

    /// Access the current configuration.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Mutable access to configuration for post-construction tuning.
    pub fn config_mut(&mut self) -> &mut AnalysisConfig {
        &mut self.config
    }

    /// Analyze decoded samples without touching the filesystem.
    pub fn analyze_samples(
        &self,
        samples: &[RawSample],
    ) -> Result<Option<SurfaceReport>, ScanError> {
        pipeline::analyze_samples(samples, &self.config)
    }

    /// Process a scan file and write the processed artifact to `output`.
    pub fn process_file(
        &self,
        input: &Path,
        output: &Path,
    ) -> Result<Option<SurfaceReport>, ScanError> {
        pipeline::process_scan_file(input, output, &self.config, None)
    }

    /// Like [`process_file`](Self::process_file), handing every view to `sink`.
    pub fn process_file_with_sink(
        &self,
        input: &Path,
        output: &Path,
        sink: &mut dyn HeatmapSink,
    ) -> Result<Option<SurfaceReport>, ScanError> {
        pipeline::process_scan_file(input, output, &self.config, Some(sink))
    }
}
