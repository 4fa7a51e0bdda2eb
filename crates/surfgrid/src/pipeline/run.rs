//! Top-level orchestrator: bin → {form, NCE, SFMA, tilt} → metrics → views.

use std::path::Path;

use super::export::write_map_artifacts;
use super::result::{GridSummary, SurfaceReport};
use crate::config::AnalysisConfig;
use crate::error::ScanError;
use crate::grid::{bin_samples, write_xyz_file, BinnedGrid, HeightMap};
use crate::metrics::SurfaceMetrics;
use crate::nce::{display_grid, partition_fields};
use crate::plane::remove_form;
use crate::render::{HeatmapSink, HeatmapView, ViewKind};
use crate::scan::{read_scan_file, RawSample};
use crate::sfma::simulate_sfma;
use crate::tilt::estimate_tilt;

fn above_threshold(map: Option<&HeightMap>, threshold: f64) -> Vec<[f64; 3]> {
    map.map(|m| {
        m.points()
            .into_iter()
            .filter(|p| p[2] > threshold)
            .collect()
    })
    .unwrap_or_default()
}

/// Run every analysis stage on a binned grid.
pub fn analyze_grid(grid: &BinnedGrid, config: &AnalysisConfig) -> SurfaceReport {
    let heights = grid.to_height_map();
    let points = grid.points();

    let form = remove_form(&heights);
    if form.is_none() {
        tracing::warn!(
            "no global plane fit over {} bins; pv, sfma and tilt are unavailable",
            points.len()
        );
    }

    let nce = partition_fields(&points, &config.nce);
    let nce_display = display_grid(&points, config.nce.display_field);

    let sfma = form.as_ref().map(|f| simulate_sfma(&f.residual, &config.sfma));
    let tilt = form.as_ref().map(|f| estimate_tilt(&f.residual));

    let residual_values = form
        .as_ref()
        .map(|f| f.residual.values())
        .unwrap_or_default();
    let sfma_values = sfma.as_ref().map(|s| s.map.values()).unwrap_or_default();
    let tilt_values = tilt
        .as_ref()
        .map(|t| t.magnitude.values())
        .unwrap_or_default();
    let metrics = SurfaceMetrics::from_maps(
        &residual_values,
        &nce.values(),
        &sfma_values,
        &tilt_values,
    );

    for (name, available) in [
        ("nce", metrics.nce.is_some()),
        ("sfma", metrics.sfma.is_some()),
        ("tilt", metrics.tilt.is_some()),
    ] {
        if !available && form.is_some() {
            tracing::warn!("{} map has no defined cells", name);
        }
    }

    let high_tilt = above_threshold(
        tilt.as_ref().map(|t| &t.magnitude),
        config.report.tilt_threshold,
    );
    let high_sfma = above_threshold(
        sfma.as_ref().map(|s| &s.map),
        config.report.sfma_threshold,
    );

    SurfaceReport {
        metrics,
        grid: GridSummary::from_grid(grid),
        points,
        heights,
        form,
        sfma,
        tilt,
        nce,
        nce_display,
        high_tilt,
        high_sfma,
    }
}

/// Bin raw samples and analyze them. `Ok(None)` when no sample is valid.
pub fn analyze_samples(
    samples: &[RawSample],
    config: &AnalysisConfig,
) -> Result<Option<SurfaceReport>, ScanError> {
    config.validate()?;
    let grid = match bin_samples(samples, &config.grid) {
        Ok(grid) => grid,
        Err(ScanError::EmptyInput) => {
            tracing::warn!("no valid samples in the data section");
            return Ok(None);
        }
        Err(e) => return Err(e),
    };
    Ok(Some(analyze_grid(&grid, config)))
}

/// Build the six views in emission order.
pub fn build_views(report: &SurfaceReport, config: &AnalysisConfig) -> Vec<HeatmapView> {
    let m = &report.metrics;
    ViewKind::ALL
        .iter()
        .map(|&kind| {
            let (metric, points, threshold) = match kind {
                ViewKind::Residual => (m.pv, report.residual_points(), 0.0),
                ViewKind::Nce => (m.nce, report.nce_points(), 0.0),
                ViewKind::Sfma => (m.sfma, report.sfma_points(), 0.0),
                ViewKind::Tilt => (m.tilt, report.tilt_points(), 0.0),
                ViewKind::HighTilt => (
                    m.tilt,
                    report.high_tilt.clone(),
                    config.report.tilt_threshold,
                ),
                ViewKind::HighSfma => (
                    m.sfma,
                    report.high_sfma.clone(),
                    config.report.sfma_threshold,
                ),
            };
            let mut view = HeatmapView::new(kind, metric, points);
            if kind == ViewKind::Nce {
                view = view.with_overlay(report.nce_display.clone());
            }
            if kind.is_scatter() {
                view = view.with_threshold(threshold);
            }
            view
        })
        .collect()
}

/// Hand every view to `sink`. Failures are logged; the count of views the
/// sink accepted is returned.
pub fn emit_views(
    report: &SurfaceReport,
    config: &AnalysisConfig,
    sink: &mut dyn HeatmapSink,
) -> usize {
    let mut accepted = 0usize;
    for view in build_views(report, config) {
        match sink.render(&view) {
            Ok(()) => accepted += 1,
            Err(e) => tracing::warn!("rendering the {} view failed: {}", view.kind.name(), e),
        }
    }
    accepted
}

/// Process one scan file end to end.
///
/// Writes the binned `x y z` artifact to `output` (and the sibling map files
/// when enabled), then hands the views to `sink`. Returns `Ok(None)` without
/// writing anything when the scan holds no valid sample.
pub fn process_scan_file(
    input: &Path,
    output: &Path,
    config: &AnalysisConfig,
    sink: Option<&mut dyn HeatmapSink>,
) -> Result<Option<SurfaceReport>, ScanError> {
    config.validate()?;
    if config.report.edge_clearance > 0.0 {
        tracing::info!(
            "edge clearance {} m is reserved and not applied",
            config.report.edge_clearance
        );
    }

    let scan = read_scan_file(input)?;
    tracing::info!(
        "read {} samples ({} valid) from {}",
        scan.samples.len(),
        scan.n_valid(),
        input.display()
    );

    let Some(report) = analyze_samples(&scan.samples, config)? else {
        return Ok(None);
    };

    write_xyz_file(output, &report.points)?;
    tracing::info!("wrote {} bins to {}", report.points.len(), output.display());

    if config.report.write_map_artifacts {
        write_map_artifacts(output, &report)?;
    }
    if let Some(sink) = sink {
        emit_views(&report, config, sink);
    }

    let m = &report.metrics;
    tracing::info!(
        pv = ?m.pv,
        nce = ?m.nce,
        sfma = ?m.sfma,
        tilt = ?m.tilt,
        "surface metrics"
    );
    Ok(Some(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GridConfig, SfmaConfig};
    use crate::render::CollectingSink;
    use crate::test_utils::{scan_text, temp_path};
    use approx::assert_abs_diff_eq;

    /// 100 µm index pitch binned at `step`.
    fn config_with_step(step: f64) -> AnalysisConfig {
        let mut cfg = AnalysisConfig::default();
        cfg.grid = GridConfig {
            scale: 1e-4,
            step_x: step,
            step_y: step,
        };
        cfg.report.write_map_artifacts = false;
        cfg
    }

    fn write_input(text: &str) -> std::path::PathBuf {
        let path = temp_path("input", "xyz");
        std::fs::write(&path, text).expect("write input");
        path
    }

    fn grid_samples(n: i64, height: impl Fn(i64, i64) -> f64) -> Vec<RawSample> {
        (0..n)
            .flat_map(|iy| (0..n).map(move |ix| (ix, iy)))
            .map(|(ix, iy)| RawSample::present(ix, iy, height(ix, iy)))
            .collect()
    }

    #[test]
    fn exact_plane_has_zero_form_error() {
        let input = write_input(&scan_text(10, 10, 1e-4, |ix, iy| {
            Some(2.0 * ix as f64 + 3.0 * iy as f64)
        }));
        let output = temp_path("plane", "txt");
        // Half-pitch bins keep the half-integer center off the rounding ties;
        // at step = scale every key is a tie and ties-to-even merges bins.
        let cfg = config_with_step(5e-5);

        let report = process_scan_file(&input, &output, &cfg, None)
            .expect("io ok")
            .expect("valid samples");
        assert_eq!(report.grid.n_bins, 100);
        assert_eq!(report.grid.center.x, 4.5);
        assert_eq!(report.grid.center.y, 4.5);
        let pv = report.metrics.pv.expect("plane fit");
        assert_abs_diff_eq!(pv, 0.0, epsilon = 1e-9);
        for v in report.form.as_ref().expect("plane fit").residual.values() {
            assert_abs_diff_eq!(v, 0.0, epsilon = 1e-9);
        }
        let text = std::fs::read_to_string(&output).expect("artifact");
        assert_eq!(text.lines().count(), 100);

        let _ = std::fs::remove_file(&input);
        let _ = std::fs::remove_file(&output);
    }

    #[test]
    fn all_missing_gives_no_result_and_no_artifact() {
        let input = write_input(&scan_text(5, 5, 1e-4, |_, _| None));
        let output = temp_path("missing", "txt");
        let result =
            process_scan_file(&input, &output, &config_with_step(1e-4), None).expect("io ok");
        assert!(result.is_none());
        assert!(!output.exists());
        let _ = std::fs::remove_file(&input);
    }

    #[test]
    fn artifact_is_byte_identical_across_runs() {
        let input = write_input(&scan_text(12, 9, 1e-4, |ix, iy| {
            Some(((ix * 7 + iy * 3) % 5) as f64 * 0.01)
        }));
        let mut cfg = AnalysisConfig::default();
        cfg.report.write_map_artifacts = false;
        let first = temp_path("repeat", "txt");
        let second = temp_path("repeat", "txt");
        process_scan_file(&input, &first, &cfg, None).expect("first run");
        process_scan_file(&input, &second, &cfg, None).expect("second run");
        let a = std::fs::read(&first).expect("first artifact");
        let b = std::fs::read(&second).expect("second artifact");
        assert!(!a.is_empty());
        assert_eq!(a, b);
        for p in [&input, &first, &second] {
            let _ = std::fs::remove_file(p);
        }
    }

    #[test]
    fn map_artifacts_are_written_beside_output() {
        let input = write_input(&scan_text(31, 31, 1e-4, |ix, iy| {
            Some(0.001 * ix as f64 - 0.002 * iy as f64)
        }));
        let output = temp_path("maps", "txt");
        let mut cfg = config_with_step(1e-4);
        cfg.report.write_map_artifacts = true;
        cfg.sfma = SfmaConfig {
            slit_width: 0.001,
            slit_height: 0.001,
            slit_step_x: 0.0005,
            slit_step_y: 0.0005,
            ..SfmaConfig::default()
        };
        let report = process_scan_file(&input, &output, &cfg, None)
            .expect("io ok")
            .expect("valid samples");
        for suffix in ["residual", "nce", "sfma", "tilt"] {
            let path = super::super::export::sibling_path(&output, suffix);
            assert!(path.exists(), "{} artifact missing", suffix);
            let _ = std::fs::remove_file(path);
        }
        assert!(report.metrics.tilt.is_some());
        assert_abs_diff_eq!(report.metrics.sfma.expect("sfma map"), 0.0, epsilon = 1e-12);
        let _ = std::fs::remove_file(&input);
        let _ = std::fs::remove_file(&output);
    }

    #[test]
    fn views_are_emitted_in_order() {
        let input = write_input(&scan_text(21, 21, 1e-4, |ix, iy| {
            Some(if (ix + iy) % 2 == 0 { 0.01 } else { -0.01 })
        }));
        let output = temp_path("views", "txt");
        let cfg = config_with_step(1e-4);
        let mut sink = CollectingSink::default();
        process_scan_file(&input, &output, &cfg, Some(&mut sink))
            .expect("io ok")
            .expect("valid samples");
        let kinds: Vec<ViewKind> = sink.views.iter().map(|v| v.kind).collect();
        assert_eq!(kinds, ViewKind::ALL.to_vec());
        assert!(sink.views[1].overlay.is_some());
        assert_eq!(sink.views[4].threshold, Some(cfg.report.tilt_threshold));
        assert_eq!(sink.views[5].threshold, Some(cfg.report.sfma_threshold));
        for view in &sink.views {
            assert_eq!(view.threshold.is_some(), view.kind.is_scatter(), "{:?}", view.kind);
        }
        let _ = std::fs::remove_file(&input);
        let _ = std::fs::remove_file(&output);
    }

    struct FailingSink;

    impl HeatmapSink for FailingSink {
        fn render(&mut self, _view: &HeatmapView) -> Result<(), Box<dyn std::error::Error>> {
            Err("renderer offline".into())
        }
    }

    #[test]
    fn sink_failures_do_not_abort() {
        let cfg = config_with_step(1e-4);
        let samples = grid_samples(9, |ix, _| 0.1 * ix as f64);
        let report = analyze_samples(&samples, &cfg)
            .expect("valid config")
            .expect("valid samples");
        assert_eq!(emit_views(&report, &cfg, &mut FailingSink), 0);
    }

    #[test]
    fn high_tilt_selects_cells_around_a_bump() {
        let cfg = config_with_step(1e-4);
        let samples = grid_samples(7, |ix, iy| {
            10.0 * ix as f64 + if (ix, iy) == (3, 3) { 5.0 } else { 0.0 }
        });
        let report = analyze_samples(&samples, &cfg)
            .expect("valid config")
            .expect("valid samples");
        let tilt = report.tilt.as_ref().expect("tilt map");
        let expected = tilt
            .magnitude
            .values()
            .into_iter()
            .filter(|&v| v > cfg.report.tilt_threshold)
            .count();
        assert!(expected > 0);
        assert_eq!(report.high_tilt.len(), expected);
        assert!(report.high_tilt.iter().all(|p| p[2] > cfg.report.tilt_threshold));
    }

    #[test]
    fn invalid_config_is_rejected_before_reading() {
        let mut cfg = AnalysisConfig::default();
        cfg.grid.scale = -1.0;
        let err = process_scan_file(
            Path::new("/nonexistent/scan.xyz"),
            Path::new("/nonexistent/out.txt"),
            &cfg,
            None,
        )
        .expect_err("negative scale");
        assert!(matches!(err, ScanError::InvalidConfig(_)));
    }
}
