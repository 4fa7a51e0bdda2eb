//! surfgrid CLI — command-line interface for height-scan surface metrics.

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use surfgrid::{
    AnalysisConfig, GridSummary, HeatmapSink, HeatmapView, ScanHeader, SurfaceAnalyzer,
    SurfaceMetrics,
};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "surfgrid")]
#[command(about = "Grid optical-profiler height scans and report PV, NCE, SFMA and local tilt")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bin a scan, write the processed artifact and report surface metrics.
    Analyze(CliAnalyzeArgs),

    /// Print the header scale and data-section counts of a scan.
    HeaderInfo {
        /// Path to the scan file.
        #[arg(long)]
        input: PathBuf,
    },

    /// Print the default configuration as JSON.
    DefaultConfig,
}

#[derive(Debug, Clone, Args)]
struct CliAnalyzeArgs {
    /// Path to the input scan.
    #[arg(long)]
    input: PathBuf,

    /// Path to write the processed `x y z` artifact.
    #[arg(long)]
    out: PathBuf,

    /// JSON configuration; flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Lateral scale in m per index unit (default: config file, else scan header).
    #[arg(long)]
    scale: Option<f64>,

    /// Bin size along X in meters.
    #[arg(long)]
    step_x: Option<f64>,

    /// Bin size along Y in meters.
    #[arg(long)]
    step_y: Option<f64>,

    /// Slit width in meters.
    #[arg(long)]
    slit_width: Option<f64>,

    /// Slit height in meters.
    #[arg(long)]
    slit_height: Option<f64>,

    /// Reserved edge filter radius in meters (accepted, not applied).
    #[arg(long)]
    edge_clearance: Option<f64>,

    /// High-SFMA selection threshold in meters.
    #[arg(long)]
    sfma_threshold: Option<f64>,

    /// High-tilt selection threshold in µrad.
    #[arg(long)]
    tilt_threshold: Option<f64>,

    /// Skip the `-residual`, `-nce`, `-sfma` and `-tilt` map files.
    #[arg(long)]
    no_map_artifacts: bool,

    /// Path to write metrics (JSON).
    #[arg(long)]
    metrics_json: Option<PathBuf>,

    /// Directory to write one JSON file per heatmap view.
    #[arg(long)]
    views_dir: Option<PathBuf>,
}

impl CliAnalyzeArgs {
    fn to_config(&self) -> CliResult<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_json_file(path)?,
            None => AnalysisConfig::default(),
        };

        config.grid.scale = match (self.scale, &self.config) {
            (Some(scale), _) => scale,
            (None, Some(_)) => config.grid.scale,
            (None, None) => read_header(&self.input)?.lateral_scale_or_default(),
        };
        if let Some(v) = self.step_x {
            config.grid.step_x = v;
        }
        if let Some(v) = self.step_y {
            config.grid.step_y = v;
        }
        if let Some(v) = self.slit_width {
            config.sfma.slit_width = v;
        }
        if let Some(v) = self.slit_height {
            config.sfma.slit_height = v;
        }
        if let Some(v) = self.edge_clearance {
            config.report.edge_clearance = v;
        }
        if let Some(v) = self.sfma_threshold {
            config.report.sfma_threshold = v;
        }
        if let Some(v) = self.tilt_threshold {
            config.report.tilt_threshold = v;
        }
        if self.no_map_artifacts {
            config.report.write_map_artifacts = false;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Writes every view as `<dir>/<view-name>.json`.
struct JsonViewWriter {
    dir: PathBuf,
}

impl HeatmapSink for JsonViewWriter {
    fn render(&mut self, view: &HeatmapView) -> Result<(), Box<dyn std::error::Error>> {
        let path = self.dir.join(format!("{}.json", view.kind.name()));
        let json = serde_json::to_string_pretty(view)?;
        std::fs::write(&path, json)?;
        tracing::debug!("view {} written to {}", view.kind.name(), path.display());
        Ok(())
    }
}

#[derive(Serialize)]
struct MetricsOutput<'a> {
    input: String,
    output: String,
    metrics: &'a SurfaceMetrics,
    grid: &'a GridSummary,
    high_tilt_points: usize,
    high_sfma_points: usize,
    config: &'a AnalysisConfig,
}

fn read_header(path: &Path) -> CliResult<ScanHeader> {
    let file = std::fs::File::open(path)
        .map_err(|e| -> CliError { format!("failed to open {}: {}", path.display(), e).into() })?;
    let lines = std::io::BufReader::new(file)
        .lines()
        .take(surfgrid::scan::HEADER_LINES)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ScanHeader::new(lines))
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze(args) => run_analyze(&args),
        Commands::HeaderInfo { input } => run_header_info(&input),
        Commands::DefaultConfig => run_default_config(),
    }
}

// ── header-info ────────────────────────────────────────────────────────

fn run_header_info(input: &Path) -> CliResult<()> {
    let scan = surfgrid::scan::read_scan_file(input)?;

    println!("scan {}", input.display());
    match scan.header.lateral_scale() {
        Some(scale) => println!("  lateral scale:   {} m", scale),
        None => println!(
            "  lateral scale:   unreadable (fallback {} m)",
            surfgrid::FALLBACK_HEADER_SCALE
        ),
    }
    println!("  header complete: {}", scan.header.is_complete());
    println!("  valid samples:   {}", scan.n_valid());
    println!("  missing samples: {}", scan.n_missing());
    println!("  skipped lines:   {}", scan.skipped_lines);

    Ok(())
}

// ── default-config ─────────────────────────────────────────────────────

fn run_default_config() -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(&AnalysisConfig::default())?);
    Ok(())
}

// ── analyze ────────────────────────────────────────────────────────────

fn run_analyze(args: &CliAnalyzeArgs) -> CliResult<()> {
    let config = args.to_config()?;
    tracing::info!(
        "scale={} m, step={}x{} m, slit={}x{} m",
        config.grid.scale,
        config.grid.step_x,
        config.grid.step_y,
        config.sfma.slit_width,
        config.sfma.slit_height
    );

    let analyzer = SurfaceAnalyzer::with_config(config);
    let result = match &args.views_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let mut sink = JsonViewWriter { dir: dir.clone() };
            analyzer.process_file_with_sink(&args.input, &args.out, &mut sink)?
        }
        None => analyzer.process_file(&args.input, &args.out)?,
    };

    let Some(report) = result else {
        return Err(format!("no valid data points found in {}", args.input.display()).into());
    };

    let m = &report.metrics;
    let show = |v: Option<f64>, factor: f64, unit: &str| match v {
        Some(v) => format!("{:.2} {}", v * factor, unit),
        None => "n/a".to_string(),
    };
    println!("grid:     {}x{} ({} bins)", report.grid.rows, report.grid.cols, report.grid.n_bins);
    println!("PV:       {}", show(m.pv, 1e9, "nm"));
    println!("NCE:      {}", show(m.nce, 1e9, "nm"));
    println!("SFMA:     {}", show(m.sfma, 1e9, "nm"));
    println!("Tilt:     {}", show(m.tilt, 1.0, "µrad"));
    println!("Tilt max: {}", show(m.tilt_max, 1.0, "µrad"));
    println!(
        "above thresholds: {} tilt, {} sfma",
        report.high_tilt.len(),
        report.high_sfma.len()
    );

    if let Some(path) = &args.metrics_json {
        let out = MetricsOutput {
            input: args.input.display().to_string(),
            output: args.out.display().to_string(),
            metrics: m,
            grid: &report.grid,
            high_tilt_points: report.high_tilt.len(),
            high_sfma_points: report.high_sfma.len(),
            config: analyzer.config(),
        };
        let json = serde_json::to_string_pretty(&out)?;
        std::fs::write(path, &json)?;
        tracing::info!("Metrics written to {}", path.display());
    }

    Ok(())
}
