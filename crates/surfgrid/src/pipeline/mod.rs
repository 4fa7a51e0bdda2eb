//! End-to-end analysis pipeline.
//!
//! This module is the glue layer that wires the stages together:
//! parse → bin → global form removal → {NCE, SFMA, tilt} → metrics → views.
//!
//! Numerical primitives live in `crate::grid`, `crate::plane`, `crate::sfma`,
//! `crate::tilt` and `crate::nce`. The pipeline layer owns call order,
//! artifact writing and the hand-off to the rendering sink.
//!
//! Entry points:
//! - `process_scan_file`: file in, artifacts out, report returned
//! - `analyze_samples`: already-decoded samples, no file output
//! - `analyze_grid`: an existing binned grid

mod export;
mod result;
mod run;

pub use export::{sibling_path, write_map_artifacts};
pub use result::{GridSummary, SurfaceReport};
pub use run::{analyze_grid, analyze_samples, build_views, emit_views, process_scan_file};
