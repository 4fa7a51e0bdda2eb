//! Sibling map artifacts next to the processed output.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use super::SurfaceReport;
use crate::error::ScanError;
use crate::grid::write_xyz_file;

/// `dir/name.ext` → `dir/name-suffix.ext`; without an extension the suffix is
/// appended.
pub fn sibling_path(output: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(output.file_stem().unwrap_or_default());
    name.push("-");
    name.push(suffix);
    if let Some(ext) = output.extension() {
        name.push(".");
        name.push(ext);
    }
    output.with_file_name(name)
}

/// Write the residual, NCE, SFMA and tilt maps beside `output`. Returns the
/// paths written, in that order.
pub fn write_map_artifacts(
    output: &Path,
    report: &SurfaceReport,
) -> Result<Vec<PathBuf>, ScanError> {
    let maps = [
        ("residual", report.residual_points()),
        ("nce", report.nce_points()),
        ("sfma", report.sfma_points()),
        ("tilt", report.tilt_points()),
    ];
    let mut written = Vec::with_capacity(maps.len());
    for (suffix, points) in maps {
        let path = sibling_path(output, suffix);
        write_xyz_file(&path, &points)?;
        tracing::debug!("wrote {} {} points to {}", points.len(), suffix, path.display());
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_goes_before_extension() {
        assert_eq!(
            sibling_path(Path::new("out/scan-processed.txt"), "sfma"),
            PathBuf::from("out/scan-processed-sfma.txt")
        );
        assert_eq!(
            sibling_path(Path::new("result"), "tilt"),
            PathBuf::from("result-tilt")
        );
    }
}
