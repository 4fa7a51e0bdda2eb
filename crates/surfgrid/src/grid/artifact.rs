//! Plain-text `x y value` artifacts.

use std::fmt::Write as _;
use std::io::Write as _;
use std::path::Path;

use crate::error::ScanError;

/// Format points as `x y value` lines with 15 fractional digits.
pub fn format_xyz_lines(points: &[[f64; 3]]) -> String {
    let mut out = String::with_capacity(points.len() * 64);
    for p in points {
        // Writing into a String cannot fail.
        let _ = writeln!(out, "{:.15} {:.15} {:.15}", p[0], p[1], p[2]);
    }
    out
}

/// Write points to `path` in the `x y value` format.
pub fn write_xyz_file(path: &Path, points: &[[f64; 3]]) -> Result<(), ScanError> {
    let file = std::fs::File::create(path).map_err(|e| ScanError::io(path, e))?;
    let mut writer = std::io::BufWriter::new(file);
    writer
        .write_all(format_xyz_lines(points).as_bytes())
        .and_then(|_| writer.flush())
        .map_err(|e| ScanError::io(path, e))
}
