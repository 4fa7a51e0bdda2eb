use std::path::Path;

use super::{Height, RawSample, ScanHeader, HEADER_LINES};
use crate::error::ScanError;

/// Token the instrument writes in the height column for unmeasured points.
const MISSING_MARKER: &str = "No";

/// Decoded scan file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanData {
    pub header: ScanHeader,
    /// Data-section samples in file order, including missing ones.
    pub samples: Vec<RawSample>,
    /// Data lines that could not be decoded.
    pub skipped_lines: usize,
}

impl ScanData {
    pub fn n_valid(&self) -> usize {
        self.samples
            .iter()
            .filter(|s| matches!(s.height, Height::Present(_)))
            .count()
    }

    pub fn n_missing(&self) -> usize {
        self.samples.len() - self.n_valid()
    }
}

/// Decode one data line. `None` means the line is malformed.
fn parse_data_line(line: &str) -> Option<RawSample> {
    let mut fields = line.split_whitespace();
    let ix = fields.next()?.parse::<i64>().ok()?;
    let iy = fields.next()?.parse::<i64>().ok()?;
    let height = fields.next()?;
    if height == MISSING_MARKER {
        return Some(RawSample::missing(ix, iy));
    }
    let z_um = height.parse::<f64>().ok().filter(|v| v.is_finite())?;
    Some(RawSample::present(ix, iy, z_um))
}

/// Split scan text into header and decoded samples.
///
/// Blank lines in the data section are ignored; other undecodable lines are
/// counted in [`ScanData::skipped_lines`].
pub fn parse_scan(text: &str) -> ScanData {
    let mut lines = text.lines();
    let header = ScanHeader::new(
        lines
            .by_ref()
            .take(HEADER_LINES)
            .map(str::to_string)
            .collect(),
    );
    if !header.is_complete() {
        tracing::warn!(
            "scan has only {} lines, shorter than the {}-line header",
            header.lines().len(),
            HEADER_LINES
        );
    }

    let mut samples = Vec::new();
    let mut skipped_lines = 0usize;
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        match parse_data_line(line) {
            Some(sample) => samples.push(sample),
            None => skipped_lines += 1,
        }
    }

    let data = ScanData {
        header,
        samples,
        skipped_lines,
    };
    tracing::debug!(
        "parsed {} samples ({} missing), skipped {} lines",
        data.samples.len(),
        data.n_missing(),
        data.skipped_lines
    );
    data
}

/// Read and decode a scan file.
pub fn read_scan_file(path: &Path) -> Result<ScanData, ScanError> {
    let text = std::fs::read_to_string(path).map_err(|e| ScanError::io(path, e))?;
    Ok(parse_scan(&text))
}
