//! Profiler scan input: header handling and data-line decoding.
//!
//! A scan file starts with a fixed-size opaque header followed by one sample
//! per line: `index_x index_y height_or_marker ...`. Heights are in
//! micrometers; the literal `No` in the height column marks a sample the
//! instrument did not measure.

mod header;
mod parse;

pub use header::{ScanHeader, HEADER_LINES};
pub use parse::{parse_scan, read_scan_file, ScanData};

/// Height column of a data line, decoded once at parse time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Height {
    /// Measured height in micrometers.
    Present(f64),
    /// The instrument reported no measurement at this index.
    Missing,
}

impl Height {
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Present(v) => Some(v),
            Self::Missing => None,
        }
    }
}

/// One index-addressed sample from the data section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSample {
    pub index_x: i64,
    pub index_y: i64,
    pub height: Height,
}

impl RawSample {
    pub fn present(index_x: i64, index_y: i64, height_um: f64) -> Self {
        Self {
            index_x,
            index_y,
            height: Height::Present(height_um),
        }
    }

    pub fn missing(index_x: i64, index_y: i64) -> Self {
        Self {
            index_x,
            index_y,
            height: Height::Missing,
        }
    }
}
