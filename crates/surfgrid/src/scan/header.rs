use crate::config::FALLBACK_HEADER_SCALE;

/// Number of opaque header lines preceding the data section.
pub const HEADER_LINES: usize = 14;

/// Header line (0-based) and whitespace field carrying the lateral resolution.
const SCALE_LINE: usize = 7;
const SCALE_FIELD: usize = 6;

/// Raw header lines of a scan file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanHeader {
    lines: Vec<String>,
}

impl ScanHeader {
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// `true` when all header lines were present.
    pub fn is_complete(&self) -> bool {
        self.lines.len() >= HEADER_LINES
    }

    /// Lateral resolution (m per index unit) recorded by the instrument.
    pub fn lateral_scale(&self) -> Option<f64> {
        let field = self
            .lines
            .get(SCALE_LINE)?
            .split_whitespace()
            .nth(SCALE_FIELD)?;
        field
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v > 0.0)
    }

    /// Header resolution, or [`FALLBACK_HEADER_SCALE`] when it is absent or
    /// unparseable.
    pub fn lateral_scale_or_default(&self) -> f64 {
        match self.lateral_scale() {
            Some(scale) => scale,
            None => {
                tracing::warn!(
                    "could not read lateral scale from header line {}, using {}",
                    SCALE_LINE + 1,
                    FALLBACK_HEADER_SCALE
                );
                FALLBACK_HEADER_SCALE
            }
        }
    }
}
