//! Crate error type.
//!
//! Only whole-run conditions are errors. Degenerate windows, fields and
//! neighbourhoods are reported as undefined cells (`None`), never through
//! this type.

use std::path::PathBuf;

/// Errors surfaced by the scan pipeline.
#[derive(Debug)]
pub enum ScanError {
    /// Reading the scan or writing an artifact failed.
    Io {
        /// File that was being read or written.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The data section contained no valid (non-missing, well-formed) sample.
    EmptyInput,
    /// A configuration value is out of range.
    InvalidConfig(String),
}

impl ScanError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl std::fmt::Display for ScanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "{}: {}", path.display(), source),
            Self::EmptyInput => write!(f, "no valid samples in scan data section"),
            Self::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ScanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_path_for_io_errors() {
        let err = ScanError::io(
            "scan.xyz",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        let msg = err.to_string();
        assert!(msg.contains("scan.xyz"));
        assert!(msg.contains("missing"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn empty_input_has_no_source() {
        assert!(std::error::Error::source(&ScanError::EmptyInput).is_none());
    }
}
