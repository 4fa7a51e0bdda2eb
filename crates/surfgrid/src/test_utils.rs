//! Synthetic scans for unit tests.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::scan::HEADER_LINES;

/// Scan file text with a 14-line header (scale on line 8, field 7) and one
/// data line per index in `0..nx × 0..ny`. `height(ix, iy)` returning `None`
/// writes the missing marker.
pub(crate) fn scan_text(
    nx: i64,
    ny: i64,
    scale: f64,
    height: impl Fn(i64, i64) -> Option<f64>,
) -> String {
    let mut text = String::new();
    for i in 0..HEADER_LINES {
        if i == 7 {
            let _ = writeln!(text, "0 0.5 6.328e-007 0.5 1 0 {} 1757694759", scale);
        } else {
            let _ = writeln!(text, "header line {}", i + 1);
        }
    }
    for iy in 0..ny {
        for ix in 0..nx {
            match height(ix, iy) {
                Some(h) => {
                    let _ = writeln!(text, "{} {} {}", ix, iy, h);
                }
                None => {
                    let _ = writeln!(text, "{} {} No", ix, iy);
                }
            }
        }
    }
    text
}

/// Fresh path under the system temp dir; the file is not created.
pub(crate) fn temp_path(tag: &str, ext: &str) -> PathBuf {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!(
        "surfgrid-{}-{}-{}.{}",
        tag,
        std::process::id(),
        n,
        ext
    ))
}
