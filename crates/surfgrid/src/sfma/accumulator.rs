use crate::grid::HeightMap;

/// Per-cell running `(sum, count)` over overlapping window placements.
#[derive(Debug, Clone)]
pub(crate) struct WindowAccumulator {
    cols: usize,
    sums: Vec<f64>,
    counts: Vec<u32>,
}

impl WindowAccumulator {
    pub(crate) fn new(rows: usize, cols: usize) -> Self {
        Self {
            cols,
            sums: vec![0.0; rows * cols],
            counts: vec![0; rows * cols],
        }
    }

    pub(crate) fn add(&mut self, row: usize, col: usize, value: f64) {
        let idx = row * self.cols + col;
        self.sums[idx] += value;
        self.counts[idx] += 1;
    }

    /// Mean per covered cell on `lattice`'s grid; cells no placement touched
    /// stay undefined.
    pub(crate) fn freeze(self, lattice: &HeightMap) -> HeightMap {
        let mut out = lattice.empty_like();
        for (idx, (&sum, &count)) in self.sums.iter().zip(&self.counts).enumerate() {
            if count > 0 {
                out.set(idx / self.cols, idx % self.cols, Some(sum / count as f64));
            }
        }
        out
    }
}
