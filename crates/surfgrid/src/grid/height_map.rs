/// Dense row-major grid of optional values on a uniform physical lattice.
///
/// Row index grows with `y`, column index with `x`. Undefined cells are
/// `None`; no numeric value is ever used as a "no data" marker. The same type
/// carries heights, residuals and derived per-cell quantities (tilt).
#[derive(Debug, Clone, PartialEq)]
pub struct HeightMap {
    rows: usize,
    cols: usize,
    xs: Vec<f64>,
    ys: Vec<f64>,
    pitch: [f64; 2],
    cells: Vec<Option<f64>>,
}

impl HeightMap {
    /// All-undefined map with `origin + i * pitch` coordinates.
    pub fn new(rows: usize, cols: usize, origin: [f64; 2], pitch: [f64; 2]) -> Self {
        let xs = (0..cols).map(|i| origin[0] + i as f64 * pitch[0]).collect();
        let ys = (0..rows).map(|i| origin[1] + i as f64 * pitch[1]).collect();
        Self::with_axes(xs, ys, pitch)
    }

    /// All-undefined map with explicit column (`xs`) and row (`ys`) coordinates.
    pub fn with_axes(xs: Vec<f64>, ys: Vec<f64>, pitch: [f64; 2]) -> Self {
        let (rows, cols) = (ys.len(), xs.len());
        Self {
            rows,
            cols,
            xs,
            ys,
            pitch,
            cells: vec![None; rows * cols],
        }
    }

    /// Map with the same lattice as `self` and every cell undefined.
    pub fn empty_like(&self) -> Self {
        Self {
            cells: vec![None; self.cells.len()],
            ..self.clone()
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Cell pitch `[x, y]` in meters.
    pub fn pitch(&self) -> [f64; 2] {
        self.pitch
    }

    pub fn x_at(&self, col: usize) -> f64 {
        self.xs[col]
    }

    pub fn y_at(&self, row: usize) -> f64 {
        self.ys[row]
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.cells[row * self.cols + col]
    }

    /// Like [`get`](Self::get) but out-of-range indices read as undefined.
    pub fn get_signed(&self, row: isize, col: isize) -> Option<f64> {
        if row < 0 || col < 0 || row as usize >= self.rows || col as usize >= self.cols {
            return None;
        }
        self.get(row as usize, col as usize)
    }

    pub fn set(&mut self, row: usize, col: usize, value: Option<f64>) {
        self.cells[row * self.cols + col] = value;
    }

    pub fn n_defined(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Defined cells as `(row, col, value)`, row-major.
    pub fn iter_defined(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        let cols = self.cols;
        self.cells
            .iter()
            .enumerate()
            .filter_map(move |(i, c)| c.map(|v| (i / cols, i % cols, v)))
    }

    /// Defined values, row-major.
    pub fn values(&self) -> Vec<f64> {
        self.cells.iter().flatten().copied().collect()
    }

    /// Defined cells as `[x, y, value]`, row-major.
    pub fn points(&self) -> Vec<[f64; 3]> {
        self.iter_defined()
            .map(|(r, c, v)| [self.xs[c], self.ys[r], v])
            .collect()
    }

    /// Apply `f` to every defined cell; undefined cells stay undefined and
    /// `f` returning `None` undefines the cell.
    pub fn map_defined(&self, mut f: impl FnMut(usize, usize, f64) -> Option<f64>) -> Self {
        let mut out = self.empty_like();
        for (r, c, v) in self.iter_defined() {
            out.set(r, c, f(r, c, v));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_map_is_undefined() {
        let map = HeightMap::new(2, 3, [1.0, -1.0], [0.5, 0.25]);
        assert_eq!(map.n_defined(), 0);
        assert_eq!(map.x_at(2), 2.0);
        assert_eq!(map.y_at(1), -0.75);
    }

    #[test]
    fn signed_access_is_bounds_checked() {
        let mut map = HeightMap::new(2, 2, [0.0, 0.0], [1.0, 1.0]);
        map.set(0, 0, Some(4.0));
        assert_eq!(map.get_signed(0, 0), Some(4.0));
        assert_eq!(map.get_signed(-1, 0), None);
        assert_eq!(map.get_signed(0, 2), None);
    }

    #[test]
    fn undefined_cells_never_read_as_zero() {
        let mut map = HeightMap::new(1, 3, [0.0, 0.0], [1.0, 1.0]);
        map.set(0, 0, Some(0.0));
        map.set(0, 2, Some(2.0));
        let doubled = map.map_defined(|_, _, v| Some(v * 2.0));
        assert_eq!(doubled.get(0, 1), None);
        assert_eq!(doubled.get(0, 0), Some(0.0));
        assert_eq!(doubled.values(), vec![0.0, 4.0]);
        assert!(!doubled.points().iter().any(|p| p[0] == 1.0));
    }
}
