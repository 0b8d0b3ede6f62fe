/// Bucketed positions for 3x3-window neighbour queries. Buckets are stored
/// flat (counting sort) and rebuilt once per frame.
#[derive(Clone, Debug)]
pub(crate) struct SpatialGrid {
    cell: f32,
    cols: usize,
    rows: usize,
    starts: Vec<usize>,
    entries: Vec<usize>,
}

impl SpatialGrid {
    pub(crate) fn new(width: u32, height: u32, cell: f32) -> Self {
        let cell = cell.max(1.0);
        let cols = ((width as f32 / cell).ceil() as usize).max(1);
        let rows = ((height as f32 / cell).ceil() as usize).max(1);
        Self {
            cell,
            cols,
            rows,
            starts: vec![0; cols * rows + 1],
            entries: Vec::new(),
        }
    }

    fn bucket(&self, x: f32, y: f32) -> (usize, usize) {
        let clamp = |v: f32, n: usize| -> usize {
            if v.is_finite() && v > 0.0 {
                ((v / self.cell) as usize).min(n - 1)
            } else {
                0
            }
        };
        (clamp(x, self.cols), clamp(y, self.rows))
    }

    pub(crate) fn rebuild(&mut self, positions: &[(f32, f32)]) {
        self.starts.iter_mut().for_each(|s| *s = 0);
        for &(x, y) in positions {
            let (cx, cy) = self.bucket(x, y);
            self.starts[cy * self.cols + cx + 1] += 1;
        }
        for i in 1..self.starts.len() {
            self.starts[i] += self.starts[i - 1];
        }
        self.entries.clear();
        self.entries.resize(positions.len(), 0);
        let mut fill = self.starts.clone();
        for (idx, &(x, y)) in positions.iter().enumerate() {
            let (cx, cy) = self.bucket(x, y);
            let slot = &mut fill[cy * self.cols + cx];
            self.entries[*slot] = idx;
            *slot += 1;
        }
    }

    /// Appends every index bucketed in the 3x3 window around `(x, y)` to `out`.
    pub(crate) fn neighbors(&self, x: f32, y: f32, out: &mut Vec<usize>) {
        let (cx, cy) = self.bucket(x, y);
        for ny in cy.saturating_sub(1)..=(cy + 1).min(self.rows - 1) {
            for nx in cx.saturating_sub(1)..=(cx + 1).min(self.cols - 1) {
                let b = ny * self.cols + nx;
                out.extend_from_slice(&self.entries[self.starts[b]..self.starts[b + 1]]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn near(grid: &SpatialGrid, x: f32, y: f32) -> Vec<usize> {
        let mut out = Vec::new();
        grid.neighbors(x, y, &mut out);
        out.sort_unstable();
        out
    }

    #[test]
    fn window_covers_adjacent_buckets_only() {
        let mut grid = SpatialGrid::new(400, 400, 40.0);
        grid.rebuild(&[(10.0, 10.0), (50.0, 50.0), (90.0, 10.0), (300.0, 300.0)]);
        assert_eq!(near(&grid, 20.0, 20.0), vec![0, 1]);
        assert_eq!(near(&grid, 60.0, 20.0), vec![0, 1, 2]);
        assert_eq!(near(&grid, 310.0, 310.0), vec![3]);
    }

    #[test]
    fn out_of_range_positions_clamp_to_edges() {
        let mut grid = SpatialGrid::new(80, 80, 40.0);
        grid.rebuild(&[(-5.0, -5.0), (500.0, 500.0), (f32::NAN, 3.0)]);
        assert_eq!(near(&grid, 0.0, 0.0), vec![0, 1, 2]);
    }

    #[test]
    fn rebuild_replaces_previous_contents() {
        let mut grid = SpatialGrid::new(200, 200, 40.0);
        grid.rebuild(&[(10.0, 10.0), (12.0, 12.0)]);
        grid.rebuild(&[(190.0, 190.0)]);
        assert!(near(&grid, 10.0, 10.0).is_empty());
        assert_eq!(near(&grid, 190.0, 190.0), vec![0]);
    }
}
