use crate::genetics::Rgb;
use crate::rng::RandomSource;
use std::collections::HashMap;

/// Canvas coordinates are packed into one `u32`, so each axis is limited to 16 bits.
pub(crate) const MAX_EXTENT: u32 = u16::MAX as u32;

fn pack(x: u32, y: u32) -> u32 {
    (y << 16) | (x & 0xFFFF)
}

fn unpack(key: u32) -> (u32, u32) {
    (key & 0xFFFF, key >> 16)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct GrowthCell {
    pub(crate) intensity: f32,
    pub(crate) color: Rgb,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Axis {
    X,
    Y,
}

pub(crate) const GROWTH_MAX: f32 = 255.0;

/// Sparse per-pixel residue. Entries below the removal floor are dropped
/// during decay; the engine keeps the size under an adaptive cap.
#[derive(Clone, Debug)]
pub(crate) struct GrowthMap {
    width: u32,
    height: u32,
    cells: HashMap<u32, GrowthCell>,
}

impl GrowthMap {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.min(MAX_EXTENT),
            height: height.min(MAX_EXTENT),
            cells: HashMap::new(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.cells.len()
    }

    fn key_at(&self, x: f32, y: f32) -> Option<u32> {
        if !(x.is_finite() && y.is_finite()) || x < 0.0 || y < 0.0 {
            return None;
        }
        let (px, py) = (x as u32, y as u32);
        (px < self.width && py < self.height).then(|| pack(px, py))
    }

    pub(crate) fn get(&self, x: u32, y: u32) -> Option<GrowthCell> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get(&pack(x, y)).copied()
    }

    /// Adds residue at a pixel. Out-of-canvas writes are ignored.
    pub(crate) fn deposit(&mut self, x: f32, y: f32, amount: f32, color: Rgb) {
        if amount <= 0.0 {
            return;
        }
        let Some(key) = self.key_at(x, y) else {
            return;
        };
        let cell = self.cells.entry(key).or_insert(GrowthCell {
            intensity: 0.0,
            color,
        });
        if cell.intensity > 0.0 {
            cell.color = cell.color.lerp(color, 0.35);
        }
        cell.intensity = (cell.intensity + amount).min(GROWTH_MAX);
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (u32, u32, GrowthCell)> + '_ {
        self.cells.iter().map(|(&k, &c)| {
            let (x, y) = unpack(k);
            (x, y, c)
        })
    }

    pub(crate) fn intensities(&self) -> impl Iterator<Item = f32> + '_ {
        self.cells.values().map(|c| c.intensity)
    }

    /// Geometric fade; entries under `floor` are removed.
    pub(crate) fn decay(&mut self, factor: f32, floor: f32) {
        self.cells.retain(|_, c| {
            c.intensity *= factor;
            c.intensity >= floor
        });
    }

    /// Evicts the weakest entries until at most `target` remain.
    pub(crate) fn prune_to(&mut self, target: usize) -> usize {
        if self.cells.len() <= target {
            return 0;
        }
        let excess = self.cells.len() - target;
        let mut ranked: Vec<(f32, u32)> = self.cells.iter().map(|(&k, c)| (c.intensity, k)).collect();
        ranked.select_nth_unstable_by(excess - 1, |a, b| a.0.total_cmp(&b.0));
        for &(_, key) in &ranked[..excess] {
            self.cells.remove(&key);
        }
        excess
    }

    /// Dims everything inside a band along `axis`, strongest at the band centre.
    pub(crate) fn suppress_band(&mut self, axis: Axis, center: f32, half_width: f32, strength: f32) {
        if half_width <= 0.0 {
            return;
        }
        for (&key, cell) in self.cells.iter_mut() {
            let (x, y) = unpack(key);
            let coord = match axis {
                Axis::X => x as f32,
                Axis::Y => y as f32,
            };
            let d = (coord - center).abs();
            if d < half_width {
                let k = strength * (1.0 - d / half_width);
                cell.intensity *= (1.0 - k).clamp(0.0, 1.0);
            }
        }
    }

    /// 4-neighbour diffusion from bright cells. A neighbour is raised to at
    /// most `ratio` times its source, never lowered. Returns cells touched.
    pub(crate) fn spread(
        &mut self,
        budget: usize,
        threshold: f32,
        ratio: f32,
        chance: f32,
        rng: &mut impl RandomSource,
    ) -> usize {
        let sources: Vec<(u32, GrowthCell)> = self
            .cells
            .iter()
            .filter(|(_, c)| c.intensity > threshold)
            .map(|(&k, &c)| (k, c))
            .collect();
        if sources.is_empty() || budget == 0 {
            return 0;
        }
        let start = rng.index(sources.len());
        let mut touched = 0;
        for n in 0..budget.min(sources.len()) {
            let (key, src) = sources[(start + n) % sources.len()];
            let (x, y) = unpack(key);
            let target = src.intensity * ratio;
            let around = [
                (x.checked_sub(1), Some(y)),
                (Some(x + 1), Some(y)),
                (Some(x), y.checked_sub(1)),
                (Some(x), Some(y + 1)),
            ];
            for (nx, ny) in around {
                let (Some(nx), Some(ny)) = (nx, ny) else {
                    continue;
                };
                if nx >= self.width || ny >= self.height || !rng.chance(chance) {
                    continue;
                }
                let cell = self.cells.entry(pack(nx, ny)).or_insert(GrowthCell {
                    intensity: 0.0,
                    color: src.color,
                });
                if cell.intensity < target {
                    cell.intensity = target;
                    touched += 1;
                }
            }
        }
        touched
    }
}

pub(crate) const RESOURCE_CELL: f32 = 20.0;
pub(crate) const RESOURCE_FULL: f32 = 100.0;
pub(crate) const RESOURCE_BOOST_CAP: f32 = 120.0;
const REGEN_STEP: f32 = 0.25;
const RELAX_STEP: f32 = 0.04;

/// Coarse resource lattice. Absent cells are full (100); only cells that
/// differ from full are stored.
#[derive(Clone, Debug)]
pub(crate) struct ResourceField {
    cols: u32,
    rows: u32,
    cells: HashMap<u32, f32>,
    cursor: usize,
}

impl ResourceField {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        Self {
            cols: ((width as f32 / RESOURCE_CELL).ceil() as u32).clamp(1, MAX_EXTENT),
            rows: ((height as f32 / RESOURCE_CELL).ceil() as u32).clamp(1, MAX_EXTENT),
            cells: HashMap::new(),
            cursor: 0,
        }
    }

    fn cell_of(&self, x: f32, y: f32) -> Option<(u32, u32)> {
        if !(x.is_finite() && y.is_finite()) || x < 0.0 || y < 0.0 {
            return None;
        }
        let (cx, cy) = ((x / RESOURCE_CELL) as u32, (y / RESOURCE_CELL) as u32);
        (cx < self.cols && cy < self.rows).then_some((cx, cy))
    }

    pub(crate) fn cell_level(&self, cx: u32, cy: u32) -> f32 {
        self.cells.get(&pack(cx, cy)).copied().unwrap_or(RESOURCE_FULL)
    }

    fn store(&mut self, cx: u32, cy: u32, v: f32) {
        if v == RESOURCE_FULL {
            self.cells.remove(&pack(cx, cy));
        } else {
            self.cells.insert(pack(cx, cy), v);
        }
    }

    /// Level at a canvas position; out of bounds reads as empty.
    pub(crate) fn level_at(&self, x: f32, y: f32) -> f32 {
        self.cell_of(x, y)
            .map_or(0.0, |(cx, cy)| self.cell_level(cx, cy))
    }

    /// Takes up to `amount`; returns what was actually taken.
    pub(crate) fn consume(&mut self, x: f32, y: f32, amount: f32) -> f32 {
        let Some((cx, cy)) = self.cell_of(x, y) else {
            return 0.0;
        };
        let have = self.cell_level(cx, cy);
        let taken = amount.max(0.0).min(have);
        self.store(cx, cy, have - taken);
        taken
    }

    /// Returns resource to a cell. Negative amounts are ignored and the
    /// regular bound applies unless the cell is already boosted above it.
    pub(crate) fn replenish(&mut self, x: f32, y: f32, amount: f32) {
        let Some((cx, cy)) = self.cell_of(x, y) else {
            return;
        };
        if !(amount > 0.0) {
            return;
        }
        let have = self.cell_level(cx, cy);
        let bound = RESOURCE_FULL.max(have);
        self.store(cx, cy, (have + amount).min(bound));
    }

    /// Nutrient boost; may lift a cell up to the boosted cap.
    pub(crate) fn boost_cell(&mut self, cx: u32, cy: u32, amount: f32) {
        if cx >= self.cols || cy >= self.rows || !(amount > 0.0) {
            return;
        }
        let have = self.cell_level(cx, cy);
        self.store(cx, cy, (have + amount).min(RESOURCE_BOOST_CAP));
    }

    pub(crate) fn dims(&self) -> (u32, u32) {
        (self.cols, self.rows)
    }

    /// Moves up to `budget` stored cells toward full, resuming where the
    /// previous call stopped.
    pub(crate) fn regenerate(&mut self, budget: usize) {
        if self.cells.is_empty() {
            return;
        }
        let keys: Vec<u32> = self.cells.keys().copied().collect();
        let n = keys.len();
        let start = self.cursor % n;
        for i in 0..budget.min(n) {
            let key = keys[(start + i) % n];
            let Some(v) = self.cells.get_mut(&key) else {
                continue;
            };
            *v = if *v < RESOURCE_FULL {
                (*v + REGEN_STEP).min(RESOURCE_FULL)
            } else {
                (*v - RELAX_STEP).max(RESOURCE_FULL)
            };
            if *v == RESOURCE_FULL {
                self.cells.remove(&key);
            }
        }
        self.cursor = start + budget.min(n);
    }

    /// Mean level over up to `samples` random lattice cells.
    pub(crate) fn sample_mean(&self, samples: usize, rng: &mut impl RandomSource) -> f32 {
        let total = self.cols as usize * self.rows as usize;
        if total == 0 || samples == 0 {
            return 0.0;
        }
        if total <= samples {
            let mut sum = 0.0;
            for cy in 0..self.rows {
                for cx in 0..self.cols {
                    sum += self.cell_level(cx, cy);
                }
            }
            return sum / total as f32;
        }
        let mut sum = 0.0;
        for _ in 0..samples {
            let cx = rng.index(self.cols as usize) as u32;
            let cy = rng.index(self.rows as usize) as u32;
            sum += self.cell_level(cx, cy);
        }
        sum / samples as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{seeded, Scripted};

    const INK: Rgb = Rgb::new(200, 100, 50);

    #[test]
    fn pack_round_trips_extremes() {
        for (x, y) in [(0, 0), (MAX_EXTENT, 0), (0, MAX_EXTENT), (1234, 4321)] {
            assert_eq!(unpack(pack(x, y)), (x, y));
        }
    }

    #[test]
    fn deposit_skips_out_of_bounds() {
        let mut m = GrowthMap::new(10, 10);
        m.deposit(-1.0, 5.0, 50.0, INK);
        m.deposit(10.0, 5.0, 50.0, INK);
        m.deposit(5.0, f32::NAN, 50.0, INK);
        assert_eq!(m.len(), 0);
        m.deposit(9.9, 9.9, 50.0, INK);
        assert_eq!(m.get(9, 9).map(|c| c.intensity), Some(50.0));
    }

    #[test]
    fn deposit_saturates_and_blends() {
        let mut m = GrowthMap::new(4, 4);
        m.deposit(1.0, 1.0, 200.0, INK);
        m.deposit(1.0, 1.0, 200.0, Rgb::new(0, 0, 0));
        let c = m.get(1, 1).expect("cell");
        assert_eq!(c.intensity, GROWTH_MAX);
        assert!(c.color.r < INK.r);
    }

    #[test]
    fn decay_removes_faint_cells() {
        let mut m = GrowthMap::new(4, 4);
        m.deposit(0.0, 0.0, 100.0, INK);
        m.deposit(1.0, 0.0, 2.0, INK);
        m.decay(0.5, 1.5);
        assert_eq!(m.len(), 1);
        assert_eq!(m.get(0, 0).map(|c| c.intensity), Some(50.0));
    }

    #[test]
    fn prune_evicts_weakest_first() {
        let mut m = GrowthMap::new(10, 1);
        for x in 0..10 {
            m.deposit(x as f32, 0.0, (x + 1) as f32 * 10.0, INK);
        }
        assert_eq!(m.prune_to(6), 4);
        assert_eq!(m.len(), 6);
        for x in 0..4 {
            assert!(m.get(x, 0).is_none());
        }
        for x in 4..10 {
            assert!(m.get(x, 0).is_some());
        }
        assert_eq!(m.prune_to(6), 0);
    }

    #[test]
    fn band_suppression_is_local() {
        let mut m = GrowthMap::new(100, 1);
        m.deposit(50.0, 0.0, 100.0, INK);
        m.deposit(10.0, 0.0, 100.0, INK);
        m.suppress_band(Axis::X, 50.0, 8.0, 0.5);
        assert_eq!(m.get(50, 0).map(|c| c.intensity), Some(50.0));
        assert_eq!(m.get(10, 0).map(|c| c.intensity), Some(100.0));
    }

    #[test]
    fn spread_respects_ratio_and_bounds() {
        let mut m = GrowthMap::new(3, 3);
        m.deposit(0.0, 0.0, 200.0, INK);
        let touched = m.spread(10, 90.0, 0.5, 1.0, &mut Scripted::constant(0.0));
        assert_eq!(touched, 2);
        assert_eq!(m.len(), 3);
        assert_eq!(m.get(1, 0).map(|c| c.intensity), Some(100.0));
        assert_eq!(m.get(0, 1).map(|c| c.intensity), Some(100.0));
        // a brighter neighbour is never lowered
        m.deposit(1.0, 0.0, 150.0, INK);
        m.spread(10, 90.0, 0.5, 1.0, &mut Scripted::constant(0.0));
        assert_eq!(m.get(1, 0).map(|c| c.intensity), Some(250.0));
    }

    #[test]
    fn spread_ignores_dim_cells() {
        let mut m = GrowthMap::new(3, 3);
        m.deposit(1.0, 1.0, 40.0, INK);
        assert_eq!(m.spread(10, 90.0, 0.5, 1.0, &mut seeded(1)), 0);
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn resources_start_full_and_deplete() {
        let mut f = ResourceField::new(100, 60);
        assert_eq!(f.dims(), (5, 3));
        assert_eq!(f.level_at(10.0, 10.0), RESOURCE_FULL);
        assert_eq!(f.consume(10.0, 10.0, 30.0), 30.0);
        assert_eq!(f.level_at(19.0, 19.0), 70.0);
        assert_eq!(f.consume(10.0, 10.0, 500.0), 70.0);
        assert_eq!(f.level_at(10.0, 10.0), 0.0);
        assert_eq!(f.level_at(-5.0, 10.0), 0.0);
    }

    #[test]
    fn replenish_never_goes_negative_or_over() {
        let mut f = ResourceField::new(40, 40);
        f.consume(5.0, 5.0, 50.0);
        f.replenish(5.0, 5.0, -80.0);
        assert_eq!(f.level_at(5.0, 5.0), 50.0);
        f.replenish(5.0, 5.0, f32::NAN);
        assert_eq!(f.level_at(5.0, 5.0), 50.0);
        f.replenish(5.0, 5.0, 500.0);
        assert_eq!(f.level_at(5.0, 5.0), RESOURCE_FULL);
    }

    #[test]
    fn boost_is_capped() {
        let mut f = ResourceField::new(40, 40);
        f.boost_cell(0, 0, 1000.0);
        assert_eq!(f.cell_level(0, 0), RESOURCE_BOOST_CAP);
        f.boost_cell(9, 9, 5.0);
        assert_eq!(f.cell_level(1, 1), RESOURCE_FULL);
    }

    #[test]
    fn regeneration_heads_back_to_full() {
        let mut f = ResourceField::new(40, 40);
        f.consume(5.0, 5.0, 1.0);
        f.boost_cell(1, 1, 0.02);
        for _ in 0..10 {
            f.regenerate(16);
        }
        assert_eq!(f.level_at(5.0, 5.0), RESOURCE_FULL);
        assert_eq!(f.cell_level(1, 1), RESOURCE_FULL);
    }

    #[test]
    fn sample_mean_reflects_depletion() {
        let mut f = ResourceField::new(40, 20);
        f.consume(5.0, 5.0, 100.0);
        let mean = f.sample_mean(800, &mut seeded(3));
        assert_eq!(mean, 50.0);
    }
}
