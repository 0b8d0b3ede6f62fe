//! Coarse glyph-grid colonies that creep across the terminal during the art phase.

use crate::rng::RandomSource;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum ColonyKind {
    Fungus,
    Slime,
    Mold,
    Mycelium,
    Algae,
}

impl ColonyKind {
    pub(crate) const ALL: [ColonyKind; 5] = [
        ColonyKind::Fungus,
        ColonyKind::Slime,
        ColonyKind::Mold,
        ColonyKind::Mycelium,
        ColonyKind::Algae,
    ];

    /// Growth progression; densifying walks toward the end.
    pub(crate) fn glyphs(self) -> &'static [char] {
        match self {
            ColonyKind::Fungus => &['·', '•', '◦', '◉', '◯', '○', '●', '◐', '◑', '◒', '◓'],
            ColonyKind::Slime => &['~', '≈', '≋', '∿', '∼', '∽', '≁', '≃'],
            ColonyKind::Mold => &['░', '▒', '▓', '█', '▄', '▀', '▌', '▐'],
            ColonyKind::Mycelium => &['─', '━', '═', '╌', '╍', '╎', '╏', '│', '┃', '║'],
            ColonyKind::Algae => &[
                '*', '✱', '✲', '✳', '✴', '✵', '✶', '✷', '✸', '✹', '✺', '✻', '✼', '✽', '✾',
                '✿', '❀', '❁', '❂', '❃', '❄', '❅', '❆', '❇', '❈', '❉', '❊', '❋',
            ],
        }
    }

    pub(crate) fn color_hex(self) -> &'static str {
        match self {
            ColonyKind::Fungus => "#ffb84d",
            ColonyKind::Slime => "#39ff14",
            ColonyKind::Mold => "#ff1493",
            ColonyKind::Mycelium => "#00ffff",
            ColonyKind::Algae => "#ffff00",
        }
    }
}

pub(crate) const EMPTY: char = ' ';

/// Row-major glyph grid; dimensions fixed at construction.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ColonyGrid {
    rows: usize,
    cols: usize,
    cells: Vec<char>,
}

impl ColonyGrid {
    /// A zero dimension gives an empty grid that never grows.
    pub(crate) fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![EMPTY; rows * cols],
        }
    }

    pub(crate) fn rows(&self) -> usize {
        self.rows
    }

    pub(crate) fn cols(&self) -> usize {
        self.cols
    }

    pub(crate) fn get(&self, r: usize, c: usize) -> Option<char> {
        (r < self.rows && c < self.cols).then(|| self.cells[r * self.cols + c])
    }

    fn set(&mut self, r: usize, c: usize, ch: char) {
        if r < self.rows && c < self.cols {
            self.cells[r * self.cols + c] = ch;
        }
    }

    pub(crate) fn occupied(&self) -> usize {
        self.cells.iter().filter(|&&c| c != EMPTY).count()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct GrowthColony {
    pub(crate) kind: ColonyKind,
    pub(crate) cells: Vec<(usize, usize)>,
    pub(crate) age: u32,
    pub(crate) spread_rate: f32,
}

pub(crate) type ColorMap = HashMap<(usize, usize), ColonyKind>;

#[derive(Clone, Debug)]
pub(crate) struct ColonyGrowth {
    pub(crate) grid: ColonyGrid,
    pub(crate) colonies: Vec<GrowthColony>,
    pub(crate) color_map: ColorMap,
}

const MAX_SEEDS: usize = 5;
const DENSIFY_FACTOR: f32 = 0.4;

const NEIGHBORS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// One growth round. Inputs are left untouched; the returned grid only ever
/// gains or densifies cells relative to `grid`.
pub(crate) fn grow_colonies(
    grid: &ColonyGrid,
    intensity: f32,
    colonies: &[GrowthColony],
    color_map: &ColorMap,
    rng: &mut impl RandomSource,
) -> ColonyGrowth {
    let mut grid = grid.clone();
    let mut color_map = color_map.clone();
    let mut colonies = colonies.to_vec();
    let (rows, cols) = (grid.rows, grid.cols);

    if rows == 0 || cols == 0 {
        return ColonyGrowth {
            grid,
            colonies,
            color_map,
        };
    }

    if colonies.is_empty() {
        let seeds = MAX_SEEDS.min((intensity.max(0.0) * 8.0).floor() as usize + 3);
        // a single row or column folds the corners together
        let mut corners: Vec<(usize, usize)> = Vec::with_capacity(4);
        for corner in [(0, 0), (0, cols - 1), (rows - 1, 0), (rows - 1, cols - 1)] {
            if !corners.contains(&corner) {
                corners.push(corner);
            }
        }
        for i in 0..seeds {
            let kind = ColonyKind::ALL[i % ColonyKind::ALL.len()];
            let (r, c) = match corners.get(i) {
                Some(&corner) => corner,
                None => (rng.index(rows), rng.index(cols)),
            };
            grid.set(r, c, kind.glyphs()[0]);
            color_map.insert((r, c), kind);
            colonies.push(GrowthColony {
                kind,
                cells: vec![(r, c)],
                age: 0,
                spread_rate: rng.range(0.3, 0.7),
            });
        }
    }

    for colony in &mut colonies {
        let glyphs = colony.kind.glyphs();
        let rate = colony.spread_rate * (1.0 + intensity * 0.5) * (1.0 + colony.age as f32 * 0.01);
        let mut fresh = Vec::new();

        for &(r, c) in &colony.cells {
            for (dr, dc) in NEIGHBORS {
                let (Some(nr), Some(nc)) = (r.checked_add_signed(dr), c.checked_add_signed(dc))
                else {
                    continue;
                };
                let Some(current) = grid.get(nr, nc) else {
                    continue;
                };
                if current == EMPTY {
                    if rng.chance(rate) {
                        grid.set(nr, nc, glyphs[rng.index(glyphs.len())]);
                        color_map.insert((nr, nc), colony.kind);
                        fresh.push((nr, nc));
                    }
                } else if let Some(pos) = glyphs.iter().position(|&g| g == current) {
                    if rng.chance(rate * DENSIFY_FACTOR) {
                        if pos + 1 < glyphs.len() {
                            grid.set(nr, nc, glyphs[pos + 1]);
                        }
                        color_map.entry((nr, nc)).or_insert(colony.kind);
                    }
                }
            }
        }

        colony.cells.extend(fresh);
        colony.age += 1;
    }

    ColonyGrowth {
        grid,
        colonies,
        color_map,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{seeded, Scripted};

    #[test]
    fn seeds_five_colonies_at_full_intensity() {
        let grid = ColonyGrid::new(10, 20);
        let out = grow_colonies(&grid, 1.0, &[], &ColorMap::new(), &mut Scripted::constant(0.5));
        assert_eq!(out.grid.rows(), 10);
        assert_eq!(out.grid.cols(), 20);
        assert_eq!(out.colonies.len(), 5);
        assert!(out.grid.occupied() >= 5);
        assert!(out.color_map.len() >= 5);
        // the input grid is not modified
        assert_eq!(grid.occupied(), 0);
    }

    #[test]
    fn seed_count_follows_intensity() {
        let grid = ColonyGrid::new(6, 6);
        let low = grow_colonies(&grid, 0.0, &[], &ColorMap::new(), &mut Scripted::constant(0.99));
        assert_eq!(low.colonies.len(), 3);
        let mid = grow_colonies(&grid, 0.15, &[], &ColorMap::new(), &mut Scripted::constant(0.99));
        assert_eq!(mid.colonies.len(), 4);
    }

    #[test]
    fn empty_grid_is_left_alone() {
        let out = grow_colonies(&ColonyGrid::new(0, 5), 1.0, &[], &ColorMap::new(), &mut seeded(1));
        assert!(out.colonies.is_empty());
        assert_eq!(out.grid.occupied(), 0);
    }

    #[test]
    fn single_row_grid_seeds_each_corner_once() {
        let out = grow_colonies(&ColonyGrid::new(1, 5), 1.0, &[], &ColorMap::new(), &mut Scripted::constant(0.5));
        assert_eq!(out.colonies.len(), 5);
        let seeds: Vec<_> = out.colonies.iter().map(|c| c.cells[0]).collect();
        assert_eq!(&seeds[..2], &[(0, 0), (0, 4)]);
        assert!(seeds[2..].iter().all(|&s| s == (0, 2)));
    }

    #[test]
    fn first_four_seeds_take_the_corners() {
        let grid = ColonyGrid::new(8, 12);
        let out = grow_colonies(&grid, 1.0, &[], &ColorMap::new(), &mut Scripted::constant(0.99));
        let corners: Vec<_> = out.colonies.iter().take(4).map(|c| c.cells[0]).collect();
        assert_eq!(corners, vec![(0, 0), (0, 11), (7, 0), (7, 11)]);
        assert_eq!(out.grid.get(0, 0), Some('·'));
        assert!(out.colonies.iter().all(|c| (0.3..0.7).contains(&c.spread_rate)));
    }

    #[test]
    fn occupancy_never_shrinks_across_rounds() {
        let mut rng = seeded(17);
        let mut state = grow_colonies(
            &ColonyGrid::new(12, 30),
            1.0,
            &[],
            &ColorMap::new(),
            &mut rng,
        );
        let mut before = state.grid.occupied();
        for round in 0..15 {
            let intensity = 0.5 + round as f32 * 0.03;
            let next = grow_colonies(&state.grid, intensity, &state.colonies, &state.color_map, &mut rng);
            assert_eq!(next.colonies.len(), state.colonies.len());
            for (old, new) in state.colonies.iter().zip(&next.colonies) {
                assert!(new.cells.starts_with(&old.cells));
                assert_eq!(new.age, old.age + 1);
            }
            let after = next.grid.occupied();
            assert!(after >= before);
            before = after;
            state = next;
        }
    }

    #[test]
    fn densify_advances_glyph_and_caps_at_last() {
        let mut grid = ColonyGrid::new(1, 2);
        let glyphs = ColonyKind::Slime.glyphs();
        grid.set(0, 0, glyphs[0]);
        grid.set(0, 1, glyphs[glyphs.len() - 2]);
        let colony = GrowthColony {
            kind: ColonyKind::Slime,
            cells: vec![(0, 0)],
            age: 0,
            spread_rate: 1.0,
        };
        let once = grow_colonies(&grid, 0.0, &[colony], &ColorMap::new(), &mut Scripted::constant(0.0));
        assert_eq!(once.grid.get(0, 1), Some(glyphs[glyphs.len() - 1]));
        assert_eq!(once.color_map.get(&(0, 1)), Some(&ColonyKind::Slime));
        let twice = grow_colonies(&once.grid, 0.0, &once.colonies, &once.color_map, &mut Scripted::constant(0.0));
        assert_eq!(twice.grid.get(0, 1), Some(glyphs[glyphs.len() - 1]));
    }

    #[test]
    fn foreign_glyphs_are_not_densified() {
        let mut grid = ColonyGrid::new(1, 2);
        grid.set(0, 0, '~');
        grid.set(0, 1, '░');
        let colony = GrowthColony {
            kind: ColonyKind::Slime,
            cells: vec![(0, 0)],
            age: 0,
            spread_rate: 1.0,
        };
        let out = grow_colonies(&grid, 1.0, &[colony], &ColorMap::new(), &mut Scripted::constant(0.0));
        assert_eq!(out.grid.get(0, 1), Some('░'));
        assert!(!out.color_map.contains_key(&(0, 1)));
    }
}
