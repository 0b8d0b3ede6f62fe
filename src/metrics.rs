use crate::ecosystem::organism::OrganismKind;
use crate::genetics::Genus;
use crate::rng::RandomSource;
use std::collections::VecDeque;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct GrowthMetrics {
    /// Active share of all cells, 0..=1.
    pub(crate) coverage: f32,
    pub(crate) avg_intensity: f32,
    /// Shannon entropy over 8 intensity bins, normalised to 0..=1.
    pub(crate) entropy: f32,
}

const ENTROPY_BINS: usize = 8;

pub(crate) fn calculate_growth_metrics(
    intensities: &[f32],
    total_cells: usize,
    active_cells: usize,
) -> GrowthMetrics {
    if total_cells == 0 {
        return GrowthMetrics::default();
    }
    let coverage = (active_cells as f32 / total_cells as f32).clamp(0.0, 1.0);
    if intensities.is_empty() {
        return GrowthMetrics {
            coverage,
            ..GrowthMetrics::default()
        };
    }

    let n = intensities.len() as f32;
    let avg_intensity = intensities.iter().sum::<f32>() / n;

    let mut counts = [0usize; ENTROPY_BINS];
    for v in intensities {
        let normalized = (v / 255.0).clamp(0.0, 0.999);
        counts[(normalized * ENTROPY_BINS as f32) as usize] += 1;
    }
    let entropy: f32 = counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f32 / n;
            -p * p.log2()
        })
        .sum();
    let max_entropy = (ENTROPY_BINS as f32).log2();

    GrowthMetrics {
        coverage,
        avg_intensity,
        entropy: (entropy / max_entropy).clamp(0.0, 1.0),
    }
}

/// Classic reservoir sampling: at most `cap` items, each equally likely.
pub(crate) fn reservoir_sample<T: Copy>(
    items: impl Iterator<Item = T>,
    cap: usize,
    rng: &mut impl RandomSource,
) -> Vec<T> {
    let mut out = Vec::with_capacity(cap);
    for (seen, item) in items.enumerate() {
        if out.len() < cap {
            out.push(item);
        } else {
            let j = rng.index(seen + 1);
            if j < cap {
                out[j] = item;
            }
        }
    }
    out
}

/// Fixed-length rolling window for sparklines.
#[derive(Clone, Debug)]
pub(crate) struct History {
    cap: usize,
    values: VecDeque<f32>,
}

impl History {
    pub(crate) fn new(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            values: VecDeque::with_capacity(cap.max(1)),
        }
    }

    pub(crate) fn push(&mut self, v: f32) {
        if self.values.len() == self.cap {
            self.values.pop_front();
        }
        self.values.push_back(v);
    }

    pub(crate) fn values(&self) -> impl Iterator<Item = f32> + '_ {
        self.values.iter().copied()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }
}

/// Exponentially decayed mean of recent mutation magnitudes.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct MutationTracker {
    pub(crate) hue: f32,
    pub(crate) shape: f32,
}

const MUTATION_BLEND: f32 = 0.08;
const MUTATION_FADE: f32 = 0.97;

impl MutationTracker {
    pub(crate) fn record(&mut self, hue_delta: f32, shape_delta: f32) {
        self.hue += (hue_delta - self.hue) * MUTATION_BLEND;
        self.shape += (shape_delta - self.shape) * MUTATION_BLEND;
    }

    /// Called once per sample so a lull in births shows as a fading rate.
    pub(crate) fn fade(&mut self) {
        self.hue *= MUTATION_FADE;
        self.shape *= MUTATION_FADE;
    }
}

/// Read-only HUD readout, refreshed at sampling points.
#[derive(Clone, Debug, Default)]
pub(crate) struct HudSnapshot {
    pub(crate) clouds: usize,
    pub(crate) apex: usize,
    pub(crate) wave: String,
    pub(crate) growth: GrowthMetrics,
    pub(crate) mean_energy: f32,
    pub(crate) diversity: usize,
    pub(crate) species: [usize; OrganismKind::COUNT],
    pub(crate) genera: [usize; Genus::ALL.len()],
    pub(crate) mutation: MutationTracker,
    pub(crate) resource_pct: f32,
    pub(crate) coverage_history: Vec<f32>,
    pub(crate) energy_history: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::seeded;

    #[test]
    fn empty_inputs_yield_zeros() {
        let m = calculate_growth_metrics(&[], 1000, 0);
        assert_eq!(m, GrowthMetrics::default());
        let m = calculate_growth_metrics(&[], 0, 0);
        assert_eq!(m, GrowthMetrics::default());
        let m = calculate_growth_metrics(&[12.0, 40.0], 0, 5);
        assert_eq!(m, GrowthMetrics::default());
    }

    #[test]
    fn coverage_average_and_entropy() {
        let m = calculate_growth_metrics(&[10.0, 50.0, 200.0, 255.0], 1000, 200);
        assert!((m.coverage - 0.2).abs() < 1e-6);
        assert!((m.avg_intensity - 128.75).abs() < 1e-4);
        assert!(m.entropy > 0.0 && m.entropy <= 1.0);
        // four distinct bins out of eight: 2 bits / 3 bits
        assert!((m.entropy - 2.0 / 3.0).abs() < 1e-5);
    }

    #[test]
    fn single_bin_has_zero_entropy() {
        let m = calculate_growth_metrics(&[100.0; 50], 500, 100);
        assert!(m.entropy.abs() < 1e-6);
        assert!((m.coverage - 0.2).abs() < 1e-6);
    }

    #[test]
    fn uniform_bins_reach_full_entropy() {
        let sample: Vec<f32> = (0..8).map(|b| b as f32 * 32.0 + 4.0).collect();
        let m = calculate_growth_metrics(&sample, 10, 10);
        assert!((m.entropy - 1.0).abs() < 1e-5);
    }

    #[test]
    fn coverage_is_clamped() {
        let m = calculate_growth_metrics(&[1.0], 10, 50);
        assert_eq!(m.coverage, 1.0);
    }

    #[test]
    fn reservoir_respects_cap() {
        let mut rng = seeded(5);
        let s = reservoir_sample(0..10_000u32, 1500, &mut rng);
        assert_eq!(s.len(), 1500);
        let small = reservoir_sample(0..10u32, 1500, &mut rng);
        assert_eq!(small, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn history_drops_oldest() {
        let mut h = History::new(3);
        for v in [1.0, 2.0, 3.0, 4.0] {
            h.push(v);
        }
        assert_eq!(h.len(), 3);
        assert_eq!(h.values().collect::<Vec<_>>(), vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn mutation_tracker_rises_then_fades() {
        let mut t = MutationTracker::default();
        for _ in 0..50 {
            t.record(10.0, 0.1);
        }
        assert!(t.hue > 9.0 && t.hue <= 10.0);
        let before = t.hue;
        t.fade();
        assert!(t.hue < before);
    }
}
