use rand::{rngs::StdRng, Rng, SeedableRng};
use std::time::{SystemTime, UNIX_EPOCH};

/// Largest `f32` below 1.0.
const UNIT_MAX: f32 = 1.0 - f32::EPSILON / 2.0;

/// Uniform randomness in `[0, 1)`. Everything stochastic in the simulation
/// draws through this, so tests can substitute a scripted sequence.
pub(crate) trait RandomSource {
    fn next_f64(&mut self) -> f64;

    /// Narrowed to `f32` without rounding up to 1.0.
    fn unit(&mut self) -> f32 {
        (self.next_f64() as f32).min(UNIT_MAX)
    }

    fn chance(&mut self, p: f32) -> bool {
        self.unit() < p
    }

    /// Uniform in `[lo, hi)`.
    fn range(&mut self, lo: f32, hi: f32) -> f32 {
        let v = lo + self.unit() * (hi - lo);
        // f32 rounding can still land on `hi` for the very top draws
        if v < hi {
            v
        } else {
            lo
        }
    }

    /// Uniform in `[-amount, amount)`.
    fn signed(&mut self, amount: f32) -> f32 {
        (self.unit() * 2.0 - 1.0) * amount
    }

    /// Index in `0..len`; `len` must be non-zero.
    fn index(&mut self, len: usize) -> usize {
        ((self.next_f64() * len as f64) as usize).min(len.saturating_sub(1))
    }
}

impl RandomSource for StdRng {
    fn next_f64(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

pub(crate) fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Seed 0 means "pick one from the clock".
pub(crate) fn resolve_seed(seed: u64) -> u64 {
    if seed != 0 {
        return seed;
    }
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0xC0FFEE)
        | 1
}

/// Replays a fixed sequence forever.
#[cfg(test)]
pub(crate) struct Scripted {
    values: Vec<f64>,
    cursor: usize,
}

#[cfg(test)]
impl Scripted {
    pub(crate) fn new(values: &[f64]) -> Self {
        assert!(!values.is_empty(), "scripted sequence must not be empty");
        Self {
            values: values.to_vec(),
            cursor: 0,
        }
    }

    pub(crate) fn constant(v: f64) -> Self {
        Self::new(&[v])
    }
}

#[cfg(test)]
impl RandomSource for Scripted {
    fn next_f64(&mut self) -> f64 {
        let v = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_cycles_through_values() {
        let mut r = Scripted::new(&[0.1, 0.9]);
        assert_eq!(r.next_f64(), 0.1);
        assert_eq!(r.next_f64(), 0.9);
        assert_eq!(r.next_f64(), 0.1);
    }

    #[test]
    fn index_stays_in_range_at_upper_edge() {
        let mut r = Scripted::constant(0.999_999_999);
        assert_eq!(r.index(7), 6);
        let mut r = Scripted::constant(0.0);
        assert_eq!(r.index(7), 0);
    }

    #[test]
    fn signed_is_symmetric() {
        let mut lo = Scripted::constant(0.0);
        let mut hi = Scripted::constant(0.999_999_999);
        assert_eq!(lo.signed(3.0), -3.0);
        let top = hi.signed(3.0);
        assert!(top < 3.0 && top > 2.999, "{top}");
    }

    #[test]
    fn top_draws_stay_inside_half_open_ranges() {
        let mut r = Scripted::constant(1.0 - 1e-9);
        assert!(r.unit() < 1.0);
        let v = r.range(0.3, 0.7);
        assert!((0.3..0.7).contains(&v), "{v}");
        assert!(r.chance(1.0));
        assert!(!r.chance(0.0));
    }

    #[test]
    fn seeded_std_rng_stays_in_unit_interval() {
        let mut rng = seeded(7);
        for _ in 0..1000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn nonzero_seed_is_kept() {
        assert_eq!(resolve_seed(42), 42);
        assert_ne!(resolve_seed(0), 0);
    }
}
