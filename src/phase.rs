use crate::config::PhaseSettings;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Phase {
    Controlled,
    Chaos,
    Art,
}

impl Phase {
    pub(crate) fn label(self) -> &'static str {
        match self {
            Phase::Controlled => "controlled",
            Phase::Chaos => "chaos",
            Phase::Art => "art",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct PhaseReading {
    pub(crate) intensity: f32,
    pub(crate) phase: Phase,
}

/// Maps elapsed time onto a sine-driven intensity and its discrete phase.
///
/// For the first `showcase_ms` the wave runs on a shorter period and is
/// boosted by 1.2 so a fresh viewer sees every phase early.
#[derive(Clone, Debug)]
pub(crate) struct PhaseClock {
    period_ms: f64,
    showcase_ms: f64,
    showcase_period_ms: f64,
    controlled_max: f32,
    art_min: f32,
}

const SHOWCASE_BOOST: f32 = 1.2;

impl PhaseClock {
    pub(crate) fn new(s: &PhaseSettings) -> Self {
        Self {
            period_ms: s.period_ms,
            showcase_ms: s.showcase_ms,
            showcase_period_ms: s.showcase_period_ms,
            controlled_max: s.controlled_max,
            art_min: s.art_min,
        }
    }

    pub(crate) fn sample(&self, elapsed_ms: f64) -> PhaseReading {
        let elapsed_ms = elapsed_ms.max(0.0);
        let intensity = if elapsed_ms < self.showcase_ms {
            (wave(elapsed_ms, self.showcase_period_ms) * SHOWCASE_BOOST).min(1.0)
        } else {
            wave(elapsed_ms, self.period_ms)
        };
        PhaseReading {
            intensity,
            phase: self.classify(intensity),
        }
    }

    pub(crate) fn classify(&self, intensity: f32) -> Phase {
        if intensity <= self.controlled_max {
            Phase::Controlled
        } else if intensity <= self.art_min {
            Phase::Chaos
        } else {
            Phase::Art
        }
    }
}

fn wave(elapsed_ms: f64, period_ms: f64) -> f32 {
    let v = ((elapsed_ms / period_ms).sin() + 1.0) / 2.0;
    (v as f32).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn clock() -> PhaseClock {
        PhaseClock::new(&PhaseSettings {
            showcase_ms: 0.0,
            ..PhaseSettings::default()
        })
    }

    #[test]
    fn intensity_starts_at_midpoint() {
        let r = clock().sample(0.0);
        assert!((r.intensity - 0.5).abs() < 1e-6);
        assert_eq!(r.phase, Phase::Chaos);
    }

    #[test]
    fn peak_and_trough_map_to_art_and_controlled() {
        let c = clock();
        let period = PhaseSettings::default().period_ms;
        let peak = c.sample(period * PI / 2.0);
        let trough = c.sample(period * 3.0 * PI / 2.0);
        assert!((peak.intensity - 1.0).abs() < 1e-5);
        assert_eq!(peak.phase, Phase::Art);
        assert!(trough.intensity < 1e-5);
        assert_eq!(trough.phase, Phase::Controlled);
    }

    #[test]
    fn thresholds_are_inclusive_on_the_lower_phase() {
        let c = clock();
        assert_eq!(c.classify(0.3), Phase::Controlled);
        assert_eq!(c.classify(0.300_01), Phase::Chaos);
        assert_eq!(c.classify(0.75), Phase::Chaos);
        assert_eq!(c.classify(0.750_01), Phase::Art);
    }

    #[test]
    fn showcase_window_boosts_and_caps() {
        let s = PhaseSettings::default();
        let c = PhaseClock::new(&s);
        // sin peaks at showcase_period * pi/2, well inside the window
        let t = s.showcase_period_ms * PI / 2.0;
        assert!(t < s.showcase_ms);
        assert_eq!(c.sample(t).intensity, 1.0);
        let mid = c.sample(0.0);
        assert!((mid.intensity - 0.6).abs() < 1e-6);
    }

    #[test]
    fn intensity_always_in_unit_range() {
        let c = PhaseClock::new(&PhaseSettings::default());
        let mut t = 0.0;
        while t < 120_000.0 {
            let r = c.sample(t);
            assert!((0.0..=1.0).contains(&r.intensity));
            t += 37.0;
        }
    }
}
