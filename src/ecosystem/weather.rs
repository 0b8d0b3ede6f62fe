use super::field::{Axis, ResourceField, RESOURCE_CELL};
use crate::rng::RandomSource;

pub(crate) const MAX_CLOUDS: usize = 5;
const BOOST_RATE: f32 = 0.05;

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct NutrientCloud {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) vx: f32,
    pub(crate) vy: f32,
    pub(crate) radius: f32,
    pub(crate) strength: f32,
    pub(crate) life: u32,
}

impl NutrientCloud {
    pub(crate) fn random(width: u32, height: u32, rng: &mut impl RandomSource) -> Self {
        let span = width.min(height) as f32;
        Self {
            x: rng.range(0.0, width as f32),
            y: rng.range(0.0, height as f32),
            vx: rng.signed(0.4),
            vy: rng.signed(0.4),
            radius: (span * rng.range(0.12, 0.3)).max(RESOURCE_CELL),
            strength: rng.range(10.0, 30.0),
            life: 400 + rng.index(500) as u32,
        }
    }

    /// Drifts one frame, bouncing off the edges; returns false once expired.
    pub(crate) fn advance(&mut self, width: u32, height: u32) -> bool {
        let (w, h) = (width as f32, height as f32);
        self.x += self.vx;
        self.y += self.vy;
        if self.x < 0.0 || self.x > w {
            self.vx = -self.vx;
            self.x = self.x.clamp(0.0, w);
        }
        if self.y < 0.0 || self.y > h {
            self.vy = -self.vy;
            self.y = self.y.clamp(0.0, h);
        }
        self.life = self.life.saturating_sub(1);
        self.life > 0
    }

    /// Boost at distance `d` from the centre; zero at and beyond the radius.
    pub(crate) fn boost_at(&self, d: f32) -> f32 {
        if self.radius <= 0.0 {
            return 0.0;
        }
        ((self.radius - d) / self.radius).max(0.0) * self.strength * BOOST_RATE
    }

    /// Feeds every resource cell whose centre lies inside the cloud.
    pub(crate) fn nourish(&self, field: &mut ResourceField) {
        let (cols, rows) = field.dims();
        let reach = (self.radius / RESOURCE_CELL).ceil() as i64;
        let ccx = (self.x / RESOURCE_CELL) as i64;
        let ccy = (self.y / RESOURCE_CELL) as i64;
        for cy in (ccy - reach).max(0)..=(ccy + reach).min(rows as i64 - 1) {
            for cx in (ccx - reach).max(0)..=(ccx + reach).min(cols as i64 - 1) {
                let px = (cx as f32 + 0.5) * RESOURCE_CELL;
                let py = (cy as f32 + 0.5) * RESOURCE_CELL;
                let d = ((px - self.x).powi(2) + (py - self.y).powi(2)).sqrt();
                let boost = self.boost_at(d);
                if boost > 0.0 {
                    field.boost_cell(cx as u32, cy as u32, boost);
                }
            }
        }
    }
}

/// A band sweeping across the canvas, dimming growth as it passes.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct DecayWave {
    pub(crate) axis: Axis,
    pub(crate) position: f32,
    pub(crate) direction: f32,
    pub(crate) speed: f32,
    pub(crate) width: f32,
    extent: f32,
}

pub(crate) const WAVE_STRENGTH: f32 = 0.15;

impl DecayWave {
    pub(crate) fn random(width: u32, height: u32, rng: &mut impl RandomSource) -> Self {
        let axis = if rng.chance(0.5) { Axis::X } else { Axis::Y };
        let extent = match axis {
            Axis::X => width as f32,
            Axis::Y => height as f32,
        };
        let direction = if rng.chance(0.5) { 1.0 } else { -1.0 };
        let band = rng.range(12.0, 30.0);
        Self {
            axis,
            position: if direction > 0.0 { -band / 2.0 } else { extent + band / 2.0 },
            direction,
            speed: rng.range(0.6, 1.6),
            width: band,
            extent,
        }
    }

    pub(crate) fn advance(&mut self) {
        self.position += self.direction * self.speed;
    }

    /// True once the whole band is past the far edge.
    pub(crate) fn exited(&self) -> bool {
        let half = self.width / 2.0;
        if self.direction > 0.0 {
            self.position - half > self.extent
        } else {
            self.position + half < 0.0
        }
    }

    pub(crate) fn descriptor(&self) -> String {
        let arrow = match (self.axis, self.direction > 0.0) {
            (Axis::X, true) => '→',
            (Axis::X, false) => '←',
            (Axis::Y, true) => '↓',
            (Axis::Y, false) => '↑',
        };
        format!("{arrow} {:.0}/{:.0} w{:.0}", self.position.max(0.0), self.extent, self.width)
    }
}
