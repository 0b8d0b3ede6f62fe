/// Rolling frame-cost tracker that scales the per-frame work the ecosystem
/// is allowed to do. Bounds and clamps are never relaxed, only iteration
/// counts shrink.
#[derive(Clone, Debug)]
pub(crate) struct PerfGovernor {
    frame_ema_ms: f32,
    render_scale: f32,
    spread_factor: f32,
    base_cap: usize,
    map_cap: usize,
}

const EMA_ALPHA: f32 = 0.1;
const SLOW_FRAME_MS: f32 = 22.0;
const FAST_FRAME_MS: f32 = 16.0;
const SCALE_MIN: f32 = 0.4;
const SCALE_MAX: f32 = 1.5;

const SLOW_SPREAD_MS: f32 = 4.0;
const FAST_SPREAD_MS: f32 = 1.5;
const SPREAD_FACTOR_MIN: f32 = 0.25;

const CAP_MIN_RATIO: f32 = 0.4;
const CAP_MAX_RATIO: f32 = 1.5;

const BASE_RENDER_CELLS: f32 = 9000.0;
const BASE_RENDER_ORGANISMS: f32 = 400.0;
const BASE_SPREAD_CELLS: f32 = 700.0;

impl PerfGovernor {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        let base_cap = ((width as usize * height as usize) / 6).clamp(2_000, 30_000);
        Self {
            frame_ema_ms: FAST_FRAME_MS,
            render_scale: 1.0,
            spread_factor: 1.0,
            base_cap,
            map_cap: base_cap,
        }
    }

    /// Feed one frame's wall duration. Returns true when the render scale moved.
    pub(crate) fn observe_frame(&mut self, delta_ms: f32) -> bool {
        if !delta_ms.is_finite() || delta_ms < 0.0 {
            return false;
        }
        self.frame_ema_ms += (delta_ms - self.frame_ema_ms) * EMA_ALPHA;
        let before = self.render_scale;
        if self.frame_ema_ms > SLOW_FRAME_MS {
            self.render_scale = (self.render_scale * 0.95).max(SCALE_MIN);
        } else if self.frame_ema_ms < FAST_FRAME_MS {
            self.render_scale = (self.render_scale * 1.02).min(SCALE_MAX);
        }
        self.render_scale != before
    }

    /// Feed how long the last growth spread took; tunes spread throttling and the map cap.
    pub(crate) fn observe_spread(&mut self, cost_ms: f32) {
        let lo = (self.base_cap as f32 * CAP_MIN_RATIO) as usize;
        let hi = (self.base_cap as f32 * CAP_MAX_RATIO) as usize;
        if cost_ms > SLOW_SPREAD_MS {
            self.spread_factor = (self.spread_factor * 0.9).max(SPREAD_FACTOR_MIN);
            self.map_cap = ((self.map_cap as f32 * 0.95) as usize).max(lo);
        } else if cost_ms < FAST_SPREAD_MS {
            self.spread_factor = (self.spread_factor * 1.05).min(1.0);
            self.map_cap = ((self.map_cap as f32 * 1.01) as usize + 1).min(hi);
        }
    }

    pub(crate) fn frame_ema_ms(&self) -> f32 {
        self.frame_ema_ms
    }

    pub(crate) fn render_scale(&self) -> f32 {
        self.render_scale
    }

    pub(crate) fn map_cap(&self) -> usize {
        self.map_cap
    }

    pub(crate) fn render_cell_budget(&self) -> usize {
        (BASE_RENDER_CELLS * self.render_scale) as usize
    }

    pub(crate) fn render_organism_budget(&self) -> usize {
        (BASE_RENDER_ORGANISMS * self.render_scale) as usize
    }

    pub(crate) fn spread_budget(&self) -> usize {
        (BASE_SPREAD_CELLS * self.render_scale * self.spread_factor).max(1.0) as usize
    }
}
