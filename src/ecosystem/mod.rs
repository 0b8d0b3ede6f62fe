//! The pixel ecosystem: organisms wander a braille-resolution canvas, feed
//! on a coarse resource lattice and leave residue on a sparse growth map.
//! Everything advances through [`Ecosystem::step`], once per drawn frame.

pub(crate) mod deposit;
pub(crate) mod field;
pub(crate) mod organism;
pub(crate) mod spatial;
pub(crate) mod weather;

use crate::genetics::{gene_to_color, mutate_gene, Genus, Rgb, DEFAULT_LIGHTNESS};
use crate::governor::PerfGovernor;
use crate::metrics::{calculate_growth_metrics, reservoir_sample, History, HudSnapshot, MutationTracker};
use crate::phase::{PhaseClock, PhaseReading};
use crate::rng::RandomSource;
use field::{GrowthMap, ResourceField, MAX_EXTENT};
use organism::{Organism, OrganismKind};
use spatial::SpatialGrid;
use std::time::Instant;
use tracing::{debug, trace};
use weather::{DecayWave, NutrientCloud, MAX_CLOUDS, WAVE_STRENGTH};

const SPATIAL_CELL: f32 = 40.0;
const INTERACT_RADIUS_SQ: f32 = 20.0 * 20.0;
const APEX_REACH_SQ: f32 = 32.0 * 32.0;
const APEX_SENSE_SQ: f32 = 120.0 * 120.0;
const APEX_CHASE: f32 = 0.12;
const MAX_SPEED: f32 = 2.5;
const CLOUD_PULL: f32 = 0.02;

const COOP_GAIN: f32 = 0.05;
const COOP_LIMIT: usize = 50;
const COMPETE_RATE: f32 = 0.02;
const PREY_SHARE: f32 = 0.5;

const FEED_RATE: f32 = 0.3;
const FEED_GAIN: f32 = 0.8;
const STARVE_LOSS: f32 = 0.3;

const REPRO_AGE: u32 = 60;
const REPRO_ENERGY: f32 = 0.6;
const REPRO_RESOURCE: f32 = 30.0;
const CHILD_SHARE: f32 = 0.4;
const BIRTH_RESOURCE: f32 = 10.0;

const RETURN_SHARE: f32 = 0.3;
const APEX_RETURN_MULT: f32 = 2.0;

const GROWTH_DECAY: f32 = 0.985;
const GROWTH_FLOOR: f32 = 1.0;
const PRUNE_TARGET: f32 = 0.9;
const SPREAD_THRESHOLD: f32 = 60.0;
const SPREAD_RATIO: f32 = 0.6;
const SPREAD_CHANCE: f32 = 0.15;
const RESEED_RATIO: f32 = 0.4;
const AMBIENT_COLOR: Rgb = Rgb::new(70, 110, 80);

const REGEN_BUDGET: usize = 600;

const CLOUD_COOLDOWN_MS: f64 = 4_000.0;
const CLOUD_CHANCE: f32 = 0.02;
const APEX_COOLDOWN_MS: f64 = 12_000.0;
const APEX_CHANCE: f32 = 0.004;
const APEX_CAP: usize = 2;

const METRICS_EVERY: u64 = 12;
const GROWTH_SAMPLES: usize = 1_500;
const RESOURCE_SAMPLES: usize = 800;
const HISTORY_LEN: usize = 48;

const POPULATION_FLOOR: f32 = 12.0;
const POPULATION_FLOOR_MIN: f32 = 6.0;
const FLOOR_RESCUE: usize = 3;

/// What the caller gets back from each frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct StateSnapshot {
    pub(crate) frame: u64,
    pub(crate) elapsed_ms: f64,
    pub(crate) reading: PhaseReading,
    pub(crate) organisms: usize,
    pub(crate) growth_cells: usize,
    pub(crate) map_cap: usize,
    pub(crate) render_scale: f32,
}

/// Frame-start copy of the fields neighbours read from each other.
#[derive(Clone, Copy, Debug)]
struct Probe {
    x: f32,
    y: f32,
    kind: OrganismKind,
    energy: f32,
}

#[derive(Debug, Default)]
struct FrameTally {
    births: usize,
    deaths: usize,
    kills: usize,
}

pub(crate) struct Ecosystem<R: RandomSource> {
    width: u32,
    height: u32,
    clock: PhaseClock,
    rng: R,
    frame: u64,
    elapsed_ms: f64,
    reading: PhaseReading,
    next_id: u64,
    organisms: Vec<Organism>,
    counts: [usize; OrganismKind::COUNT],
    growth: GrowthMap,
    resources: ResourceField,
    clouds: Vec<NutrientCloud>,
    last_cloud_ms: f64,
    last_apex_ms: f64,
    wave: DecayWave,
    grid: SpatialGrid,
    probes: Vec<Probe>,
    positions: Vec<(f32, f32)>,
    near: Vec<usize>,
    governor: PerfGovernor,
    tracker: MutationTracker,
    coverage_history: History,
    energy_history: History,
    hud: HudSnapshot,
}

impl<R: RandomSource> Ecosystem<R> {
    /// A fresh ecosystem on a `width` x `height` pixel canvas, seeded along the edges.
    pub(crate) fn new(width: u32, height: u32, clock: PhaseClock, mut rng: R) -> Self {
        let width = width.clamp(1, MAX_EXTENT);
        let height = height.clamp(1, MAX_EXTENT);
        let wave = DecayWave::random(width, height, &mut rng);
        let reading = clock.sample(0.0);
        let mut eco = Self {
            width,
            height,
            clock,
            rng,
            frame: 0,
            elapsed_ms: 0.0,
            reading,
            next_id: 1,
            organisms: Vec::new(),
            counts: [0; OrganismKind::COUNT],
            growth: GrowthMap::new(width, height),
            resources: ResourceField::new(width, height),
            clouds: Vec::new(),
            last_cloud_ms: -CLOUD_COOLDOWN_MS,
            last_apex_ms: 0.0,
            wave,
            grid: SpatialGrid::new(width, height, SPATIAL_CELL),
            probes: Vec::new(),
            positions: Vec::new(),
            near: Vec::new(),
            governor: PerfGovernor::new(width, height),
            tracker: MutationTracker::default(),
            coverage_history: History::new(HISTORY_LEN),
            energy_history: History::new(HISTORY_LEN),
            hud: HudSnapshot::default(),
        };
        eco.seed_edges();
        eco.sample_metrics();
        debug!(width, height, organisms = eco.organisms.len(), "ecosystem seeded");
        eco
    }

    /// Continues the phase clock from `elapsed_ms` (after a resize or reseed).
    /// Spawn cooldowns restart from that moment.
    pub(crate) fn resume_at(mut self, elapsed_ms: f64) -> Self {
        let elapsed_ms = if elapsed_ms.is_finite() { elapsed_ms.max(0.0) } else { 0.0 };
        self.elapsed_ms = elapsed_ms;
        self.reading = self.clock.sample(elapsed_ms);
        self.last_cloud_ms = elapsed_ms - CLOUD_COOLDOWN_MS;
        self.last_apex_ms = elapsed_ms;
        self
    }

    pub(crate) fn dims(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub(crate) fn organisms(&self) -> &[Organism] {
        &self.organisms
    }

    pub(crate) fn growth(&self) -> &GrowthMap {
        &self.growth
    }

    pub(crate) fn governor(&self) -> &PerfGovernor {
        &self.governor
    }

    pub(crate) fn hud(&self) -> &HudSnapshot {
        &self.hud
    }

    pub(crate) fn reading(&self) -> PhaseReading {
        self.reading
    }

    pub(crate) fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    /// Feeds the governor how long the last frame's work took (simulation
    /// plus drawing, without the pacing sleep).
    pub(crate) fn observe_frame_cost(&mut self, cost_ms: f64) {
        if self.governor.observe_frame(cost_ms as f32) {
            trace!(
                scale = self.governor.render_scale(),
                ema_ms = self.governor.frame_ema_ms(),
                "render budget adjusted"
            );
        }
    }

    /// Advances one frame. `delta_ms` is wall time since the previous frame
    /// and only drives the phase clock.
    pub(crate) fn step(&mut self, delta_ms: f64) -> StateSnapshot {
        let delta_ms = if delta_ms.is_finite() { delta_ms.max(0.0) } else { 0.0 };
        self.frame += 1;
        self.elapsed_ms += delta_ms;
        self.reading = self.clock.sample(self.elapsed_ms);
        let intensity = self.reading.intensity;

        self.growth.decay(GROWTH_DECAY, GROWTH_FLOOR);
        self.enforce_growth_cap();
        self.resources.regenerate(REGEN_BUDGET);
        self.recount();
        self.update_clouds();
        self.maybe_spawn_apex();
        self.advance_wave();

        let tally = self.update_organisms(intensity);
        if tally.births + tally.deaths + tally.kills > 0 {
            trace!(
                frame = self.frame,
                births = tally.births,
                deaths = tally.deaths,
                kills = tally.kills,
                "population churn"
            );
        }

        self.spread_growth();
        self.enforce_growth_cap();

        if self.frame % METRICS_EVERY == 0 {
            self.sample_metrics();
        }
        self.enforce_population_floor();

        self.snapshot()
    }

    pub(crate) fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            frame: self.frame,
            elapsed_ms: self.elapsed_ms,
            reading: self.reading,
            organisms: self.organisms.len(),
            growth_cells: self.growth.len(),
            map_cap: self.governor.map_cap(),
            render_scale: self.governor.render_scale(),
        }
    }

    fn max_x(&self) -> f32 {
        (self.width as f32 - 1.0).max(0.0)
    }

    fn max_y(&self) -> f32 {
        (self.height as f32 - 1.0).max(0.0)
    }

    fn spawn(&mut self, kind: OrganismKind, x: f32, y: f32) {
        let org = Organism::spawn(self.next_id, kind, x, y, &mut self.rng);
        self.next_id += 1;
        self.counts[kind.index()] += 1;
        self.organisms.push(org);
    }

    /// A random point hugging one of the four canvas edges.
    fn edge_point(&mut self) -> (f32, f32) {
        let (mx, my) = (self.max_x(), self.max_y());
        let inset = self.rng.range(0.0, 4.0);
        match self.rng.index(4) {
            0 => (self.rng.range(0.0, mx), inset.min(my)),
            1 => (self.rng.range(0.0, mx), (my - inset).max(0.0)),
            2 => (inset.min(mx), self.rng.range(0.0, my)),
            _ => ((mx - inset).max(0.0), self.rng.range(0.0, my)),
        }
    }

    fn seed_edges(&mut self) {
        let area = self.width as f32 * self.height as f32;
        let initial = (area / 2_500.0).clamp(16.0, 80.0) as usize;
        for i in 0..initial {
            let kind = OrganismKind::BREEDERS[i % OrganismKind::BREEDERS.len()];
            let (x, y) = self.edge_point();
            self.spawn(kind, x, y);
        }
    }

    fn recount(&mut self) {
        self.counts = [0; OrganismKind::COUNT];
        for org in &self.organisms {
            self.counts[org.kind.index()] += 1;
        }
        for org in &mut self.organisms {
            org.population = self.counts[org.kind.index()];
        }
    }

    fn enforce_growth_cap(&mut self) {
        let cap = self.governor.map_cap();
        if self.growth.len() > cap {
            let evicted = self.growth.prune_to((cap as f32 * PRUNE_TARGET) as usize);
            trace!(evicted, cap, "growth map pruned");
        }
    }

    fn update_clouds(&mut self) {
        let (w, h) = (self.width, self.height);
        if self.clouds.len() < MAX_CLOUDS
            && self.elapsed_ms - self.last_cloud_ms >= CLOUD_COOLDOWN_MS
            && self.rng.chance(CLOUD_CHANCE)
        {
            let cloud = NutrientCloud::random(w, h, &mut self.rng);
            debug!(x = cloud.x, y = cloud.y, radius = cloud.radius, "nutrient cloud formed");
            self.clouds.push(cloud);
            self.last_cloud_ms = self.elapsed_ms;
        }
        self.clouds.retain_mut(|c| c.advance(w, h));
        for cloud in &self.clouds {
            cloud.nourish(&mut self.resources);
        }
    }

    fn maybe_spawn_apex(&mut self) {
        let apex = self.counts[OrganismKind::Apex.index()];
        if apex >= APEX_CAP
            || self.elapsed_ms - self.last_apex_ms < APEX_COOLDOWN_MS
            || !self.rng.chance(APEX_CHANCE)
        {
            return;
        }
        let (x, y) = self.edge_point();
        self.spawn(OrganismKind::Apex, x, y);
        self.last_apex_ms = self.elapsed_ms;
        if let Some(org) = self.organisms.last() {
            let color = gene_to_color(&org.gene, DEFAULT_LIGHTNESS);
            debug!(x, y, apex = apex + 1, %color, "apex predator arrived");
        }
    }

    fn advance_wave(&mut self) {
        self.wave.advance();
        if self.wave.exited() {
            self.wave = DecayWave::random(self.width, self.height, &mut self.rng);
            trace!(wave = %self.wave.descriptor(), "decay wave regenerated");
        }
        self.growth.suppress_band(
            self.wave.axis,
            self.wave.position,
            self.wave.width / 2.0,
            WAVE_STRENGTH,
        );
    }

    fn update_organisms(&mut self, intensity: f32) -> FrameTally {
        let (max_x, max_y) = (self.max_x(), self.max_y());
        let Self {
            rng,
            organisms,
            counts,
            growth,
            resources,
            clouds,
            grid,
            probes,
            positions,
            near,
            tracker,
            next_id,
            ..
        } = self;

        probes.clear();
        probes.extend(organisms.iter().map(|o| Probe {
            x: o.x,
            y: o.y,
            kind: o.kind,
            energy: o.energy,
        }));
        positions.clear();
        positions.extend(probes.iter().map(|p| (p.x, p.y)));
        grid.rebuild(positions.as_slice());

        let n = organisms.len();
        let mut removed = vec![false; n];
        let mut births = Vec::new();
        let mut tally = FrameTally::default();

        for i in 0..n {
            if removed[i] {
                continue;
            }
            let org = &mut organisms[i];
            let t = org.traits();

            org.age = org.age.saturating_add(1);
            org.energy -= t.energy_decay;
            org.vx = (org.vx + rng.signed(t.jitter)) * t.friction;
            org.vy = (org.vy + rng.signed(t.jitter)) * t.friction;

            for c in clouds.iter() {
                let (dx, dy) = (c.x - org.x, c.y - org.y);
                let d = (dx * dx + dy * dy).sqrt();
                let reach = c.radius * 2.0;
                if d > 1.0 && d < reach {
                    let pull = (1.0 - d / reach) * CLOUD_PULL * (c.strength / 20.0);
                    org.vx += dx / d * pull;
                    org.vy += dy / d * pull;
                }
            }

            if org.kind.is_apex() {
                if let Some((tx, ty)) = nearest_prey(probes, &removed, org.x, org.y) {
                    let (dx, dy) = (tx - org.x, ty - org.y);
                    let d = (dx * dx + dy * dy).sqrt().max(1.0);
                    org.vx += dx / d * APEX_CHASE;
                    org.vy += dy / d * APEX_CHASE;
                }
            }

            let speed = (org.vx * org.vx + org.vy * org.vy).sqrt();
            if speed > MAX_SPEED {
                org.vx *= MAX_SPEED / speed;
                org.vy *= MAX_SPEED / speed;
            }
            org.x += org.vx;
            org.y += org.vy;
            if org.x < 0.0 || org.x > max_x {
                org.vx = -org.vx;
                org.x = org.x.clamp(0.0, max_x);
            }
            if org.y < 0.0 || org.y > max_y {
                org.vy = -org.vy;
                org.y = org.y.clamp(0.0, max_y);
            }
            org.record_trail();

            near.clear();
            grid.neighbors(org.x, org.y, near);
            let reach = if org.kind.is_apex() { APEX_REACH_SQ } else { INTERACT_RADIUS_SQ };
            let mut fed = false;
            for &j in near.iter() {
                if j == i || removed[j] {
                    continue;
                }
                let other = probes[j];
                let d2 = (other.x - org.x).powi(2) + (other.y - org.y).powi(2);
                if d2 < INTERACT_RADIUS_SQ {
                    if other.kind == org.kind {
                        if org.population < COOP_LIMIT {
                            org.energy += COOP_GAIN;
                        }
                    } else {
                        org.energy += (t.strength - other.kind.traits().strength) * COMPETE_RATE;
                    }
                }
                if fed || d2 >= reach {
                    continue;
                }
                if let Some(p) = org.kind.predation_chance(other.kind) {
                    if rng.chance(p) {
                        removed[j] = true;
                        org.energy += other.energy * PREY_SHARE;
                        fed = true;
                        tally.kills += 1;
                    }
                }
            }

            let taken = resources.consume(org.x, org.y, t.territory * FEED_RATE);
            if taken > 0.0 {
                org.energy += taken * FEED_GAIN;
                org.consumed += taken;
            } else {
                org.energy -= STARVE_LOSS;
            }
            org.energy = org.energy.clamp(0.0, t.energy_cap);

            deposit::residue(growth, org, rng);

            let k = org.kind.index();
            if !org.kind.is_apex()
                && org.age > REPRO_AGE
                && org.energy > t.energy_cap * REPRO_ENERGY
                && counts[k] < t.max_population
                && resources.level_at(org.x, org.y) > REPRO_RESOURCE
                && rng.chance(t.reproduction * (1.0 + intensity * 0.5))
            {
                let m = mutate_gene(&org.gene, 0.5 + intensity, rng);
                tracker.record(m.hue_delta, m.shape_delta);
                let share = org.energy * CHILD_SHARE;
                org.energy -= share;
                resources.consume(org.x, org.y, BIRTH_RESOURCE);
                let cx = (org.x + rng.signed(4.0)).clamp(0.0, max_x);
                let cy = (org.y + rng.signed(4.0)).clamp(0.0, max_y);
                let mut child = Organism::new(*next_id, org.kind, cx, cy, m.gene, share);
                child.vx = -org.vx * 0.5;
                child.vy = -org.vy * 0.5;
                *next_id += 1;
                counts[k] += 1;
                births.push(child);
                tally.births += 1;
            }

            let dies = if org.energy <= 0.0 {
                rng.chance(0.5)
            } else if org.age > t.max_age {
                rng.chance(0.05)
            } else if org.age as f32 > t.max_age as f32 * 0.7 && org.energy < 20.0 {
                rng.chance(0.02)
            } else if org.population > t.max_population && org.energy < 30.0 {
                rng.chance(0.04)
            } else {
                false
            };
            if dies {
                removed[i] = true;
            }
        }

        let mut idx = 0;
        organisms.retain(|o| {
            let dead = removed[idx];
            idx += 1;
            if dead {
                let mut give = (o.consumed * RETURN_SHARE).max(0.0);
                if o.kind.is_apex() {
                    give *= APEX_RETURN_MULT;
                }
                resources.replenish(o.x, o.y, give);
            }
            !dead
        });
        tally.deaths = removed.iter().filter(|&&d| d).count() - tally.kills;
        organisms.extend(births);
        tally
    }

    fn spread_growth(&mut self) {
        let started = Instant::now();
        let budget = self.governor.spread_budget();
        self.growth
            .spread(budget, SPREAD_THRESHOLD, SPREAD_RATIO, SPREAD_CHANCE, &mut self.rng);
        let cost_ms = started.elapsed().as_secs_f32() * 1_000.0;
        self.governor.observe_spread(cost_ms);

        let floor = (self.governor.map_cap() as f32 * RESEED_RATIO) as usize;
        let len = self.growth.len();
        if len < floor {
            let inject = ((floor - len) / 50).clamp(1, 40);
            for _ in 0..inject {
                let x = self.rng.range(0.0, self.width as f32);
                let y = self.rng.range(0.0, self.height as f32);
                let color = if self.organisms.is_empty() {
                    AMBIENT_COLOR
                } else {
                    self.organisms[self.rng.index(self.organisms.len())].color
                };
                let amount = self.rng.range(12.0, 35.0);
                self.growth.deposit(x, y, amount, color);
            }
        }
    }

    fn sample_metrics(&mut self) {
        let sample = reservoir_sample(self.growth.intensities(), GROWTH_SAMPLES, &mut self.rng);
        let total = self.width as usize * self.height as usize;
        let growth = calculate_growth_metrics(&sample, total, self.growth.len());
        let resource_pct = self.resources.sample_mean(RESOURCE_SAMPLES, &mut self.rng);

        self.recount();
        let mut genera = [0usize; Genus::ALL.len()];
        for kind in OrganismKind::ALL {
            genera[kind.genus().index()] += self.counts[kind.index()];
        }
        let mean_energy = if self.organisms.is_empty() {
            0.0
        } else {
            self.organisms.iter().map(|o| o.energy).sum::<f32>() / self.organisms.len() as f32
        };
        self.tracker.fade();
        self.coverage_history.push(growth.coverage);
        self.energy_history.push(mean_energy);

        self.hud = HudSnapshot {
            clouds: self.clouds.len(),
            apex: self.counts[OrganismKind::Apex.index()],
            wave: self.wave.descriptor(),
            growth,
            mean_energy,
            diversity: self.counts.iter().filter(|&&c| c > 0).count(),
            species: self.counts,
            genera,
            mutation: self.tracker,
            resource_pct,
            coverage_history: self.coverage_history.values().collect(),
            energy_history: self.energy_history.values().collect(),
        };
        trace!(
            frame = self.frame,
            coverage = growth.coverage,
            entropy = growth.entropy,
            organisms = self.organisms.len(),
            "metrics sampled"
        );
    }

    fn enforce_population_floor(&mut self) {
        let floor = (POPULATION_FLOOR * self.governor.render_scale())
            .round()
            .max(POPULATION_FLOOR_MIN) as usize;
        if self.organisms.len() >= floor {
            return;
        }
        let (mx, my) = (self.max_x(), self.max_y());
        for _ in 0..FLOOR_RESCUE {
            let kind = OrganismKind::BREEDERS[self.rng.index(OrganismKind::BREEDERS.len())];
            let x = self.rng.range(0.0, mx);
            let y = self.rng.range(0.0, my);
            self.spawn(kind, x, y);
        }
        debug!(floor, organisms = self.organisms.len(), "population floor rescue");
    }
}

/// Closest living non-apex within sensing range of `(x, y)`.
fn nearest_prey(probes: &[Probe], removed: &[bool], x: f32, y: f32) -> Option<(f32, f32)> {
    probes
        .iter()
        .zip(removed)
        .filter(|(p, &gone)| !gone && !p.kind.is_apex())
        .map(|(p, _)| (p, (p.x - x).powi(2) + (p.y - y).powi(2)))
        .filter(|&(_, d2)| d2 < APEX_SENSE_SQ)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(p, _)| (p.x, p.y))
}
