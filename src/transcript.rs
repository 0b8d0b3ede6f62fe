//! The text layer: a typewriter intro that hands over to phase-driven
//! corruption once every source line has been typed.

use crate::corruption::{art_pattern, chaos_corruption, controlled_corruption, glyph_cluster, noise_line};
use crate::phase::{Phase, PhaseReading};
use crate::rng::RandomSource;
use tracing::debug;

const CHAR_MS: f64 = 20.0;
const LINE_PAUSE_MS: f64 = 600.0;
const SETTLE_MS: f64 = 1_000.0;

const CONTROLLED_LINE_CHANCE: f32 = 0.3;
const CHAOS_LINE_CHANCE: f32 = 0.5;
const NOISE_LINE_CHANCE: f32 = 0.1;
const MAX_CHAOS_LINES: usize = 10;
const ART_REFRESH_CHANCE: f32 = 0.05;
const FOOTER_CHANCE: f32 = 0.3;
const FOOTER_INTENSITY: f32 = 0.5;

#[derive(Clone, Debug, PartialEq)]
enum Stage {
    /// `line` is being typed; `shown` characters are visible.
    Typing { line: usize, shown: usize },
    /// All lines typed, waiting for corruption to start.
    Settling,
    Live,
}

#[derive(Clone, Debug)]
pub(crate) struct Transcript {
    sources: Vec<String>,
    footer_source: String,
    elapsed_ms: f64,
    stage: Stage,
    lines: Vec<String>,
    art: Vec<String>,
    footer: String,
    footer_corrupted: bool,
    phase: Option<Phase>,
}

impl Transcript {
    pub(crate) fn new(sources: &[String], footer: &str) -> Self {
        let mut t = Self {
            sources: sources.to_vec(),
            footer_source: footer.to_string(),
            elapsed_ms: 0.0,
            stage: Stage::Typing { line: 0, shown: 0 },
            lines: Vec::new(),
            art: Vec::new(),
            footer: footer.to_string(),
            footer_corrupted: false,
            phase: None,
        };
        t.stage = t.stage_at(0.0);
        t
    }

    /// Where the typewriter is after `ms` of wall time.
    fn stage_at(&self, ms: f64) -> Stage {
        let mut t = ms;
        for (line, src) in self.sources.iter().enumerate() {
            let typing = src.chars().count() as f64 * CHAR_MS;
            if t < typing {
                return Stage::Typing {
                    line,
                    shown: (t / CHAR_MS) as usize,
                };
            }
            t -= typing;
            if t < LINE_PAUSE_MS {
                return Stage::Typing {
                    line,
                    shown: src.chars().count(),
                };
            }
            t -= LINE_PAUSE_MS;
        }
        if t < SETTLE_MS {
            Stage::Settling
        } else {
            Stage::Live
        }
    }

    /// Drives the typewriter; cheap enough to call every frame.
    pub(crate) fn advance(&mut self, dt_ms: f64) {
        if self.stage == Stage::Live || !dt_ms.is_finite() || dt_ms <= 0.0 {
            return;
        }
        self.elapsed_ms += dt_ms;
        self.stage = self.stage_at(self.elapsed_ms);
        if self.stage == Stage::Live {
            self.lines = self.sources.clone();
            debug!(lines = self.lines.len(), "typewriter finished, corruption live");
        }
    }

    pub(crate) fn is_live(&self) -> bool {
        self.stage == Stage::Live
    }

    /// One coarse tick of corruption. Does nothing until the intro is done.
    pub(crate) fn tick(&mut self, reading: PhaseReading, rng: &mut impl RandomSource) {
        if !self.is_live() {
            return;
        }
        let entering = self.phase != Some(reading.phase);
        self.phase = Some(reading.phase);
        match reading.phase {
            Phase::Controlled => {
                if entering {
                    self.lines = self.sources.clone();
                    self.footer = self.footer_source.clone();
                    self.footer_corrupted = false;
                }
                for line in &mut self.lines {
                    if rng.chance(CONTROLLED_LINE_CHANCE) {
                        *line = controlled_corruption(line, rng);
                    }
                }
            }
            Phase::Chaos => {
                if rng.chance(NOISE_LINE_CHANCE) {
                    self.lines.push(noise_line(rng));
                }
                for line in &mut self.lines {
                    if rng.chance(CHAOS_LINE_CHANCE) {
                        *line = chaos_corruption(line, reading.intensity, rng);
                    }
                }
                let excess = self.lines.len().saturating_sub(MAX_CHAOS_LINES);
                self.lines.drain(..excess);
                if !self.footer_corrupted && rng.chance(FOOTER_CHANCE) {
                    self.footer = corrupt_footer(&self.footer_source, rng);
                    self.footer_corrupted = true;
                }
            }
            Phase::Art => {
                if entering || self.art.is_empty() || rng.chance(ART_REFRESH_CHANCE) {
                    self.art = art_pattern(rng);
                }
            }
        }
    }

    /// Lines to draw: the intro so far, or the live transcript for the current phase.
    pub(crate) fn lines(&self) -> Vec<&str> {
        match &self.stage {
            Stage::Typing { line, shown } => {
                let mut out: Vec<&str> = self.sources[..*line].iter().map(String::as_str).collect();
                let src = &self.sources[*line];
                let end = src.char_indices().nth(*shown).map_or(src.len(), |(i, _)| i);
                out.push(&src[..end]);
                out
            }
            Stage::Settling => self.sources.iter().map(String::as_str).collect(),
            Stage::Live if self.phase == Some(Phase::Art) => self.art.iter().map(String::as_str).collect(),
            Stage::Live => self.lines.iter().map(String::as_str).collect(),
        }
    }

    /// True while a line is still being typed (the renderer shows a cursor).
    pub(crate) fn typing(&self) -> bool {
        matches!(self.stage, Stage::Typing { .. })
    }

    /// The link line, shown once typing is over.
    pub(crate) fn footer(&self) -> Option<&str> {
        (!self.typing()).then_some(self.footer.as_str())
    }
}

/// Chaos-corrupts the footer but keeps it recognisable: if the first word of
/// its name part is lost, falls back to `prefix + glyphs + name`.
fn corrupt_footer(footer: &str, rng: &mut impl RandomSource) -> String {
    let corrupted = chaos_corruption(footer, FOOTER_INTENSITY, rng);
    let split = footer.rfind('/').map_or(0, |i| i + 1);
    let (prefix, name) = footer.split_at(split);
    let anchor = name.split_whitespace().next().unwrap_or(name);
    if !anchor.is_empty() && corrupted.contains(anchor) {
        corrupted
    } else {
        format!("{prefix}{}{name}", glyph_cluster(rng))
    }
}
