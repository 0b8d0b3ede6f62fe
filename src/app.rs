use crate::colony::{grow_colonies, ColonyGrid, ColonyGrowth, ColorMap, GrowthColony};
use crate::config::{load_settings, save_settings_atomic, Paths, Settings};
use crate::ecosystem::{Ecosystem, StateSnapshot};
use crate::input::{collect_input_nonblocking, map_event_to_action, Action};
use crate::phase::{Phase, PhaseClock};
use crate::render::{
    canvas_to_cells, draw_colonies, draw_hud, draw_transcript, hud_lines, paint_ecosystem, Terminal,
};
use crate::rng::{resolve_seed, seeded};
use crate::ticker::Ticker;
use crate::transcript::Transcript;
use rand::{rngs::StdRng, Rng};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Terminal-cell colonies grown during the art phase.
struct Colonies {
    grid: ColonyGrid,
    colonies: Vec<GrowthColony>,
    color_map: ColorMap,
}

impl Colonies {
    fn new(rows: u16, cols: u16) -> Self {
        Self {
            grid: ColonyGrid::new(rows as usize, cols as usize),
            colonies: Vec::new(),
            color_map: ColorMap::new(),
        }
    }
}

pub(crate) struct App {
    settings: Settings,
    paths: Paths,
    term: Terminal,
    eco: Ecosystem<StdRng>,
    snap: StateSnapshot,
    transcript: Transcript,
    colonies: Colonies,
    text_ticker: Ticker,
    text_rng: StdRng,
    fps: f32,
    paused: bool,
    should_quit: bool,
}

impl App {
    fn init(settings: Settings, paths: Paths) -> anyhow::Result<Self> {
        let seed = resolve_seed(settings.seed);
        let term = Terminal::begin()?;
        let eco = new_ecosystem(&term, &settings, seed);
        let snap = eco.snapshot();
        let transcript = Transcript::new(&settings.messages, &settings.footer);
        let colonies = Colonies::new(term.rows, term.cols);
        let text_ticker = Ticker::new(Duration::from_millis(settings.text_tick_ms));
        info!(
            seed,
            cols = term.cols,
            rows = term.rows,
            text_tick_ms = text_ticker.period().as_millis() as u64,
            "terminal ready"
        );

        Ok(Self {
            text_rng: seeded(seed.rotate_left(17) ^ 0x5EED),
            settings,
            paths,
            term,
            eco,
            snap,
            transcript,
            colonies,
            text_ticker,
            fps: 0.0,
            paused: false,
            should_quit: false,
        })
    }

    fn run(&mut self) -> anyhow::Result<()> {
        let fps = self.settings.fps_cap.clamp(10, 240);
        let frame_dt = Duration::from_secs_f32(1.0 / fps as f32);

        let mut last_frame = Instant::now();

        while !self.should_quit {
            let frame_start = Instant::now();

            if self.term.resize_if_needed()? {
                let seed = self.text_rng.gen::<u64>() | 1;
                self.rebuild_ecosystem(seed);
                self.colonies = Colonies::new(self.term.rows, self.term.cols);
                let (width, height) = self.eco.dims();
                info!(cols = self.term.cols, rows = self.term.rows, width, height, "resized, ecosystem rebuilt");
            }

            for ev in collect_input_nonblocking(frame_dt)? {
                if let Some(action) = map_event_to_action(&ev) {
                    self.apply(action);
                }
            }

            let real_dt = frame_start.saturating_duration_since(last_frame);
            last_frame = frame_start;
            if !real_dt.is_zero() {
                self.fps += (1.0 / real_dt.as_secs_f32() - self.fps) * 0.1;
            }
            let dt = if self.paused { Duration::ZERO } else { real_dt };

            if !self.paused {
                self.snap = self.eco.step(dt.as_secs_f64() * 1_000.0);
                self.transcript.advance(dt.as_secs_f64() * 1_000.0);
            }
            self.text_tick(dt);

            self.render_frame()?;

            // the governor sees the work, not the pacing sleep
            let cost = frame_start.elapsed();
            self.eco.observe_frame_cost(cost.as_secs_f64() * 1_000.0);

            spin_sleep(frame_dt, frame_start);
        }

        self.term.end()?;
        self.persist_toggles()?;
        Ok(())
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::ToggleHud => self.settings.show_hud = !self.settings.show_hud,
            Action::ToggleColor => self.settings.enable_color = !self.settings.enable_color,
            Action::TogglePause => {
                self.paused = !self.paused;
                debug!(paused = self.paused, "pause toggled");
            }
            Action::Reseed => {
                let seed = self.text_rng.gen::<u64>() | 1;
                self.rebuild_ecosystem(seed);
                info!(seed, "ecosystem reseeded");
            }
        }
    }

    /// Fresh ecosystem for the current canvas; the phase clock keeps running.
    fn rebuild_ecosystem(&mut self, seed: u64) {
        let elapsed = self.eco.elapsed_ms();
        self.eco = new_ecosystem(&self.term, &self.settings, seed).resume_at(elapsed);
        self.snap = self.eco.snapshot();
    }

    /// Coarse driver: transcript corruption, plus colony growth while in art.
    fn text_tick(&mut self, dt: Duration) {
        let Self {
            eco,
            transcript,
            colonies,
            text_ticker,
            text_rng,
            term,
            ..
        } = self;
        let reading = eco.reading();
        text_ticker.advance(dt, |_| {
            let overgrown = colonies.grid.occupied() > 0;
            transcript.tick(reading, &mut *text_rng);
            if !transcript.is_live() {
                return;
            }
            if reading.phase == Phase::Art {
                let ColonyGrowth {
                    grid,
                    colonies: grown,
                    color_map,
                } = grow_colonies(
                    &colonies.grid,
                    reading.intensity,
                    &colonies.colonies,
                    &colonies.color_map,
                    &mut *text_rng,
                );
                *colonies = Colonies {
                    grid,
                    colonies: grown,
                    color_map,
                };
            } else if overgrown {
                *colonies = Colonies::new(term.rows, term.cols);
                debug!("art phase over, colonies cleared");
            }
        });
    }

    fn render_frame(&mut self) -> anyhow::Result<()> {
        let color = self.settings.enable_color;
        self.term.canvas.clear();
        paint_ecosystem(&mut self.term.canvas, &self.eco);
        canvas_to_cells(&self.term.canvas, &mut self.term.cur, color);

        draw_colonies(&mut self.term.cur, &self.colonies.grid, &self.colonies.color_map, color);
        draw_transcript(&mut self.term.cur, &self.transcript, self.snap.reading.phase, color);

        if self.settings.show_hud {
            let lines = hud_lines(self.eco.hud(), &self.snap, self.fps, self.paused);
            draw_hud(&mut self.term.cur, &lines, color);
        }

        self.term.present(true)?;
        Ok(())
    }

    /// Only the runtime toggles are written back; CLI overrides stay one-shot.
    fn persist_toggles(&self) -> anyhow::Result<()> {
        let mut stored = load_settings(&self.paths.settings_path);
        stored.show_hud = self.settings.show_hud;
        stored.enable_color = self.settings.enable_color;
        save_settings_atomic(&self.paths.settings_path, &stored)?;
        debug!(path = %self.paths.settings_path.display(), "settings saved");
        Ok(())
    }
}

fn new_ecosystem(term: &Terminal, settings: &Settings, seed: u64) -> Ecosystem<StdRng> {
    let (w, h) = term.canvas_size();
    Ecosystem::new(w, h, PhaseClock::new(&settings.phase), seeded(seed))
}

pub(crate) fn run(settings: Settings, paths: Paths) -> anyhow::Result<()> {
    let mut app = App::init(settings, paths)?;
    let result = app.run();
    if result.is_err() {
        // leave the terminal usable even if the loop bailed out
        let _ = app.term.end();
    }
    result
}

/* -----------------------------
   Frame pacing helper
------------------------------ */

fn spin_sleep(target: Duration, start: Instant) {
    let end = start + target;
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        let left = end - t;
        if left > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}
