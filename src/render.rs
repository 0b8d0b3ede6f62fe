use crate::colony::{ColonyGrid, ColorMap, EMPTY};
use crate::ecosystem::organism::{Organism, OrganismKind};
use crate::ecosystem::{Ecosystem, StateSnapshot};
use crate::genetics::{Genus, Rgb};
use crate::metrics::HudSnapshot;
use crate::phase::Phase;
use crate::rng::RandomSource;
use crate::transcript::Transcript;
use crossterm::{
    cursor,
    execute, queue,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Write};

const BACKGROUND: Color = Color::Black;
const BLANK_BRAILLE: char = '\u{2800}';

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
    pub(crate) bold: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: BACKGROUND,
            bold: false,
        }
    }
}

pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }

    pub(crate) fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }

    pub(crate) fn get(&self, x: u16, y: u16) -> Option<Cell> {
        (x < self.w && y < self.h).then(|| self.cells[self.idx(x, y)])
    }

    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Pixel {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl Pixel {
    fn from_rgb(c: Rgb, alpha: f32) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: (alpha.clamp(0.0, 1.0) * 255.0 + 0.5) as u8,
        }
    }
}

pub(crate) struct PixelCanvas {
    pub(crate) w: u32,
    pub(crate) h: u32,
    pub(crate) px: Vec<Pixel>,
}

impl PixelCanvas {
    pub(crate) fn new(w: u32, h: u32) -> Self {
        Self {
            w,
            h,
            px: vec![Pixel::default(); (w as usize) * (h as usize)],
        }
    }

    pub(crate) fn idx(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }

    pub(crate) fn clear(&mut self) {
        self.px.fill(Pixel::default());
    }

    fn blend_over(&mut self, x: i32, y: i32, src: Pixel) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        if x >= self.w || y >= self.h {
            return;
        }
        let i = self.idx(x, y);
        let dst = self.px[i];

        let sa = src.a as f32 / 255.0;
        let da = dst.a as f32 / 255.0;

        let out_a = sa + da * (1.0 - sa);
        if out_a <= 1e-6 {
            self.px[i] = Pixel::default();
            return;
        }

        let blend = |sc: u8, dc: u8| -> u8 {
            let sc = sc as f32 / 255.0;
            let dc = dc as f32 / 255.0;
            let out = (sc * sa + dc * da * (1.0 - sa)) / out_a;
            (out.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
        };

        self.px[i] = Pixel {
            r: blend(src.r, dst.r),
            g: blend(src.g, dst.g),
            b: blend(src.b, dst.b),
            a: (out_a.clamp(0.0, 1.0) * 255.0 + 0.5) as u8,
        };
    }

    fn disk(&mut self, cx: f32, cy: f32, radius: f32, color: Rgb, alpha: f32) {
        let r = radius.max(0.5);
        let reach = r.ceil() as i32;
        let (ox, oy) = (cx.round() as i32, cy.round() as i32);
        for dy in -reach..=reach {
            for dx in -reach..=reach {
                let d = ((dx * dx + dy * dy) as f32).sqrt();
                if d > r {
                    continue;
                }
                let falloff = 0.45 + 0.55 * (1.0 - d / (r + 1.0));
                self.blend_over(ox + dx, oy + dy, Pixel::from_rgb(color, alpha * falloff));
            }
        }
    }
}

pub(crate) struct Terminal {
    pub(crate) out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    pub(crate) prev: CellBuffer,
    pub(crate) cur: CellBuffer,
    pub(crate) canvas: PixelCanvas,
}

impl Terminal {
    pub(crate) fn begin() -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            terminal::Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        let (cols, rows) = terminal::size()?;
        Ok(Self {
            out,
            cols,
            rows,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
            // Braille: 2×4 pixels per cell
            canvas: PixelCanvas::new(cols as u32 * 2, rows as u32 * 4),
        })
    }

    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        queue!(
            self.out,
            BeginSynchronizedUpdate,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            EndSynchronizedUpdate,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    /// Canvas size in braille sub-pixels.
    pub(crate) fn canvas_size(&self) -> (u32, u32) {
        (self.canvas.w, self.canvas.h)
    }

    pub(crate) fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        self.canvas = PixelCanvas::new(c as u32 * 2, r as u32 * 4);
        queue!(self.out, Clear(ClearType::All))?;
        Ok(true)
    }

    pub(crate) fn present(&mut self, diff_only: bool) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;
        let mut last_bold = None;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if diff_only && c == self.prev.cells[i] {
                    continue;
                }

                queue!(self.out, cursor::MoveTo(x, y))?;

                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }
                if last_bold != Some(c.bold) {
                    let attr = if c.bold { Attribute::Bold } else { Attribute::NormalIntensity };
                    queue!(self.out, SetAttribute(attr))?;
                    last_bold = Some(c.bold);
                }

                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(self.out, SetAttribute(Attribute::Reset), ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        Ok(())
    }
}

/* -----------------------------
   Braille encoding: 2×4 pixels -> U+2800..U+28FF
------------------------------ */

fn braille_bit(dx: u32, dy: u32) -> u8 {
    // Dot mapping:
    // (0,0)=1 (0,1)=2 (0,2)=4 (0,3)=64
    // (1,0)=8 (1,1)=16 (1,2)=32 (1,3)=128
    match (dx, dy) {
        (0, 0) => 0x01,
        (0, 1) => 0x02,
        (0, 2) => 0x04,
        (0, 3) => 0x40,
        (1, 0) => 0x08,
        (1, 1) => 0x10,
        (1, 2) => 0x20,
        (1, 3) => 0x80,
        _ => 0x00,
    }
}

pub(crate) fn canvas_to_cells(canvas: &PixelCanvas, out: &mut CellBuffer, enable_color: bool) {
    for cy in 0..out.h as u32 {
        for cx in 0..out.w as u32 {
            let mut mask: u8 = 0;
            let (mut sum_r, mut sum_g, mut sum_b, mut ink) = (0u32, 0u32, 0u32, 0u32);

            for dy in 0..4 {
                for dx in 0..2 {
                    let (x, y) = (cx * 2 + dx, cy * 4 + dy);
                    if x >= canvas.w || y >= canvas.h {
                        continue;
                    }
                    let p = canvas.px[canvas.idx(x, y)];
                    // alpha threshold counts as ink
                    if p.a >= 32 {
                        mask |= braille_bit(dx, dy);
                        sum_r += p.r as u32;
                        sum_g += p.g as u32;
                        sum_b += p.b as u32;
                        ink += 1;
                    }
                }
            }

            let ch = char::from_u32(0x2800 + mask as u32).unwrap_or(' ');
            let fg = if enable_color && ink > 0 {
                Color::Rgb {
                    r: (sum_r / ink) as u8,
                    g: (sum_g / ink) as u8,
                    b: (sum_b / ink) as u8,
                }
            } else {
                Color::White
            };
            out.set(
                cx as u16,
                cy as u16,
                Cell {
                    ch,
                    fg,
                    bg: BACKGROUND,
                    bold: false,
                },
            );
        }
    }
}

/* -----------------------------
   Ecosystem painter
------------------------------ */

/// Paints growth residue then organisms, each within the governor's budget.
pub(crate) fn paint_ecosystem<R: RandomSource>(canvas: &mut PixelCanvas, eco: &Ecosystem<R>) {
    let t = eco.elapsed_ms() as f32;
    let gov = eco.governor();

    let growth = eco.growth();
    let budget = gov.render_cell_budget().max(1);
    let stride = growth.len().div_ceil(budget).max(1);
    for (x, y, cell) in growth.iter().step_by(stride) {
        let pulse = 0.85 + 0.15 * (t * 0.004 + (x + y) as f32 * 0.05).sin();
        let alpha = (cell.intensity / 255.0) * pulse;
        canvas.blend_over(x as i32, y as i32, Pixel::from_rgb(cell.color, alpha));
    }

    let organisms = eco.organisms();
    let budget = gov.render_organism_budget().max(1);
    let stride = organisms.len().div_ceil(budget).max(1);
    for org in organisms.iter().step_by(stride) {
        paint_organism(canvas, org, t);
    }
}

fn paint_organism(canvas: &mut PixelCanvas, org: &Organism, t: f32) {
    let vigor = 0.55 + 0.45 * (org.energy / org.traits().energy_cap).clamp(0.0, 1.0);
    let (x, y) = (org.x, org.y);
    match org.kind {
        OrganismKind::Apex => {
            let halo = org.size + 2.0 + (t * 0.006).sin();
            for k in 0..16 {
                let (dy, dx) = (k as f32 * std::f32::consts::TAU / 16.0).sin_cos();
                let p = Pixel::from_rgb(org.accent, 0.8);
                canvas.blend_over((x + dx * halo).round() as i32, (y + dy * halo).round() as i32, p);
            }
            canvas.disk(x, y, org.size, org.color, vigor);
        }
        OrganismKind::Fly => {
            let flap = if (t * 0.03 + org.id as f32).sin() > 0.0 { 1 } else { 2 };
            let wing = Pixel::from_rgb(org.color.scale(1.3), 0.6);
            canvas.blend_over(x as i32 - flap, y as i32 - 1, wing);
            canvas.blend_over(x as i32 + flap, y as i32 - 1, wing);
            canvas.disk(x, y, org.size * 0.6, org.color, vigor);
        }
        OrganismKind::Beetle => {
            canvas.disk(x, y, org.size, org.color.scale(0.7), vigor);
            canvas.disk(x, y, org.size * 0.4, org.color, vigor);
        }
        OrganismKind::Worm => {
            for p in org.trail.iter().step_by(2) {
                canvas.disk(p.x, p.y, org.size * 0.5, org.color.scale(0.8), vigor * 0.7 * p.opacity);
            }
            canvas.disk(x, y, org.size * 0.6, org.color, vigor);
        }
        OrganismKind::Insect => {
            let speed = (org.vx * org.vx + org.vy * org.vy).sqrt().max(0.01);
            let (hx, hy) = (org.vx / speed, org.vy / speed);
            let tip = org.size + 1.5;
            let feeler = Pixel::from_rgb(org.color, 0.7);
            canvas.blend_over((x + hx * tip - hy).round() as i32, (y + hy * tip + hx).round() as i32, feeler);
            canvas.blend_over((x + hx * tip + hy).round() as i32, (y + hy * tip - hx).round() as i32, feeler);
            canvas.disk(x, y, org.size * 0.7, org.color, vigor);
        }
        _ => canvas.disk(x, y, org.size * 0.6, org.color, vigor),
    }
}

/* -----------------------------
   Text overlays
------------------------------ */

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bold: bool) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x.saturating_add(i as u16);
        if xx >= buf.w || y >= buf.h {
            break;
        }
        buf.set(
            xx,
            y,
            Cell {
                ch,
                fg,
                bg: BACKGROUND,
                bold,
            },
        );
    }
}

fn is_blank(c: Cell) -> bool {
    c.ch == ' ' || c.ch == BLANK_BRAILLE
}

/// Colony glyphs only show through where the canvas left the cell empty.
pub(crate) fn draw_colonies(buf: &mut CellBuffer, grid: &ColonyGrid, colors: &ColorMap, enable_color: bool) {
    for row in 0..grid.rows().min(buf.h as usize) {
        for col in 0..grid.cols().min(buf.w as usize) {
            let Some(ch) = grid.get(row, col) else {
                continue;
            };
            let (x, y) = (col as u16, row as u16);
            if ch == EMPTY || !buf.get(x, y).is_some_and(is_blank) {
                continue;
            }
            let fg = colors
                .get(&(row, col))
                .filter(|_| enable_color)
                .and_then(|kind| Rgb::from_hex(kind.color_hex()))
                .map_or(Color::DarkGrey, |c| Color::Rgb { r: c.r, g: c.g, b: c.b });
            buf.set(x, y, Cell { ch, fg, bg: BACKGROUND, bold: false });
        }
    }
}

fn phase_color(phase: Phase) -> Color {
    match phase {
        Phase::Controlled => Color::Rgb { r: 0, g: 255, b: 65 },
        Phase::Chaos => Color::Rgb { r: 255, g: 70, b: 90 },
        Phase::Art => Color::Rgb { r: 190, g: 170, b: 255 },
    }
}

/// Centred transcript block with the footer link underneath.
pub(crate) fn draw_transcript(buf: &mut CellBuffer, transcript: &Transcript, phase: Phase, enable_color: bool) {
    let lines = transcript.lines();
    let footer = transcript.footer();
    let width = lines
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0)
        .max(footer.map_or(0, |f| f.chars().count() + 2)) as u16;
    let height = lines.len() as u16 + if footer.is_some() { 2 } else { 0 };
    let x0 = buf.w.saturating_sub(width) / 2;
    let y0 = buf.h.saturating_sub(height) / 2;

    let (fg, link) = if enable_color {
        (phase_color(phase), Color::Rgb { r: 110, g: 180, b: 255 })
    } else {
        (Color::White, Color::White)
    };
    for (i, line) in lines.iter().enumerate() {
        draw_text(buf, x0, y0 + i as u16, line, fg, false);
    }
    if transcript.typing() {
        let last = lines.len().saturating_sub(1);
        let col = lines.last().map_or(0, |l| l.chars().count()) as u16;
        draw_text(buf, x0 + col, y0 + last as u16, "_", fg, true);
    }
    if let Some(footer) = footer {
        draw_text(buf, x0, y0 + lines.len() as u16 + 1, &format!("> {footer}"), link, false);
    }
}

/* -----------------------------
   HUD
------------------------------ */

fn bar(value01: f32, width: usize) -> String {
    let v = value01.clamp(0.0, 1.0);
    let fill = (v * width as f32 + 0.5) as usize;
    let mut s = String::new();
    s.push('[');
    for i in 0..width {
        s.push(if i < fill { '█' } else { ' ' });
    }
    s.push(']');
    s
}

const SPARKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

fn sparkline(values: &[f32]) -> String {
    let (lo, hi) = values
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let span = hi - lo;
    values
        .iter()
        .map(|&v| {
            let t = if span > f32::EPSILON { (v - lo) / span } else { 0.5 };
            SPARKS[((t * 7.0).round() as usize).min(7)]
        })
        .collect()
}

fn species_tag(kind: OrganismKind) -> &'static str {
    match kind {
        OrganismKind::Spore => "spo",
        OrganismKind::Mycelium => "myc",
        OrganismKind::Insect => "ins",
        OrganismKind::Slime => "sli",
        OrganismKind::Beetle => "bee",
        OrganismKind::Mite => "mit",
        OrganismKind::Worm => "wor",
        OrganismKind::Fly => "fly",
        OrganismKind::Apex => "apx",
    }
}

fn genus_tag(g: Genus) -> &'static str {
    match g {
        Genus::Fungi => "fun",
        Genus::Arthropod => "art",
        Genus::Ooze => "ooz",
        Genus::Annelid => "ann",
        Genus::Predator => "pred",
    }
}

pub(crate) fn hud_lines(hud: &HudSnapshot, snap: &StateSnapshot, fps: f32, paused: bool) -> Vec<String> {
    let total: usize = hud.species.iter().sum();
    let genera = Genus::ALL
        .iter()
        .map(|g| format!("{} {}", genus_tag(*g), hud.genera[g.index()]))
        .collect::<Vec<_>>()
        .join(" ");
    let species = OrganismKind::ALL
        .iter()
        .map(|k| format!("{} {}", species_tag(*k), hud.species[k.index()]))
        .collect::<Vec<_>>()
        .join(" ");
    vec![
        format!(
            "rotgarden  {}  i={:.2}{}",
            snap.reading.phase.label(),
            snap.reading.intensity,
            if paused { "  [paused]" } else { "" }
        ),
        format!(
            "fps {:>4.0}  scale {:.2}  cells {}/{}",
            fps, snap.render_scale, snap.growth_cells, snap.map_cap
        ),
        format!("org {total}  div {}  energy {:.1}", hud.diversity, hud.mean_energy),
        format!("clouds {}  apex {}  wave {}", hud.clouds, hud.apex, hud.wave),
        format!(
            "cov {:.1}%  int {:.0}  ent {:.2}",
            hud.growth.coverage * 100.0,
            hud.growth.avg_intensity,
            hud.growth.entropy
        ),
        format!("res {} {:.0}%", bar(hud.resource_pct / 100.0, 10), hud.resource_pct),
        format!("mut hue {:.2}  shape {:.3}", hud.mutation.hue, hud.mutation.shape),
        species,
        genera,
        format!("cov {}", sparkline(&hud.coverage_history)),
        format!("nrg {}", sparkline(&hud.energy_history)),
    ]
}

pub(crate) fn draw_hud(buf: &mut CellBuffer, lines: &[String], enable_color: bool) {
    let fg = if enable_color {
        Color::Rgb { r: 200, g: 210, b: 200 }
    } else {
        Color::White
    };
    for (i, line) in lines.iter().enumerate() {
        draw_text(buf, 1, i as u16, line, fg, i == 0);
    }
    let help = "h hud · c colour · space pause · r reseed · q quit";
    draw_text(buf, 1, buf.h.saturating_sub(1), help, fg, false);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colony::{grow_colonies, ColonyKind};
    use crate::rng::Scripted;
    use std::collections::HashMap;

    #[test]
    fn single_pixel_lights_one_dot() {
        let mut canvas = PixelCanvas::new(4, 8);
        canvas.blend_over(1, 2, Pixel { r: 255, g: 0, b: 0, a: 255 });
        let mut buf = CellBuffer::new(2, 2);
        canvas_to_cells(&canvas, &mut buf, true);
        let c = buf.get(0, 0).expect("cell");
        assert_eq!(c.ch, '\u{2820}');
        assert_eq!(c.fg, Color::Rgb { r: 255, g: 0, b: 0 });
        assert_eq!(buf.get(1, 1).map(|c| c.ch), Some(BLANK_BRAILLE));
    }

    #[test]
    fn faint_pixels_are_not_ink() {
        let mut canvas = PixelCanvas::new(2, 4);
        canvas.blend_over(0, 0, Pixel { r: 255, g: 255, b: 255, a: 10 });
        let mut buf = CellBuffer::new(1, 1);
        canvas_to_cells(&canvas, &mut buf, false);
        assert_eq!(buf.get(0, 0).map(|c| c.ch), Some(BLANK_BRAILLE));
    }

    #[test]
    fn out_of_canvas_blends_are_ignored() {
        let mut canvas = PixelCanvas::new(2, 2);
        canvas.blend_over(-1, 0, Pixel { r: 1, g: 1, b: 1, a: 255 });
        canvas.blend_over(0, 5, Pixel { r: 1, g: 1, b: 1, a: 255 });
        assert!(canvas.px.iter().all(|p| *p == Pixel::default()));
    }

    #[test]
    fn text_clips_at_the_edge() {
        let mut buf = CellBuffer::new(4, 1);
        draw_text(&mut buf, 2, 0, "abcdef", Color::White, false);
        let row: String = buf.cells.iter().map(|c| c.ch).collect();
        assert_eq!(row, "  ab");
        draw_text(&mut buf, 0, 3, "zz", Color::White, false);
        assert_eq!(buf.cells.iter().map(|c| c.ch).collect::<String>(), "  ab");
    }

    #[test]
    fn colonies_fill_only_blank_cells() {
        let grid = ColonyGrid::new(2, 2);
        let grown = grow_colonies(&grid, 1.0, &[], &HashMap::new(), &mut Scripted::constant(0.5));
        let mut buf = CellBuffer::new(2, 2);
        buf.set(0, 0, Cell { ch: '⣿', ..Cell::default() });
        draw_colonies(&mut buf, &grown.grid, &grown.color_map, true);
        assert_eq!(buf.get(0, 0).map(|c| c.ch), Some('⣿'));
        let (x, y) = (1u16, 1u16);
        let ch = grown.grid.get(1, 1).expect("seeded");
        assert_ne!(ch, EMPTY);
        assert_eq!(buf.get(x, y).map(|c| c.ch), Some(ch));
    }

    #[test]
    fn colony_colours_fall_back_without_colour() {
        let grid = ColonyGrid::new(1, 1);
        let grown = grow_colonies(&grid, 0.0, &[], &HashMap::new(), &mut Scripted::constant(0.5));
        let mut buf = CellBuffer::new(1, 1);
        draw_colonies(&mut buf, &grown.grid, &grown.color_map, false);
        assert_eq!(buf.get(0, 0).map(|c| c.fg), Some(Color::DarkGrey));
        assert!(ColonyKind::ALL.iter().all(|k| Rgb::from_hex(k.color_hex()).is_some()));
    }

    #[test]
    fn hud_breaks_population_down_by_species() {
        let mut hud = HudSnapshot::default();
        hud.species[OrganismKind::Worm.index()] = 3;
        hud.species[OrganismKind::Apex.index()] = 1;
        let snap = StateSnapshot {
            frame: 1,
            elapsed_ms: 0.0,
            reading: crate::phase::PhaseReading {
                intensity: 0.5,
                phase: Phase::Chaos,
            },
            organisms: 4,
            growth_cells: 0,
            map_cap: 100,
            render_scale: 1.0,
        };
        let lines = hud_lines(&hud, &snap, 60.0, false);
        let species = lines.iter().find(|l| l.starts_with("spo ")).expect("species line");
        assert!(species.contains("wor 3"));
        assert!(species.contains("apx 1"));
        assert!(species.contains("fly 0"));
        assert!(lines.iter().any(|l| l.starts_with("org 4")));
    }

    #[test]
    fn sparkline_spans_the_range() {
        assert_eq!(sparkline(&[0.0, 0.5, 1.0]), "▁▅█");
        assert_eq!(sparkline(&[3.0, 3.0]), "▅▅");
        assert_eq!(sparkline(&[]), "");
    }

    #[test]
    fn bar_fills_proportionally() {
        assert_eq!(bar(0.5, 4), "[██  ]");
        assert_eq!(bar(7.0, 2), "[██]");
    }
}
