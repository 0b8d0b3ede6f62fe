mod app;
mod colony;
mod config;
mod corruption;
mod ecosystem;
mod genetics;
mod governor;
mod input;
mod metrics;
mod phase;
mod render;
mod rng;
mod ticker;
mod transcript;

use anyhow::{Context, Result};
use clap::Parser;
use config::{load_settings, project_paths, Settings};
use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::Mutex,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// A "coming soon" page for the terminal: typed lines rot into noise while
/// a braille ecosystem grows underneath.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// RNG seed (0 = derive from the clock)
    #[arg(long)]
    seed: Option<u64>,

    /// Frame cap
    #[arg(long)]
    fps: Option<u32>,

    /// Monochrome output
    #[arg(long)]
    no_color: bool,

    /// Start with the HUD hidden
    #[arg(long)]
    no_hud: bool,

    /// Log file (default: rotgarden.log in the data directory)
    #[arg(long)]
    log: Option<PathBuf>,

    /// Ignore saved settings and start from defaults
    #[arg(long)]
    reset_settings: bool,
}

impl Args {
    fn apply(&self, settings: &mut Settings) {
        if let Some(seed) = self.seed {
            settings.seed = seed;
        }
        if let Some(fps) = self.fps {
            settings.fps_cap = fps;
        }
        if self.no_color {
            settings.enable_color = false;
        }
        if self.no_hud {
            settings.show_hud = false;
        }
    }
}

/// The terminal owns stdout, so events go to a plain-text file.
fn init_tracing(path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
        .context("installing tracing subscriber")
}

fn main() -> Result<()> {
    let args = Args::parse();
    let paths = project_paths()?;
    init_tracing(args.log.as_deref().unwrap_or(paths.log_path.as_path()))?;

    let mut settings = if args.reset_settings {
        Settings::default()
    } else {
        load_settings(&paths.settings_path)
    };
    args.apply(&mut settings);
    settings.validate().context("invalid command-line override")?;
    info!(
        fps = settings.fps_cap,
        seed = settings.seed,
        color = settings.enable_color,
        "starting"
    );

    app::run(settings, paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_land_on_settings() {
        let args = Args::parse_from(["rotgarden", "--seed", "7", "--fps", "30", "--no-color", "--no-hud"]);
        let mut s = Settings::default();
        args.apply(&mut s);
        assert_eq!(s.seed, 7);
        assert_eq!(s.fps_cap, 30);
        assert!(!s.enable_color);
        assert!(!s.show_hud);
    }

    #[test]
    fn zero_fps_override_is_rejected() {
        let args = Args::parse_from(["rotgarden", "--fps", "0"]);
        let mut s = Settings::default();
        args.apply(&mut s);
        assert!(s.validate().is_err());
    }

    #[test]
    fn no_flags_leave_settings_alone() {
        let args = Args::parse_from(["rotgarden"]);
        let mut s = Settings::default();
        args.apply(&mut s);
        assert_eq!(s, Settings::default());
    }
}
