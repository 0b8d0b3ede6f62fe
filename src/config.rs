use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, PartialEq)]
pub(crate) enum SettingsError {
    #[error("fps cap must be at least 1")]
    ZeroFps,
    #[error("text tick must be at least 1ms")]
    ZeroTextTick,
    #[error("phase period must be positive and finite (got {0})")]
    BadPeriod(f64),
    #[error("phase thresholds must satisfy 0 < controlled_max < art_min < 1 (got {0} / {1})")]
    Thresholds(f32, f32),
    #[error("at least one message line is required")]
    NoMessages,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub(crate) struct PhaseSettings {
    pub(crate) period_ms: f64,
    pub(crate) showcase_ms: f64,
    pub(crate) showcase_period_ms: f64,
    pub(crate) controlled_max: f32,
    pub(crate) art_min: f32,
}

impl Default for PhaseSettings {
    fn default() -> Self {
        Self {
            period_ms: 8000.0,
            showcase_ms: 20_000.0,
            showcase_period_ms: 3000.0,
            controlled_max: 0.3,
            art_min: 0.75,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub(crate) struct Settings {
    pub(crate) seed: u64,
    pub(crate) fps_cap: u32,
    pub(crate) text_tick_ms: u64,
    pub(crate) enable_color: bool,
    pub(crate) show_hud: bool,
    pub(crate) phase: PhaseSettings,
    pub(crate) messages: Vec<String>,
    pub(crate) footer: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: 0,
            fps_cap: 60,
            text_tick_ms: 100,
            enable_color: true,
            show_hud: true,
            phase: PhaseSettings::default(),
            messages: vec![
                "> coming soon is coming soon".to_string(),
                "> what is time anyway, it will come before the sequel".to_string(),
                "> status: slightly better than 404".to_string(),
                "> ask around -> link below".to_string(),
            ],
            footer: "stay tuned".to_string(),
        }
    }
}

impl Settings {
    pub(crate) fn validate(&self) -> Result<(), SettingsError> {
        if self.fps_cap == 0 {
            return Err(SettingsError::ZeroFps);
        }
        if self.text_tick_ms == 0 {
            return Err(SettingsError::ZeroTextTick);
        }
        let p = &self.phase;
        for period in [p.period_ms, p.showcase_period_ms] {
            if !(period.is_finite() && period > 0.0) {
                return Err(SettingsError::BadPeriod(period));
            }
        }
        if !(p.controlled_max > 0.0 && p.controlled_max < p.art_min && p.art_min < 1.0) {
            return Err(SettingsError::Thresholds(p.controlled_max, p.art_min));
        }
        if self.messages.is_empty() {
            return Err(SettingsError::NoMessages);
        }
        Ok(())
    }
}

pub(crate) struct Paths {
    pub(crate) settings_path: PathBuf,
    pub(crate) log_path: PathBuf,
}

pub(crate) fn project_paths() -> Result<Paths> {
    let proj = ProjectDirs::from("com", "rotgarden", "Rotgarden")
        .context("could not resolve project directories")?;
    let dir = proj.data_local_dir().to_path_buf();
    fs::create_dir_all(&dir)
        .with_context(|| format!("creating data directory {}", dir.display()))?;
    Ok(Paths {
        settings_path: dir.join("settings.json"),
        log_path: dir.join("rotgarden.log"),
    })
}

/// Missing file means defaults; a broken or invalid one is logged and replaced.
pub(crate) fn load_settings(path: &Path) -> Settings {
    let Ok(s) = fs::read_to_string(path) else {
        return Settings::default();
    };
    match serde_json::from_str::<Settings>(&s) {
        Ok(v) => match v.validate() {
            Ok(()) => v,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "settings rejected, using defaults");
                Settings::default()
            }
        },
        Err(e) => {
            warn!(path = %path.display(), error = %e, "settings unreadable, using defaults");
            Settings::default()
        }
    }
}

pub(crate) fn save_settings_atomic(path: &Path, s: &Settings) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(s)?;
    fs::write(&tmp, data)?;
    if path.exists() {
        let _ = fs::remove_file(path);
    }
    fs::rename(&tmp, path)?;
    Ok(())
}
