//! User settings, read from a TOML file in the platform config dir.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_HEIGHT: u32 = 1080;
pub const CONFIG_ENV: &str = "TUBESAVE_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Folder downloads land in
    pub save_path: PathBuf,
    /// Resolution cap for the format preference
    pub max_height: u32,
    /// Use this yt-dlp instead of the bundled one or the one on PATH
    pub ytdlp_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            save_path: PathBuf::from("downloads"),
            max_height: DEFAULT_MAX_HEIGHT,
            ytdlp_path: None,
        }
    }
}

impl Settings {
    /// Loads from `$TUBESAVE_CONFIG` or the platform config dir.
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let settings: Settings =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        Ok(settings)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }
}

pub fn config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|d| d.join("tubesave").join("config.toml"))
}
