use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::{DEFAULT_COLOR, DEFAULT_RECENT_LIMIT, DEFAULT_TREND_MONTHS};

/// User settings read from `config.json`. Every field has a default, so a
/// missing or partial file is fine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_trend_months")]
    pub trend_months: u32,
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
    #[serde(default = "default_color")]
    pub default_color: String,
}

fn default_database() -> String {
    "budgetlens.db".to_string()
}

fn default_trend_months() -> u32 {
    DEFAULT_TREND_MONTHS
}

fn default_recent_limit() -> usize {
    DEFAULT_RECENT_LIMIT
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database(),
            trend_months: default_trend_months(),
            recent_limit: default_recent_limit(),
            default_color: default_color(),
        }
    }
}

/// `~/.config/budgetlens/config.json` or the platform equivalent.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("budgetlens")
        .join("config.json")
}

impl Config {
    /// Load settings from `path`. A missing file yields the defaults; a file
    /// that exists but does not parse is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config dir: {}", dir.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, format!("{json}\n"))
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }
}
