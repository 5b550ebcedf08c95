use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::theme::{EffectiveTheme, SignalSource};

const APP_DIR: &str = "portal-theme";

/// Browser chrome colors written to the `theme-color` meta tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeColors {
    pub light: String,
    pub dark: String,
}

impl ThemeColors {
    pub fn for_theme(&self, theme: EffectiveTheme) -> &str {
        match theme {
            EffectiveTheme::Light => &self.light,
            EffectiveTheme::Dark => &self.dark,
        }
    }
}

impl Default for ThemeColors {
    fn default() -> Self {
        Self {
            light: "#ffffff".to_string(),
            dark: "#111827".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Key the preference is stored under.
    pub storage_key: String,
    pub database: Option<PathBuf>,
    pub log_file: Option<PathBuf>,
    pub signal: SignalSource,
    pub poll_interval_ms: u64,
    pub theme_color: ThemeColors,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_key: "theme".to_string(),
            database: None,
            log_file: None,
            signal: SignalSource::default(),
            poll_interval_ms: 1000,
            theme_color: ThemeColors::default(),
        }
    }
}

impl Config {
    /// Default location: `<config_dir>/portal-theme/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
    }

    /// Load config from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        anyhow::ensure!(!config.storage_key.is_empty(), "storage_key must not be empty");
        anyhow::ensure!(config.poll_interval_ms > 0, "poll_interval_ms must be positive");
        Ok(config)
    }

    pub fn database_path(&self) -> Option<PathBuf> {
        self.database
            .clone()
            .or_else(|| dirs::data_dir().map(|dir| dir.join(APP_DIR).join("preferences.db")))
    }

    pub fn log_path(&self) -> Option<PathBuf> {
        self.log_file
            .clone()
            .or_else(|| dirs::data_dir().map(|dir| dir.join(APP_DIR).join("portal-theme.log")))
    }

    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
