use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}, time::Duration};

use crate::{error::WeatherError, sun::SunriseSunsetTable};

pub const DEFAULT_BASE_URL: &str = "https://opendata.cwb.gov.tw/api/v1/rest/datastore";
pub const DEFAULT_STATION: &str = "臺北";
pub const DEFAULT_DISTRICT: &str = "臺北市";

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "CWB-..."
/// station = "臺北"
/// district = "臺北市"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// CWB open-data authorization key.
    pub api_key: Option<String>,

    /// Observation station name for the current-observation dataset.
    pub station: String,

    /// County/city name for the forecast dataset and the sunrise table.
    pub district: String,

    pub base_url: String,

    /// Per-request timeout. No timeout when absent.
    pub timeout_secs: Option<u64>,

    /// Replacement sunrise/sunset table; the bundled one is used when absent.
    pub sun_table: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            station: DEFAULT_STATION.to_string(),
            district: DEFAULT_DISTRICT.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: None,
            sun_table: None,
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, use defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("tw", "cwb-weather", "cwb-weather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn set_api_key(&mut self, api_key: String) {
        let trimmed = api_key.trim();
        self.api_key = if trimmed.is_empty() { None } else { Some(trimmed.to_string()) };
    }

    pub fn api_key(&self) -> Result<&str, WeatherError> {
        self.api_key.as_deref().ok_or(WeatherError::MissingApiKey)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// The configured sunrise/sunset table, falling back to the bundled one.
    pub fn sun_table(&self) -> Result<SunriseSunsetTable> {
        match &self.sun_table {
            Some(path) => SunriseSunsetTable::load(path),
            None => SunriseSunsetTable::bundled(),
        }
    }
}
