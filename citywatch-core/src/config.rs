use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// units = "metric"
/// default_cities = ["Kyiv", "Lviv"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OpenWeather API key.
    pub api_key: Option<String>,

    /// Provider root, without a trailing `/weather` or `/forecast`.
    pub base_url: String,

    /// Provider units, e.g. "metric" or "imperial".
    pub units: String,

    pub icon_base_url: String,

    /// Watch-list used when nothing has been persisted yet.
    pub default_cities: Vec<String>,

    /// Directory for the persisted watch-list. Platform data dir when unset.
    pub storage_dir: Option<PathBuf>,

    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            units: "metric".to_string(),
            icon_base_url: DEFAULT_ICON_BASE_URL.to_string(),
            default_cities: default_cities(),
            storage_dir: None,
            request_timeout_secs: 10,
        }
    }
}

pub fn default_cities() -> Vec<String> {
    ["Kyiv", "Lviv", "Odesa", "Dnipro"].into_iter().map(String::from).collect()
}

impl Config {
    /// Load config from the platform config dir, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
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

    /// Save config to the platform config dir, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;
        self.save_to(&path)
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

    pub fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("dev", "citywatch", "citywatch")
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = Self::project_dirs()
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Returns the API key, if one is configured and non-empty.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.trim().is_empty())
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }
}
