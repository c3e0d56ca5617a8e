use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::geocode::CityTable;
use crate::model::Coordinate;
use crate::resolver::DEFAULT_MAX_STEPS;

/// Overrides `base_url` from the file when set.
pub const BASE_URL_ENV: &str = "CLIMATRACK_BASE_URL";

pub const DEFAULT_BASE_URL: &str = "https://power.larc.nasa.gov/api/temporal/daily/point";

/// Extra geocoding entry, checked after the built-in cities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityConfig {
    pub name: String,
    pub latitude: String,
    pub longitude: String,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// NASA POWER daily point endpoint.
    pub base_url: String,

    /// POWER user community, `RE` (renewable energy) unless changed.
    pub community: String,

    /// Per-request transport timeout.
    pub timeout_secs: u64,

    /// Total single-day fetches the fallback is allowed, target day included.
    pub max_fallback_steps: u32,

    /// Listen address for `climatrack serve`.
    pub bind: String,

    /// Example TOML:
    /// [[cities]]
    /// name = "berlin"
    /// latitude = "52.5200"
    /// longitude = "13.4050"
    pub cities: Vec<CityConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            community: "RE".to_string(),
            timeout_secs: 30,
            max_fallback_steps: DEFAULT_MAX_STEPS,
            bind: "127.0.0.1:3000".to_string(),
            cities: Vec::new(),
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    /// The base URL environment override is applied either way.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = Self::load_from(&path)?;
        cfg.override_base_url(std::env::var(BASE_URL_ENV).ok());
        Ok(cfg)
    }

    /// Blank values leave the configured URL in place.
    fn override_base_url(&mut self, url: Option<String>) {
        if let Some(url) = url
            && !url.trim().is_empty()
        {
            self.base_url = url;
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return defaults.
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
        let dirs = ProjectDirs::from("dev", "climatrack", "climatrack")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Add or replace an extra geocoding entry, matched case-insensitively by name.
    pub fn upsert_city(&mut self, name: &str, coordinate: Coordinate) {
        let name = name.trim().to_lowercase();
        let entry = CityConfig {
            name: name.clone(),
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
        };

        match self.cities.iter_mut().find(|c| c.name == name) {
            Some(existing) => *existing = entry,
            None => self.cities.push(entry),
        }
    }

    /// Built-in city table extended with the configured cities.
    pub fn city_table(&self) -> CityTable {
        self.cities.iter().fold(CityTable::default(), |table, c| {
            table.with_city(&c.name, Coordinate::new(&c.latitude, &c.longitude))
        })
    }
}
