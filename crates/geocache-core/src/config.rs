//! Maintenance tool configuration.
//!
//! Every setting has a default pointing at the repository-relative `data/`
//! directory, so the tool runs with no config file at all. A JSON file can
//! override any subset of fields. It is read from `$GEOCACHE_CONFIG` when set,
//! otherwise from `~/.config/geocache/config.json`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::boundary::DEFAULT_BOUNDARY_URL;
use crate::dataset::ColumnMapping;

/// Application name used for the config directory path
const APP_NAME: &str = "geocache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable naming an explicit config file
const CONFIG_PATH_ENV: &str = "GEOCACHE_CONFIG";

/// Environment variable overriding the geocoder user agent
const USER_AGENT_ENV: &str = "GEOCACHE_USER_AGENT";

const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";

/// Nominatim rejects requests without an identifying user agent.
const DEFAULT_USER_AGENT: &str = concat!("dc-sustainability-geocache/", env!("CARGO_PKG_VERSION"));

/// HTTP request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Public Nominatim allows at most one request per second.
const DEFAULT_MIN_INTERVAL_MS: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderSettings {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub min_interval_ms: u64,
}

impl Default for GeocoderSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_NOMINATIM_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            min_interval_ms: DEFAULT_MIN_INTERVAL_MS,
        }
    }
}

impl GeocoderSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub location_cache_path: PathBuf,
    pub boundary_cache_path: PathBuf,
    pub boundary_url: String,
    pub dataset_path: PathBuf,
    pub columns: ColumnMapping,
    pub geocoder: GeocoderSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            location_cache_path: PathBuf::from("data/location_cache.json"),
            boundary_cache_path: PathBuf::from("data/us_states.geojson"),
            boundary_url: DEFAULT_BOUNDARY_URL.to_string(),
            dataset_path: PathBuf::from("data/data_centers.csv"),
            columns: ColumnMapping::default(),
            geocoder: GeocoderSettings::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::load_from(Path::new(&path))?,
            None => {
                let path = Self::config_path()?;
                if path.exists() {
                    Self::load_from(&path)?
                } else {
                    debug!(path = %path.display(), "No config file, using defaults");
                    Self::default()
                }
            }
        };

        if let Ok(agent) = std::env::var(USER_AGENT_ENV) {
            if !agent.trim().is_empty() {
                config.geocoder.user_agent = agent;
            }
        }
        Ok(config)
    }

    /// Read an explicit config file; missing fields take their defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }
}
