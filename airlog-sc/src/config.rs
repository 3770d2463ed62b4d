//! Collector configuration
//!
//! Station identity, endpoint URLs and API keys come from a TOML file;
//! secrets may also arrive via environment variables, which take priority
//! over the file. Empty URL fields disable the corresponding probe without
//! error, so a single-station deployment just leaves the others blank.

use airlog_common::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Environment override for the Last.fm API key
pub const LASTFM_KEY_ENV: &str = "AIRLOG_LASTFM_API_KEY";
/// Environment override for the OpenWeatherMap API key
pub const OPENWEATHER_KEY_ENV: &str = "AIRLOG_OPENWEATHER_API_KEY";

const DEFAULT_DATABASE_PATH: &str = "airlog.db";

/// Top-level collector configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollectorConfig {
    #[serde(default)]
    pub station_name: String,
    #[serde(default)]
    pub station_website: String,
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    #[serde(default)]
    pub streams: StreamUrls,
    #[serde(default)]
    pub schedules: ScheduleUrls,
    #[serde(default)]
    pub keys: ApiKeys,
    #[serde(default)]
    pub location: Option<Location>,
}

/// Stream status-page endpoints, one per monitored stream
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamUrls {
    #[serde(default)]
    pub main1: String,
    #[serde(default)]
    pub main2: String,
    #[serde(default)]
    pub second1: String,
    #[serde(default)]
    pub second2: String,
    #[serde(default)]
    pub comparison: String,
}

/// Schedule feed endpoints, one per channel
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScheduleUrls {
    #[serde(default)]
    pub main: String,
    #[serde(default)]
    pub second: String,
    #[serde(default)]
    pub comparison: String,
}

/// Optional API keys; a missing key silently disables its source
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiKeys {
    #[serde(default)]
    pub lastfm: Option<String>,
    #[serde(default)]
    pub openweather: Option<String>,
}

/// Station coordinates for the weather and sun-times lookups
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl CollectorConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;

        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("cannot parse {}: {}", path.display(), e)))
    }

    /// Identifying user-agent for metadata requests.
    ///
    /// MusicBrainz in particular requires callers to identify themselves.
    pub fn user_agent(&self) -> String {
        format!(
            "{} Listener Analysis/{} ({})",
            self.station_name,
            env!("CARGO_PKG_VERSION"),
            self.station_website
        )
    }

    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH))
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.location.map(|l| (l.latitude, l.longitude))
    }

    /// Last.fm API key: environment overrides the config file
    pub fn lastfm_api_key(&self) -> Option<String> {
        resolve_key(LASTFM_KEY_ENV, self.keys.lastfm.as_ref(), "Last.fm")
    }

    /// OpenWeatherMap API key: environment overrides the config file
    pub fn openweather_api_key(&self) -> Option<String> {
        resolve_key(
            OPENWEATHER_KEY_ENV,
            self.keys.openweather.as_ref(),
            "OpenWeatherMap",
        )
    }
}

/// Two-tier key resolution: environment, then config file.
///
/// Blank values count as absent; a key in both places gets a warning so a
/// stale file entry is noticed.
fn resolve_key(env_var: &str, file_value: Option<&String>, label: &str) -> Option<String> {
    let env_key = std::env::var(env_var)
        .ok()
        .filter(|key| !key.trim().is_empty());
    let file_key = file_value.filter(|key| !key.trim().is_empty()).cloned();

    if env_key.is_some() && file_key.is_some() {
        warn!(
            "{} API key found in both {} and the config file; using the environment value",
            label, env_var
        );
    }

    env_key.or(file_key)
}
