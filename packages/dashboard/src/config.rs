//! Dashboard configuration.
//!
//! Values are resolved in layers, later layers winning:
//!
//! 1. the embedded `config/default.toml`
//! 2. a user TOML file named by `TICK_MONITOR_CONFIG`
//! 3. individual environment variables (`TICK_MONITOR_API_URL`, ...)
//! 4. explicit overrides from the command line ([`DashboardConfig::with_api_url`])

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

const DEFAULT_TOML: &str = include_str!("../config/default.toml");

/// Path of an optional user configuration file.
pub const CONFIG_FILE_ENV: &str = "TICK_MONITOR_CONFIG";
/// Backend base URL override.
pub const API_URL_ENV: &str = "TICK_MONITOR_API_URL";
/// Sources result-size cap override.
pub const SOURCES_LIMIT_ENV: &str = "TICK_MONITOR_SOURCES_LIMIT";
/// Settle delay override, in milliseconds.
pub const SETTLE_DELAY_ENV: &str = "TICK_MONITOR_SETTLE_DELAY_MS";
/// Theme preference file override.
pub const THEME_FILE_ENV: &str = "TICK_MONITOR_THEME_FILE";

/// Errors that can occur while resolving the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A configuration document is not valid TOML or has wrong types.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// The user configuration file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A setting has an unusable value.
    #[error("Invalid value {value:?} for {key}: {message}")]
    InvalidValue {
        /// Setting or environment variable name.
        key: String,
        /// The rejected value.
        value: String,
        /// Why it was rejected.
        message: String,
    },
}

/// A WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
}

/// Resolved dashboard settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Backend base URL.
    pub api_base_url: String,
    /// `limit` parameter of every sources request.
    pub sources_limit: u32,
    /// Pause between a successful update trigger and the reload of the
    /// stats/graph/sources views.
    pub settle_delay_ms: u64,
    /// Length of the initial date range, in months, ending today.
    pub default_range_months: u32,
    /// Map center used when a snapshot has no clusters.
    pub default_map_center: GeoPoint,
    /// Map zoom used when a snapshot has no clusters.
    pub default_map_zoom: u8,
    /// File holding the persisted theme preference.
    pub theme_file: PathBuf,
}

/// A partial configuration document; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigOverlay {
    api_base_url: Option<String>,
    sources_limit: Option<u32>,
    settle_delay_ms: Option<u64>,
    default_range_months: Option<u32>,
    default_map_center: Option<GeoPoint>,
    default_map_zoom: Option<u8>,
    theme_file: Option<PathBuf>,
}

impl DashboardConfig {
    /// The built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] if the embedded document is malformed.
    pub fn embedded() -> Result<Self, ConfigError> {
        Ok(toml::de::from_str(DEFAULT_TOML)?)
    }

    /// Resolves the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// See [`DashboardConfig::from_lookup`].
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves the configuration, reading environment values through
    /// `lookup`.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::Io`] if the user configuration file cannot be read
    /// * [`ConfigError::Toml`] if a document is malformed
    /// * [`ConfigError::InvalidValue`] if a setting is out of range
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::embedded()?;

        if let Some(path) = lookup(CONFIG_FILE_ENV).filter(|p| !p.trim().is_empty()) {
            config.overlay_file(Path::new(&path))?;
        }

        if let Some(url) = lookup(API_URL_ENV) {
            config.api_base_url = url;
        }
        if let Some(limit) = lookup(SOURCES_LIMIT_ENV) {
            config.sources_limit = parse_env(SOURCES_LIMIT_ENV, &limit)?;
        }
        if let Some(delay) = lookup(SETTLE_DELAY_ENV) {
            config.settle_delay_ms = parse_env(SETTLE_DELAY_ENV, &delay)?;
        }
        if let Some(path) = lookup(THEME_FILE_ENV) {
            config.theme_file = PathBuf::from(path);
        }

        config.validate()?;
        log::debug!("Resolved dashboard config: {config:?}");
        Ok(config)
    }

    /// Replaces the backend URL (command-line override).
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// The settle delay as a [`Duration`].
    #[must_use]
    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    fn overlay_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.overlay_toml(&text)?;
        log::info!("Loaded dashboard config from {}", path.display());
        Ok(())
    }

    fn overlay_toml(&mut self, text: &str) -> Result<(), ConfigError> {
        let overlay: ConfigOverlay = toml::de::from_str(text)?;

        if let Some(v) = overlay.api_base_url {
            self.api_base_url = v;
        }
        if let Some(v) = overlay.sources_limit {
            self.sources_limit = v;
        }
        if let Some(v) = overlay.settle_delay_ms {
            self.settle_delay_ms = v;
        }
        if let Some(v) = overlay.default_range_months {
            self.default_range_months = v;
        }
        if let Some(v) = overlay.default_map_center {
            self.default_map_center = v;
        }
        if let Some(v) = overlay.default_map_zoom {
            self.default_map_zoom = v;
        }
        if let Some(v) = overlay.theme_file {
            self.theme_file = v;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(invalid("api_base_url", "", "must not be empty"));
        }
        if self.sources_limit == 0 {
            return Err(invalid("sources_limit", "0", "must be at least 1"));
        }
        let GeoPoint { lat, lng } = self.default_map_center;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(invalid(
                "default_map_center",
                &format!("{lat},{lng}"),
                "not a WGS84 coordinate",
            ));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| invalid(key, value, &e.to_string()))
}

fn invalid(key: &str, value: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: BTreeMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn embedded_defaults() {
        let config = DashboardConfig::embedded().unwrap();
        assert_eq!(config.sources_limit, 20);
        assert_eq!(config.settle_delay(), Duration::from_secs(3));
        assert_eq!(config.default_range_months, 2);
        assert_eq!(config.default_map_zoom, 7);
        assert!((config.default_map_center.lat - 57.1522).abs() < 1e-9);
        assert!((config.default_map_center.lng - 65.5272).abs() < 1e-9);
    }

    #[test]
    fn env_overrides_defaults() {
        let config = DashboardConfig::from_lookup(lookup(&[
            (API_URL_ENV, "https://ticks.example.org"),
            (SOURCES_LIMIT_ENV, " 50 "),
            (SETTLE_DELAY_ENV, "0"),
        ]))
        .unwrap();
        assert_eq!(config.api_base_url, "https://ticks.example.org");
        assert_eq!(config.sources_limit, 50);
        assert_eq!(config.settle_delay(), Duration::ZERO);
    }

    #[test]
    fn bad_env_value_is_rejected() {
        let err = DashboardConfig::from_lookup(lookup(&[(SOURCES_LIMIT_ENV, "lots")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == SOURCES_LIMIT_ENV));

        let err = DashboardConfig::from_lookup(lookup(&[(SOURCES_LIMIT_ENV, "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn user_file_overlays_then_env_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.toml");
        std::fs::write(
            &path,
            "sources_limit = 5\ndefault_map_zoom = 9\n[default_map_center]\nlat = 58.2\nlng = 68.25\n",
        )
        .unwrap();
        let path = path.to_string_lossy().into_owned();

        let config = DashboardConfig::from_lookup(lookup(&[
            (CONFIG_FILE_ENV, path.as_str()),
            (SOURCES_LIMIT_ENV, "7"),
        ]))
        .unwrap();
        assert_eq!(config.sources_limit, 7);
        assert_eq!(config.default_map_zoom, 9);
        assert!((config.default_map_center.lat - 58.2).abs() < 1e-9);
        assert_eq!(config.default_range_months, 2);
    }

    #[test]
    fn missing_user_file_is_an_error() {
        let err = DashboardConfig::from_lookup(lookup(&[(CONFIG_FILE_ENV, "/nonexistent/tick.toml")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().starts_with("Failed to read /nonexistent/tick.toml: "));
    }

    #[test]
    fn malformed_user_toml_is_an_error() {
        let mut config = DashboardConfig::embedded().unwrap();
        let err = config.overlay_toml("sources_limit = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn cli_override_wins() {
        let config = DashboardConfig::embedded()
            .unwrap()
            .with_api_url("http://10.0.0.2:8080");
        assert_eq!(config.api_base_url, "http://10.0.0.2:8080");
    }
}
