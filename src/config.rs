//! Configuration module
//!
//! Reads configuration from a TOML file
//! (~/.config/evmap-cache/config.toml by default). Every section has
//! working defaults, so a missing or partial file still yields a usable
//! configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::application::services::UpdaterConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Default location of the config file.
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("evmap-cache")
        .join("config.toml")
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseSection,
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub rate_limit: RateLimitSection,
    #[serde(default)]
    pub upstream: UpstreamSection,
    #[serde(default)]
    pub updater: UpdaterSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    pub fn updater_config(&self) -> UpdaterConfig {
        UpdaterConfig {
            default_market: self.upstream.market.clone(),
            tariffs: self.upstream.tariffs.clone(),
            sweep_limit: self.updater.sweep_limit,
            sweep_priority: self.updater.sweep_priority,
            startup_grace: Duration::from_secs(self.updater.startup_grace_seconds),
            idle_wait: Duration::from_secs(self.updater.idle_wait_seconds),
            error_backoff: Duration::from_secs(self.updater.error_backoff_seconds),
            log_retention_days: self.updater.log_retention_days,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSection {
    /// Path of the SQLite database file
    pub path: String,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            path: "./station_cache.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSection {
    pub expiry_hours: i64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self { expiry_hours: 24 }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitSection {
    pub max_requests: usize,
    pub window_seconds: u64,
}

impl Default for RateLimitSection {
    fn default() -> Self {
        Self {
            max_requests: 3,
            window_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamSection {
    pub base_url: String,
    pub market: String,
    pub tariffs: Vec<String>,
}

impl Default for UpstreamSection {
    fn default() -> Self {
        Self {
            base_url: crate::infrastructure::upstream::DEFAULT_BASE_URL.to_string(),
            market: "de".to_string(),
            tariffs: vec!["HYUNDAI_FLEX".to_string(), "HYUNDAI_SMART".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdaterSection {
    pub sweep_limit: u64,
    pub sweep_priority: i32,
    pub startup_grace_seconds: u64,
    pub idle_wait_seconds: u64,
    pub error_backoff_seconds: u64,
    pub log_retention_days: i64,
}

impl Default for UpdaterSection {
    fn default() -> Self {
        Self {
            sweep_limit: 50,
            sweep_priority: 1,
            startup_grace_seconds: 5,
            idle_wait_seconds: 60,
            error_backoff_seconds: 30,
            log_retention_days: 7,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log level filter (e.g. "info", "evmap_cache=debug")
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg: AppConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.database.path, "./station_cache.db");
        assert_eq!(cfg.cache.expiry_hours, 24);
        assert_eq!(cfg.rate_limit.max_requests, 3);
        assert_eq!(cfg.rate_limit.window_seconds, 10);
        assert_eq!(cfg.upstream.market, "de");
        assert_eq!(cfg.upstream.tariffs.len(), 2);
        assert_eq!(cfg.updater.sweep_limit, 50);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn partial_file_overrides_only_named_keys() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [cache]
            expiry_hours = 6

            [upstream]
            base_url = "https://example.test/api/map/v1"
            market = "at"
            tariffs = ["HYUNDAI_FLEX"]

            [updater]
            sweep_limit = 10
            sweep_priority = 2
            startup_grace_seconds = 1
            idle_wait_seconds = 5
            error_backoff_seconds = 5
            log_retention_days = 3
            "#,
        )
        .unwrap();

        assert_eq!(cfg.cache.expiry_hours, 6);
        assert_eq!(cfg.upstream.market, "at");
        assert_eq!(cfg.database.path, "./station_cache.db");

        let updater = cfg.updater_config();
        assert_eq!(updater.default_market, "at");
        assert_eq!(updater.tariffs, vec!["HYUNDAI_FLEX".to_string()]);
        assert_eq!(updater.sweep_limit, 10);
        assert_eq!(updater.startup_grace, Duration::from_secs(1));
    }
}
