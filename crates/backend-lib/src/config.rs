// ============================
// chatroom-backend-lib/src/config.rs
// ============================
//! Configuration management.
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::storage::StoreLocation;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Log level
    pub log_level: String,
    /// Emit logs as JSON lines
    #[serde(default)]
    pub log_json: bool,
    /// Store connection string, see [`StoreLocation::parse`]
    #[serde(default)]
    pub database_url: Option<String>,
    /// Inactivity sweep timing
    #[serde(default)]
    pub sweep: SweepSettings,
}

/// Inactivity sweep timing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SweepSettings {
    /// Seconds between sweeps
    pub interval_secs: u64,
    /// Seconds without a heartbeat before a participant is evicted
    pub inactivity_threshold_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            log_level: "info".to_string(),
            log_json: false,
            database_url: None,
            sweep: SweepSettings::default(),
        }
    }
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            interval_secs: 15,
            inactivity_threshold_secs: 10,
        }
    }
}

impl SweepSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn threshold(&self) -> Duration {
        Duration::from_secs(self.inactivity_threshold_secs)
    }
}

impl Settings {
    /// Load from `config.toml` in the working directory
    pub fn load() -> Result<Self, AppError> {
        Self::load_from("config.toml")
    }

    /// Defaults, then the TOML file at `path` (if any), then `CHATROOM_*`
    /// variables, then a plain `DATABASE_URL`.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        let settings: Settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("CHATROOM_").split("__"))
            .merge(Env::raw().only(&["database_url"]))
            .extract()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<(), AppError> {
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(AppError::Config(format!(
                "log_level must be one of {LOG_LEVELS:?}, got {}",
                self.log_level
            )));
        }

        if self.sweep.interval_secs == 0 {
            return Err(AppError::Config("sweep.interval_secs must be positive".to_string()));
        }

        if self.sweep.inactivity_threshold_secs == 0 {
            return Err(AppError::Config(
                "sweep.inactivity_threshold_secs must be positive".to_string(),
            ));
        }

        if i64::try_from(self.sweep.inactivity_threshold_secs).is_err() {
            return Err(AppError::Config(
                "sweep.inactivity_threshold_secs is too large".to_string(),
            ));
        }

        self.store_location().map(|_| ())
    }

    /// Parsed `database_url`. Missing is an error: there is no implicit store.
    pub fn store_location(&self) -> Result<StoreLocation, AppError> {
        match self.database_url.as_deref() {
            Some(url) => StoreLocation::parse(url),
            None => Err(AppError::Config("database_url is required".to_string())),
        }
    }
}

#[cfg(test)]
mod config_tests;
