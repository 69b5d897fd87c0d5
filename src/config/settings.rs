//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use std::path::Path;
use std::time::Duration;
use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub hostel: HostelConfig,
    pub geolocation: GeolocationConfig,
    pub sync: SyncConfig,
    pub webhook: WebhookConfig,
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// `postgres://...` for the real store, `memory://` for the seeded demo store
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Hostel reference point used for attendance geofencing
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HostelConfig {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f64,
}

/// Device location request options
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeolocationConfig {
    pub timeout_seconds: u64,
    pub high_accuracy: bool,
}

/// How synchronizers react to change notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Re-read the whole table on every notification
    Refetch,
    /// Apply payload-carrying notifications in place, re-read otherwise
    Patch,
}

/// Change-notification configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    pub mode: SyncMode,
    /// Postgres NOTIFY channel the row triggers publish on
    pub channel: String,
    /// In-process broadcast buffer per subscriber
    pub buffer: usize,
}

/// Spreadsheet webhook configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebhookConfig {
    pub enabled: bool,
    pub url: Option<String>,
    pub timeout_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: String,
    pub json: bool,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        Self::load(config::File::with_name("config").required(false))
    }

    /// Load settings from an explicit file, still honouring environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, config::ConfigError> {
        let path = path.as_ref().to_string_lossy().to_string();
        Self::load(config::File::with_name(&path).required(true))
    }

    fn load<S>(file: S) -> Result<Self, config::ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let defaults = config::Config::try_from(&Settings::default())?;

        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(file)
            .add_source(config::Environment::with_prefix("HOSTELFLOW").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::HostelError> {
        super::validation::validate_settings(self)
    }
}

impl GeolocationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl WebhookConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl DatabaseConfig {
    /// Whether the URL selects the in-memory demo store
    pub fn is_memory(&self) -> bool {
        self.url.starts_with("memory:")
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "postgresql://localhost/hostelflow".to_string(),
                max_connections: 10,
                min_connections: 1,
            },
            hostel: HostelConfig {
                name: "HostelFlow Residence".to_string(),
                latitude: 21.234776,
                longitude: 81.346385,
                radius_meters: 100.0,
            },
            geolocation: GeolocationConfig {
                timeout_seconds: 10,
                high_accuracy: true,
            },
            sync: SyncConfig {
                mode: SyncMode::Refetch,
                channel: "hostel_changes".to_string(),
                buffer: 256,
            },
            webhook: WebhookConfig {
                enabled: false,
                url: None,
                timeout_seconds: 10,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: "logs".to_string(),
                json: false,
            },
        }
    }
}
