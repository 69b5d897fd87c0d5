//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{HostelError, Result};
use super::Settings;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_database_config(&settings.database)?;
    validate_hostel_config(&settings.hostel)?;
    validate_geolocation_config(&settings.geolocation)?;
    validate_sync_config(&settings.sync)?;
    validate_webhook_config(&settings.webhook)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(HostelError::Config(
            "Database URL is required".to_string()
        ));
    }

    if config.max_connections == 0 {
        return Err(HostelError::Config(
            "Max connections must be greater than 0".to_string()
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(HostelError::Config(
            "Min connections cannot be greater than max connections".to_string()
        ));
    }

    Ok(())
}

/// Validate the geofence reference point
fn validate_hostel_config(config: &super::HostelConfig) -> Result<()> {
    if !config.latitude.is_finite() || !(-90.0..=90.0).contains(&config.latitude) {
        return Err(HostelError::Config(
            format!("Hostel latitude out of range: {}", config.latitude)
        ));
    }

    if !config.longitude.is_finite() || !(-180.0..=180.0).contains(&config.longitude) {
        return Err(HostelError::Config(
            format!("Hostel longitude out of range: {}", config.longitude)
        ));
    }

    if !(config.radius_meters.is_finite() && config.radius_meters > 0.0) {
        return Err(HostelError::Config(
            "Geofence radius must be a positive number of meters".to_string()
        ));
    }

    Ok(())
}

/// Validate geolocation configuration
fn validate_geolocation_config(config: &super::GeolocationConfig) -> Result<()> {
    if config.timeout_seconds == 0 {
        return Err(HostelError::Config(
            "Location timeout must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate change-notification configuration
fn validate_sync_config(config: &super::SyncConfig) -> Result<()> {
    if config.channel.is_empty() {
        return Err(HostelError::Config(
            "Notification channel name is required".to_string()
        ));
    }

    if config.buffer == 0 {
        return Err(HostelError::Config(
            "Sync buffer must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate webhook configuration
fn validate_webhook_config(config: &super::WebhookConfig) -> Result<()> {
    if !config.enabled {
        return Ok(());
    }

    let raw = config.url.as_deref().unwrap_or_default();
    if raw.is_empty() {
        return Err(HostelError::Config(
            "Webhook URL is required when the webhook is enabled".to_string()
        ));
    }
    url::Url::parse(raw)?;

    if config.timeout_seconds == 0 {
        return Err(HostelError::Config(
            "Webhook timeout must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(HostelError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(HostelError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    Ok(())
}
