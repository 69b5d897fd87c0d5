//! Device location access

use std::time::Duration;
use async_trait::async_trait;
use crate::config::GeolocationConfig;
use crate::services::geofence::Coordinate;
use crate::utils::errors::LocationError;

/// Options for a one-shot position request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// Accept a cached fix no older than this; zero forces a fresh one
    pub maximum_age: Duration,
}

impl From<&GeolocationConfig> for PositionOptions {
    fn from(config: &GeolocationConfig) -> Self {
        Self {
            high_accuracy: config.high_accuracy,
            timeout: config.timeout(),
            maximum_age: Duration::ZERO,
        }
    }
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(10),
            maximum_age: Duration::ZERO,
        }
    }
}

/// Source of the device's current position
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_position(&self, options: PositionOptions) -> Result<Coordinate, LocationError>;
}

/// Provider that always reports the same outcome
#[derive(Debug, Clone)]
pub struct FixedLocation {
    outcome: Result<Coordinate, LocationError>,
}

impl FixedLocation {
    pub fn at(position: Coordinate) -> Self {
        Self { outcome: Ok(position) }
    }

    pub fn failing(error: LocationError) -> Self {
        Self { outcome: Err(error) }
    }
}

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current_position(&self, _options: PositionOptions) -> Result<Coordinate, LocationError> {
        self.outcome.clone()
    }
}
