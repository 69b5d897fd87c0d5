//! Geofence evaluation
//!
//! Great-circle distance on a spherical Earth and the inside/outside decision
//! for the hostel boundary.

use serde::{Deserialize, Serialize};
use crate::config::HostelConfig;
use crate::utils::errors::{HostelError, Result};

/// Mean Earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS84 position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Build a coordinate, rejecting non-finite or out-of-range values
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(HostelError::InvalidInput(format!("latitude out of range: {}", latitude)));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(HostelError::InvalidInput(format!("longitude out of range: {}", longitude)));
        }
        Ok(Self { latitude, longitude })
    }

    /// Build without validation; NaN inputs propagate through distance math
    pub const fn unchecked(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Haversine distance between two points, in meters
pub fn haversine_distance(a: Coordinate, b: Coordinate) -> f64 {
    let phi1 = a.latitude.to_radians();
    let phi2 = b.latitude.to_radians();
    let d_phi = (b.latitude - a.latitude).to_radians();
    let d_lambda = (b.longitude - a.longitude).to_radians();

    let h = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push h slightly past 1 for antipodal points; NaN passes through
    let root = h.sqrt();
    let root = if root > 1.0 { 1.0 } else { root };
    let c = 2.0 * root.asin();

    EARTH_RADIUS_M * c
}

/// Outcome of a boundary check
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeofenceReading {
    pub distance_m: f64,
    pub within: bool,
}

/// Circular boundary around a reference point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geofence {
    pub center: Coordinate,
    pub radius_m: f64,
}

impl Geofence {
    pub fn new(center: Coordinate, radius_m: f64) -> Self {
        Self { center, radius_m }
    }

    /// `within` holds iff the distance is at most the radius; NaN is never within.
    pub fn evaluate(&self, position: Coordinate) -> GeofenceReading {
        let distance_m = haversine_distance(self.center, position);
        GeofenceReading {
            distance_m,
            within: distance_m <= self.radius_m,
        }
    }
}

impl From<&HostelConfig> for Geofence {
    fn from(config: &HostelConfig) -> Self {
        Self::new(Coordinate::unchecked(config.latitude, config.longitude), config.radius_meters)
    }
}
