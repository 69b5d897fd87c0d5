//! Services module
//!
//! This module contains the hostel workflows and their supporting services

pub mod auth;
pub mod dashboard;
pub mod directory;
pub mod gate_pass;
pub mod geofence;
pub mod location;
pub mod maintenance;
pub mod security;
pub mod webhook;

// Re-export commonly used services
pub use auth::{AuthService, Session};
pub use dashboard::{Dashboard, StudentSummary, WardenSummary, AnalyticsSummary, SecuritySummary};
pub use gate_pass::{GatePassForm, GatePassService};
pub use geofence::{haversine_distance, Coordinate, Geofence, GeofenceReading};
pub use location::{FixedLocation, LocationProvider, PositionOptions};
pub use maintenance::{MaintenanceService, TicketForm};
pub use security::SecurityService;
pub use webhook::{AttendancePayload, WebhookRelay};

use std::sync::Arc;
use crate::config::settings::Settings;
use crate::database::RecordStore;
use crate::utils::errors::Result;
use crate::utils::logging::log_error;

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub auth_service: AuthService,
    pub maintenance_service: MaintenanceService,
    pub gate_pass_service: GatePassService,
    pub security_service: SecurityService,
    pub webhook_relay: WebhookRelay,
    store: Arc<dyn RecordStore>,
}

impl ServiceFactory {
    /// Create a new ServiceFactory with all services initialized
    pub fn new(settings: &Settings, store: Arc<dyn RecordStore>) -> Result<Self> {
        Ok(Self {
            auth_service: AuthService::new(store.clone()),
            maintenance_service: MaintenanceService::new(store.clone()),
            gate_pass_service: GatePassService::new(store.clone()),
            security_service: SecurityService::new(store.clone()),
            webhook_relay: WebhookRelay::new(&settings.webhook)?,
            store,
        })
    }

    pub fn store(&self) -> Arc<dyn RecordStore> {
        self.store.clone()
    }

    /// Health check for all services
    pub async fn health_check(&self) -> ServiceHealthStatus {
        let store_healthy = match self.store.ping().await {
            Ok(()) => true,
            Err(e) => {
                log_error("store_health_check", &e);
                false
            }
        };

        ServiceHealthStatus {
            store_backend: self.store.backend_tag(),
            store_healthy,
            webhook_enabled: self.webhook_relay.is_enabled(),
        }
    }
}

/// Health status for all services
#[derive(Debug, Clone)]
pub struct ServiceHealthStatus {
    pub store_backend: &'static str,
    pub store_healthy: bool,
    pub webhook_enabled: bool,
}

impl ServiceHealthStatus {
    /// Check if all critical services are healthy
    pub fn is_healthy(&self) -> bool {
        self.store_healthy
    }

    /// Get list of degraded services
    pub fn get_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !self.store_healthy {
            issues.push(format!("{} store unreachable", self.store_backend));
        }
        if !self.webhook_enabled {
            issues.push("Attendance webhook disabled".to_string());
        }

        issues
    }
}
