//! Application and session context
//!
//! `AppContext` holds the process-wide pieces. `SessionViews` holds the live
//! views a signed-in principal needs, chosen by role.

use std::sync::Arc;
use futures::future::select_all;
use tokio::sync::watch;

use crate::config::Settings;
use crate::database::{ChangeFeed, RecordStore};
use crate::models::{AttendanceRecord, GatePass, Hostelmate, MaintenanceTicket, MovementLog, Role};
use crate::services::dashboard::{self, Dashboard};
use crate::services::{Geofence, LocationProvider, PositionOptions, ServiceFactory, Session};
use crate::state::check_in::CheckInFlow;
use crate::state::sync::Synchronizer;
use crate::utils::errors::Result;
use crate::utils::helpers::today;

/// Application-wide context containing services and settings
#[derive(Clone)]
pub struct AppContext {
    pub settings: Settings,
    pub feed: ChangeFeed,
    pub services: Arc<ServiceFactory>,
}

impl AppContext {
    pub fn new(settings: Settings, store: Arc<dyn RecordStore>, feed: ChangeFeed) -> Result<Self> {
        let services = Arc::new(ServiceFactory::new(&settings, store)?);
        Ok(Self { settings, feed, services })
    }

    pub fn store(&self) -> Arc<dyn RecordStore> {
        self.services.store()
    }

    pub fn geofence(&self) -> Geofence {
        Geofence::from(&self.settings.hostel)
    }

    /// Live view of one table, following the configured sync mode
    pub async fn view<T: crate::state::sync::SyncRecord>(&self) -> Synchronizer<T> {
        Synchronizer::activate(self.store(), &self.feed, self.settings.sync.mode).await
    }

    /// Open the views the session's role works with
    pub async fn open_views(&self, session: Session) -> SessionViews {
        let views = match session.role {
            Role::Student => RoleViews::Student {
                attendance: self.view().await,
                passes: self.view().await,
                tickets: self.view().await,
                roster: self.view().await,
            },
            Role::Warden => RoleViews::Warden {
                attendance: self.view().await,
                passes: self.view().await,
                tickets: self.view().await,
                roster: self.view().await,
            },
            Role::Security => RoleViews::Security {
                passes: self.view().await,
                movements: self.view().await,
            },
        };
        let signals = views.signals();
        SessionViews { session, views, signals }
    }

    /// Start a check-in for a student session
    pub fn check_in_flow(&self, session: Session, location: Arc<dyn LocationProvider>) -> Result<CheckInFlow> {
        CheckInFlow::new(
            session,
            self.store(),
            location,
            self.geofence(),
            PositionOptions::from(&self.settings.geolocation),
            self.services.webhook_relay.clone(),
        )
    }
}

/// Views per role
#[derive(Debug)]
pub enum RoleViews {
    Student {
        attendance: Synchronizer<AttendanceRecord>,
        passes: Synchronizer<GatePass>,
        tickets: Synchronizer<MaintenanceTicket>,
        roster: Synchronizer<Hostelmate>,
    },
    Warden {
        attendance: Synchronizer<AttendanceRecord>,
        passes: Synchronizer<GatePass>,
        tickets: Synchronizer<MaintenanceTicket>,
        roster: Synchronizer<Hostelmate>,
    },
    Security {
        passes: Synchronizer<GatePass>,
        movements: Synchronizer<MovementLog>,
    },
}

impl RoleViews {
    fn signals(&self) -> Vec<watch::Receiver<u64>> {
        match self {
            RoleViews::Student { attendance, passes, tickets, roster }
            | RoleViews::Warden { attendance, passes, tickets, roster } => {
                vec![attendance.watch(), passes.watch(), tickets.watch(), roster.watch()]
            }
            RoleViews::Security { passes, movements } => vec![passes.watch(), movements.watch()],
        }
    }
}

/// A signed-in principal with their live views
#[derive(Debug)]
pub struct SessionViews {
    pub session: Session,
    pub views: RoleViews,
    signals: Vec<watch::Receiver<u64>>,
}

impl SessionViews {
    /// Wait until any view applies a change. `false` once views have stopped.
    pub async fn changed(&mut self) -> bool {
        if self.signals.is_empty() {
            return false;
        }
        let waits = self.signals.iter_mut().map(|rx| Box::pin(rx.changed()));
        let (result, _, _) = select_all(waits).await;
        result.is_ok()
    }

    pub fn dashboard(&self) -> Dashboard {
        let day = today();
        match &self.views {
            RoleViews::Student { attendance, passes, tickets, roster } => Dashboard::Student(dashboard::student_summary(
                self.session.user_id,
                day,
                &attendance.records(),
                &passes.records(),
                &tickets.records(),
                &roster.records(),
            )),
            RoleViews::Warden { attendance, passes, tickets, roster } => {
                let (attendance, passes, tickets, roster) =
                    (attendance.records(), passes.records(), tickets.records(), roster.records());
                Dashboard::Warden {
                    summary: dashboard::warden_summary(day, &attendance, &passes, &tickets, &roster),
                    analytics: dashboard::analytics_summary(day, &attendance, &passes, &tickets, &roster),
                }
            }
            RoleViews::Security { passes, movements } => {
                Dashboard::Security(dashboard::security_summary(day, &passes.records(), &movements.records()))
            }
        }
    }

    /// End the session, stopping every view
    pub fn close(self) -> Session {
        self.session
    }
}
