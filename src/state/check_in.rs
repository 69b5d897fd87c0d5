//! Attendance check-in flow
//!
//! `Idle -> Checking -> Verified | Outside`. Only a verified position can be
//! submitted, and a position is only ever verified by a fresh location
//! request.

use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::database::RecordStore;
use crate::models::{AttendanceKind, AttendanceRecord, NewAttendanceRecord, Role};
use crate::services::auth::Session;
use crate::services::geofence::{Coordinate, Geofence, GeofenceReading};
use crate::services::location::{LocationProvider, PositionOptions};
use crate::services::webhook::{AttendancePayload, WebhookRelay};
use crate::state::sync::Synchronizer;
use crate::utils::errors::{HostelError, LocationError, Result};
use crate::utils::helpers::today;
use crate::utils::logging::{log_check_in, log_error};

#[derive(Debug, Clone, PartialEq)]
pub enum CheckInState {
    Idle,
    Checking,
    Verified { position: Coordinate, reading: GeofenceReading },
    Outside { position: Coordinate, reading: GeofenceReading },
}

impl CheckInState {
    pub fn name(&self) -> &'static str {
        match self {
            CheckInState::Idle => "idle",
            CheckInState::Checking => "checking",
            CheckInState::Verified { .. } => "verified",
            CheckInState::Outside { .. } => "outside",
        }
    }
}

/// What the check-in screen shows
#[derive(Debug, Clone, PartialEq)]
pub enum CheckInDisplay {
    AlreadyCheckedIn(AttendanceRecord),
    Flow(CheckInState),
}

/// Result of a successful check-in
#[derive(Debug)]
pub struct CheckInReceipt {
    pub record: AttendanceRecord,
    /// Resolves to whether the spreadsheet accepted the row
    pub forwarded: JoinHandle<bool>,
}

pub struct CheckInFlow {
    session: Session,
    store: Arc<dyn RecordStore>,
    location: Arc<dyn LocationProvider>,
    geofence: Geofence,
    options: PositionOptions,
    webhook: WebhookRelay,
    state: CheckInState,
    last_error: Option<LocationError>,
}

impl fmt::Debug for CheckInFlow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckInFlow")
            .field("user_id", &self.session.user_id)
            .field("geofence", &self.geofence)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl CheckInFlow {
    pub fn new(
        session: Session,
        store: Arc<dyn RecordStore>,
        location: Arc<dyn LocationProvider>,
        geofence: Geofence,
        options: PositionOptions,
        webhook: WebhookRelay,
    ) -> Result<Self> {
        session.require(Role::Student)?;
        Ok(Self {
            session,
            store,
            location,
            geofence,
            options,
            webhook,
            state: CheckInState::Idle,
            last_error: None,
        })
    }

    pub fn state(&self) -> &CheckInState {
        &self.state
    }

    pub fn last_error(&self) -> Option<&LocationError> {
        self.last_error.as_ref()
    }

    /// Request a fresh position and judge it against the geofence
    pub async fn verify_location(&mut self) -> Result<GeofenceReading> {
        self.state = CheckInState::Checking;
        self.last_error = None;

        let outcome = match tokio::time::timeout(self.options.timeout, self.location.current_position(self.options)).await {
            Ok(result) => result.and_then(checked_position),
            Err(_) => Err(LocationError::Timeout),
        };

        let position = match outcome {
            Ok(position) => position,
            Err(e) => {
                self.state = CheckInState::Idle;
                self.last_error = Some(e.clone());
                let err = HostelError::Location(e);
                log_error("verify_location", &err);
                return Err(err);
            }
        };

        let reading = self.geofence.evaluate(position);
        log_check_in(self.session.user_id, reading.distance_m, reading.within);
        self.state = if reading.within {
            CheckInState::Verified { position, reading }
        } else {
            CheckInState::Outside { position, reading }
        };
        Ok(reading)
    }

    /// Write today's check-in from the verified position
    pub async fn submit(&mut self, attendance: &Synchronizer<AttendanceRecord>) -> Result<CheckInReceipt> {
        let position = match &self.state {
            CheckInState::Verified { position, .. } => *position,
            other => return Err(HostelError::transition(other.name(), "submitted")),
        };

        let day = today();
        if attendance.checked_in_on(self.session.user_id, day) {
            return Err(HostelError::AlreadyCheckedIn { date: day });
        }

        let record = self
            .store
            .insert_attendance(NewAttendanceRecord {
                user_id: self.session.user_id,
                user_name: self.session.name.clone(),
                room_number: self.session.room_label(),
                kind: AttendanceKind::CheckIn,
                latitude: position.latitude,
                longitude: position.longitude,
                verified: true,
                selfie_url: None,
            })
            .await?;

        info!(user_id = %record.user_id, record_id = %record.id, "Attendance marked");
        let forwarded = self.webhook.dispatch(AttendancePayload::from(&record));
        self.state = CheckInState::Idle;

        Ok(CheckInReceipt { record, forwarded })
    }

    /// Screen state, accounting for a check-in already made today
    pub fn display_state(&self, attendance: &Synchronizer<AttendanceRecord>) -> CheckInDisplay {
        let day = today();
        match attendance.check_in_for_user_on(self.session.user_id, day) {
            Some(record) => CheckInDisplay::AlreadyCheckedIn(record),
            None => CheckInDisplay::Flow(self.state.clone()),
        }
    }
}

/// Providers hand back raw values; only in-range, finite positions are judged
fn checked_position(position: Coordinate) -> std::result::Result<Coordinate, LocationError> {
    Coordinate::new(position.latitude, position.longitude)
        .map_err(|_| LocationError::InvalidPosition(format!("({}, {})", position.latitude, position.longitude)))
}
