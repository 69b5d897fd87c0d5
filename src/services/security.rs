//! Gate movement logging

use std::sync::Arc;
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::database::RecordStore;
use crate::models::{GatePass, GatePassStatus, GatePassUpdate, MovementKind, MovementLog, NewMovementLog, Role};
use crate::services::auth::Session;
use crate::utils::errors::{HostelError, Result};
use crate::utils::helpers::parse_access_code;
use crate::utils::logging::log_movement;

#[derive(Clone)]
pub struct SecurityService {
    store: Arc<dyn RecordStore>,
}

impl SecurityService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Resolve a scanned access code to the approved pass it was issued for
    pub async fn lookup_code(&self, code: &str) -> Result<GatePass> {
        let id = parse_access_code(code)
            .ok_or_else(|| HostelError::InvalidInput("Unrecognised access code".to_string()))?;
        let pass = self
            .store
            .find_gate_pass(id)
            .await?
            .ok_or(HostelError::NotFound { entity: "gate pass", id })?;

        if pass.qr_code.as_deref() != Some(code.trim()) {
            warn!(gate_pass_id = %id, "Access code does not match the issued one");
            return Err(HostelError::InvalidInput("Access code has been superseded".to_string()));
        }
        Ok(pass)
    }

    /// Log a scan by access code
    pub async fn scan(&self, session: &Session, code: &str, kind: MovementKind) -> Result<MovementLog> {
        let pass = self.lookup_code(code).await?;
        self.log_movement(session, pass.id, kind).await
    }

    /// Record an exit or entry against an approved pass and stamp the pass.
    ///
    /// The log row is written first; if stamping the pass then fails the log
    /// stands and the error is returned.
    pub async fn log_movement(&self, session: &Session, gate_pass_id: Uuid, kind: MovementKind) -> Result<MovementLog> {
        session.require(Role::Security)?;

        let pass = self
            .store
            .find_gate_pass(gate_pass_id)
            .await?
            .ok_or(HostelError::NotFound { entity: "gate pass", id: gate_pass_id })?;
        if pass.status != GatePassStatus::Approved {
            return Err(HostelError::InvalidInput(format!(
                "Gate pass {} is {}, only approved passes can be scanned",
                pass.id, pass.status
            )));
        }

        let log = self
            .store
            .insert_movement_log(NewMovementLog {
                gate_pass_id: pass.id,
                user_id: pass.user_id,
                user_name: pass.user_name.clone(),
                kind,
                scanned_by: session.user_id,
            })
            .await?;

        let now = Utc::now();
        let stamp = match kind {
            MovementKind::Exit => GatePassUpdate { exit_time: Some(now), ..Default::default() },
            MovementKind::Entry => GatePassUpdate { entry_time: Some(now), ..Default::default() },
        };
        self.store
            .update_gate_pass(pass.id, stamp, &[GatePassStatus::Approved])
            .await?
            .ok_or_else(|| HostelError::transition(pass.status, format!("{} stamp", kind)))?;

        log_movement(pass.id, kind.as_str(), session.user_id);
        info!(gate_pass_id = %pass.id, user = %pass.user_name, kind = %kind, "Movement logged");
        Ok(log)
    }
}
