//! Gate pass request and approval workflow
//!
//! Students request passes; wardens approve or deny them. Approval issues the
//! access code scanned at the gate. Both decisions only apply to a pass that
//! is still `pending` at write time, so two wardens racing on the same pass
//! cannot both win.

use std::sync::Arc;
use chrono::{NaiveDate, Utc};
use tracing::info;
use uuid::Uuid;

use crate::database::RecordStore;
use crate::models::{GatePass, GatePassStatus, GatePassUpdate, NewGatePass, Role};
use crate::services::auth::Session;
use crate::utils::errors::{HostelError, Result};
use crate::utils::helpers::{generate_access_code, require_text};
use crate::utils::logging::log_workflow_transition;

/// What a student fills in to request leave
#[derive(Debug, Clone)]
pub struct GatePassForm {
    pub reason: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub expected_return: NaiveDate,
}

impl GatePassForm {
    fn validate(self) -> Result<(String, String, NaiveDate, NaiveDate)> {
        let reason = require_text("reason", &self.reason)
            .ok_or_else(|| HostelError::InvalidInput("Reason is required".to_string()))?;
        let destination = require_text("destination", &self.destination)
            .ok_or_else(|| HostelError::InvalidInput("Destination is required".to_string()))?;
        if self.departure_date > self.expected_return {
            return Err(HostelError::InvalidInput(format!(
                "Expected return {} is before departure {}",
                self.expected_return, self.departure_date
            )));
        }
        Ok((reason, destination, self.departure_date, self.expected_return))
    }
}

#[derive(Clone)]
pub struct GatePassService {
    store: Arc<dyn RecordStore>,
}

impl GatePassService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn submit(&self, session: &Session, form: GatePassForm) -> Result<GatePass> {
        session.require(Role::Student)?;
        let (reason, destination, departure_date, expected_return) = form.validate()?;

        let pass = self
            .store
            .insert_gate_pass(NewGatePass {
                user_id: session.user_id,
                user_name: session.name.clone(),
                room_number: session.room_label(),
                reason,
                destination,
                departure_date,
                expected_return,
            })
            .await?;

        info!(gate_pass_id = %pass.id, user_id = %session.user_id, "Gate pass requested");
        Ok(pass)
    }

    /// Approve a pending pass, issuing its access code
    pub async fn approve(&self, session: &Session, gate_pass_id: Uuid) -> Result<GatePass> {
        session.require(Role::Warden)?;
        let now = Utc::now();

        let update = GatePassUpdate {
            status: Some(GatePassStatus::Approved),
            qr_code: Some(generate_access_code(gate_pass_id, now)),
            approved_by: Some(session.user_id),
            approved_at: Some(now),
            ..Default::default()
        };
        self.decide(session, gate_pass_id, GatePassStatus::Approved, update).await
    }

    /// Deny a pending pass; no code is issued
    pub async fn deny(&self, session: &Session, gate_pass_id: Uuid) -> Result<GatePass> {
        session.require(Role::Warden)?;

        let update = GatePassUpdate {
            status: Some(GatePassStatus::Denied),
            ..Default::default()
        };
        self.decide(session, gate_pass_id, GatePassStatus::Denied, update).await
    }

    async fn decide(
        &self,
        session: &Session,
        gate_pass_id: Uuid,
        next: GatePassStatus,
        update: GatePassUpdate,
    ) -> Result<GatePass> {
        let pending = [GatePassStatus::Pending];
        if let Some(pass) = self.store.update_gate_pass(gate_pass_id, update, &pending).await? {
            log_workflow_transition("gate_pass", pass.id, GatePassStatus::Pending.as_str(), next.as_str(), session.user_id);
            return Ok(pass);
        }

        match self.store.find_gate_pass(gate_pass_id).await? {
            Some(current) => Err(HostelError::transition(current.status, next)),
            None => Err(HostelError::NotFound { entity: "gate pass", id: gate_pass_id }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use crate::database::{ChangeFeed, InMemoryStore};
    use crate::database::memory::{DEMO_STUDENT_ID, DEMO_WARDEN_ID};
    use crate::services::auth::AuthService;
    use crate::utils::helpers::parse_access_code;

    async fn setup() -> (GatePassService, Session, Session) {
        let store: Arc<dyn RecordStore> = Arc::new(InMemoryStore::with_demo_data(ChangeFeed::default()).unwrap());
        let auth = AuthService::new(store.clone());
        let student = auth.sign_in(Uuid::from_u128(DEMO_STUDENT_ID)).await.unwrap();
        let warden = auth.sign_in(Uuid::from_u128(DEMO_WARDEN_ID)).await.unwrap();
        (GatePassService::new(store), student, warden)
    }

    fn form(departure: (i32, u32, u32), back: (i32, u32, u32)) -> GatePassForm {
        GatePassForm {
            reason: "Family function".to_string(),
            destination: "Raipur".to_string(),
            departure_date: NaiveDate::from_ymd_opt(departure.0, departure.1, departure.2).unwrap(),
            expected_return: NaiveDate::from_ymd_opt(back.0, back.1, back.2).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_return_before_departure_is_rejected() {
        let (service, student, _) = setup().await;
        assert_matches!(
            service.submit(&student, form((2025, 5, 10), (2025, 5, 9))).await,
            Err(HostelError::InvalidInput(_))
        );
        // Same-day trips are fine
        assert!(service.submit(&student, form((2025, 5, 10), (2025, 5, 10))).await.is_ok());
    }

    #[tokio::test]
    async fn test_blank_fields_are_rejected() {
        let (service, student, _) = setup().await;
        let mut blank = form((2025, 5, 10), (2025, 5, 12));
        blank.destination = " ".to_string();
        assert_matches!(service.submit(&student, blank).await, Err(HostelError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_approve_issues_access_code() {
        let (service, student, warden) = setup().await;
        let pass = service.submit(&student, form((2025, 5, 10), (2025, 5, 12))).await.unwrap();
        assert_eq!(pass.status, GatePassStatus::Pending);

        let approved = service.approve(&warden, pass.id).await.unwrap();
        assert_eq!(approved.status, GatePassStatus::Approved);
        assert_eq!(approved.approved_by, Some(warden.user_id));
        assert!(approved.approved_at.is_some());
        let code = approved.qr_code.expect("approved pass carries a code");
        assert_eq!(parse_access_code(&code), Some(pass.id));
    }

    #[tokio::test]
    async fn test_deny_issues_no_code() {
        let (service, student, warden) = setup().await;
        let pass = service.submit(&student, form((2025, 5, 10), (2025, 5, 12))).await.unwrap();

        let denied = service.deny(&warden, pass.id).await.unwrap();
        assert_eq!(denied.status, GatePassStatus::Denied);
        assert!(denied.qr_code.is_none());
        assert!(denied.approved_by.is_none());
    }

    #[tokio::test]
    async fn test_second_decision_loses() {
        let (service, student, warden) = setup().await;
        let pass = service.submit(&student, form((2025, 5, 10), (2025, 5, 12))).await.unwrap();

        service.approve(&warden, pass.id).await.unwrap();
        assert_matches!(
            service.approve(&warden, pass.id).await,
            Err(HostelError::InvalidStateTransition { ref from, .. }) if from == "approved"
        );
        assert_matches!(
            service.deny(&warden, pass.id).await,
            Err(HostelError::InvalidStateTransition { .. })
        );
    }

    #[tokio::test]
    async fn test_concurrent_approvals_have_one_winner() {
        let (service, student, warden) = setup().await;
        let pass = service.submit(&student, form((2025, 5, 10), (2025, 5, 12))).await.unwrap();

        let (a, b) = tokio::join!(service.approve(&warden, pass.id), service.deny(&warden, pass.id));
        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);
    }

    #[tokio::test]
    async fn test_only_students_request_passes() {
        let (service, _, warden) = setup().await;
        assert_matches!(
            service.submit(&warden, form((2025, 5, 10), (2025, 5, 12))).await,
            Err(HostelError::PermissionDenied(_))
        );
    }

    #[tokio::test]
    async fn test_only_wardens_decide() {
        let (service, student, _) = setup().await;
        let pass = service.submit(&student, form((2025, 5, 10), (2025, 5, 12))).await.unwrap();
        assert_matches!(service.approve(&student, pass.id).await, Err(HostelError::PermissionDenied(_)));
    }
}
