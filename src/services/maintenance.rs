//! Maintenance ticket workflow

use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::database::RecordStore;
use crate::models::{MaintenanceTicket, NewTicket, Role, TicketCategory, TicketPriority, TicketStatus, TicketUpdate};
use crate::services::auth::Session;
use crate::utils::errors::{HostelError, Result};
use crate::utils::helpers::require_text;
use crate::utils::logging::log_workflow_transition;

/// What a student fills in to report a problem
#[derive(Debug, Clone)]
pub struct TicketForm {
    pub category: TicketCategory,
    pub description: String,
    pub priority: TicketPriority,
}

#[derive(Clone)]
pub struct MaintenanceService {
    store: Arc<dyn RecordStore>,
}

impl MaintenanceService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// File a new ticket in `pending`
    pub async fn submit(&self, session: &Session, form: TicketForm) -> Result<MaintenanceTicket> {
        let description = require_text("description", &form.description)
            .ok_or_else(|| HostelError::InvalidInput("Please describe the issue".to_string()))?;

        let ticket = self
            .store
            .insert_ticket(NewTicket {
                user_id: session.user_id,
                user_name: session.name.clone(),
                room_number: session.room_label(),
                category: form.category,
                description,
                priority: form.priority,
            })
            .await?;

        info!(ticket_id = %ticket.id, category = %ticket.category, "Maintenance ticket submitted");
        Ok(ticket)
    }

    /// Hand a ticket to someone; moves it to `in-progress`
    pub async fn assign(&self, session: &Session, ticket_id: Uuid, assignee: &str) -> Result<MaintenanceTicket> {
        session.require(Role::Warden)?;
        let assignee = require_text("assigned_to", assignee)
            .ok_or_else(|| HostelError::InvalidInput("Assignee is required".to_string()))?;

        let update = TicketUpdate {
            status: Some(TicketStatus::InProgress),
            assigned_to: Some(assignee),
            resolution: None,
        };
        self.transition(session, ticket_id, TicketStatus::InProgress, update).await
    }

    /// Close a ticket. Allowed from `pending` or `in-progress`.
    pub async fn resolve(&self, session: &Session, ticket_id: Uuid, resolution: Option<&str>) -> Result<MaintenanceTicket> {
        session.require(Role::Warden)?;

        let update = TicketUpdate {
            status: Some(TicketStatus::Resolved),
            assigned_to: None,
            resolution: resolution.and_then(|text| require_text("resolution", text)),
        };
        self.transition(session, ticket_id, TicketStatus::Resolved, update).await
    }

    async fn transition(
        &self,
        session: &Session,
        ticket_id: Uuid,
        next: TicketStatus,
        update: TicketUpdate,
    ) -> Result<MaintenanceTicket> {
        let sources = TicketStatus::sources_of(next);
        if let Some(ticket) = self.store.update_ticket(ticket_id, update, &sources).await? {
            let from = sources
                .iter()
                .map(TicketStatus::as_str)
                .collect::<Vec<_>>()
                .join("|");
            log_workflow_transition("maintenance_ticket", ticket.id, &from, next.as_str(), session.user_id);
            return Ok(ticket);
        }

        // Guard failed: tell a missing row apart from a wrong status
        match self.store.find_ticket(ticket_id).await? {
            Some(current) => Err(HostelError::transition(current.status, next)),
            None => Err(HostelError::NotFound { entity: "maintenance ticket", id: ticket_id }),
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

    async fn setup() -> (MaintenanceService, Session, Session) {
        let store: Arc<dyn RecordStore> = Arc::new(InMemoryStore::with_demo_data(ChangeFeed::default()).unwrap());
        let auth = AuthService::new(store.clone());
        let student = auth.sign_in(Uuid::from_u128(DEMO_STUDENT_ID)).await.unwrap();
        let warden = auth.sign_in(Uuid::from_u128(DEMO_WARDEN_ID)).await.unwrap();
        (MaintenanceService::new(store), student, warden)
    }

    fn form(description: &str) -> TicketForm {
        TicketForm {
            category: TicketCategory::Electrical,
            description: description.to_string(),
            priority: TicketPriority::High,
        }
    }

    #[tokio::test]
    async fn test_submit_requires_description() {
        let (service, student, _) = setup().await;
        assert_matches!(service.submit(&student, form("   ")).await, Err(HostelError::InvalidInput(_)));

        let ticket = service.submit(&student, form("  Fan not working ")).await.unwrap();
        assert_eq!(ticket.status, TicketStatus::Pending);
        assert_eq!(ticket.description, "Fan not working");
        assert_eq!(ticket.room_number, "A-101");
    }

    #[tokio::test]
    async fn test_assign_then_resolve() {
        let (service, student, warden) = setup().await;
        let ticket = service.submit(&student, form("Light flickers")).await.unwrap();

        let assigned = service.assign(&warden, ticket.id, "Electrician").await.unwrap();
        assert_eq!(assigned.status, TicketStatus::InProgress);
        assert_eq!(assigned.assigned_to.as_deref(), Some("Electrician"));

        let resolved = service.resolve(&warden, ticket.id, Some("Replaced tube")).await.unwrap();
        assert_eq!(resolved.status, TicketStatus::Resolved);
        assert_eq!(resolved.resolution.as_deref(), Some("Replaced tube"));
    }

    #[tokio::test]
    async fn test_pending_ticket_resolves_directly() {
        let (service, student, warden) = setup().await;
        let ticket = service.submit(&student, form("Door hinge loose")).await.unwrap();

        let resolved = service.resolve(&warden, ticket.id, None).await.unwrap();
        assert_eq!(resolved.status, TicketStatus::Resolved);
        assert!(resolved.assigned_to.is_none());
    }

    #[tokio::test]
    async fn test_resolved_is_terminal() {
        let (service, student, warden) = setup().await;
        let ticket = service.submit(&student, form("Window stuck")).await.unwrap();
        service.resolve(&warden, ticket.id, None).await.unwrap();

        assert_matches!(
            service.assign(&warden, ticket.id, "Carpenter").await,
            Err(HostelError::InvalidStateTransition { .. })
        );
        assert_matches!(
            service.resolve(&warden, ticket.id, None).await,
            Err(HostelError::InvalidStateTransition { .. })
        );
    }

    #[tokio::test]
    async fn test_students_cannot_assign() {
        let (service, student, _) = setup().await;
        let ticket = service.submit(&student, form("Tap leaking")).await.unwrap();
        assert_matches!(
            service.assign(&student, ticket.id, "Me").await,
            Err(HostelError::PermissionDenied(_))
        );
        assert_matches!(
            service.resolve(&student, Uuid::new_v4(), None).await,
            Err(HostelError::PermissionDenied(_))
        );
    }

    #[tokio::test]
    async fn test_unknown_ticket() {
        let (service, _, warden) = setup().await;
        assert_matches!(
            service.resolve(&warden, Uuid::new_v4(), None).await,
            Err(HostelError::NotFound { .. })
        );
    }
}
