//! Maintenance ticket repository implementation

use sqlx::PgPool;
use chrono::Utc;
use uuid::Uuid;
use crate::models::ticket::{MaintenanceTicket, NewTicket, TicketUpdate, TicketStatus};
use crate::utils::errors::HostelError;

const COLUMNS: &str = "id, user_id, user_name, room_number, category, description, status, priority, assigned_to, resolution, created_at, updated_at";

#[derive(Clone, Debug)]
pub struct TicketRepository {
    pool: PgPool,
}

impl TicketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// File a new ticket in `pending`
    pub async fn create(&self, request: NewTicket) -> Result<MaintenanceTicket, HostelError> {
        let now = Utc::now();
        let ticket = sqlx::query_as::<_, MaintenanceTicket>(&format!(
            r#"
            INSERT INTO maintenance_tickets (user_id, user_name, room_number, category, description, status, priority, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(request.user_id)
        .bind(request.user_name)
        .bind(request.room_number)
        .bind(request.category.as_str())
        .bind(request.description)
        .bind(TicketStatus::Pending.as_str())
        .bind(request.priority.as_str())
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(ticket)
    }

    /// Find ticket by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<MaintenanceTicket>, HostelError> {
        let ticket = sqlx::query_as::<_, MaintenanceTicket>(&format!(
            "SELECT {COLUMNS} FROM maintenance_tickets WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ticket)
    }

    /// All tickets, newest first
    pub async fn list(&self) -> Result<Vec<MaintenanceTicket>, HostelError> {
        let tickets = sqlx::query_as::<_, MaintenanceTicket>(&format!(
            "SELECT {COLUMNS} FROM maintenance_tickets ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(tickets)
    }

    /// Apply an update only while the ticket is in one of `expected`
    pub async fn update_if(&self, id: Uuid, request: TicketUpdate, expected: &[TicketStatus]) -> Result<Option<MaintenanceTicket>, HostelError> {
        let expected: Vec<String> = expected.iter().map(|s| s.as_str().to_string()).collect();

        let ticket = sqlx::query_as::<_, MaintenanceTicket>(&format!(
            r#"
            UPDATE maintenance_tickets
            SET status = COALESCE($2, status),
                assigned_to = COALESCE($3, assigned_to),
                resolution = COALESCE($4, resolution),
                updated_at = $5
            WHERE id = $1 AND status = ANY($6)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(request.status.map(|s| s.as_str()))
        .bind(request.assigned_to)
        .bind(request.resolution)
        .bind(Utc::now())
        .bind(expected)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ticket)
    }
}
