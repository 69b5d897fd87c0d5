//! Gate pass repository implementation

use sqlx::PgPool;
use chrono::Utc;
use uuid::Uuid;
use crate::models::gate_pass::{GatePass, NewGatePass, GatePassUpdate, GatePassStatus};
use crate::utils::errors::HostelError;

const COLUMNS: &str = "id, user_id, user_name, room_number, reason, destination, departure_date, expected_return, status, qr_code, approved_by, approved_at, exit_time, entry_time, created_at";

#[derive(Clone, Debug)]
pub struct GatePassRepository {
    pool: PgPool,
}

impl GatePassRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Request a pass; it starts `pending` with no access code
    pub async fn create(&self, request: NewGatePass) -> Result<GatePass, HostelError> {
        let pass = sqlx::query_as::<_, GatePass>(&format!(
            r#"
            INSERT INTO gate_passes (user_id, user_name, room_number, reason, destination, departure_date, expected_return, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(request.user_id)
        .bind(request.user_name)
        .bind(request.room_number)
        .bind(request.reason)
        .bind(request.destination)
        .bind(request.departure_date)
        .bind(request.expected_return)
        .bind(GatePassStatus::Pending.as_str())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(pass)
    }

    /// Find gate pass by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<GatePass>, HostelError> {
        let pass = sqlx::query_as::<_, GatePass>(&format!(
            "SELECT {COLUMNS} FROM gate_passes WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(pass)
    }

    /// All passes, newest first
    pub async fn list(&self) -> Result<Vec<GatePass>, HostelError> {
        let passes = sqlx::query_as::<_, GatePass>(&format!(
            "SELECT {COLUMNS} FROM gate_passes ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(passes)
    }

    /// Compare-and-set update guarded by the current status
    pub async fn update_if(&self, id: Uuid, request: GatePassUpdate, expected: &[GatePassStatus]) -> Result<Option<GatePass>, HostelError> {
        let expected: Vec<String> = expected.iter().map(|s| s.as_str().to_string()).collect();

        let pass = sqlx::query_as::<_, GatePass>(&format!(
            r#"
            UPDATE gate_passes
            SET status = COALESCE($2, status),
                qr_code = COALESCE($3, qr_code),
                approved_by = COALESCE($4, approved_by),
                approved_at = COALESCE($5, approved_at),
                exit_time = COALESCE($6, exit_time),
                entry_time = COALESCE($7, entry_time)
            WHERE id = $1 AND status = ANY($8)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(id)
        .bind(request.status.map(|s| s.as_str()))
        .bind(request.qr_code)
        .bind(request.approved_by)
        .bind(request.approved_at)
        .bind(request.exit_time)
        .bind(request.entry_time)
        .bind(expected)
        .fetch_optional(&self.pool)
        .await?;

        Ok(pass)
    }
}
