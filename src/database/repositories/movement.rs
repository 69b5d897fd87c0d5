//! Movement log repository implementation

use sqlx::PgPool;
use chrono::Utc;
use crate::models::movement::{MovementLog, NewMovementLog};
use crate::utils::errors::HostelError;

const COLUMNS: &str = "id, gate_pass_id, user_id, user_name, type, scanned_by, timestamp, created_at";

#[derive(Clone, Debug)]
pub struct MovementRepository {
    pool: PgPool,
}

impl MovementRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append a scan event
    pub async fn create(&self, request: NewMovementLog) -> Result<MovementLog, HostelError> {
        let now = Utc::now();
        let log = sqlx::query_as::<_, MovementLog>(&format!(
            r#"
            INSERT INTO movement_logs (gate_pass_id, user_id, user_name, type, scanned_by, timestamp, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(request.gate_pass_id)
        .bind(request.user_id)
        .bind(request.user_name)
        .bind(request.kind.as_str())
        .bind(request.scanned_by)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(log)
    }

    /// All scans, newest first
    pub async fn list(&self) -> Result<Vec<MovementLog>, HostelError> {
        let logs = sqlx::query_as::<_, MovementLog>(&format!(
            "SELECT {COLUMNS} FROM movement_logs ORDER BY timestamp DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }
}
