//! Attendance repository implementation

use sqlx::PgPool;
use chrono::Utc;
use crate::models::attendance::{AttendanceRecord, NewAttendanceRecord};
use crate::utils::errors::HostelError;

const COLUMNS: &str = "id, user_id, user_name, room_number, timestamp, type, latitude, longitude, verified, selfie_url, created_at";

#[derive(Clone, Debug)]
pub struct AttendanceRepository {
    pool: PgPool,
}

impl AttendanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record an attendance mark
    pub async fn create(&self, request: NewAttendanceRecord) -> Result<AttendanceRecord, HostelError> {
        let now = Utc::now();
        let record = sqlx::query_as::<_, AttendanceRecord>(&format!(
            r#"
            INSERT INTO attendance_records (user_id, user_name, room_number, timestamp, type, latitude, longitude, verified, selfie_url, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(request.user_id)
        .bind(request.user_name)
        .bind(request.room_number)
        .bind(now)
        .bind(request.kind.as_str())
        .bind(request.latitude)
        .bind(request.longitude)
        .bind(request.verified)
        .bind(request.selfie_url)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    /// All marks, newest first
    pub async fn list(&self) -> Result<Vec<AttendanceRecord>, HostelError> {
        let records = sqlx::query_as::<_, AttendanceRecord>(&format!(
            "SELECT {COLUMNS} FROM attendance_records ORDER BY timestamp DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}
