//! Hostel roster repository implementation

use sqlx::PgPool;
use crate::models::hostelmate::Hostelmate;
use crate::utils::errors::HostelError;

#[derive(Clone, Debug)]
pub struct HostelmateRepository {
    pool: PgPool,
}

impl HostelmateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Whole roster ordered by name
    pub async fn list(&self) -> Result<Vec<Hostelmate>, HostelError> {
        let hostelmates = sqlx::query_as::<_, Hostelmate>(
            "SELECT id, user_id, name, room_number, hostel_block, course, year, created_at FROM hostelmates ORDER BY name"
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(hostelmates)
    }
}
