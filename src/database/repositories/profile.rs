//! Profile and role repository implementation

use sqlx::PgPool;
use uuid::Uuid;
use crate::models::profile::{Profile, Role};
use crate::utils::errors::HostelError;

#[derive(Clone, Debug)]
pub struct ProfileRepository {
    pool: PgPool,
}

impl ProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find the profile owned by an auth user
    pub async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<Profile>, HostelError> {
        let profile = sqlx::query_as::<_, Profile>(
            "SELECT id, user_id, name, email, room_number, hostel_block, student_id, profile_image, created_at, updated_at FROM profiles WHERE user_id = $1"
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    /// Role granted to an auth user
    pub async fn find_role(&self, user_id: Uuid) -> Result<Option<Role>, HostelError> {
        let role: Option<(String,)> = sqlx::query_as(
            "SELECT role::text FROM user_roles WHERE user_id = $1 ORDER BY created_at LIMIT 1"
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        role.map(|(raw,)| raw.parse()).transpose()
    }
}
