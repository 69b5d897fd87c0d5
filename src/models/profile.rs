//! Profile and role model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

text_enum! {
    /// Role attached to an authenticated principal
    Role {
        Student => "student",
        Warden => "warden",
        Security => "security",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub room_number: Option<String>,
    pub hostel_block: Option<String>,
    pub student_id: Option<String>,
    pub profile_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
