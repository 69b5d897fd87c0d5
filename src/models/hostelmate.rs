//! Hostel roster model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Hostelmate {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub room_number: String,
    pub hostel_block: String,
    pub course: Option<String>,
    pub year: Option<String>,
    pub created_at: DateTime<Utc>,
}
