//! Movement log model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

text_enum! {
    MovementKind {
        Exit => "exit",
        Entry => "entry",
    }
}

/// Append-only gate scan record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct MovementLog {
    pub id: Uuid,
    pub gate_pass_id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type", try_from = "String")]
    pub kind: MovementKind,
    pub scanned_by: Uuid,
    pub timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMovementLog {
    pub gate_pass_id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub kind: MovementKind,
    pub scanned_by: Uuid,
}
