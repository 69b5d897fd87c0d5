//! Gate pass model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

text_enum! {
    GatePassStatus {
        Pending => "pending",
        Approved => "approved",
        Denied => "denied",
    }
}

impl GatePassStatus {
    pub fn can_transition_to(self, next: GatePassStatus) -> bool {
        matches!(
            (self, next),
            (GatePassStatus::Pending, GatePassStatus::Approved)
                | (GatePassStatus::Pending, GatePassStatus::Denied)
        )
    }

    pub fn is_terminal(self) -> bool {
        self != GatePassStatus::Pending
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct GatePass {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub room_number: String,
    pub reason: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub expected_return: NaiveDate,
    #[sqlx(try_from = "String")]
    pub status: GatePassStatus,
    pub qr_code: Option<String>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub exit_time: Option<DateTime<Utc>>,
    pub entry_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl GatePass {
    pub fn is_approved(&self) -> bool {
        self.status == GatePassStatus::Approved
    }

    /// Holder has left and not yet come back
    pub fn is_out(&self) -> bool {
        match (self.exit_time, self.entry_time) {
            (Some(exit), Some(entry)) => exit > entry,
            (Some(_), None) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGatePass {
    pub user_id: Uuid,
    pub user_name: String,
    pub room_number: String,
    pub reason: String,
    pub destination: String,
    pub departure_date: NaiveDate,
    pub expected_return: NaiveDate,
}

/// Partial update; `None` leaves a column untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatePassUpdate {
    pub status: Option<GatePassStatus>,
    pub qr_code: Option<String>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub exit_time: Option<DateTime<Utc>>,
    pub entry_time: Option<DateTime<Utc>>,
}
