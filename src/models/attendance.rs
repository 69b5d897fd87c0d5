//! Attendance model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

text_enum! {
    /// Direction of an attendance mark
    AttendanceKind {
        CheckIn => "check-in",
        CheckOut => "check-out",
    }
}

/// A student's attendance mark. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AttendanceRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub room_number: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    #[sqlx(rename = "type", try_from = "String")]
    pub kind: AttendanceKind,
    pub latitude: f64,
    pub longitude: f64,
    pub verified: bool,
    pub selfie_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AttendanceRecord {
    /// UTC calendar day the mark belongs to
    pub fn day(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    pub fn is_check_in(&self) -> bool {
        self.kind == AttendanceKind::CheckIn
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAttendanceRecord {
    pub user_id: Uuid,
    pub user_name: String,
    pub room_number: String,
    pub kind: AttendanceKind,
    pub latitude: f64,
    pub longitude: f64,
    pub verified: bool,
    pub selfie_url: Option<String>,
}
