//! Maintenance ticket model

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

text_enum! {
    TicketCategory {
        Plumbing => "plumbing",
        Electrical => "electrical",
        Wifi => "wifi",
        Furniture => "furniture",
        Other => "other",
    }
}

text_enum! {
    TicketStatus {
        Pending => "pending",
        InProgress => "in-progress",
        Resolved => "resolved",
    }
}

text_enum! {
    TicketPriority {
        Low => "low",
        Medium => "medium",
        High => "high",
    }
}

impl TicketStatus {
    /// Assignment is optional: a pending ticket may be resolved directly.
    /// `Resolved` accepts nothing.
    pub fn can_transition_to(self, next: TicketStatus) -> bool {
        matches!(
            (self, next),
            (TicketStatus::Pending, TicketStatus::InProgress)
                | (TicketStatus::InProgress, TicketStatus::InProgress)
                | (TicketStatus::Pending, TicketStatus::Resolved)
                | (TicketStatus::InProgress, TicketStatus::Resolved)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == TicketStatus::Resolved
    }

    /// Statuses from which `next` is reachable
    pub fn sources_of(next: TicketStatus) -> Vec<TicketStatus> {
        TicketStatus::ALL
            .iter()
            .copied()
            .filter(|from| from.can_transition_to(next))
            .collect()
    }
}

impl Default for TicketPriority {
    fn default() -> Self {
        TicketPriority::Medium
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct MaintenanceTicket {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub room_number: String,
    #[sqlx(try_from = "String")]
    pub category: TicketCategory,
    pub description: String,
    #[sqlx(try_from = "String")]
    pub status: TicketStatus,
    #[sqlx(try_from = "String")]
    pub priority: TicketPriority,
    pub assigned_to: Option<String>,
    pub resolution: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MaintenanceTicket {
    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTicket {
    pub user_id: Uuid,
    pub user_name: String,
    pub room_number: String,
    pub category: TicketCategory,
    pub description: String,
    pub priority: TicketPriority,
}

/// Partial update; `None` leaves a column untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TicketUpdate {
    pub status: Option<TicketStatus>,
    pub assigned_to: Option<String>,
    pub resolution: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_is_terminal() {
        for next in TicketStatus::ALL {
            assert!(!TicketStatus::Resolved.can_transition_to(*next));
        }
    }

    #[test]
    fn test_assignment_is_optional() {
        assert!(TicketStatus::Pending.can_transition_to(TicketStatus::Resolved));
        assert_eq!(
            TicketStatus::sources_of(TicketStatus::Resolved),
            vec![TicketStatus::Pending, TicketStatus::InProgress]
        );
    }

    #[test]
    fn test_status_text_roundtrip() {
        assert_eq!(TicketStatus::InProgress.as_str(), "in-progress");
        assert_eq!("in-progress".parse::<TicketStatus>().unwrap(), TicketStatus::InProgress);
        assert!("done".parse::<TicketStatus>().is_err());
        assert_eq!(
            serde_json::to_string(&TicketCategory::Wifi).unwrap(),
            "\"wifi\""
        );
    }
}
