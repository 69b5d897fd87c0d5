//! Record store contract and change feed
//!
//! `RecordStore` is the seam between the workflows and the persistence engine.
//! Every write returns the persisted row, server-assigned id and timestamps
//! included. Row mutations are announced on a [`ChangeFeed`].

use std::fmt;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::*;
use crate::utils::errors::Result;

/// Tables that publish change notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Table {
    #[serde(rename = "attendance_records")]
    Attendance,
    #[serde(rename = "maintenance_tickets")]
    Tickets,
    #[serde(rename = "gate_passes")]
    GatePasses,
    #[serde(rename = "movement_logs")]
    MovementLogs,
    #[serde(rename = "hostelmates")]
    Hostelmates,
}

impl Table {
    pub const ALL: [Table; 5] = [
        Table::Attendance,
        Table::Tickets,
        Table::GatePasses,
        Table::MovementLogs,
        Table::Hostelmates,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Attendance => "attendance_records",
            Table::Tickets => "maintenance_tickets",
            Table::GatePasses => "gate_passes",
            Table::MovementLogs => "movement_logs",
            Table::Hostelmates => "hostelmates",
        }
    }

    pub fn from_name(name: &str) -> Option<Table> {
        Table::ALL.into_iter().find(|table| table.as_str() == name)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to the row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
    /// Notifications may have been missed; consumers must re-read
    Resync,
}

/// A row-level change notification.
///
/// `record` carries the row as JSON when the producer has it; consumers in
/// refetch mode ignore it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: Table,
    pub kind: ChangeKind,
    pub id: Option<Uuid>,
    pub record: Option<serde_json::Value>,
}

impl ChangeEvent {
    /// Payload-free trigger
    pub fn touched(table: Table, kind: ChangeKind) -> Self {
        Self { table, kind, id: None, record: None }
    }

    pub fn resync(table: Table) -> Self {
        Self::touched(table, ChangeKind::Resync)
    }

    pub fn with_record<T: Serialize>(table: Table, kind: ChangeKind, id: Uuid, record: &T) -> Self {
        Self {
            table,
            kind,
            id: Some(id),
            record: serde_json::to_value(record).ok(),
        }
    }
}

/// In-process fan-out of change notifications
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new(buffer: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer.max(1));
        Self { sender }
    }

    /// Announce a change; returns the number of live subscribers
    pub fn publish(&self, event: ChangeEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Reads and writes against the hostel tables.
///
/// Bulk reads are ordered newest first (`timestamp` for attendance and
/// movement, `created_at` for tickets and gate passes); the roster is ordered
/// by name. Conditional updates return `Ok(None)` when the row is missing or
/// its current status is not one of `expected`.
#[async_trait]
pub trait RecordStore: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    /// Check the backend can serve requests
    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn list_attendance(&self) -> Result<Vec<AttendanceRecord>>;
    async fn insert_attendance(&self, record: NewAttendanceRecord) -> Result<AttendanceRecord>;

    async fn list_tickets(&self) -> Result<Vec<MaintenanceTicket>>;
    async fn find_ticket(&self, id: Uuid) -> Result<Option<MaintenanceTicket>>;
    async fn insert_ticket(&self, ticket: NewTicket) -> Result<MaintenanceTicket>;
    async fn update_ticket(
        &self,
        id: Uuid,
        update: TicketUpdate,
        expected: &[TicketStatus],
    ) -> Result<Option<MaintenanceTicket>>;

    async fn list_gate_passes(&self) -> Result<Vec<GatePass>>;
    async fn find_gate_pass(&self, id: Uuid) -> Result<Option<GatePass>>;
    async fn insert_gate_pass(&self, pass: NewGatePass) -> Result<GatePass>;
    async fn update_gate_pass(
        &self,
        id: Uuid,
        update: GatePassUpdate,
        expected: &[GatePassStatus],
    ) -> Result<Option<GatePass>>;

    async fn list_movement_logs(&self) -> Result<Vec<MovementLog>>;
    async fn insert_movement_log(&self, log: NewMovementLog) -> Result<MovementLog>;

    async fn list_hostelmates(&self) -> Result<Vec<Hostelmate>>;

    async fn find_profile(&self, user_id: Uuid) -> Result<Option<Profile>>;
    async fn find_role(&self, user_id: Uuid) -> Result<Option<Role>>;
}
