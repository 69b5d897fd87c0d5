//! Database service layer
//!
//! This module provides the PostgreSQL-backed [`RecordStore`].

use std::time::Instant;
use async_trait::async_trait;
use uuid::Uuid;

use crate::database::{
    DatabasePool, AttendanceRepository, TicketRepository, GatePassRepository,
    MovementRepository, HostelmateRepository, ProfileRepository,
};
use crate::database::store::RecordStore;
use crate::models::*;
use crate::utils::errors::Result;
use crate::utils::logging::log_database_operation;

#[derive(Debug, Clone)]
pub struct DatabaseService {
    pool: DatabasePool,
    pub attendance: AttendanceRepository,
    pub tickets: TicketRepository,
    pub gate_passes: GatePassRepository,
    pub movements: MovementRepository,
    pub hostelmates: HostelmateRepository,
    pub profiles: ProfileRepository,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            attendance: AttendanceRepository::new(pool.clone()),
            tickets: TicketRepository::new(pool.clone()),
            gate_passes: GatePassRepository::new(pool.clone()),
            movements: MovementRepository::new(pool.clone()),
            hostelmates: HostelmateRepository::new(pool.clone()),
            profiles: ProfileRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    /// Check the pool can still serve queries
    pub async fn health_check(&self) -> Result<()> {
        crate::database::health_check(&self.pool).await
    }
}

/// Time a bulk read and report it through the database operation log
async fn timed<T, F>(table: &str, read: F) -> Result<Vec<T>>
where
    F: std::future::Future<Output = Result<Vec<T>>>,
{
    let started = Instant::now();
    let result = read.await;
    log_database_operation("select", table, started.elapsed().as_millis() as u64, result.is_ok());
    result
}

#[async_trait]
impl RecordStore for DatabaseService {
    fn backend_tag(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<()> {
        self.health_check().await
    }

    async fn list_attendance(&self) -> Result<Vec<AttendanceRecord>> {
        timed("attendance_records", self.attendance.list()).await
    }

    async fn insert_attendance(&self, record: NewAttendanceRecord) -> Result<AttendanceRecord> {
        self.attendance.create(record).await
    }

    async fn list_tickets(&self) -> Result<Vec<MaintenanceTicket>> {
        timed("maintenance_tickets", self.tickets.list()).await
    }

    async fn find_ticket(&self, id: Uuid) -> Result<Option<MaintenanceTicket>> {
        self.tickets.find_by_id(id).await
    }

    async fn insert_ticket(&self, ticket: NewTicket) -> Result<MaintenanceTicket> {
        self.tickets.create(ticket).await
    }

    async fn update_ticket(
        &self,
        id: Uuid,
        update: TicketUpdate,
        expected: &[TicketStatus],
    ) -> Result<Option<MaintenanceTicket>> {
        self.tickets.update_if(id, update, expected).await
    }

    async fn list_gate_passes(&self) -> Result<Vec<GatePass>> {
        timed("gate_passes", self.gate_passes.list()).await
    }

    async fn find_gate_pass(&self, id: Uuid) -> Result<Option<GatePass>> {
        self.gate_passes.find_by_id(id).await
    }

    async fn insert_gate_pass(&self, pass: NewGatePass) -> Result<GatePass> {
        self.gate_passes.create(pass).await
    }

    async fn update_gate_pass(
        &self,
        id: Uuid,
        update: GatePassUpdate,
        expected: &[GatePassStatus],
    ) -> Result<Option<GatePass>> {
        self.gate_passes.update_if(id, update, expected).await
    }

    async fn list_movement_logs(&self) -> Result<Vec<MovementLog>> {
        timed("movement_logs", self.movements.list()).await
    }

    async fn insert_movement_log(&self, log: NewMovementLog) -> Result<MovementLog> {
        self.movements.create(log).await
    }

    async fn list_hostelmates(&self) -> Result<Vec<Hostelmate>> {
        timed("hostelmates", self.hostelmates.list()).await
    }

    async fn find_profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
        self.profiles.find_by_user_id(user_id).await
    }

    async fn find_role(&self, user_id: Uuid) -> Result<Option<Role>> {
        self.profiles.find_role(user_id).await
    }
}
