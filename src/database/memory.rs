//! In-memory record store
//!
//! Implements the same contract as the PostgreSQL store and announces every
//! write on its [`ChangeFeed`]. Backs the `memory://` demo mode and the tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use async_trait::async_trait;
use chrono::{Duration, NaiveTime, Utc};
use uuid::Uuid;

use crate::database::store::{ChangeEvent, ChangeFeed, ChangeKind, RecordStore, Table};
use crate::models::*;
use crate::utils::errors::{HostelError, Result};

#[derive(Debug, Default)]
struct Tables {
    attendance: Vec<AttendanceRecord>,
    tickets: Vec<MaintenanceTicket>,
    gate_passes: Vec<GatePass>,
    movements: Vec<MovementLog>,
    hostelmates: Vec<Hostelmate>,
    profiles: Vec<Profile>,
    roles: HashMap<Uuid, Role>,
}

#[derive(Debug)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    feed: ChangeFeed,
    fetches: Mutex<HashMap<Table, u64>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl InMemoryStore {
    pub fn new(feed: ChangeFeed) -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            feed,
            fetches: Mutex::new(HashMap::new()),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn feed(&self) -> &ChangeFeed {
        &self.feed
    }

    /// Number of bulk reads served for a table
    pub fn fetch_count(&self, table: Table) -> u64 {
        self.fetches
            .lock()
            .map(|fetches| fetches.get(&table).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Make every bulk read fail until switched back
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every write fail until switched back
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Register a principal. Profiles are not synchronized, so nothing is published.
    pub fn add_profile(&self, profile: Profile, role: Role) -> Result<()> {
        let mut tables = self.lock()?;
        tables.roles.insert(profile.user_id, role);
        tables.profiles.retain(|p| p.user_id != profile.user_id);
        tables.profiles.push(profile);
        Ok(())
    }

    pub fn add_hostelmate(&self, hostelmate: Hostelmate) -> Result<()> {
        let id = hostelmate.id;
        let event = ChangeEvent::with_record(Table::Hostelmates, ChangeKind::Insert, id, &hostelmate);
        self.lock()?.hostelmates.push(hostelmate);
        self.feed.publish(event);
        Ok(())
    }

    /// Remove a gate pass row, announcing a delete
    pub fn delete_gate_pass(&self, id: Uuid) -> Result<bool> {
        let removed = {
            let mut tables = self.lock()?;
            let before = tables.gate_passes.len();
            tables.gate_passes.retain(|p| p.id != id);
            before != tables.gate_passes.len()
        };
        if removed {
            self.feed.publish(ChangeEvent {
                table: Table::GatePasses,
                kind: ChangeKind::Delete,
                id: Some(id),
                record: None,
            });
        }
        Ok(removed)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| HostelError::ServiceUnavailable("in-memory store poisoned".to_string()))
    }

    fn read<T, F>(&self, table: Table, select: F) -> Result<Vec<T>>
    where
        F: FnOnce(&Tables) -> Vec<T>,
    {
        if let Ok(mut fetches) = self.fetches.lock() {
            *fetches.entry(table).or_insert(0) += 1;
        }
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(HostelError::ServiceUnavailable(format!("read of {} failed", table)));
        }
        let tables = self.lock()?;
        Ok(select(&tables))
    }

    fn check_writable(&self, table: Table) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(HostelError::ServiceUnavailable(format!("write to {} failed", table)));
        }
        Ok(())
    }

    /// Seed the demo hostel: three students, a warden, a security guard, the
    /// roster, two tickets and a pending gate pass.
    pub fn with_demo_data(feed: ChangeFeed) -> Result<Self> {
        let store = Self::new(feed);
        let now = Utc::now();
        let today = now.date_naive();

        for (user_id, name, email, role, room, block, student_id) in demo_principals() {
            store.add_profile(
                Profile {
                    id: Uuid::new_v4(),
                    user_id,
                    name: name.to_string(),
                    email: email.to_string(),
                    room_number: room.map(str::to_string),
                    hostel_block: block.map(str::to_string),
                    student_id: student_id.map(str::to_string),
                    profile_image: None,
                    created_at: now,
                    updated_at: now,
                },
                role,
            )?;
        }

        let roster = [
            ("Aarav Sharma", "A-101", "Block A", "Computer Science", "3rd Year", Some(DEMO_STUDENT_ID)),
            ("Priya Patel", "A-102", "Block A", "Electronics", "2nd Year", Some(DEMO_STUDENT_2_ID)),
            ("Rahul Kumar", "B-201", "Block B", "Mechanical", "4th Year", Some(DEMO_STUDENT_3_ID)),
            ("Sneha Reddy", "A-103", "Block A", "Civil Engineering", "2nd Year", None),
            ("Vikram Joshi", "B-202", "Block B", "Computer Science", "3rd Year", None),
            ("Ananya Das", "A-104", "Block A", "Biotechnology", "1st Year", None),
            ("Karthik Iyer", "B-203", "Block B", "Electrical", "4th Year", None),
            ("Divya Menon", "A-105", "Block A", "Chemistry", "3rd Year", None),
        ];

        let mut tables = store.lock()?;
        for (name, room, block, course, year, user_id) in roster {
            tables.hostelmates.push(Hostelmate {
                id: Uuid::new_v4(),
                user_id: user_id.map(Uuid::from_u128),
                name: name.to_string(),
                room_number: room.to_string(),
                hostel_block: block.to_string(),
                course: Some(course.to_string()),
                year: Some(year.to_string()),
                created_at: now,
            });
        }

        let morning = |h, m| {
            NaiveTime::from_hms_opt(h, m, 0)
                .map(|t| today.and_time(t).and_utc())
                .unwrap_or(now)
        };
        tables.attendance.push(AttendanceRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::from_u128(DEMO_STUDENT_2_ID),
            user_name: "Priya Patel".to_string(),
            room_number: "A-102".to_string(),
            timestamp: morning(9, 15),
            kind: AttendanceKind::CheckIn,
            latitude: DEMO_HOSTEL.0,
            longitude: DEMO_HOSTEL.1,
            verified: true,
            selfie_url: None,
            created_at: morning(9, 15),
        });

        tables.tickets.push(MaintenanceTicket {
            id: Uuid::new_v4(),
            user_id: Uuid::from_u128(DEMO_STUDENT_ID),
            user_name: "Aarav Sharma".to_string(),
            room_number: "A-101".to_string(),
            category: TicketCategory::Wifi,
            description: "WiFi connectivity is very slow in my room".to_string(),
            status: TicketStatus::Pending,
            priority: TicketPriority::Medium,
            assigned_to: None,
            resolution: None,
            created_at: now - Duration::days(1),
            updated_at: now,
        });
        tables.tickets.push(MaintenanceTicket {
            id: Uuid::new_v4(),
            user_id: Uuid::from_u128(DEMO_STUDENT_3_ID),
            user_name: "Rahul Kumar".to_string(),
            room_number: "B-201".to_string(),
            category: TicketCategory::Plumbing,
            description: "Bathroom tap is leaking".to_string(),
            status: TicketStatus::InProgress,
            priority: TicketPriority::High,
            assigned_to: Some("Suresh (Plumber)".to_string()),
            resolution: None,
            created_at: now - Duration::days(2),
            updated_at: now,
        });

        tables.gate_passes.push(GatePass {
            id: Uuid::new_v4(),
            user_id: Uuid::from_u128(DEMO_STUDENT_2_ID),
            user_name: "Priya Patel".to_string(),
            room_number: "A-102".to_string(),
            reason: "Family Visit".to_string(),
            destination: "Home - Mumbai".to_string(),
            departure_date: today,
            expected_return: today + Duration::days(2),
            status: GatePassStatus::Pending,
            qr_code: None,
            approved_by: None,
            approved_at: None,
            exit_time: None,
            entry_time: None,
            created_at: now,
        });
        drop(tables);

        Ok(store)
    }
}

/// Demo hostel location (latitude, longitude)
const DEMO_HOSTEL: (f64, f64) = (21.234776, 81.346385);

pub const DEMO_STUDENT_ID: u128 = 0x0000_0000_0000_0000_0000_0000_0000_0001;
pub const DEMO_STUDENT_2_ID: u128 = 0x0000_0000_0000_0000_0000_0000_0000_0002;
pub const DEMO_STUDENT_3_ID: u128 = 0x0000_0000_0000_0000_0000_0000_0000_0003;
pub const DEMO_WARDEN_ID: u128 = 0x0000_0000_0000_0000_0000_0000_0000_0010;
pub const DEMO_SECURITY_ID: u128 = 0x0000_0000_0000_0000_0000_0000_0000_0020;

type DemoPrincipal = (Uuid, &'static str, &'static str, Role, Option<&'static str>, Option<&'static str>, Option<&'static str>);

fn demo_principals() -> Vec<DemoPrincipal> {
    vec![
        (Uuid::from_u128(DEMO_STUDENT_ID), "Aarav Sharma", "aarav@college.edu", Role::Student, Some("A-101"), Some("Block A"), Some("STU001")),
        (Uuid::from_u128(DEMO_STUDENT_2_ID), "Priya Patel", "priya@college.edu", Role::Student, Some("A-102"), Some("Block A"), Some("STU002")),
        (Uuid::from_u128(DEMO_STUDENT_3_ID), "Rahul Kumar", "rahul@college.edu", Role::Student, Some("B-201"), Some("Block B"), Some("STU003")),
        (Uuid::from_u128(DEMO_WARDEN_ID), "Dr. Meera Nair", "meera@college.edu", Role::Warden, None, None, None),
        (Uuid::from_u128(DEMO_SECURITY_ID), "Ravi Singh", "ravi@college.edu", Role::Security, None, None, None),
    ]
}

#[async_trait]
impl RecordStore for InMemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn list_attendance(&self) -> Result<Vec<AttendanceRecord>> {
        self.read(Table::Attendance, |t| {
            let mut rows = t.attendance.clone();
            rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            rows
        })
    }

    async fn insert_attendance(&self, record: NewAttendanceRecord) -> Result<AttendanceRecord> {
        self.check_writable(Table::Attendance)?;
        let now = Utc::now();
        let row = AttendanceRecord {
            id: Uuid::new_v4(),
            user_id: record.user_id,
            user_name: record.user_name,
            room_number: record.room_number,
            timestamp: now,
            kind: record.kind,
            latitude: record.latitude,
            longitude: record.longitude,
            verified: record.verified,
            selfie_url: record.selfie_url,
            created_at: now,
        };
        self.lock()?.attendance.push(row.clone());
        self.feed.publish(ChangeEvent::with_record(Table::Attendance, ChangeKind::Insert, row.id, &row));
        Ok(row)
    }

    async fn list_tickets(&self) -> Result<Vec<MaintenanceTicket>> {
        self.read(Table::Tickets, |t| {
            let mut rows = t.tickets.clone();
            rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            rows
        })
    }

    async fn find_ticket(&self, id: Uuid) -> Result<Option<MaintenanceTicket>> {
        Ok(self.lock()?.tickets.iter().find(|t| t.id == id).cloned())
    }

    async fn insert_ticket(&self, ticket: NewTicket) -> Result<MaintenanceTicket> {
        self.check_writable(Table::Tickets)?;
        let now = Utc::now();
        let row = MaintenanceTicket {
            id: Uuid::new_v4(),
            user_id: ticket.user_id,
            user_name: ticket.user_name,
            room_number: ticket.room_number,
            category: ticket.category,
            description: ticket.description,
            status: TicketStatus::Pending,
            priority: ticket.priority,
            assigned_to: None,
            resolution: None,
            created_at: now,
            updated_at: now,
        };
        self.lock()?.tickets.push(row.clone());
        self.feed.publish(ChangeEvent::with_record(Table::Tickets, ChangeKind::Insert, row.id, &row));
        Ok(row)
    }

    async fn update_ticket(
        &self,
        id: Uuid,
        update: TicketUpdate,
        expected: &[TicketStatus],
    ) -> Result<Option<MaintenanceTicket>> {
        self.check_writable(Table::Tickets)?;
        let updated = {
            let mut tables = self.lock()?;
            match tables.tickets.iter_mut().find(|t| t.id == id) {
                Some(ticket) if expected.contains(&ticket.status) => {
                    if let Some(status) = update.status {
                        ticket.status = status;
                    }
                    if let Some(assignee) = update.assigned_to {
                        ticket.assigned_to = Some(assignee);
                    }
                    if let Some(resolution) = update.resolution {
                        ticket.resolution = Some(resolution);
                    }
                    ticket.updated_at = Utc::now();
                    Some(ticket.clone())
                }
                _ => None,
            }
        };
        if let Some(row) = &updated {
            self.feed.publish(ChangeEvent::with_record(Table::Tickets, ChangeKind::Update, row.id, row));
        }
        Ok(updated)
    }

    async fn list_gate_passes(&self) -> Result<Vec<GatePass>> {
        self.read(Table::GatePasses, |t| {
            let mut rows = t.gate_passes.clone();
            rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            rows
        })
    }

    async fn find_gate_pass(&self, id: Uuid) -> Result<Option<GatePass>> {
        Ok(self.lock()?.gate_passes.iter().find(|p| p.id == id).cloned())
    }

    async fn insert_gate_pass(&self, pass: NewGatePass) -> Result<GatePass> {
        self.check_writable(Table::GatePasses)?;
        let row = GatePass {
            id: Uuid::new_v4(),
            user_id: pass.user_id,
            user_name: pass.user_name,
            room_number: pass.room_number,
            reason: pass.reason,
            destination: pass.destination,
            departure_date: pass.departure_date,
            expected_return: pass.expected_return,
            status: GatePassStatus::Pending,
            qr_code: None,
            approved_by: None,
            approved_at: None,
            exit_time: None,
            entry_time: None,
            created_at: Utc::now(),
        };
        self.lock()?.gate_passes.push(row.clone());
        self.feed.publish(ChangeEvent::with_record(Table::GatePasses, ChangeKind::Insert, row.id, &row));
        Ok(row)
    }

    async fn update_gate_pass(
        &self,
        id: Uuid,
        update: GatePassUpdate,
        expected: &[GatePassStatus],
    ) -> Result<Option<GatePass>> {
        self.check_writable(Table::GatePasses)?;
        let updated = {
            let mut tables = self.lock()?;
            match tables.gate_passes.iter_mut().find(|p| p.id == id) {
                Some(pass) if expected.contains(&pass.status) => {
                    if let Some(status) = update.status {
                        pass.status = status;
                    }
                    if update.qr_code.is_some() {
                        pass.qr_code = update.qr_code;
                    }
                    if update.approved_by.is_some() {
                        pass.approved_by = update.approved_by;
                    }
                    if update.approved_at.is_some() {
                        pass.approved_at = update.approved_at;
                    }
                    if update.exit_time.is_some() {
                        pass.exit_time = update.exit_time;
                    }
                    if update.entry_time.is_some() {
                        pass.entry_time = update.entry_time;
                    }
                    Some(pass.clone())
                }
                _ => None,
            }
        };
        if let Some(row) = &updated {
            self.feed.publish(ChangeEvent::with_record(Table::GatePasses, ChangeKind::Update, row.id, row));
        }
        Ok(updated)
    }

    async fn list_movement_logs(&self) -> Result<Vec<MovementLog>> {
        self.read(Table::MovementLogs, |t| {
            let mut rows = t.movements.clone();
            rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            rows
        })
    }

    async fn insert_movement_log(&self, log: NewMovementLog) -> Result<MovementLog> {
        self.check_writable(Table::MovementLogs)?;
        let now = Utc::now();
        let row = MovementLog {
            id: Uuid::new_v4(),
            gate_pass_id: log.gate_pass_id,
            user_id: log.user_id,
            user_name: log.user_name,
            kind: log.kind,
            scanned_by: log.scanned_by,
            timestamp: now,
            created_at: now,
        };
        self.lock()?.movements.push(row.clone());
        self.feed.publish(ChangeEvent::with_record(Table::MovementLogs, ChangeKind::Insert, row.id, &row));
        Ok(row)
    }

    async fn list_hostelmates(&self) -> Result<Vec<Hostelmate>> {
        self.read(Table::Hostelmates, |t| {
            let mut rows = t.hostelmates.clone();
            rows.sort_by(|a, b| a.name.cmp(&b.name));
            rows
        })
    }

    async fn find_profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
        Ok(self.lock()?.profiles.iter().find(|p| p.user_id == user_id).cloned())
    }

    async fn find_role(&self, user_id: Uuid) -> Result<Option<Role>> {
        Ok(self.lock()?.roles.get(&user_id).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tokio_test::{assert_err, assert_ok};

    fn new_pass(user_id: Uuid) -> NewGatePass {
        NewGatePass {
            user_id,
            user_name: "Test Student".to_string(),
            room_number: "C-301".to_string(),
            reason: "Conference".to_string(),
            destination: "Pune".to_string(),
            departure_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            expected_return: NaiveDate::from_ymd_opt(2025, 1, 12).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_publishes() {
        let store = InMemoryStore::new(ChangeFeed::new(8));
        let mut rx = store.feed().subscribe();

        let pass = store.insert_gate_pass(new_pass(Uuid::new_v4())).await.unwrap();
        assert_eq!(pass.status, GatePassStatus::Pending);
        assert!(pass.qr_code.is_none());

        let event = rx.recv().await.unwrap();
        assert_eq!(event.table, Table::GatePasses);
        assert_eq!(event.kind, ChangeKind::Insert);
        assert_eq!(event.id, Some(pass.id));
    }

    #[tokio::test]
    async fn test_conditional_update_respects_expected_status() {
        let store = InMemoryStore::new(ChangeFeed::new(8));
        let pass = store.insert_gate_pass(new_pass(Uuid::new_v4())).await.unwrap();

        let deny = GatePassUpdate { status: Some(GatePassStatus::Denied), ..Default::default() };
        let first = store.update_gate_pass(pass.id, deny.clone(), &[GatePassStatus::Pending]).await.unwrap();
        assert_eq!(first.unwrap().status, GatePassStatus::Denied);

        let second = store.update_gate_pass(pass.id, deny, &[GatePassStatus::Pending]).await.unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn test_failed_write_leaves_tables_untouched() {
        let store = InMemoryStore::new(ChangeFeed::new(8));
        store.set_fail_writes(true);
        assert_err!(store.insert_gate_pass(new_pass(Uuid::new_v4())).await);

        store.set_fail_writes(false);
        let passes = assert_ok!(store.list_gate_passes().await);
        assert!(passes.is_empty());
        assert_eq!(store.fetch_count(Table::GatePasses), 1);
    }

    #[tokio::test]
    async fn test_demo_data_is_seeded() {
        let store = InMemoryStore::with_demo_data(ChangeFeed::new(8)).unwrap();
        assert_eq!(store.list_hostelmates().await.unwrap().len(), 8);
        assert_eq!(
            store.find_role(Uuid::from_u128(DEMO_WARDEN_ID)).await.unwrap(),
            Some(Role::Warden)
        );
        let roster = store.list_hostelmates().await.unwrap();
        assert_eq!(roster.first().map(|h| h.name.as_str()), Some("Aarav Sharma"));
    }
}
