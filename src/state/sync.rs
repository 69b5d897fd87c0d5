//! Change-driven record synchronizers
//!
//! A [`Synchronizer`] keeps a local copy of one table current. It subscribes
//! to the change feed before its first read, so no change between the read
//! and the subscription is missed, and re-reads (or patches) on every
//! notification for its table. Dropping it stops the background task.

use std::cmp::Ordering;
use std::sync::{Arc, RwLock};
use chrono::NaiveDate;
use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::SyncMode;
use crate::database::{ChangeEvent, ChangeFeed, ChangeKind, RecordStore, Table};
use crate::models::*;
use crate::utils::errors::Result;
use crate::utils::logging::{log_error, log_sync_refresh};

/// A row type that can be kept in sync with its table
pub trait SyncRecord: Clone + Send + Sync + DeserializeOwned + 'static {
    const TABLE: Table;

    fn id(&self) -> Uuid;

    /// The user the row belongs to, if any
    fn owner(&self) -> Option<Uuid>;

    /// Display order of the table
    fn ordering(a: &Self, b: &Self) -> Ordering;

    fn fetch(store: &dyn RecordStore) -> BoxFuture<'_, Result<Vec<Self>>>;
}

impl SyncRecord for AttendanceRecord {
    const TABLE: Table = Table::Attendance;

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Option<Uuid> {
        Some(self.user_id)
    }

    fn ordering(a: &Self, b: &Self) -> Ordering {
        b.timestamp.cmp(&a.timestamp)
    }

    fn fetch(store: &dyn RecordStore) -> BoxFuture<'_, Result<Vec<Self>>> {
        store.list_attendance()
    }
}

impl SyncRecord for MaintenanceTicket {
    const TABLE: Table = Table::Tickets;

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Option<Uuid> {
        Some(self.user_id)
    }

    fn ordering(a: &Self, b: &Self) -> Ordering {
        b.created_at.cmp(&a.created_at)
    }

    fn fetch(store: &dyn RecordStore) -> BoxFuture<'_, Result<Vec<Self>>> {
        store.list_tickets()
    }
}

impl SyncRecord for GatePass {
    const TABLE: Table = Table::GatePasses;

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Option<Uuid> {
        Some(self.user_id)
    }

    fn ordering(a: &Self, b: &Self) -> Ordering {
        b.created_at.cmp(&a.created_at)
    }

    fn fetch(store: &dyn RecordStore) -> BoxFuture<'_, Result<Vec<Self>>> {
        store.list_gate_passes()
    }
}

impl SyncRecord for MovementLog {
    const TABLE: Table = Table::MovementLogs;

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Option<Uuid> {
        Some(self.user_id)
    }

    fn ordering(a: &Self, b: &Self) -> Ordering {
        b.timestamp.cmp(&a.timestamp)
    }

    fn fetch(store: &dyn RecordStore) -> BoxFuture<'_, Result<Vec<Self>>> {
        store.list_movement_logs()
    }
}

impl SyncRecord for Hostelmate {
    const TABLE: Table = Table::Hostelmates;

    fn id(&self) -> Uuid {
        self.id
    }

    fn owner(&self) -> Option<Uuid> {
        self.user_id
    }

    fn ordering(a: &Self, b: &Self) -> Ordering {
        a.name.cmp(&b.name)
    }

    fn fetch(store: &dyn RecordStore) -> BoxFuture<'_, Result<Vec<Self>>> {
        store.list_hostelmates()
    }
}

type Snapshot<T> = Arc<RwLock<Vec<T>>>;

/// Live view of one table
#[derive(Debug)]
pub struct Synchronizer<T: SyncRecord> {
    snapshot: Snapshot<T>,
    version: watch::Receiver<u64>,
    handle: JoinHandle<()>,
}

impl<T: SyncRecord> Synchronizer<T> {
    /// Subscribe, load the table, and start following changes
    pub async fn activate(store: Arc<dyn RecordStore>, feed: &ChangeFeed, mode: SyncMode) -> Self {
        let receiver = feed.subscribe();
        let snapshot: Snapshot<T> = Arc::new(RwLock::new(Vec::new()));
        refetch(store.as_ref(), &snapshot, "initial").await;

        let (version_tx, version) = watch::channel(0u64);
        let handle = tokio::spawn(follow(store, receiver, snapshot.clone(), mode, version_tx));

        Self { snapshot, version, handle }
    }

    /// Current rows in table order
    pub fn records(&self) -> Vec<T> {
        read(&self.snapshot).clone()
    }

    pub fn len(&self) -> usize {
        read(&self.snapshot).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn for_user(&self, user_id: Uuid) -> Vec<T> {
        self.filter(|row| row.owner() == Some(user_id))
    }

    pub fn filter<F>(&self, predicate: F) -> Vec<T>
    where
        F: Fn(&T) -> bool,
    {
        read(&self.snapshot).iter().filter(|row| predicate(row)).cloned().collect()
    }

    pub fn find(&self, id: Uuid) -> Option<T> {
        read(&self.snapshot).iter().find(|row| row.id() == id).cloned()
    }

    /// Number of changes applied since activation
    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    /// Wait for the next applied change. `false` once the view has stopped.
    pub async fn changed(&mut self) -> bool {
        self.version.changed().await.is_ok()
    }

    /// A handle that observes applied changes without holding the view
    pub fn watch(&self) -> watch::Receiver<u64> {
        self.version.clone()
    }

    /// Stop following changes
    pub fn release(self) {}
}

impl<T: SyncRecord> Drop for Synchronizer<T> {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl Synchronizer<AttendanceRecord> {
    /// Records stamped on `day`
    pub fn on_day(&self, day: NaiveDate) -> Vec<AttendanceRecord> {
        self.filter(|record| record.day() == day)
    }

    /// The user's check-in on `day`, regardless of later check-outs
    pub fn check_in_for_user_on(&self, user_id: Uuid, day: NaiveDate) -> Option<AttendanceRecord> {
        read(&self.snapshot)
            .iter()
            .filter(|record| record.user_id == user_id && record.day() == day && record.is_check_in())
            .max_by_key(|record| record.timestamp)
            .cloned()
    }

    pub fn checked_in_on(&self, user_id: Uuid, day: NaiveDate) -> bool {
        self.check_in_for_user_on(user_id, day).is_some()
    }
}

impl Synchronizer<MaintenanceTicket> {
    pub fn with_status(&self, status: TicketStatus) -> Vec<MaintenanceTicket> {
        self.filter(|ticket| ticket.status == status)
    }
}

impl Synchronizer<GatePass> {
    pub fn with_status(&self, status: GatePassStatus) -> Vec<GatePass> {
        self.filter(|pass| pass.status == status)
    }

    pub fn find_by_access_code(&self, code: &str) -> Option<GatePass> {
        let code = code.trim();
        read(&self.snapshot)
            .iter()
            .find(|pass| pass.qr_code.as_deref() == Some(code))
            .cloned()
    }
}

fn read<T>(snapshot: &RwLock<Vec<T>>) -> std::sync::RwLockReadGuard<'_, Vec<T>> {
    snapshot.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(snapshot: &RwLock<Vec<T>>) -> std::sync::RwLockWriteGuard<'_, Vec<T>> {
    snapshot.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

async fn follow<T: SyncRecord>(
    store: Arc<dyn RecordStore>,
    mut receiver: broadcast::Receiver<ChangeEvent>,
    snapshot: Snapshot<T>,
    mode: SyncMode,
    version: watch::Sender<u64>,
) {
    loop {
        match receiver.recv().await {
            Ok(event) if event.table == T::TABLE => {
                let patched = mode == SyncMode::Patch && patch(&snapshot, &event);
                if !patched {
                    refetch(store.as_ref(), &snapshot, "notification").await;
                }
            }
            Ok(_) => continue,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(table = %T::TABLE, skipped = skipped, "Change feed lagged, re-reading");
                refetch(store.as_ref(), &snapshot, "lagged").await;
            }
            Err(broadcast::error::RecvError::Closed) => {
                info!(table = %T::TABLE, "Change feed closed, view is no longer updated");
                break;
            }
        }
        version.send_modify(|v| *v += 1);
    }
}

/// Replace the snapshot with a fresh read; on failure keep what we have
async fn refetch<T: SyncRecord>(store: &dyn RecordStore, snapshot: &Snapshot<T>, reason: &str) {
    match T::fetch(store).await {
        Ok(rows) => {
            log_sync_refresh(T::TABLE.as_str(), rows.len(), reason);
            *write(snapshot) = rows;
        }
        Err(e) => {
            // Previous snapshot stays in place
            log_error(T::TABLE.as_str(), &e);
        }
    }
}

/// Apply a change in place. Returns `false` when the event cannot be applied
/// and the table must be re-read instead.
fn patch<T: SyncRecord>(snapshot: &Snapshot<T>, event: &ChangeEvent) -> bool {
    match event.kind {
        ChangeKind::Resync => false,
        ChangeKind::Delete => {
            let id = match event.id.or_else(|| decode::<T>(event).map(|row| row.id())) {
                Some(id) => id,
                None => return false,
            };
            write(snapshot).retain(|row| row.id() != id);
            debug!(table = %T::TABLE, id = %id, "Patched delete");
            true
        }
        ChangeKind::Insert | ChangeKind::Update => {
            let row = match decode::<T>(event) {
                Some(row) => row,
                None => return false,
            };
            let id = row.id();
            let mut rows = write(snapshot);
            match rows.iter_mut().find(|existing| existing.id() == id) {
                Some(existing) => *existing = row,
                None => rows.push(row),
            }
            rows.sort_by(T::ordering);
            debug!(table = %T::TABLE, id = %id, "Patched upsert");
            true
        }
    }
}

fn decode<T: SyncRecord>(event: &ChangeEvent) -> Option<T> {
    let record = event.record.clone()?;
    match serde_json::from_value(record) {
        Ok(row) => Some(row),
        Err(e) => {
            debug!(table = %T::TABLE, error = %e, "Undecodable change payload");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use chrono::Utc;
    use crate::database::InMemoryStore;

    fn new_pass(user_id: Uuid, reason: &str) -> NewGatePass {
        let today = Utc::now().date_naive();
        NewGatePass {
            user_id,
            user_name: "Test Student".to_string(),
            room_number: "C-301".to_string(),
            reason: reason.to_string(),
            destination: "Home".to_string(),
            departure_date: today,
            expected_return: today,
        }
    }

    fn store() -> (Arc<InMemoryStore>, Arc<dyn RecordStore>, ChangeFeed) {
        let feed = ChangeFeed::new(64);
        let store = Arc::new(InMemoryStore::new(feed.clone()));
        let dyn_store: Arc<dyn RecordStore> = store.clone();
        (store, dyn_store, feed)
    }

    async fn next_change<T: SyncRecord>(view: &mut Synchronizer<T>) {
        tokio::time::timeout(Duration::from_secs(2), view.changed())
            .await
            .expect("view did not change in time");
    }

    #[tokio::test]
    async fn test_initial_read_then_one_refetch_per_notification() {
        let (store, dyn_store, feed) = store();
        let user = Uuid::new_v4();
        store.insert_gate_pass(new_pass(user, "first")).await.unwrap();

        let mut view = Synchronizer::<GatePass>::activate(dyn_store, &feed, SyncMode::Refetch).await;
        assert_eq!(view.len(), 1);
        assert_eq!(store.fetch_count(Table::GatePasses), 1);

        let second = store.insert_gate_pass(new_pass(user, "second")).await.unwrap();
        next_change(&mut view).await;
        assert_eq!(store.fetch_count(Table::GatePasses), 2);
        assert_eq!(view.records().first().map(|p| p.id), Some(second.id));
        assert_eq!(view.for_user(user).len(), 2);
        assert_eq!(view.version(), 1);
    }

    #[tokio::test]
    async fn test_other_tables_are_ignored() {
        let (store, dyn_store, feed) = store();
        let mut view = Synchronizer::<GatePass>::activate(dyn_store, &feed, SyncMode::Refetch).await;

        feed.publish(ChangeEvent::resync(Table::Tickets));
        feed.publish(ChangeEvent::resync(Table::Hostelmates));
        store.insert_gate_pass(new_pass(Uuid::new_v4(), "leave")).await.unwrap();

        next_change(&mut view).await;
        assert_eq!(view.version(), 1);
        assert_eq!(store.fetch_count(Table::GatePasses), 2);
        assert_eq!(store.fetch_count(Table::Tickets), 0);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_snapshot() {
        let (store, dyn_store, feed) = store();
        store.insert_gate_pass(new_pass(Uuid::new_v4(), "kept")).await.unwrap();
        let mut view = Synchronizer::<GatePass>::activate(dyn_store, &feed, SyncMode::Refetch).await;

        store.set_fail_reads(true);
        feed.publish(ChangeEvent::resync(Table::GatePasses));
        next_change(&mut view).await;
        assert_eq!(view.len(), 1);
        assert_eq!(view.records()[0].reason, "kept");
    }

    #[tokio::test]
    async fn test_failed_initial_read_starts_empty() {
        let (store, dyn_store, feed) = store();
        store.set_fail_reads(true);
        let view = Synchronizer::<Hostelmate>::activate(dyn_store, &feed, SyncMode::Refetch).await;
        assert!(view.is_empty());
    }

    #[tokio::test]
    async fn test_drop_releases_subscription() {
        let (_store, dyn_store, feed) = store();
        let view = Synchronizer::<MovementLog>::activate(dyn_store, &feed, SyncMode::Refetch).await;
        assert_eq!(feed.subscriber_count(), 1);

        view.release();
        tokio::time::timeout(Duration::from_secs(2), async {
            while feed.subscriber_count() > 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("subscription outlived its view");
    }

    #[tokio::test]
    async fn test_patch_mode_applies_payloads_without_reading() {
        let (store, dyn_store, feed) = store();
        let mut view = Synchronizer::<GatePass>::activate(dyn_store, &feed, SyncMode::Patch).await;

        let older = store.insert_gate_pass(new_pass(Uuid::new_v4(), "older")).await.unwrap();
        next_change(&mut view).await;
        let newer = store.insert_gate_pass(new_pass(Uuid::new_v4(), "newer")).await.unwrap();
        next_change(&mut view).await;

        assert_eq!(store.fetch_count(Table::GatePasses), 1);
        let ids: Vec<Uuid> = view.records().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);

        store.delete_gate_pass(older.id).unwrap();
        next_change(&mut view).await;
        assert!(view.find(older.id).is_none());
        assert_eq!(view.len(), 1);

        // No payload: falls back to a read
        feed.publish(ChangeEvent::touched(Table::GatePasses, ChangeKind::Update));
        next_change(&mut view).await;
        assert_eq!(store.fetch_count(Table::GatePasses), 2);
    }

    fn mate(name: &str, room: &str) -> Hostelmate {
        Hostelmate {
            id: Uuid::new_v4(),
            user_id: None,
            name: name.to_string(),
            room_number: room.to_string(),
            hostel_block: "Block C".to_string(),
            course: None,
            year: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_roster_additions_are_refetched_in_name_order() {
        let (store, dyn_store, feed) = store();
        let mut view = Synchronizer::<Hostelmate>::activate(dyn_store, &feed, SyncMode::Refetch).await;
        assert!(view.is_empty());

        store.add_hostelmate(mate("Zoya Khan", "C-302")).unwrap();
        next_change(&mut view).await;
        store.add_hostelmate(mate("Arjun Mehta", "C-301")).unwrap();
        next_change(&mut view).await;

        assert_eq!(store.fetch_count(Table::Hostelmates), 3);
        let names: Vec<String> = view.records().into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["Arjun Mehta", "Zoya Khan"]);
    }

    #[tokio::test]
    async fn test_lagged_subscriber_reads_once() {
        let feed = ChangeFeed::new(2);
        let store = Arc::new(InMemoryStore::new(feed.clone()));
        let dyn_store: Arc<dyn RecordStore> = store.clone();
        let mut view = Synchronizer::<GatePass>::activate(dyn_store, &feed, SyncMode::Refetch).await;
        assert_eq!(store.fetch_count(Table::GatePasses), 1);

        // Flood before the view task runs; only the last two survive and
        // they belong to another table.
        for _ in 0..10 {
            feed.publish(ChangeEvent::resync(Table::Hostelmates));
        }

        next_change(&mut view).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(view.version(), 1);
        assert_eq!(store.fetch_count(Table::GatePasses), 2);
    }

    #[tokio::test]
    async fn test_closed_feed_stops_updates() {
        let feed = ChangeFeed::new(8);
        // Writes go to a separate feed so the view's feed can be closed
        let store = Arc::new(InMemoryStore::new(ChangeFeed::default()));
        let dyn_store: Arc<dyn RecordStore> = store.clone();
        let mut view = Synchronizer::<GatePass>::activate(dyn_store, &feed, SyncMode::Refetch).await;

        feed.publish(ChangeEvent::resync(Table::GatePasses));
        next_change(&mut view).await;
        assert_eq!(store.fetch_count(Table::GatePasses), 2);

        drop(feed);
        let changed = tokio::time::timeout(Duration::from_secs(2), view.changed())
            .await
            .expect("view did not stop in time");
        assert!(!changed);

        store.insert_gate_pass(new_pass(Uuid::new_v4(), "unseen")).await.unwrap();
        assert!(view.is_empty());
        assert_eq!(store.fetch_count(Table::GatePasses), 2);
    }

    #[tokio::test]
    async fn test_access_code_lookup() {
        let (store, dyn_store, feed) = store();
        let pass = store.insert_gate_pass(new_pass(Uuid::new_v4(), "trip")).await.unwrap();
        let approve = GatePassUpdate {
            status: Some(GatePassStatus::Approved),
            qr_code: Some("HOSTELFLOW:GATEPASS:test:1".to_string()),
            ..Default::default()
        };
        store.update_gate_pass(pass.id, approve, &[GatePassStatus::Pending]).await.unwrap();

        let view = Synchronizer::<GatePass>::activate(dyn_store, &feed, SyncMode::Refetch).await;
        assert_eq!(view.find_by_access_code(" HOSTELFLOW:GATEPASS:test:1 ").map(|p| p.id), Some(pass.id));
        assert!(view.find_by_access_code("HOSTELFLOW:GATEPASS:other:1").is_none());
        assert_eq!(view.with_status(GatePassStatus::Approved).len(), 1);
        assert!(view.with_status(GatePassStatus::Pending).is_empty());
    }
}
