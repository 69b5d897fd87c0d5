//! Database module
//!
//! This module handles database connections, the record store contract and
//! the change notifications that keep cached views current.

pub mod connection;
pub mod listener;
pub mod memory;
pub mod repositories;
pub mod service;
pub mod store;

// Re-export commonly used database components
pub use connection::{
    DatabasePool, PoolConfig, TRIGGER_CHANNEL, create_pool, run_migrations, health_check, trigger_notifies_on,
};
pub use listener::ChangeListener;
pub use memory::InMemoryStore;
pub use repositories::{
    AttendanceRepository, TicketRepository, GatePassRepository,
    MovementRepository, HostelmateRepository, ProfileRepository,
};
pub use service::DatabaseService;
pub use store::{ChangeEvent, ChangeFeed, ChangeKind, RecordStore, Table};
