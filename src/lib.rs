//! HostelFlow
//!
//! Hostel operations backend: geofenced attendance check-in, gate pass and
//! maintenance workflows, gate movement logging and per-role dashboards, all
//! kept current through row change notifications.

pub mod config;
pub mod database;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{HostelError, Result};

// Re-export main components for easy access
pub use database::{ChangeFeed, DatabaseService, InMemoryStore, RecordStore};
pub use services::ServiceFactory;
pub use state::{AppContext, Synchronizer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
