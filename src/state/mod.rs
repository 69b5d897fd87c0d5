//! State management module
//!
//! This module handles the live table views, the check-in flow and the
//! per-session context

pub mod check_in;
pub mod context;
pub mod sync;

// Re-export commonly used state components
pub use check_in::{CheckInDisplay, CheckInFlow, CheckInReceipt, CheckInState};
pub use context::{AppContext, RoleViews, SessionViews};
pub use sync::{SyncRecord, Synchronizer};
