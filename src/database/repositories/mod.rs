//! Database repositories module
//!
//! This module contains all repository implementations for data access

pub mod attendance;
pub mod ticket;
pub mod gate_pass;
pub mod movement;
pub mod hostelmate;
pub mod profile;

// Re-export repositories
pub use attendance::AttendanceRepository;
pub use ticket::TicketRepository;
pub use gate_pass::GatePassRepository;
pub use movement::MovementRepository;
pub use hostelmate::HostelmateRepository;
pub use profile::ProfileRepository;
