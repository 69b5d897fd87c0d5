//! Data models module
//!
//! This module contains all data structures used throughout the application

/// Declares a closed set of text values stored in `TEXT` columns.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::utils::errors::HostelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(crate::utils::errors::HostelError::InvalidInput(
                        format!("Unknown {} value: {}", stringify!($name), other)
                    )),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = crate::utils::errors::HostelError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}

pub mod attendance;
pub mod ticket;
pub mod gate_pass;
pub mod movement;
pub mod hostelmate;
pub mod profile;

// Re-export commonly used models
pub use attendance::{AttendanceRecord, AttendanceKind, NewAttendanceRecord};
pub use ticket::{MaintenanceTicket, NewTicket, TicketUpdate, TicketCategory, TicketStatus, TicketPriority};
pub use gate_pass::{GatePass, NewGatePass, GatePassUpdate, GatePassStatus};
pub use movement::{MovementLog, MovementKind, NewMovementLog};
pub use hostelmate::Hostelmate;
pub use profile::{Profile, Role};
