//! Error handling for HostelFlow
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.

use thiserror::Error;
use uuid::Uuid;

/// Main error type for HostelFlow
#[derive(Error, Debug)]
pub enum HostelError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Location error: {0}")]
    Location(#[from] LocationError),

    #[error("Webhook error: {0}")]
    Webhook(#[from] WebhookError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Profile not found for user {user_id}")]
    ProfileNotFound { user_id: Uuid },

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Already checked in on {date}")]
    AlreadyCheckedIn { date: chrono::NaiveDate },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// Device geolocation failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    #[error("Geolocation is not supported on this device")]
    Unsupported,

    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location request timed out")]
    Timeout,

    #[error("Position unavailable: {0}")]
    Unavailable(String),

    #[error("Position out of range: {0}")]
    InvalidPosition(String),
}

/// Spreadsheet webhook failures
#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("Webhook URL not configured")]
    NotConfigured,

    #[error("Webhook rejected the request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Webhook request failed: {0}")]
    RequestFailed(String),
}

/// Result type alias for HostelFlow operations
pub type Result<T> = std::result::Result<T, HostelError>;

impl HostelError {
    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            HostelError::Database(_) => true,
            HostelError::Migration(_) => false,
            HostelError::Location(_) => true,
            HostelError::Webhook(_) => true,
            HostelError::Config(_) => false,
            HostelError::PermissionDenied(_) => false,
            HostelError::NotFound { .. } => false,
            HostelError::ProfileNotFound { .. } => false,
            HostelError::InvalidStateTransition { .. } => false,
            HostelError::AlreadyCheckedIn { .. } => false,
            HostelError::Http(_) => true,
            HostelError::Serialization(_) => false,
            HostelError::Io(_) => true,
            HostelError::UrlParse(_) => false,
            HostelError::InvalidInput(_) => false,
            HostelError::ServiceUnavailable(_) => true,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            HostelError::Migration(_) => ErrorSeverity::Critical,
            HostelError::Config(_) => ErrorSeverity::Critical,
            HostelError::PermissionDenied(_) => ErrorSeverity::Warning,
            HostelError::Location(_) => ErrorSeverity::Warning,
            HostelError::Webhook(_) => ErrorSeverity::Warning,
            HostelError::AlreadyCheckedIn { .. } => ErrorSeverity::Info,
            HostelError::InvalidInput(_) => ErrorSeverity::Info,
            HostelError::InvalidStateTransition { .. } => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }

    /// Shorthand for a rejected status change
    pub fn transition(from: impl ToString, to: impl ToString) -> Self {
        HostelError::InvalidStateTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
