//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the HostelFlow application.

use tracing::{info, warn, error, debug};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};
use uuid::Uuid;
use crate::config::LoggingConfig;
use crate::utils::errors::{ErrorSeverity, HostelError, Result};

/// Initialize logging based on configuration.
///
/// The returned guard flushes the file writer on drop and must be held for the
/// lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(&config.file_path, "hostelflow.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = if config.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(non_blocking)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(non_blocking)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(file_layer)
        .try_init()
        .map_err(|e| HostelError::Config(format!("Failed to install log subscriber: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log user actions with structured data
pub fn log_user_action(user_id: Uuid, action: &str, details: Option<&str>) {
    info!(
        user_id = %user_id,
        action = action,
        details = details,
        "User action performed"
    );
}

/// Log a geofenced check-in attempt
pub fn log_check_in(user_id: Uuid, distance_m: f64, within: bool) {
    if within {
        info!(
            user_id = %user_id,
            distance_m = distance_m,
            "Check-in location verified"
        );
    } else {
        warn!(
            user_id = %user_id,
            distance_m = distance_m,
            "Check-in location outside geofence"
        );
    }
}

/// Log approval workflow transitions (gate passes, tickets)
pub fn log_workflow_transition(entity: &str, id: Uuid, from: &str, to: &str, actor: Uuid) {
    info!(
        entity = entity,
        id = %id,
        from = from,
        to = to,
        actor = %actor,
        "Workflow transition applied"
    );
}

/// Log security desk movements
pub fn log_movement(gate_pass_id: Uuid, kind: &str, scanned_by: Uuid) {
    info!(
        gate_pass_id = %gate_pass_id,
        kind = kind,
        scanned_by = %scanned_by,
        "Movement logged"
    );
}

/// Log synchronizer refreshes
pub fn log_sync_refresh(table: &str, rows: usize, reason: &str) {
    debug!(
        table = table,
        rows = rows,
        reason = reason,
        "Synchronized snapshot refreshed"
    );
}

/// Log API errors with context
pub fn log_api_error(api: &str, error: &str, context: Option<&str>) {
    error!(
        api = api,
        error = error,
        context = context,
        "API error occurred"
    );
}

/// Log a failed operation at the level its error's severity calls for
pub fn log_error(operation: &str, err: &HostelError) {
    let severity = err.severity();
    let recoverable = err.is_recoverable();
    match severity {
        ErrorSeverity::Info => info!(
            operation = operation,
            error = %err,
            recoverable = recoverable,
            "Operation rejected"
        ),
        ErrorSeverity::Warning => warn!(
            operation = operation,
            error = %err,
            recoverable = recoverable,
            "Operation failed"
        ),
        ErrorSeverity::Error | ErrorSeverity::Critical => error!(
            operation = operation,
            error = %err,
            severity = %severity,
            recoverable = recoverable,
            "Operation failed"
        ),
    }
}

/// Log database operations
pub fn log_database_operation(operation: &str, table: &str, duration_ms: u64, success: bool) {
    if success {
        debug!(
            operation = operation,
            table = table,
            duration_ms = duration_ms,
            "Database operation completed"
        );
    } else {
        error!(
            operation = operation,
            table = table,
            duration_ms = duration_ms,
            "Database operation failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use crate::utils::errors::LocationError;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn captured_lines(emit: impl FnOnce()) -> Vec<String> {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, emit);
        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        output.lines().map(str::to_string).collect()
    }

    #[test]
    fn test_log_error_level_follows_severity() {
        let lines = captured_lines(|| {
            log_error("approve", &HostelError::transition("approved", "denied"));
            log_error("verify_location", &LocationError::Timeout.into());
            log_error("connect", &HostelError::Config("missing url".to_string()));
        });

        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("INFO") && lines[0].contains("approve"));
        assert!(lines[1].contains("WARN") && lines[1].contains("recoverable=true"));
        assert!(lines[2].contains("ERROR") && lines[2].contains("severity=CRITICAL"));
    }
}
