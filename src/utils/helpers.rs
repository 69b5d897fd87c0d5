//! Helper functions and utilities
//!
//! This module contains common helper functions used throughout the application.

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// Prefix carried by every gate pass access code
pub const ACCESS_CODE_PREFIX: &str = "HOSTELFLOW:GATEPASS";

/// Today's calendar date. Attendance days are UTC days.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Build the access code issued when a gate pass is approved
pub fn generate_access_code(gate_pass_id: Uuid, issued_at: DateTime<Utc>) -> String {
    format!("{}:{}:{}", ACCESS_CODE_PREFIX, gate_pass_id, issued_at.timestamp_millis())
}

/// Extract the gate pass id from an access code, if it is well formed
pub fn parse_access_code(code: &str) -> Option<Uuid> {
    let rest = code.trim().strip_prefix(ACCESS_CODE_PREFIX)?.strip_prefix(':')?;
    let (id, millis) = rest.rsplit_once(':')?;
    millis.parse::<i64>().ok()?;
    Uuid::parse_str(id).ok()
}

/// Trim a required form field, rejecting blank input
pub fn require_text(field: &str, value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        tracing::debug!(field = field, "Required field left blank");
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Case-insensitive substring match used by the search boxes
pub fn matches_query(haystack: &str, query: &str) -> bool {
    haystack.to_lowercase().contains(&query.trim().to_lowercase())
}

/// Integer percentage, rounded half away from zero; 0 when the total is 0
pub fn percentage(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((part as f64 / total as f64) * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_access_code_roundtrip() {
        let id = Uuid::new_v4();
        let issued = Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap();
        let code = generate_access_code(id, issued);
        assert!(code.starts_with("HOSTELFLOW:GATEPASS:"));
        assert!(code.ends_with(&issued.timestamp_millis().to_string()));
        assert_eq!(parse_access_code(&code), Some(id));
    }

    #[test]
    fn test_parse_access_code_rejects_garbage() {
        assert_eq!(parse_access_code("GATEPASS-123"), None);
        assert_eq!(parse_access_code("HOSTELFLOW:GATEPASS:not-a-uuid:1"), None);
        assert_eq!(parse_access_code(&format!("HOSTELFLOW:GATEPASS:{}:x", Uuid::nil())), None);
    }

    #[test]
    fn test_require_text() {
        assert_eq!(require_text("reason", "  Family visit "), Some("Family visit".to_string()));
        assert_eq!(require_text("reason", "   "), None);
    }

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(0, 0), 0);
        assert_eq!(percentage(2, 8), 25);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
    }

    #[test]
    fn test_matches_query_is_case_insensitive() {
        assert!(matches_query("Aarav Sharma", "aarav"));
        assert!(matches_query("A-101", " a-1"));
        assert!(!matches_query("B-201", "A-"));
    }
}
