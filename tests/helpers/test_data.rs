//! Test data helpers for building forms and positions

use chrono::{Duration, NaiveDate, Utc};
use hostelflow::models::{TicketCategory, TicketPriority};
use hostelflow::services::{Coordinate, GatePassForm, TicketForm};

/// The demo hostel's reference point
pub const HOSTEL: Coordinate = Coordinate::unchecked(21.234776, 81.346385);

/// About 150 m due north of the hostel
pub fn north_of_hostel_150m() -> Coordinate {
    Coordinate::unchecked(HOSTEL.latitude + 0.0013489824088780957, HOSTEL.longitude)
}

pub fn gate_pass_form(reason: &str, days_away: i64) -> GatePassForm {
    let departure = Utc::now().date_naive();
    GatePassForm {
        reason: reason.to_string(),
        destination: "Home - Bhilai".to_string(),
        departure_date: departure,
        expected_return: departure + Duration::days(days_away),
    }
}

pub fn dated_gate_pass_form(departure: NaiveDate, expected_return: NaiveDate) -> GatePassForm {
    GatePassForm {
        reason: "Internship interview".to_string(),
        destination: "Bengaluru".to_string(),
        departure_date: departure,
        expected_return,
    }
}

pub fn ticket_form(category: TicketCategory, description: &str) -> TicketForm {
    TicketForm {
        category,
        description: description.to_string(),
        priority: TicketPriority::default(),
    }
}
