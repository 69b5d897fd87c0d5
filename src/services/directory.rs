//! Roster and attendance search

use std::collections::BTreeMap;
use crate::models::{AttendanceRecord, Hostelmate};
use crate::utils::helpers::matches_query;

/// Hostelmates whose name, room or block contains `query`. A blank query matches everyone.
pub fn search_roster<'a>(roster: &'a [Hostelmate], query: &str) -> Vec<&'a Hostelmate> {
    roster
        .iter()
        .filter(|mate| {
            matches_query(&mate.name, query)
                || matches_query(&mate.room_number, query)
                || matches_query(&mate.hostel_block, query)
        })
        .collect()
}

/// Roster grouped by hostel block, blocks in name order
pub fn group_by_block<'a>(roster: &[&'a Hostelmate]) -> BTreeMap<&'a str, Vec<&'a Hostelmate>> {
    let mut blocks: BTreeMap<&str, Vec<&Hostelmate>> = BTreeMap::new();
    for mate in roster {
        blocks.entry(mate.hostel_block.as_str()).or_default().push(*mate);
    }
    blocks
}

/// Attendance rows whose student name or room contains `query`
pub fn search_attendance<'a>(records: &'a [AttendanceRecord], query: &str) -> Vec<&'a AttendanceRecord> {
    records
        .iter()
        .filter(|r| matches_query(&r.user_name, query) || matches_query(&r.room_number, query))
        .collect()
}
