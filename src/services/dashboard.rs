//! Dashboard summaries
//!
//! Pure aggregations over synchronized snapshots. Nothing here touches the
//! store.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::models::*;
use crate::utils::helpers::percentage;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentSummary {
    pub checked_in_today: bool,
    pub pending_passes: usize,
    pub active_tickets: usize,
    pub hostelmates: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WardenSummary {
    pub total_students: usize,
    pub present_today: usize,
    pub attendance_percent: u32,
    pub pending_passes: usize,
    pub active_tickets: usize,
    /// Roster members without a check-in today
    pub late_comers: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyticsSummary {
    pub attendance_rate: u32,
    pub resolved_tickets: usize,
    pub total_tickets: usize,
    pub approved_passes: usize,
    pub total_passes: usize,
    pub tickets_by_category: BTreeMap<TicketCategory, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecuritySummary {
    pub approved_passes: usize,
    pub currently_out: usize,
    pub exits_today: usize,
    pub entries_today: usize,
}

/// Per-role dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Dashboard {
    Student(StudentSummary),
    Warden {
        summary: WardenSummary,
        analytics: AnalyticsSummary,
    },
    Security(SecuritySummary),
}

/// Distinct users with a check-in on `day`
fn present_on(attendance: &[AttendanceRecord], day: NaiveDate) -> usize {
    attendance
        .iter()
        .filter(|r| r.is_check_in() && r.day() == day)
        .map(|r| r.user_id)
        .collect::<HashSet<_>>()
        .len()
}

pub fn student_summary(
    user_id: Uuid,
    day: NaiveDate,
    attendance: &[AttendanceRecord],
    passes: &[GatePass],
    tickets: &[MaintenanceTicket],
    roster: &[Hostelmate],
) -> StudentSummary {
    StudentSummary {
        checked_in_today: attendance
            .iter()
            .any(|r| r.user_id == user_id && r.is_check_in() && r.day() == day),
        pending_passes: passes
            .iter()
            .filter(|p| p.user_id == user_id && p.status == GatePassStatus::Pending)
            .count(),
        active_tickets: tickets.iter().filter(|t| t.user_id == user_id && t.is_active()).count(),
        hostelmates: roster.len(),
    }
}

pub fn warden_summary(
    day: NaiveDate,
    attendance: &[AttendanceRecord],
    passes: &[GatePass],
    tickets: &[MaintenanceTicket],
    roster: &[Hostelmate],
) -> WardenSummary {
    let total_students = roster.len();
    let present_today = present_on(attendance, day);

    WardenSummary {
        total_students,
        present_today,
        attendance_percent: percentage(present_today, total_students),
        pending_passes: passes.iter().filter(|p| p.status == GatePassStatus::Pending).count(),
        active_tickets: tickets.iter().filter(|t| t.is_active()).count(),
        late_comers: total_students.saturating_sub(present_today),
    }
}

pub fn analytics_summary(
    day: NaiveDate,
    attendance: &[AttendanceRecord],
    passes: &[GatePass],
    tickets: &[MaintenanceTicket],
    roster: &[Hostelmate],
) -> AnalyticsSummary {
    let mut tickets_by_category: BTreeMap<TicketCategory, usize> =
        TicketCategory::ALL.iter().map(|c| (*c, 0)).collect();
    for ticket in tickets {
        *tickets_by_category.entry(ticket.category).or_insert(0) += 1;
    }

    AnalyticsSummary {
        attendance_rate: percentage(present_on(attendance, day), roster.len()),
        resolved_tickets: tickets.iter().filter(|t| t.status == TicketStatus::Resolved).count(),
        total_tickets: tickets.len(),
        approved_passes: passes.iter().filter(|p| p.is_approved()).count(),
        total_passes: passes.len(),
        tickets_by_category,
    }
}

pub fn security_summary(day: NaiveDate, passes: &[GatePass], movements: &[MovementLog]) -> SecuritySummary {
    let today = movements.iter().filter(|m| m.timestamp.date_naive() == day);
    let (exits_today, entries_today) = today.fold((0, 0), |(exits, entries), m| match m.kind {
        MovementKind::Exit => (exits + 1, entries),
        MovementKind::Entry => (exits, entries + 1),
    });

    SecuritySummary {
        approved_passes: passes.iter().filter(|p| p.is_approved()).count(),
        currently_out: passes.iter().filter(|p| p.is_approved() && p.is_out()).count(),
        exits_today,
        entries_today,
    }
}

impl fmt::Display for Dashboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dashboard::Student(s) => write!(
                f,
                "checked in: {}, pending passes: {}, active tickets: {}, hostelmates: {}",
                if s.checked_in_today { "yes" } else { "no" },
                s.pending_passes,
                s.active_tickets,
                s.hostelmates
            ),
            Dashboard::Warden { summary, analytics } => write!(
                f,
                "present {}/{} ({}%), late: {}, pending passes: {}, active complaints: {}, resolved {}/{}",
                summary.present_today,
                summary.total_students,
                summary.attendance_percent,
                summary.late_comers,
                summary.pending_passes,
                summary.active_tickets,
                analytics.resolved_tickets,
                analytics.total_tickets
            ),
            Dashboard::Security(s) => write!(
                f,
                "approved passes: {}, out now: {}, exits today: {}, entries today: {}",
                s.approved_passes, s.currently_out, s.exits_today, s.entries_today
            ),
        }
    }
}
