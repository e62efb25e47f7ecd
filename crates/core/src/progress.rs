//! Progress snapshot over a student's calendar events.

use serde::Serialize;

use crate::types::{DbId, Timestamp};

/// Days reported when the student has never completed a session.
pub const NEVER_STUDIED_DAYS: i64 = 999;

/// The slice of a calendar event that progress analysis needs.
#[derive(Debug, Clone, PartialEq)]
pub struct EventProgress {
    pub id: DbId,
    pub lesson_id: DbId,
    pub scheduled_date: Timestamp,
    pub completed: bool,
    pub completed_at: Option<Timestamp>,
    pub estimated_difficulty: i16,
}

/// Point-in-time view of how a student is doing against the plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressSnapshot {
    pub total_scheduled: usize,
    pub completed: usize,
    /// Incomplete events whose date has passed.
    pub overdue: usize,
    /// Completed events divided by events already due; 1.0 with none due.
    pub pace_ratio: f64,
    /// Whole days since the latest completion, or [`NEVER_STUDIED_DAYS`].
    pub days_since_last_session: i64,
}

/// Completions so far over events already due.
///
/// Events finished ahead of their date count, so a student working ahead
/// scores above 1. Returns 1.0 when nothing is due yet.
pub fn pace_ratio(events: &[EventProgress], now: Timestamp) -> f64 {
    let due = events.iter().filter(|e| e.scheduled_date < now).count();
    if due == 0 {
        return 1.0;
    }
    let completed = events.iter().filter(|e| e.completed).count();
    completed as f64 / due as f64
}

/// Share of already-due events that are completed; never above 1.
/// Returns 1.0 when nothing is due yet.
pub fn due_completion_ratio(events: &[EventProgress], now: Timestamp) -> f64 {
    let due: Vec<&EventProgress> = events.iter().filter(|e| e.scheduled_date < now).collect();
    if due.is_empty() {
        return 1.0;
    }
    let completed_due = due.iter().filter(|e| e.completed).count();
    completed_due as f64 / due.len() as f64
}

/// Compute a fresh snapshot. Empty history yields neutral values.
pub fn compute_snapshot(events: &[EventProgress], now: Timestamp) -> ProgressSnapshot {
    let completed = events.iter().filter(|e| e.completed).count();
    let overdue = events
        .iter()
        .filter(|e| !e.completed && e.scheduled_date < now)
        .count();

    let days_since_last_session = events
        .iter()
        .filter(|e| e.completed)
        .filter_map(|e| e.completed_at)
        .max()
        .map(|last| (now - last).num_days().max(0))
        .unwrap_or(NEVER_STUDIED_DAYS);

    ProgressSnapshot {
        total_scheduled: events.len(),
        completed,
        overdue,
        pace_ratio: pace_ratio(events, now),
        days_since_last_session,
    }
}

/// Latest scheduled date among incomplete events.
pub fn last_incomplete_date(events: &[EventProgress]) -> Option<Timestamp> {
    events
        .iter()
        .filter(|e| !e.completed)
        .map(|e| e.scheduled_date)
        .max()
}
