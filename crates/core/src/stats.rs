//! Aggregate study statistics for a student.

use serde::Serialize;

use crate::progress::{due_completion_ratio, last_incomplete_date, EventProgress};
use crate::types::Timestamp;

/// Pace ratio at or above which a student is ahead.
pub const AHEAD_RATIO: f64 = 1.1;
/// Pace ratio at or above which a student is on track (below [`AHEAD_RATIO`]).
pub const ON_TRACK_RATIO: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaceStatus {
    Ahead,
    OnTrack,
    Behind,
}

impl PaceStatus {
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio >= AHEAD_RATIO {
            Self::Ahead
        } else if ratio >= ON_TRACK_RATIO {
            Self::OnTrack
        } else {
            Self::Behind
        }
    }
}

/// The slice of a study session that statistics need.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionFacts {
    pub duration_minutes: i32,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudyStats {
    pub sessions_completed: usize,
    pub total_minutes: i64,
    pub average_session_minutes: f64,
    /// Date of the last incomplete event, or `now` when nothing is pending.
    pub projected_completion_date: Timestamp,
    pub pace_status: PaceStatus,
}

pub fn compute_study_stats(
    sessions: &[SessionFacts],
    events: &[EventProgress],
    now: Timestamp,
) -> StudyStats {
    let completed: Vec<&SessionFacts> = sessions.iter().filter(|s| s.completed).collect();
    let total_minutes: i64 = completed
        .iter()
        .map(|s| i64::from(s.duration_minutes.max(0)))
        .sum();
    let average_session_minutes = if completed.is_empty() {
        0.0
    } else {
        total_minutes as f64 / completed.len() as f64
    };

    StudyStats {
        sessions_completed: completed.len(),
        total_minutes,
        average_session_minutes,
        projected_completion_date: last_incomplete_date(events).unwrap_or(now),
        pace_status: PaceStatus::from_ratio(due_completion_ratio(events, now)),
    }
}
