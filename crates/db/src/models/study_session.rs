//! Study session entity model.

use serde::Serialize;
use sqlx::FromRow;
use studyplan_core::stats::SessionFacts;
use studyplan_core::types::{DbId, Timestamp};

/// A row from the `study_sessions` table.
///
/// `duration_minutes` is written once, when the session ends.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct StudySession {
    pub id: DbId,
    pub student_id: DbId,
    pub event_id: Option<DbId>,
    pub started_at: Timestamp,
    pub ended_at: Option<Timestamp>,
    pub duration_minutes: i32,
    pub completed: bool,
    pub created_at: Timestamp,
}

impl StudySession {
    pub fn facts(&self) -> SessionFacts {
        SessionFacts {
            duration_minutes: self.duration_minutes,
            completed: self.completed,
        }
    }
}
