//! Calendar event entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use studyplan_core::progress::EventProgress;
use studyplan_core::types::{DbId, Timestamp};

/// A row from the `calendar_events` table.
///
/// `completed = true` always comes with a `completed_at`; the repository
/// sets both in one statement. `reschedule_count` only grows.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct CalendarEvent {
    pub id: DbId,
    pub student_id: DbId,
    pub lesson_id: DbId,
    pub scheduled_date: Timestamp,
    pub duration_minutes: i32,
    pub completed: bool,
    pub completed_at: Option<Timestamp>,
    pub actual_duration_minutes: Option<i32>,
    /// Lesson ids that must be studied before this event's lesson.
    pub prerequisites: Vec<DbId>,
    /// 1 (easiest) to 5 (hardest).
    pub estimated_difficulty: i16,
    pub learning_objectives: Vec<String>,
    pub reschedule_count: i32,
    /// The date this event held before its most recent reschedule.
    pub rescheduled_from: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl CalendarEvent {
    /// Project the fields progress analysis reads.
    pub fn progress(&self) -> EventProgress {
        EventProgress {
            id: self.id,
            lesson_id: self.lesson_id,
            scheduled_date: self.scheduled_date,
            completed: self.completed,
            completed_at: self.completed_at,
            estimated_difficulty: self.estimated_difficulty,
        }
    }
}

/// DTO for inserting a calendar event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreateCalendarEvent {
    pub student_id: DbId,
    pub lesson_id: DbId,
    pub scheduled_date: Timestamp,
    pub duration_minutes: i32,
    #[serde(default)]
    pub prerequisites: Vec<DbId>,
    pub estimated_difficulty: i16,
    #[serde(default)]
    pub learning_objectives: Vec<String>,
}

/// Query filter for listing a student's events.
///
/// `None` fields do not constrain the result. Results are always ordered
/// by ascending `scheduled_date`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CalendarEventFilter {
    pub student_id: DbId,
    /// Inclusive lower bound on `scheduled_date`.
    pub from: Option<Timestamp>,
    /// Inclusive upper bound on `scheduled_date`.
    pub to: Option<Timestamp>,
    pub completed: Option<bool>,
    pub limit: Option<i64>,
}

impl CalendarEventFilter {
    pub fn for_student(student_id: DbId) -> Self {
        Self {
            student_id,
            ..Default::default()
        }
    }

    /// Whether `event` satisfies every set field except `limit`.
    pub fn matches(&self, event: &CalendarEvent) -> bool {
        event.student_id == self.student_id
            && self.from.map_or(true, |from| event.scheduled_date >= from)
            && self.to.map_or(true, |to| event.scheduled_date <= to)
            && self.completed.map_or(true, |c| event.completed == c)
    }
}
