//! Persistence collaborator for the planner services.
//!
//! [`ScheduleRepository`] is the set of primitives the calendar store,
//! generator and adaptive scheduler need. [`PgScheduleRepository`] delegates
//! to the `studyplan-db` repositories.

mod postgres;

pub use postgres::PgScheduleRepository;

use async_trait::async_trait;
use studyplan_core::types::{DbId, Timestamp};
use studyplan_db::models::calendar_event::{
    CalendarEvent, CalendarEventFilter, CreateCalendarEvent,
};
use studyplan_db::models::schedule_preferences::{SchedulePreferences, UpsertSchedulePreferences};
use studyplan_db::models::study_session::StudySession;

/// Storage for calendar events, study sessions and schedule preferences.
///
/// Update methods return `Ok(None)` when the target row does not exist.
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    /// Insert all drafts atomically, returning them in input order.
    async fn insert_events(
        &self,
        drafts: &[CreateCalendarEvent],
    ) -> Result<Vec<CalendarEvent>, sqlx::Error>;

    async fn find_event(&self, id: DbId) -> Result<Option<CalendarEvent>, sqlx::Error>;

    /// Events matching `filter`, ascending by date then id.
    async fn list_events(
        &self,
        filter: &CalendarEventFilter,
    ) -> Result<Vec<CalendarEvent>, sqlx::Error>;

    /// Events of `student_id` other than `exclude_id` whose prerequisites
    /// include `lesson_id`.
    async fn find_dependents(
        &self,
        student_id: DbId,
        lesson_id: DbId,
        exclude_id: DbId,
    ) -> Result<Vec<CalendarEvent>, sqlx::Error>;

    async fn mark_complete(
        &self,
        id: DbId,
        completed_at: Timestamp,
        actual_duration_minutes: Option<i32>,
    ) -> Result<Option<CalendarEvent>, sqlx::Error>;

    /// Move an event, stamping `rescheduled_from` and bumping the count.
    async fn reschedule_event(
        &self,
        id: DbId,
        new_date: Timestamp,
    ) -> Result<Option<CalendarEvent>, sqlx::Error>;

    /// Hard-delete events. Returns the number removed.
    async fn delete_events(&self, ids: &[DbId]) -> Result<u64, sqlx::Error>;

    async fn start_session(
        &self,
        student_id: DbId,
        event_id: Option<DbId>,
        started_at: Timestamp,
    ) -> Result<StudySession, sqlx::Error>;

    async fn find_session(&self, id: DbId) -> Result<Option<StudySession>, sqlx::Error>;

    async fn end_session(
        &self,
        id: DbId,
        ended_at: Timestamp,
        duration_minutes: i32,
        completed: bool,
    ) -> Result<Option<StudySession>, sqlx::Error>;

    async fn list_sessions(&self, student_id: DbId) -> Result<Vec<StudySession>, sqlx::Error>;

    async fn upsert_preferences(
        &self,
        input: &UpsertSchedulePreferences,
    ) -> Result<SchedulePreferences, sqlx::Error>;

    async fn find_preferences(
        &self,
        student_id: DbId,
    ) -> Result<Option<SchedulePreferences>, sqlx::Error>;

    /// Students with saved preferences, ascending.
    async fn list_student_ids(&self) -> Result<Vec<DbId>, sqlx::Error>;
}
