use async_trait::async_trait;
use studyplan_core::types::{DbId, Timestamp};
use studyplan_db::models::calendar_event::{
    CalendarEvent, CalendarEventFilter, CreateCalendarEvent,
};
use studyplan_db::models::schedule_preferences::{SchedulePreferences, UpsertSchedulePreferences};
use studyplan_db::models::study_session::StudySession;
use studyplan_db::repositories::{CalendarEventRepo, SchedulePreferencesRepo, StudySessionRepo};
use studyplan_db::DbPool;

use super::ScheduleRepository;

/// [`ScheduleRepository`] over a PostgreSQL pool.
#[derive(Clone)]
pub struct PgScheduleRepository {
    pool: DbPool,
}

impl PgScheduleRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScheduleRepository for PgScheduleRepository {
    async fn insert_events(
        &self,
        drafts: &[CreateCalendarEvent],
    ) -> Result<Vec<CalendarEvent>, sqlx::Error> {
        CalendarEventRepo::create_many(&self.pool, drafts).await
    }

    async fn find_event(&self, id: DbId) -> Result<Option<CalendarEvent>, sqlx::Error> {
        CalendarEventRepo::find_by_id(&self.pool, id).await
    }

    async fn list_events(
        &self,
        filter: &CalendarEventFilter,
    ) -> Result<Vec<CalendarEvent>, sqlx::Error> {
        CalendarEventRepo::list(&self.pool, filter).await
    }

    async fn find_dependents(
        &self,
        student_id: DbId,
        lesson_id: DbId,
        exclude_id: DbId,
    ) -> Result<Vec<CalendarEvent>, sqlx::Error> {
        CalendarEventRepo::list_dependents(&self.pool, student_id, lesson_id, exclude_id).await
    }

    async fn mark_complete(
        &self,
        id: DbId,
        completed_at: Timestamp,
        actual_duration_minutes: Option<i32>,
    ) -> Result<Option<CalendarEvent>, sqlx::Error> {
        CalendarEventRepo::mark_complete(&self.pool, id, completed_at, actual_duration_minutes)
            .await
    }

    async fn reschedule_event(
        &self,
        id: DbId,
        new_date: Timestamp,
    ) -> Result<Option<CalendarEvent>, sqlx::Error> {
        CalendarEventRepo::reschedule(&self.pool, id, new_date).await
    }

    async fn delete_events(&self, ids: &[DbId]) -> Result<u64, sqlx::Error> {
        CalendarEventRepo::delete_many(&self.pool, ids).await
    }

    async fn start_session(
        &self,
        student_id: DbId,
        event_id: Option<DbId>,
        started_at: Timestamp,
    ) -> Result<StudySession, sqlx::Error> {
        StudySessionRepo::start(&self.pool, student_id, event_id, started_at).await
    }

    async fn find_session(&self, id: DbId) -> Result<Option<StudySession>, sqlx::Error> {
        StudySessionRepo::find_by_id(&self.pool, id).await
    }

    async fn end_session(
        &self,
        id: DbId,
        ended_at: Timestamp,
        duration_minutes: i32,
        completed: bool,
    ) -> Result<Option<StudySession>, sqlx::Error> {
        StudySessionRepo::end(&self.pool, id, ended_at, duration_minutes, completed).await
    }

    async fn list_sessions(&self, student_id: DbId) -> Result<Vec<StudySession>, sqlx::Error> {
        StudySessionRepo::list_by_student(&self.pool, student_id).await
    }

    async fn upsert_preferences(
        &self,
        input: &UpsertSchedulePreferences,
    ) -> Result<SchedulePreferences, sqlx::Error> {
        SchedulePreferencesRepo::upsert(&self.pool, input).await
    }

    async fn find_preferences(
        &self,
        student_id: DbId,
    ) -> Result<Option<SchedulePreferences>, sqlx::Error> {
        SchedulePreferencesRepo::find_by_student(&self.pool, student_id).await
    }

    async fn list_student_ids(&self) -> Result<Vec<DbId>, sqlx::Error> {
        SchedulePreferencesRepo::list_student_ids(&self.pool).await
    }
}
