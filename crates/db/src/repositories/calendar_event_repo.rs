//! Repository for the `calendar_events` table.

use sqlx::PgPool;
use studyplan_core::types::{DbId, Timestamp};

use crate::models::calendar_event::{CalendarEvent, CalendarEventFilter, CreateCalendarEvent};

/// Column list for `calendar_events` queries.
const COLUMNS: &str = "id, student_id, lesson_id, scheduled_date, duration_minutes, completed, \
     completed_at, actual_duration_minutes, prerequisites, estimated_difficulty, \
     learning_objectives, reschedule_count, rescheduled_from, created_at, updated_at";

/// Insert statement shared by single and bulk creation.
const INSERT_SQL: &str = "INSERT INTO calendar_events \
     (student_id, lesson_id, scheduled_date, duration_minutes, prerequisites, \
      estimated_difficulty, learning_objectives) \
     VALUES ($1, $2, $3, $4, $5, $6, $7)";

/// Provides CRUD operations for calendar events.
pub struct CalendarEventRepo;

impl CalendarEventRepo {
    /// Insert a single event.
    pub async fn create(
        pool: &PgPool,
        input: &CreateCalendarEvent,
    ) -> Result<CalendarEvent, sqlx::Error> {
        let query = format!("{INSERT_SQL} RETURNING {COLUMNS}");
        sqlx::query_as::<_, CalendarEvent>(&query)
            .bind(input.student_id)
            .bind(input.lesson_id)
            .bind(input.scheduled_date)
            .bind(input.duration_minutes)
            .bind(&input.prerequisites)
            .bind(input.estimated_difficulty)
            .bind(&input.learning_objectives)
            .fetch_one(pool)
            .await
    }

    /// Insert a batch of events in one transaction.
    ///
    /// Either every row is committed or none is.
    pub async fn create_many(
        pool: &PgPool,
        inputs: &[CreateCalendarEvent],
    ) -> Result<Vec<CalendarEvent>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut results = Vec::with_capacity(inputs.len());

        let query = format!("{INSERT_SQL} RETURNING {COLUMNS}");
        for input in inputs {
            let row = sqlx::query_as::<_, CalendarEvent>(&query)
                .bind(input.student_id)
                .bind(input.lesson_id)
                .bind(input.scheduled_date)
                .bind(input.duration_minutes)
                .bind(&input.prerequisites)
                .bind(input.estimated_difficulty)
                .bind(&input.learning_objectives)
                .fetch_one(&mut *tx)
                .await?;
            results.push(row);
        }

        tx.commit().await?;
        tracing::debug!(count = results.len(), "Inserted calendar event batch");
        Ok(results)
    }

    /// Find an event by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<CalendarEvent>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM calendar_events WHERE id = $1");
        sqlx::query_as::<_, CalendarEvent>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a student's events matching `filter`, earliest first.
    pub async fn list(
        pool: &PgPool,
        filter: &CalendarEventFilter,
    ) -> Result<Vec<CalendarEvent>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM calendar_events \
             WHERE student_id = $1 \
               AND ($2::TIMESTAMPTZ IS NULL OR scheduled_date >= $2) \
               AND ($3::TIMESTAMPTZ IS NULL OR scheduled_date <= $3) \
               AND ($4::BOOL IS NULL OR completed = $4) \
             ORDER BY scheduled_date ASC, id ASC \
             LIMIT $5"
        );
        sqlx::query_as::<_, CalendarEvent>(&query)
            .bind(filter.student_id)
            .bind(filter.from)
            .bind(filter.to)
            .bind(filter.completed)
            .bind(filter.limit)
            .fetch_all(pool)
            .await
    }

    /// Events of the same student that list `lesson_id` as a prerequisite,
    /// excluding `exclude_id`.
    pub async fn list_dependents(
        pool: &PgPool,
        student_id: DbId,
        lesson_id: DbId,
        exclude_id: DbId,
    ) -> Result<Vec<CalendarEvent>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM calendar_events \
             WHERE student_id = $1 AND $2 = ANY(prerequisites) AND id <> $3 \
             ORDER BY scheduled_date ASC, id ASC"
        );
        sqlx::query_as::<_, CalendarEvent>(&query)
            .bind(student_id)
            .bind(lesson_id)
            .bind(exclude_id)
            .fetch_all(pool)
            .await
    }

    /// Mark an event completed at `completed_at`.
    ///
    /// A second call overwrites the timestamp. `actual_duration_minutes`
    /// is only replaced when provided.
    pub async fn mark_complete(
        pool: &PgPool,
        id: DbId,
        completed_at: Timestamp,
        actual_duration_minutes: Option<i32>,
    ) -> Result<Option<CalendarEvent>, sqlx::Error> {
        let query = format!(
            "UPDATE calendar_events SET \
                completed = true, \
                completed_at = $2, \
                actual_duration_minutes = COALESCE($3, actual_duration_minutes), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CalendarEvent>(&query)
            .bind(id)
            .bind(completed_at)
            .bind(actual_duration_minutes)
            .fetch_optional(pool)
            .await
    }

    /// Move an event to `new_date`, recording the previous date and
    /// bumping `reschedule_count`.
    pub async fn reschedule(
        pool: &PgPool,
        id: DbId,
        new_date: Timestamp,
    ) -> Result<Option<CalendarEvent>, sqlx::Error> {
        let query = format!(
            "UPDATE calendar_events SET \
                rescheduled_from = scheduled_date, \
                scheduled_date = $2, \
                reschedule_count = reschedule_count + 1, \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, CalendarEvent>(&query)
            .bind(id)
            .bind(new_date)
            .fetch_optional(pool)
            .await
    }

    /// Delete an event. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM calendar_events WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete several events. Returns the number of rows removed.
    pub async fn delete_many(pool: &PgPool, ids: &[DbId]) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM calendar_events WHERE id = ANY($1)")
            .bind(ids)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
