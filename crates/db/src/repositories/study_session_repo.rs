//! Repository for the `study_sessions` table.

use sqlx::PgPool;
use studyplan_core::types::{DbId, Timestamp};

use crate::models::study_session::StudySession;

/// Column list for `study_sessions` queries.
const COLUMNS: &str =
    "id, student_id, event_id, started_at, ended_at, duration_minutes, completed, created_at";

/// Provides CRUD operations for study sessions.
pub struct StudySessionRepo;

impl StudySessionRepo {
    /// Open a new session.
    pub async fn start(
        pool: &PgPool,
        student_id: DbId,
        event_id: Option<DbId>,
        started_at: Timestamp,
    ) -> Result<StudySession, sqlx::Error> {
        let query = format!(
            "INSERT INTO study_sessions (student_id, event_id, started_at) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, StudySession>(&query)
            .bind(student_id)
            .bind(event_id)
            .bind(started_at)
            .fetch_one(pool)
            .await
    }

    /// Find a session by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<StudySession>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM study_sessions WHERE id = $1");
        sqlx::query_as::<_, StudySession>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Close a session with its computed duration.
    pub async fn end(
        pool: &PgPool,
        id: DbId,
        ended_at: Timestamp,
        duration_minutes: i32,
        completed: bool,
    ) -> Result<Option<StudySession>, sqlx::Error> {
        let query = format!(
            "UPDATE study_sessions SET ended_at = $2, duration_minutes = $3, completed = $4 \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, StudySession>(&query)
            .bind(id)
            .bind(ended_at)
            .bind(duration_minutes)
            .bind(completed)
            .fetch_optional(pool)
            .await
    }

    /// List a student's sessions, oldest first.
    pub async fn list_by_student(
        pool: &PgPool,
        student_id: DbId,
    ) -> Result<Vec<StudySession>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM study_sessions \
             WHERE student_id = $1 \
             ORDER BY started_at ASC"
        );
        sqlx::query_as::<_, StudySession>(&query)
            .bind(student_id)
            .fetch_all(pool)
            .await
    }
}
