//! Repository for the `schedule_preferences` table.

use sqlx::PgPool;
use studyplan_core::types::DbId;

use crate::models::schedule_preferences::{SchedulePreferences, UpsertSchedulePreferences};

/// Column list for `schedule_preferences` queries.
const COLUMNS: &str = "student_id, catalog_owner_id, skill_level, target_weeks, \
     hours_per_week, preferred_days, preferred_time_slots, session_length, learning_style, \
     pace, target_completion_date, created_at, updated_at";

/// Provides data access for per-student schedule preferences.
pub struct SchedulePreferencesRepo;

impl SchedulePreferencesRepo {
    /// Insert or replace a student's preferences.
    ///
    /// Uses `ON CONFLICT (student_id) DO UPDATE` to guarantee one row per student.
    pub async fn upsert(
        pool: &PgPool,
        input: &UpsertSchedulePreferences,
    ) -> Result<SchedulePreferences, sqlx::Error> {
        let query = format!(
            "INSERT INTO schedule_preferences \
                (student_id, catalog_owner_id, skill_level, target_weeks, hours_per_week, \
                 preferred_days, preferred_time_slots, session_length, learning_style, pace, \
                 target_completion_date) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             ON CONFLICT (student_id) DO UPDATE SET \
                catalog_owner_id = EXCLUDED.catalog_owner_id, \
                skill_level = EXCLUDED.skill_level, \
                target_weeks = EXCLUDED.target_weeks, \
                hours_per_week = EXCLUDED.hours_per_week, \
                preferred_days = EXCLUDED.preferred_days, \
                preferred_time_slots = EXCLUDED.preferred_time_slots, \
                session_length = EXCLUDED.session_length, \
                learning_style = EXCLUDED.learning_style, \
                pace = EXCLUDED.pace, \
                target_completion_date = EXCLUDED.target_completion_date, \
                updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SchedulePreferences>(&query)
            .bind(input.student_id)
            .bind(input.catalog_owner_id)
            .bind(&input.skill_level)
            .bind(input.target_weeks)
            .bind(input.hours_per_week)
            .bind(&input.preferred_days)
            .bind(&input.preferred_time_slots)
            .bind(&input.session_length)
            .bind(&input.learning_style)
            .bind(&input.pace)
            .bind(input.target_completion_date)
            .fetch_one(pool)
            .await
    }

    /// Find the preferences row for a student.
    pub async fn find_by_student(
        pool: &PgPool,
        student_id: DbId,
    ) -> Result<Option<SchedulePreferences>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM schedule_preferences WHERE student_id = $1");
        sqlx::query_as::<_, SchedulePreferences>(&query)
            .bind(student_id)
            .fetch_optional(pool)
            .await
    }

    /// IDs of every student with saved preferences.
    pub async fn list_student_ids(pool: &PgPool) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "SELECT student_id FROM schedule_preferences ORDER BY student_id",
        )
        .fetch_all(pool)
        .await
    }
}
