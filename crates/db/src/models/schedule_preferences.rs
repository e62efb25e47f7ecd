//! Schedule preferences entity model and DTOs.
//!
//! One row per student, overwritten on every calendar (re)generation.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use studyplan_core::preferences::OnboardingPreferences;
use studyplan_core::types::{DbId, Timestamp};

/// A row from the `schedule_preferences` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct SchedulePreferences {
    pub student_id: DbId,
    /// Catalog the student's calendar was generated from.
    pub catalog_owner_id: DbId,
    pub skill_level: String,
    pub target_weeks: i32,
    pub hours_per_week: f64,
    pub preferred_days: Vec<String>,
    pub preferred_time_slots: Vec<String>,
    pub session_length: String,
    pub learning_style: Option<String>,
    pub pace: Option<String>,
    pub target_completion_date: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for upserting a student's schedule preferences.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UpsertSchedulePreferences {
    pub student_id: DbId,
    pub catalog_owner_id: DbId,
    pub skill_level: String,
    pub target_weeks: i32,
    pub hours_per_week: f64,
    pub preferred_days: Vec<String>,
    pub preferred_time_slots: Vec<String>,
    pub session_length: String,
    pub learning_style: Option<String>,
    pub pace: Option<String>,
    pub target_completion_date: Timestamp,
}

impl UpsertSchedulePreferences {
    /// Denormalize onboarding preferences, targeting completion from `now`.
    pub fn from_onboarding(
        student_id: DbId,
        catalog_owner_id: DbId,
        prefs: &OnboardingPreferences,
        now: Timestamp,
    ) -> Self {
        Self {
            student_id,
            catalog_owner_id,
            skill_level: prefs.skill_level.as_str().to_string(),
            target_weeks: i32::try_from(prefs.target_weeks).unwrap_or(i32::MAX),
            hours_per_week: prefs.hours_per_week,
            preferred_days: prefs
                .preferred_days
                .iter()
                .map(|d| d.as_str().to_string())
                .collect(),
            preferred_time_slots: prefs
                .preferred_time_slots
                .iter()
                .map(|s| s.as_str().to_string())
                .collect(),
            session_length: prefs.session_length.as_str().to_string(),
            learning_style: prefs.learning_style.clone(),
            pace: prefs.pace.clone(),
            target_completion_date: prefs.target_completion_date(now),
        }
    }
}
