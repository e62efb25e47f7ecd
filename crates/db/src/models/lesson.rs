//! Catalog lesson row model.

use serde::Serialize;
use sqlx::FromRow;
use studyplan_core::catalog::Lesson;
use studyplan_core::preferences::SkillLevel;
use studyplan_core::types::{DbId, Timestamp};

/// Status value of lessons whose video has finished processing.
pub const LESSON_STATUS_PROCESSED: &str = "processed";

/// A row from the `lessons` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct CatalogLesson {
    pub id: DbId,
    pub owner_id: DbId,
    pub title: String,
    pub duration_minutes: i32,
    pub difficulty: Option<String>,
    pub learning_objectives: Vec<String>,
    pub prerequisites: Vec<DbId>,
    pub status: String,
    pub position: i32,
    pub created_at: Timestamp,
}

impl From<CatalogLesson> for Lesson {
    fn from(row: CatalogLesson) -> Self {
        Lesson {
            id: row.id,
            title: row.title,
            duration_minutes: u32::try_from(row.duration_minutes).unwrap_or(0),
            difficulty: row.difficulty.as_deref().and_then(SkillLevel::parse),
            learning_objectives: row.learning_objectives,
            prerequisites: row.prerequisites,
        }
    }
}
