//! Read-only repository for the `lessons` catalog table.

use sqlx::PgPool;
use studyplan_core::types::DbId;

use crate::models::lesson::{CatalogLesson, LESSON_STATUS_PROCESSED};

/// Column list for `lessons` queries.
const COLUMNS: &str = "id, owner_id, title, duration_minutes, difficulty, learning_objectives, \
     prerequisites, status, position, created_at";

/// Provides catalog reads.
pub struct LessonRepo;

impl LessonRepo {
    /// Processed lessons of a catalog owner in course order.
    pub async fn list_processed_by_owner(
        pool: &PgPool,
        owner_id: DbId,
    ) -> Result<Vec<CatalogLesson>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM lessons \
             WHERE owner_id = $1 AND status = $2 \
             ORDER BY position ASC, id ASC"
        );
        sqlx::query_as::<_, CatalogLesson>(&query)
            .bind(owner_id)
            .bind(LESSON_STATUS_PROCESSED)
            .fetch_all(pool)
            .await
    }
}
