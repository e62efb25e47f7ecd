//! Lesson catalog collaborator.

use async_trait::async_trait;
use studyplan_core::catalog::Lesson;
use studyplan_core::types::DbId;
use studyplan_db::repositories::LessonRepo;
use studyplan_db::DbPool;

use crate::error::PlanError;

/// Read-only source of schedulable lessons.
#[async_trait]
pub trait LessonCatalog: Send + Sync {
    /// Processed lessons of `owner_id` in course order.
    async fn list_lessons(&self, owner_id: DbId) -> Result<Vec<Lesson>, PlanError>;
}

/// Catalog backed by the `lessons` table.
pub struct PgLessonCatalog {
    pool: DbPool,
}

impl PgLessonCatalog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LessonCatalog for PgLessonCatalog {
    async fn list_lessons(&self, owner_id: DbId) -> Result<Vec<Lesson>, PlanError> {
        let rows = LessonRepo::list_processed_by_owner(&self.pool, owner_id).await?;
        Ok(rows.into_iter().map(Lesson::from).collect())
    }
}
