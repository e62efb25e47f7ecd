use studyplan_core::error::CoreError;

use crate::oracle::OracleError;

/// Failure of a planner operation.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Scheduling oracle failed: {0}")]
    Oracle(#[from] OracleError),

    /// The oracle did not answer within the configured budget. Nothing was
    /// persisted.
    #[error("Scheduling oracle timed out after {secs}s")]
    OracleTimeout { secs: u64 },
}

impl PlanError {
    /// Shorthand for a missing-entity error.
    pub fn not_found(entity: &'static str, id: studyplan_core::types::DbId) -> Self {
        Self::Core(CoreError::NotFound { entity, id })
    }
}
