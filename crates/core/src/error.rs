use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The catalog owner has no processed lessons to schedule.
    #[error("No content available for catalog owner {owner_id}")]
    NoContent { owner_id: DbId },

    /// The requested timeline cannot hold the content. The caller should
    /// re-prompt with `suggested_weeks`.
    #[error(
        "Timeline infeasible: needs {estimated_hours}h but only {available_hours}h available \
         (suggested weeks: {suggested_weeks})"
    )]
    TimelineInfeasible {
        estimated_hours: u32,
        available_hours: f64,
        suggested_weeks: u32,
    },

    /// The scheduling oracle returned output that could not be parsed.
    #[error("Malformed oracle response: {0}")]
    OracleResponse(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
