//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts

pub mod calendar_event;
pub mod lesson;
pub mod schedule_preferences;
pub mod study_session;
