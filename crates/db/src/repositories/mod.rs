//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod calendar_event_repo;
pub mod lesson_repo;
pub mod schedule_preferences_repo;
pub mod study_session_repo;

pub use calendar_event_repo::CalendarEventRepo;
pub use lesson_repo::LessonRepo;
pub use schedule_preferences_repo::SchedulePreferencesRepo;
pub use study_session_repo::StudySessionRepo;
