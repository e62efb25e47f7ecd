//! Study-plan services.
//!
//! - [`generator::CalendarGenerator`]: turns onboarding preferences and a
//!   lesson catalog into a persisted calendar.
//! - [`calendar_store::CalendarStore`]: event and session operations,
//!   including cascading reschedules and study statistics.
//! - [`adaptive::AdaptiveScheduler`]: progress analysis and remediation.
//!
//! External collaborators sit behind traits: [`catalog::LessonCatalog`],
//! [`oracle::SchedulingOracle`], [`rewards::MilestoneNotifier`] and
//! [`repository::ScheduleRepository`].

pub mod adaptive;
pub mod calendar_store;
pub mod catalog;
pub mod config;
pub mod error;
pub mod generator;
pub mod oracle;
pub mod repository;
pub mod rewards;

pub use adaptive::{AdaptationOutcome, AdaptiveScheduler};
pub use calendar_store::CalendarStore;
pub use config::OracleConfig;
pub use error::PlanError;
pub use generator::CalendarGenerator;
