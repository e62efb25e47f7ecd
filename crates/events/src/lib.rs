//! Study-plan event bus.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlanEvent`]: the event envelope published by the planner and worker.
//! - [`EventLogger`]: background subscriber that records every event to the
//!   tracing output.

pub mod bus;
pub mod logger;

pub use bus::{EventBus, PlanEvent};
pub use logger::EventLogger;
