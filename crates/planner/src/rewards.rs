//! Reward collaborator: milestone signals.
//!
//! Notification is fire-and-forget from the planner's point of view. A
//! failure is logged by the caller and never affects the operation that
//! triggered it.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use studyplan_core::types::DbId;
use studyplan_events::bus::MILESTONE_REACHED;
use studyplan_events::{EventBus, PlanEvent};
use tokio::sync::Mutex;

/// Milestone key fired after a student's calendar is first persisted.
pub const CALENDAR_CREATED: &str = "calendar_created";

#[derive(Debug, thiserror::Error)]
#[error("Milestone notification failed: {0}")]
pub struct NotifyError(pub String);

#[async_trait]
pub trait MilestoneNotifier: Send + Sync {
    /// Record that `student_id` reached `milestone`. Repeated calls for the
    /// same pair must have no further effect.
    async fn notify_milestone(&self, student_id: DbId, milestone: &str) -> Result<(), NotifyError>;
}

/// Publishes `milestone.reached` events on the in-process bus.
///
/// Each (student, milestone) pair is published at most once per notifier.
pub struct EventBusNotifier {
    bus: Arc<EventBus>,
    reached: Mutex<HashSet<(DbId, String)>>,
}

impl EventBusNotifier {
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            bus,
            reached: Mutex::new(HashSet::new()),
        }
    }
}

#[async_trait]
impl MilestoneNotifier for EventBusNotifier {
    async fn notify_milestone(&self, student_id: DbId, milestone: &str) -> Result<(), NotifyError> {
        let first_time = self
            .reached
            .lock()
            .await
            .insert((student_id, milestone.to_string()));
        if !first_time {
            tracing::debug!(student_id, milestone, "Milestone already reached");
            return Ok(());
        }

        self.bus.publish(
            PlanEvent::new(MILESTONE_REACHED, student_id)
                .with_payload(serde_json::json!({ "milestone": milestone })),
        );
        Ok(())
    }
}
