//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is shared via `Arc<EventBus>` between the calendar generator,
//! the reward notifier and the adaptation worker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use studyplan_core::types::DbId;
use tokio::sync::broadcast;

/// A student reached a milestone (first calendar, etc.).
pub const MILESTONE_REACHED: &str = "milestone.reached";
/// The adaptation sweep produced a suggestion for a student.
pub const ADAPTATION_SUGGESTED: &str = "adaptation.suggested";

// ---------------------------------------------------------------------------
// PlanEvent
// ---------------------------------------------------------------------------

/// Something that happened to a student's study plan.
///
/// Constructed via [`PlanEvent::new`] and enriched with
/// [`with_payload`](PlanEvent::with_payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanEvent {
    /// Dot-separated event name, e.g. `"milestone.reached"`.
    pub event_type: String,

    /// The student the event concerns.
    pub student_id: DbId,

    /// Event-specific data.
    pub payload: serde_json::Value,

    pub timestamp: DateTime<Utc>,
}

impl PlanEvent {
    /// Create an event with an empty object payload.
    pub fn new(event_type: impl Into<String>, student_id: DbId) -> Self {
        Self {
            event_type: event_type.into(),
            student_id,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Buffer size used by [`EventBus::default`].
const DEFAULT_CAPACITY: usize = 256;

/// Broadcasts plan events to every live subscriber.
///
/// ```rust
/// use studyplan_events::bus::{EventBus, PlanEvent, MILESTONE_REACHED};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(PlanEvent::new(MILESTONE_REACHED, 42));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<PlanEvent>,
}

impl EventBus {
    /// Bus buffering up to `capacity` undelivered events per receiver.
    ///
    /// Slow receivers observe `RecvError::Lagged` once the buffer overflows.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Send `event` to every receiver subscribed right now.
    ///
    /// Events published with no subscribers are dropped.
    pub fn publish(&self, event: PlanEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlanEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
