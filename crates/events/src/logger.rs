//! Tracing sink for plan events.
//!
//! [`EventLogger`] subscribes to the [`EventBus`](crate::bus::EventBus) and
//! writes each [`PlanEvent`] as a structured log line. It runs until the bus
//! is dropped.

use tokio::sync::broadcast;

use crate::bus::PlanEvent;

pub struct EventLogger;

impl EventLogger {
    /// Run the logging loop. Returns the number of events logged.
    pub async fn run(mut receiver: broadcast::Receiver<PlanEvent>) -> u64 {
        let mut logged = 0;
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    tracing::info!(
                        event_type = %event.event_type,
                        student_id = event.student_id,
                        payload = %event.payload,
                        "Plan event"
                    );
                    logged += 1;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Event logger lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, logger shutting down");
                    break;
                }
            }
        }
        logged
    }
}
