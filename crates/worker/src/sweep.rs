//! Periodic adaptation sweep.
//!
//! Every tick analyzes each student with saved preferences, logs the result
//! and publishes an `adaptation.suggested` event for anything that is not
//! on track. Suggestions are never applied here; accepting one is the
//! student's call.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use studyplan_core::adaptation::{AdaptationSuggestion, AdaptationType};
use studyplan_core::types::DbId;
use studyplan_events::bus::ADAPTATION_SUGGESTED;
use studyplan_events::{EventBus, PlanEvent};
use studyplan_planner::AdaptiveScheduler;
use tokio_util::sync::CancellationToken;

/// Default sweep interval: 6 hours.
pub const DEFAULT_INTERVAL_SECS: u64 = 21_600;

/// Read `ADAPTATION_INTERVAL_SECS`, falling back to the default when unset,
/// unparseable or zero.
pub fn interval_from_env() -> Duration {
    let secs = std::env::var("ADAPTATION_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|&s| s > 0)
        .unwrap_or(DEFAULT_INTERVAL_SECS);
    Duration::from_secs(secs)
}

/// Build the bus event for a suggestion, or `None` when the student is on
/// track.
pub fn suggestion_event(student_id: DbId, suggestion: &AdaptationSuggestion) -> Option<PlanEvent> {
    if suggestion.kind == AdaptationType::OnTrack {
        return None;
    }
    let payload = match serde_json::to_value(suggestion) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::error!(student_id, error = %e, "Failed to serialize suggestion");
            return None;
        }
    };
    Some(PlanEvent::new(ADAPTATION_SUGGESTED, student_id).with_payload(payload))
}

/// Run the sweep loop until `cancel` is triggered.
pub async fn run(
    scheduler: Arc<AdaptiveScheduler>,
    bus: Arc<EventBus>,
    period: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(interval_secs = period.as_secs(), "Adaptation sweep started");

    let mut interval = tokio::time::interval(period);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Adaptation sweep stopping");
                break;
            }
            _ = interval.tick() => {
                sweep_once(&scheduler, &bus).await;
            }
        }
    }
}

async fn sweep_once(scheduler: &AdaptiveScheduler, bus: &EventBus) {
    let results = match scheduler.analyze_all_at(Utc::now()).await {
        Ok(results) => results,
        Err(e) => {
            tracing::error!(error = %e, "Adaptation sweep failed");
            return;
        }
    };

    let mut suggested = 0usize;
    for (student_id, suggestion) in &results {
        tracing::debug!(
            student_id = *student_id,
            kind = suggestion.kind.as_str(),
            severity = ?suggestion.severity,
            "Student analyzed"
        );
        if let Some(event) = suggestion_event(*student_id, suggestion) {
            bus.publish(event);
            suggested += 1;
        }
    }

    tracing::info!(students = results.len(), suggested, "Adaptation sweep complete");
}
