//! Adaptive scheduling: progress analysis and remediation.
//!
//! Analysis is read-only and recomputed on every call. Applying an action
//! mutates the calendar under the student's lock; `reduce-hours` and
//! `finish-early` carry no calendar mutation and are reported back as
//! informational.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use studyplan_core::adaptation::{
    self, AdaptationAction, AdaptationContext, AdaptationSuggestion, AdvancedLesson,
    AHEAD_PACE_THRESHOLD, BONUS_DIFFICULTY, BONUS_DURATION_MINUTES,
};
use studyplan_core::progress::{compute_snapshot, EventProgress};
use studyplan_core::types::{DbId, Timestamp};
use studyplan_db::models::calendar_event::{
    CalendarEvent, CalendarEventFilter, CreateCalendarEvent,
};

use crate::calendar_store::CalendarStore;
use crate::catalog::LessonCatalog;
use crate::error::PlanError;

/// What applying an adaptation action changed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AdaptationOutcome {
    /// Future incomplete events moved later (`extend-timeline`).
    Shifted { events: Vec<CalendarEvent> },
    /// Events removed from the calendar (`skip-optional`).
    Skipped { deleted: u64 },
    /// Bonus events appended (`add-advanced-content`).
    Added { events: Vec<CalendarEvent> },
    /// No calendar mutation is defined for this action.
    Informational { action: &'static str },
}

pub struct AdaptiveScheduler {
    store: Arc<CalendarStore>,
    catalog: Arc<dyn LessonCatalog>,
}

impl AdaptiveScheduler {
    pub fn new(store: Arc<CalendarStore>, catalog: Arc<dyn LessonCatalog>) -> Self {
        Self { store, catalog }
    }

    pub async fn analyze(&self, student_id: DbId) -> Result<AdaptationSuggestion, PlanError> {
        self.analyze_at(student_id, Utc::now()).await
    }

    /// Snapshot the student's progress at `now` and classify it.
    pub async fn analyze_at(
        &self,
        student_id: DbId,
        now: Timestamp,
    ) -> Result<AdaptationSuggestion, PlanError> {
        let events = self.store.get_all(student_id).await?;
        let progress: Vec<EventProgress> = events.iter().map(CalendarEvent::progress).collect();
        let snapshot = compute_snapshot(&progress, now);

        let prefs = self.store.get_preferences(student_id).await?;

        // Only the ahead-of-schedule rule reads the catalog.
        let advanced_candidates: Vec<AdvancedLesson> = match &prefs {
            Some(prefs) if snapshot.pace_ratio > AHEAD_PACE_THRESHOLD => {
                let catalog = self.catalog.list_lessons(prefs.catalog_owner_id).await?;
                let scheduled: HashSet<DbId> = events.iter().map(|e| e.lesson_id).collect();
                adaptation::select_advanced_candidates(&catalog, &scheduled)
            }
            _ => Vec::new(),
        };

        let ctx = AdaptationContext {
            events: &progress,
            current_hours_per_week: prefs.as_ref().map(|p| p.hours_per_week),
            advanced_candidates: &advanced_candidates,
        };
        let suggestion = adaptation::classify(&snapshot, &ctx);

        tracing::debug!(
            student_id,
            kind = suggestion.kind.as_str(),
            overdue = snapshot.overdue,
            pace_ratio = snapshot.pace_ratio,
            days_since_last_session = snapshot.days_since_last_session,
            "Progress analyzed"
        );
        Ok(suggestion)
    }

    /// Analyze every student with saved preferences.
    ///
    /// A failure for one student is logged and does not stop the sweep.
    pub async fn analyze_all_at(
        &self,
        now: Timestamp,
    ) -> Result<Vec<(DbId, AdaptationSuggestion)>, PlanError> {
        let student_ids = self.store.repository().list_student_ids().await?;
        let mut results = Vec::with_capacity(student_ids.len());
        for student_id in student_ids {
            match self.analyze_at(student_id, now).await {
                Ok(suggestion) => results.push((student_id, suggestion)),
                Err(e) => {
                    tracing::error!(student_id, error = %e, "Adaptation analysis failed");
                }
            }
        }
        Ok(results)
    }

    pub async fn apply_adaptation(
        &self,
        student_id: DbId,
        action: &AdaptationAction,
    ) -> Result<AdaptationOutcome, PlanError> {
        self.apply_adaptation_at(student_id, action, Utc::now())
            .await
    }

    /// Apply an accepted action to the student's calendar.
    pub async fn apply_adaptation_at(
        &self,
        student_id: DbId,
        action: &AdaptationAction,
        now: Timestamp,
    ) -> Result<AdaptationOutcome, PlanError> {
        let outcome = match action {
            AdaptationAction::ExtendTimeline { weeks } => {
                let _guard = self.store.lock_student(student_id).await;
                self.extend_timeline(student_id, *weeks, now).await?
            }
            AdaptationAction::SkipOptional { videos_to_skip } => {
                let _guard = self.store.lock_student(student_id).await;
                self.skip_events(student_id, videos_to_skip).await?
            }
            AdaptationAction::AddAdvancedContent { videos } => {
                let _guard = self.store.lock_student(student_id).await;
                self.add_bonus_events(student_id, videos, now).await?
            }
            AdaptationAction::ReduceHours { .. } | AdaptationAction::FinishEarly { .. } => {
                AdaptationOutcome::Informational {
                    action: action.kind(),
                }
            }
        };

        tracing::info!(student_id, action = action.kind(), "Adaptation applied");
        Ok(outcome)
    }

    async fn extend_timeline(
        &self,
        student_id: DbId,
        weeks: u32,
        now: Timestamp,
    ) -> Result<AdaptationOutcome, PlanError> {
        let repo = self.store.repository();
        let filter = CalendarEventFilter {
            student_id,
            from: Some(now),
            completed: Some(false),
            ..Default::default()
        };
        let future = repo.list_events(&filter).await?;
        let offsets = adaptation::extend_timeline_offsets(future.len(), weeks);

        // Every date is resolved before the first write.
        let planned = future
            .iter()
            .zip(offsets)
            .map(|(event, offset)| {
                adaptation::shift_by_days(event.scheduled_date, offset).map(|date| (event.id, date))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut shifted = Vec::with_capacity(planned.len());
        for (event_id, new_date) in planned {
            if let Some(moved) = repo.reschedule_event(event_id, new_date).await? {
                shifted.push(moved);
            }
        }
        Ok(AdaptationOutcome::Shifted { events: shifted })
    }

    async fn skip_events(
        &self,
        student_id: DbId,
        event_ids: &[DbId],
    ) -> Result<AdaptationOutcome, PlanError> {
        let repo = self.store.repository();
        let mut deletable = Vec::with_capacity(event_ids.len());
        for &event_id in event_ids {
            match repo.find_event(event_id).await? {
                Some(event) if event.student_id == student_id && !event.completed => {
                    deletable.push(event_id)
                }
                _ => tracing::warn!(
                    student_id,
                    event_id,
                    "Not skipping event: missing, completed or owned by another student"
                ),
            }
        }

        let deleted = if deletable.is_empty() {
            0
        } else {
            repo.delete_events(&deletable).await?
        };
        Ok(AdaptationOutcome::Skipped { deleted })
    }

    async fn add_bonus_events(
        &self,
        student_id: DbId,
        lessons: &[AdvancedLesson],
        now: Timestamp,
    ) -> Result<AdaptationOutcome, PlanError> {
        let last_event = self
            .store
            .get_all(student_id)
            .await?
            .iter()
            .map(|e| e.scheduled_date)
            .max()
            .unwrap_or(now);

        let drafts: Vec<CreateCalendarEvent> = lessons
            .iter()
            .zip(adaptation::bonus_event_dates(last_event, lessons.len())?)
            .map(|(lesson, scheduled_date)| CreateCalendarEvent {
                student_id,
                lesson_id: lesson.lesson_id,
                scheduled_date,
                duration_minutes: BONUS_DURATION_MINUTES,
                prerequisites: Vec::new(),
                estimated_difficulty: BONUS_DIFFICULTY,
                learning_objectives: Vec::new(),
            })
            .collect();

        let events = if drafts.is_empty() {
            Vec::new()
        } else {
            self.store.repository().insert_events(&drafts).await?
        };
        Ok(AdaptationOutcome::Added { events })
    }
}
