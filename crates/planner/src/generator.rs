//! Calendar generation.
//!
//! Each step gates the next: preferences are validated, the catalog is
//! fetched and filtered, feasibility is confirmed before any oracle call,
//! and the oracle's proposal is validated before the batch is written in
//! one atomic insert. Saving preferences and the milestone signal happen
//! after the write and never fail the generation.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use studyplan_core::assignment::{self, AssignmentRequest, ValidatedAssignment};
use studyplan_core::catalog::filter_by_skill_level;
use studyplan_core::error::CoreError;
use studyplan_core::feasibility::ensure_feasible;
use studyplan_core::preferences::OnboardingPreferences;
use studyplan_core::types::{DbId, Timestamp};
use studyplan_db::models::calendar_event::{CalendarEvent, CreateCalendarEvent};

use crate::calendar_store::CalendarStore;
use crate::catalog::LessonCatalog;
use crate::error::PlanError;
use crate::oracle::{extract_json, SchedulingOracle};
use crate::rewards::{MilestoneNotifier, CALENDAR_CREATED};

pub struct CalendarGenerator {
    catalog: Arc<dyn LessonCatalog>,
    oracle: Arc<dyn SchedulingOracle>,
    store: Arc<CalendarStore>,
    notifier: Arc<dyn MilestoneNotifier>,
    oracle_timeout: Duration,
}

impl CalendarGenerator {
    pub fn new(
        catalog: Arc<dyn LessonCatalog>,
        oracle: Arc<dyn SchedulingOracle>,
        store: Arc<CalendarStore>,
        notifier: Arc<dyn MilestoneNotifier>,
        oracle_timeout: Duration,
    ) -> Self {
        Self {
            catalog,
            oracle,
            store,
            notifier,
            oracle_timeout,
        }
    }

    pub async fn generate(
        &self,
        student_id: DbId,
        catalog_owner_id: DbId,
        prefs: &OnboardingPreferences,
    ) -> Result<Vec<CalendarEvent>, PlanError> {
        self.generate_at(student_id, catalog_owner_id, prefs, Utc::now())
            .await
    }

    /// Generate and persist a calendar, resolving dates relative to `now`.
    pub async fn generate_at(
        &self,
        student_id: DbId,
        catalog_owner_id: DbId,
        prefs: &OnboardingPreferences,
        now: Timestamp,
    ) -> Result<Vec<CalendarEvent>, PlanError> {
        prefs.validate()?;

        let catalog = self.catalog.list_lessons(catalog_owner_id).await?;
        if catalog.is_empty() {
            return Err(CoreError::NoContent {
                owner_id: catalog_owner_id,
            }
            .into());
        }

        let lessons = filter_by_skill_level(&catalog, prefs.skill_level);
        if lessons.is_empty() {
            return Err(CoreError::NoContent {
                owner_id: catalog_owner_id,
            }
            .into());
        }

        let report = ensure_feasible(&lessons, prefs)?;
        tracing::info!(
            student_id,
            catalog_owner_id,
            lessons = lessons.len(),
            estimated_hours = report.estimated_hours,
            available_hours = report.available_hours,
            "Timeline feasible, requesting schedule"
        );

        let request = AssignmentRequest::build(prefs, &lessons);
        let raw = tokio::time::timeout(self.oracle_timeout, self.oracle.propose(&request))
            .await
            .map_err(|_| PlanError::OracleTimeout {
                secs: self.oracle_timeout.as_secs(),
            })??;
        let response = assignment::parse_response(&extract_json(&raw))?;

        let validation = assignment::validate_response(&request, &lessons, &response, now)?;
        for rejected in &validation.rejected {
            tracing::warn!(
                student_id,
                position = rejected.position,
                reason = %rejected.reason,
                "Dropping oracle assignment"
            );
        }

        let drafts: Vec<CreateCalendarEvent> = validation
            .accepted
            .iter()
            .map(|item| draft_from_assignment(student_id, item))
            .collect();
        let events = self.store.create_events(drafts).await?;

        tracing::info!(
            student_id,
            events = events.len(),
            dropped = validation.rejected.len(),
            "Calendar generated"
        );

        if let Err(e) = self
            .store
            .save_preferences(student_id, catalog_owner_id, prefs, now)
            .await
        {
            tracing::warn!(student_id, error = %e, "Failed to save schedule preferences");
        }

        if !events.is_empty() {
            if let Err(e) = self
                .notifier
                .notify_milestone(student_id, CALENDAR_CREATED)
                .await
            {
                tracing::warn!(student_id, error = %e, "Failed to signal calendar milestone");
            }
        }

        Ok(events)
    }
}

fn draft_from_assignment(
    student_id: DbId,
    item: &ValidatedAssignment,
) -> CreateCalendarEvent {
    CreateCalendarEvent {
        student_id,
        lesson_id: item.lesson.id,
        scheduled_date: item.scheduled_date,
        duration_minutes: i32::try_from(item.duration_minutes).unwrap_or(i32::MAX),
        prerequisites: item.lesson.prerequisites.clone(),
        estimated_difficulty: item.difficulty,
        learning_objectives: if item.learning_objectives.is_empty() {
            item.lesson.learning_objectives.clone()
        } else {
            item.learning_objectives.clone()
        },
    }
}
