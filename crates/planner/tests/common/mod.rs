//! Shared fixtures for planner integration tests: an in-memory repository
//! and stub collaborators.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use studyplan_core::assignment::AssignmentRequest;
use studyplan_core::catalog::Lesson;
use studyplan_core::preferences::{
    OnboardingPreferences, SessionLength, SkillLevel, StudyDay, TimeSlot,
};
use studyplan_core::types::{DbId, Timestamp};
use studyplan_db::models::calendar_event::{
    CalendarEvent, CalendarEventFilter, CreateCalendarEvent,
};
use studyplan_db::models::schedule_preferences::{SchedulePreferences, UpsertSchedulePreferences};
use studyplan_db::models::study_session::StudySession;
use studyplan_planner::catalog::LessonCatalog;
use studyplan_planner::oracle::{OracleError, SchedulingOracle};
use studyplan_planner::repository::ScheduleRepository;
use studyplan_planner::rewards::{MilestoneNotifier, NotifyError};
use studyplan_planner::PlanError;
use tokio::sync::Mutex;

// ---------------------------------------------------------------------------
// Clock and builders
// ---------------------------------------------------------------------------

/// Monday 2026-03-02 08:00 UTC.
pub fn monday_morning() -> Timestamp {
    Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap()
}

pub fn lesson(
    id: DbId,
    duration_minutes: u32,
    difficulty: Option<SkillLevel>,
    prerequisites: Vec<DbId>,
) -> Lesson {
    Lesson {
        id,
        title: format!("Lesson {id}"),
        duration_minutes,
        difficulty,
        learning_objectives: vec![format!("Understand topic {id}")],
        prerequisites,
    }
}

pub fn preferences(
    skill_level: SkillLevel,
    hours_per_week: f64,
    target_weeks: u32,
) -> OnboardingPreferences {
    OnboardingPreferences {
        skill_level,
        target_weeks,
        hours_per_week,
        preferred_days: vec![StudyDay::Monday, StudyDay::Wednesday],
        preferred_time_slots: vec![TimeSlot::Morning, TimeSlot::Evening],
        session_length: SessionLength::Medium,
        learning_style: Some("visual".to_string()),
        pace: None,
    }
}

pub fn draft(
    student_id: DbId,
    lesson_id: DbId,
    scheduled_date: Timestamp,
    prerequisites: Vec<DbId>,
    difficulty: i16,
) -> CreateCalendarEvent {
    CreateCalendarEvent {
        student_id,
        lesson_id,
        scheduled_date,
        duration_minutes: 60,
        prerequisites,
        estimated_difficulty: difficulty,
        learning_objectives: Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// In-memory repository
// ---------------------------------------------------------------------------

#[derive(Default)]
struct State {
    events: BTreeMap<DbId, CalendarEvent>,
    sessions: BTreeMap<DbId, StudySession>,
    preferences: BTreeMap<DbId, SchedulePreferences>,
    next_event_id: DbId,
    next_session_id: DbId,
}

/// [`ScheduleRepository`] held in memory, with switches to simulate
/// storage failures.
#[derive(Default)]
pub struct InMemoryScheduleRepository {
    state: Mutex<State>,
    pub fail_event_inserts: AtomicBool,
    pub fail_preference_upserts: AtomicBool,
}

fn storage_error(what: &str) -> sqlx::Error {
    sqlx::Error::Protocol(format!("simulated {what} failure"))
}

impl InMemoryScheduleRepository {
    pub async fn event_count(&self) -> usize {
        self.state.lock().await.events.len()
    }

    /// Force an event's completion state, bypassing the store.
    pub async fn set_completed(&self, id: DbId, completed_at: Option<Timestamp>) {
        let mut state = self.state.lock().await;
        if let Some(event) = state.events.get_mut(&id) {
            event.completed = completed_at.is_some();
            event.completed_at = completed_at;
        }
    }
}

#[async_trait]
impl ScheduleRepository for InMemoryScheduleRepository {
    async fn insert_events(
        &self,
        drafts: &[CreateCalendarEvent],
    ) -> Result<Vec<CalendarEvent>, sqlx::Error> {
        if self.fail_event_inserts.load(Ordering::SeqCst) {
            return Err(storage_error("event insert"));
        }
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let mut created = Vec::with_capacity(drafts.len());
        for d in drafts {
            state.next_event_id += 1;
            let event = CalendarEvent {
                id: state.next_event_id,
                student_id: d.student_id,
                lesson_id: d.lesson_id,
                scheduled_date: d.scheduled_date,
                duration_minutes: d.duration_minutes,
                completed: false,
                completed_at: None,
                actual_duration_minutes: None,
                prerequisites: d.prerequisites.clone(),
                estimated_difficulty: d.estimated_difficulty,
                learning_objectives: d.learning_objectives.clone(),
                reschedule_count: 0,
                rescheduled_from: None,
                created_at: now,
                updated_at: now,
            };
            state.events.insert(event.id, event.clone());
            created.push(event);
        }
        Ok(created)
    }

    async fn find_event(&self, id: DbId) -> Result<Option<CalendarEvent>, sqlx::Error> {
        Ok(self.state.lock().await.events.get(&id).cloned())
    }

    async fn list_events(
        &self,
        filter: &CalendarEventFilter,
    ) -> Result<Vec<CalendarEvent>, sqlx::Error> {
        let state = self.state.lock().await;
        let mut events: Vec<CalendarEvent> = state
            .events
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        events.sort_by_key(|e| (e.scheduled_date, e.id));
        if let Some(limit) = filter.limit {
            events.truncate(usize::try_from(limit).unwrap_or(0));
        }
        Ok(events)
    }

    async fn find_dependents(
        &self,
        student_id: DbId,
        lesson_id: DbId,
        exclude_id: DbId,
    ) -> Result<Vec<CalendarEvent>, sqlx::Error> {
        let state = self.state.lock().await;
        let mut events: Vec<CalendarEvent> = state
            .events
            .values()
            .filter(|e| {
                e.student_id == student_id
                    && e.id != exclude_id
                    && e.prerequisites.contains(&lesson_id)
            })
            .cloned()
            .collect();
        events.sort_by_key(|e| (e.scheduled_date, e.id));
        Ok(events)
    }

    async fn mark_complete(
        &self,
        id: DbId,
        completed_at: Timestamp,
        actual_duration_minutes: Option<i32>,
    ) -> Result<Option<CalendarEvent>, sqlx::Error> {
        let mut state = self.state.lock().await;
        Ok(state.events.get_mut(&id).map(|event| {
            event.completed = true;
            event.completed_at = Some(completed_at);
            if actual_duration_minutes.is_some() {
                event.actual_duration_minutes = actual_duration_minutes;
            }
            event.updated_at = Utc::now();
            event.clone()
        }))
    }

    async fn reschedule_event(
        &self,
        id: DbId,
        new_date: Timestamp,
    ) -> Result<Option<CalendarEvent>, sqlx::Error> {
        let mut state = self.state.lock().await;
        Ok(state.events.get_mut(&id).map(|event| {
            event.rescheduled_from = Some(event.scheduled_date);
            event.scheduled_date = new_date;
            event.reschedule_count += 1;
            event.updated_at = Utc::now();
            event.clone()
        }))
    }

    async fn delete_events(&self, ids: &[DbId]) -> Result<u64, sqlx::Error> {
        let mut state = self.state.lock().await;
        Ok(ids
            .iter()
            .filter(|id| state.events.remove(*id).is_some())
            .count() as u64)
    }

    async fn start_session(
        &self,
        student_id: DbId,
        event_id: Option<DbId>,
        started_at: Timestamp,
    ) -> Result<StudySession, sqlx::Error> {
        let mut state = self.state.lock().await;
        state.next_session_id += 1;
        let session = StudySession {
            id: state.next_session_id,
            student_id,
            event_id,
            started_at,
            ended_at: None,
            duration_minutes: 0,
            completed: false,
            created_at: Utc::now(),
        };
        state.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn find_session(&self, id: DbId) -> Result<Option<StudySession>, sqlx::Error> {
        Ok(self.state.lock().await.sessions.get(&id).cloned())
    }

    async fn end_session(
        &self,
        id: DbId,
        ended_at: Timestamp,
        duration_minutes: i32,
        completed: bool,
    ) -> Result<Option<StudySession>, sqlx::Error> {
        let mut state = self.state.lock().await;
        Ok(state.sessions.get_mut(&id).map(|session| {
            session.ended_at = Some(ended_at);
            session.duration_minutes = duration_minutes;
            session.completed = completed;
            session.clone()
        }))
    }

    async fn list_sessions(&self, student_id: DbId) -> Result<Vec<StudySession>, sqlx::Error> {
        let state = self.state.lock().await;
        Ok(state
            .sessions
            .values()
            .filter(|s| s.student_id == student_id)
            .cloned()
            .collect())
    }

    async fn upsert_preferences(
        &self,
        input: &UpsertSchedulePreferences,
    ) -> Result<SchedulePreferences, sqlx::Error> {
        if self.fail_preference_upserts.load(Ordering::SeqCst) {
            return Err(storage_error("preference upsert"));
        }
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let created_at = state
            .preferences
            .get(&input.student_id)
            .map(|p| p.created_at)
            .unwrap_or(now);
        let row = SchedulePreferences {
            student_id: input.student_id,
            catalog_owner_id: input.catalog_owner_id,
            skill_level: input.skill_level.clone(),
            target_weeks: input.target_weeks,
            hours_per_week: input.hours_per_week,
            preferred_days: input.preferred_days.clone(),
            preferred_time_slots: input.preferred_time_slots.clone(),
            session_length: input.session_length.clone(),
            learning_style: input.learning_style.clone(),
            pace: input.pace.clone(),
            target_completion_date: input.target_completion_date,
            created_at,
            updated_at: now,
        };
        state.preferences.insert(row.student_id, row.clone());
        Ok(row)
    }

    async fn find_preferences(
        &self,
        student_id: DbId,
    ) -> Result<Option<SchedulePreferences>, sqlx::Error> {
        Ok(self.state.lock().await.preferences.get(&student_id).cloned())
    }

    async fn list_student_ids(&self) -> Result<Vec<DbId>, sqlx::Error> {
        Ok(self.state.lock().await.preferences.keys().copied().collect())
    }
}

// ---------------------------------------------------------------------------
// Stub collaborators
// ---------------------------------------------------------------------------

/// Catalog serving a fixed lesson list for any owner.
pub struct StubCatalog {
    pub lessons: Vec<Lesson>,
    pub calls: AtomicUsize,
}

impl StubCatalog {
    pub fn new(lessons: Vec<Lesson>) -> Arc<Self> {
        Arc::new(Self {
            lessons,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl LessonCatalog for StubCatalog {
    async fn list_lessons(&self, _owner_id: DbId) -> Result<Vec<Lesson>, PlanError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.lessons.clone())
    }
}

/// Oracle replying with canned text, optionally after a delay.
pub struct StubOracle {
    pub reply: String,
    pub delay: Option<Duration>,
    pub calls: AtomicUsize,
}

impl StubOracle {
    pub fn replying(reply: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.into(),
            delay: None,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            reply: "[]".to_string(),
            delay: Some(delay),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SchedulingOracle for StubOracle {
    async fn propose(&self, _request: &AssignmentRequest) -> Result<String, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.reply.clone())
    }
}

/// Notifier that records every call and can be told to fail.
#[derive(Default)]
pub struct RecordingNotifier {
    pub calls: Mutex<Vec<(DbId, String)>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl MilestoneNotifier for RecordingNotifier {
    async fn notify_milestone(&self, student_id: DbId, milestone: &str) -> Result<(), NotifyError> {
        self.calls.lock().await.push((student_id, milestone.to_string()));
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError("reward service unavailable".to_string()));
        }
        Ok(())
    }
}
