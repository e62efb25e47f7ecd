//! Calendar event and study session operations.
//!
//! Rescheduling walks prerequisite edges: moving an event shifts every
//! event of the same student that lists the moved event's lesson as a
//! prerequisite, recursively, by the same delta. Cascades and timeline
//! adaptations for one student are serialized through a per-student lock.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use chrono::Utc;
use studyplan_core::assignment::{MAX_DIFFICULTY, MIN_DIFFICULTY};
use studyplan_core::dependency::ensure_acyclic;
use studyplan_core::error::CoreError;
use studyplan_core::preferences::OnboardingPreferences;
use studyplan_core::progress::EventProgress;
use studyplan_core::stats::{compute_study_stats, SessionFacts, StudyStats};
use studyplan_core::types::{DbId, Timestamp};
use studyplan_db::models::calendar_event::{
    CalendarEvent, CalendarEventFilter, CreateCalendarEvent,
};
use studyplan_db::models::schedule_preferences::{SchedulePreferences, UpsertSchedulePreferences};
use studyplan_db::models::study_session::StudySession;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::PlanError;
use crate::repository::ScheduleRepository;

type LockMap = HashMap<DbId, Arc<Mutex<()>>>;

/// Per-student async mutexes.
///
/// An entry lives only while some task holds or waits for it; the last
/// guard to release removes it.
#[derive(Default)]
struct StudentLocks {
    inner: Arc<StdMutex<LockMap>>,
}

impl StudentLocks {
    async fn acquire(&self, student_id: DbId) -> StudentLockGuard {
        let lock = {
            let mut locks = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(student_id).or_default())
        };
        let guard = lock.lock_owned().await;
        StudentLockGuard {
            student_id,
            guard: Some(guard),
            locks: Arc::clone(&self.inner),
        }
    }

    fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Holds one student's calendar-mutation lock until dropped.
pub struct StudentLockGuard {
    student_id: DbId,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<StdMutex<LockMap>>,
}

impl Drop for StudentLockGuard {
    fn drop(&mut self) {
        // Release first so the guard's own reference is not counted.
        drop(self.guard.take());
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks
            .get(&self.student_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.student_id);
        }
    }
}

pub struct CalendarStore {
    repo: Arc<dyn ScheduleRepository>,
    student_locks: StudentLocks,
}

impl CalendarStore {
    pub fn new(repo: Arc<dyn ScheduleRepository>) -> Self {
        Self {
            repo,
            student_locks: StudentLocks::default(),
        }
    }

    pub fn repository(&self) -> &Arc<dyn ScheduleRepository> {
        &self.repo
    }

    /// Acquire the calendar-mutation lock for `student_id`.
    ///
    /// Held for the whole of a reschedule cascade or an applied adaptation.
    pub async fn lock_student(&self, student_id: DbId) -> StudentLockGuard {
        self.student_locks.acquire(student_id).await
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    /// Create a single event.
    pub async fn create_event(
        &self,
        draft: CreateCalendarEvent,
    ) -> Result<CalendarEvent, PlanError> {
        let id = draft.lesson_id;
        self.create_events(vec![draft])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                PlanError::Core(CoreError::Internal(format!(
                    "insert of event for lesson {id} returned no row"
                )))
            })
    }

    /// Create a batch of events in one atomic write.
    ///
    /// Rejects drafts with a non-positive duration or a difficulty outside
    /// 1-5, and any batch whose prerequisites would close a cycle among the
    /// student's events.
    pub async fn create_events(
        &self,
        drafts: Vec<CreateCalendarEvent>,
    ) -> Result<Vec<CalendarEvent>, PlanError> {
        if drafts.is_empty() {
            return Ok(Vec::new());
        }
        for draft in &drafts {
            validate_draft(draft)?;
        }

        let students: HashSet<DbId> = drafts.iter().map(|d| d.student_id).collect();
        for student_id in students {
            let existing = self.get_all(student_id).await?;
            let edges = existing
                .iter()
                .map(|e| (e.lesson_id, e.prerequisites.as_slice()))
                .chain(
                    drafts
                        .iter()
                        .filter(|d| d.student_id == student_id)
                        .map(|d| (d.lesson_id, d.prerequisites.as_slice())),
                );
            ensure_acyclic(edges)?;
        }

        let created = self.repo.insert_events(&drafts).await?;
        tracing::info!(count = created.len(), "Calendar events created");
        Ok(created)
    }

    pub async fn get_upcoming(
        &self,
        student_id: DbId,
        limit: i64,
    ) -> Result<Vec<CalendarEvent>, PlanError> {
        self.get_upcoming_at(student_id, limit, Utc::now()).await
    }

    /// Incomplete events at or after `now`, earliest first.
    pub async fn get_upcoming_at(
        &self,
        student_id: DbId,
        limit: i64,
        now: Timestamp,
    ) -> Result<Vec<CalendarEvent>, PlanError> {
        let filter = CalendarEventFilter {
            student_id,
            from: Some(now),
            to: None,
            completed: Some(false),
            limit: Some(limit.max(0)),
        };
        Ok(self.repo.list_events(&filter).await?)
    }

    pub async fn get_by_date_range(
        &self,
        filter: &CalendarEventFilter,
    ) -> Result<Vec<CalendarEvent>, PlanError> {
        if let (Some(from), Some(to)) = (filter.from, filter.to) {
            if from > to {
                return Err(CoreError::Validation(format!(
                    "date range start {from} is after end {to}"
                ))
                .into());
            }
        }
        Ok(self.repo.list_events(filter).await?)
    }

    pub async fn get_all(&self, student_id: DbId) -> Result<Vec<CalendarEvent>, PlanError> {
        Ok(self
            .repo
            .list_events(&CalendarEventFilter::for_student(student_id))
            .await?)
    }

    pub async fn mark_complete(
        &self,
        event_id: DbId,
        actual_duration_minutes: Option<i32>,
    ) -> Result<CalendarEvent, PlanError> {
        self.mark_complete_at(event_id, actual_duration_minutes, Utc::now())
            .await
    }

    /// Mark an event completed. Calling it again overwrites `completed_at`.
    pub async fn mark_complete_at(
        &self,
        event_id: DbId,
        actual_duration_minutes: Option<i32>,
        now: Timestamp,
    ) -> Result<CalendarEvent, PlanError> {
        let event = self
            .repo
            .mark_complete(event_id, now, actual_duration_minutes)
            .await?
            .ok_or_else(|| PlanError::not_found("calendar_event", event_id))?;
        tracing::info!(event_id, student_id = event.student_id, "Event marked complete");
        Ok(event)
    }

    /// Move an event to `new_date`.
    ///
    /// With `cascade`, every dependent event (transitively) moves by the
    /// same delta relative to its own current date. Each event moves at
    /// most once per call. Returns the moved events, target first.
    pub async fn reschedule(
        &self,
        event_id: DbId,
        new_date: Timestamp,
        cascade: bool,
    ) -> Result<Vec<CalendarEvent>, PlanError> {
        let target = self
            .repo
            .find_event(event_id)
            .await?
            .ok_or_else(|| PlanError::not_found("calendar_event", event_id))?;

        let _guard = self.lock_student(target.student_id).await;

        // Re-read under the lock: a concurrent cascade may have moved it.
        let target = self
            .repo
            .find_event(event_id)
            .await?
            .ok_or_else(|| PlanError::not_found("calendar_event", event_id))?;
        let delta = new_date - target.scheduled_date;

        // Plan the whole cascade first so an out-of-range date writes nothing.
        let mut plan: Vec<(DbId, Timestamp)> = Vec::new();
        if cascade {
            let mut visited: HashSet<DbId> = HashSet::from([event_id]);
            let mut queue: VecDeque<(DbId, DbId)> = VecDeque::from([(target.lesson_id, event_id)]);

            while let Some((lesson_id, source_id)) = queue.pop_front() {
                let dependents = self
                    .repo
                    .find_dependents(target.student_id, lesson_id, source_id)
                    .await?;
                for dependent in dependents {
                    if !visited.insert(dependent.id) {
                        continue;
                    }
                    let shifted = dependent
                        .scheduled_date
                        .checked_add_signed(delta)
                        .ok_or_else(|| {
                            CoreError::Validation(format!(
                                "cascading to event {} moves it outside the supported date range",
                                dependent.id
                            ))
                        })?;
                    queue.push_back((dependent.lesson_id, dependent.id));
                    plan.push((dependent.id, shifted));
                }
            }
        }

        let moved_target = self
            .repo
            .reschedule_event(event_id, new_date)
            .await?
            .ok_or_else(|| PlanError::not_found("calendar_event", event_id))?;
        let mut moved = vec![moved_target];
        for (dependent_id, shifted) in plan {
            if let Some(event) = self.repo.reschedule_event(dependent_id, shifted).await? {
                moved.push(event);
            }
        }

        tracing::info!(
            event_id,
            student_id = target.student_id,
            delta_minutes = delta.num_minutes(),
            moved = moved.len(),
            cascade,
            "Event rescheduled"
        );
        Ok(moved)
    }

    pub async fn delete_event(&self, event_id: DbId) -> Result<(), PlanError> {
        let deleted = self.repo.delete_events(&[event_id]).await?;
        if deleted == 0 {
            return Err(PlanError::not_found("calendar_event", event_id));
        }
        tracing::info!(event_id, "Event deleted");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Sessions
    // -----------------------------------------------------------------------

    pub async fn start_session(
        &self,
        student_id: DbId,
        event_id: Option<DbId>,
    ) -> Result<StudySession, PlanError> {
        self.start_session_at(student_id, event_id, Utc::now()).await
    }

    pub async fn start_session_at(
        &self,
        student_id: DbId,
        event_id: Option<DbId>,
        now: Timestamp,
    ) -> Result<StudySession, PlanError> {
        let session = self.repo.start_session(student_id, event_id, now).await?;
        tracing::debug!(session_id = session.id, student_id, "Study session started");
        Ok(session)
    }

    pub async fn end_session(
        &self,
        session_id: DbId,
        completed: bool,
    ) -> Result<Option<StudySession>, PlanError> {
        self.end_session_at(session_id, completed, Utc::now()).await
    }

    /// Close a session, recording whole minutes since it started.
    ///
    /// A missing session is not an error: it is logged and `None` returned.
    pub async fn end_session_at(
        &self,
        session_id: DbId,
        completed: bool,
        now: Timestamp,
    ) -> Result<Option<StudySession>, PlanError> {
        let Some(session) = self.repo.find_session(session_id).await? else {
            tracing::warn!(session_id, "Ending unknown study session, duration defaults to 0");
            return Ok(None);
        };

        let minutes = (now - session.started_at).num_minutes().max(0);
        let duration_minutes = i32::try_from(minutes).unwrap_or(i32::MAX);
        let ended = self
            .repo
            .end_session(session_id, now, duration_minutes, completed)
            .await?;
        tracing::debug!(session_id, duration_minutes, completed, "Study session ended");
        Ok(ended)
    }

    pub async fn get_study_stats(&self, student_id: DbId) -> Result<StudyStats, PlanError> {
        self.get_study_stats_at(student_id, Utc::now()).await
    }

    pub async fn get_study_stats_at(
        &self,
        student_id: DbId,
        now: Timestamp,
    ) -> Result<StudyStats, PlanError> {
        let sessions: Vec<SessionFacts> = self
            .repo
            .list_sessions(student_id)
            .await?
            .iter()
            .map(StudySession::facts)
            .collect();
        let events: Vec<EventProgress> = self
            .get_all(student_id)
            .await?
            .iter()
            .map(CalendarEvent::progress)
            .collect();
        Ok(compute_study_stats(&sessions, &events, now))
    }

    // -----------------------------------------------------------------------
    // Preferences
    // -----------------------------------------------------------------------

    pub async fn save_preferences(
        &self,
        student_id: DbId,
        catalog_owner_id: DbId,
        prefs: &OnboardingPreferences,
        now: Timestamp,
    ) -> Result<SchedulePreferences, PlanError> {
        let input =
            UpsertSchedulePreferences::from_onboarding(student_id, catalog_owner_id, prefs, now);
        Ok(self.repo.upsert_preferences(&input).await?)
    }

    pub async fn get_preferences(
        &self,
        student_id: DbId,
    ) -> Result<Option<SchedulePreferences>, PlanError> {
        Ok(self.repo.find_preferences(student_id).await?)
    }
}

fn validate_draft(draft: &CreateCalendarEvent) -> Result<(), CoreError> {
    if draft.duration_minutes <= 0 {
        return Err(CoreError::Validation(format!(
            "event for lesson {} must have a positive duration, got {}",
            draft.lesson_id, draft.duration_minutes
        )));
    }
    if !(MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&draft.estimated_difficulty) {
        return Err(CoreError::Validation(format!(
            "event for lesson {} has difficulty {} outside {MIN_DIFFICULTY}-{MAX_DIFFICULTY}",
            draft.lesson_id, draft.estimated_difficulty
        )));
    }
    Ok(())
}
