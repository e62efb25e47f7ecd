//! Integration tests for the calendar, session and preferences repositories.
//!
//! These need a live PostgreSQL instance (`DATABASE_URL`); run them with
//! `cargo test -- --ignored`.

use chrono::{Duration, TimeZone, Utc};
use sqlx::PgPool;
use studyplan_core::preferences::{
    OnboardingPreferences, SessionLength, SkillLevel, StudyDay, TimeSlot,
};
use studyplan_core::types::{DbId, Timestamp};
use studyplan_db::models::calendar_event::{CalendarEventFilter, CreateCalendarEvent};
use studyplan_db::models::schedule_preferences::UpsertSchedulePreferences;
use studyplan_db::repositories::{
    CalendarEventRepo, LessonRepo, SchedulePreferencesRepo, StudySessionRepo,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn base() -> Timestamp {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
}

fn new_event(
    student_id: DbId,
    lesson_id: DbId,
    day: i64,
    prerequisites: Vec<DbId>,
) -> CreateCalendarEvent {
    CreateCalendarEvent {
        student_id,
        lesson_id,
        scheduled_date: base() + Duration::days(day),
        duration_minutes: 60,
        prerequisites,
        estimated_difficulty: 3,
        learning_objectives: vec![format!("objective {lesson_id}")],
    }
}

// ---------------------------------------------------------------------------
// Test: bulk insert and ordered listing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn create_many_then_list_in_date_order(pool: PgPool) {
    let inputs = vec![
        new_event(1, 30, 5, vec![]),
        new_event(1, 10, 1, vec![]),
        new_event(2, 20, 3, vec![]),
    ];
    let created = CalendarEventRepo::create_many(&pool, &inputs).await.unwrap();
    assert_eq!(created.len(), 3);

    let listed = CalendarEventRepo::list(&pool, &CalendarEventFilter::for_student(1))
        .await
        .unwrap();
    let lessons: Vec<DbId> = listed.iter().map(|e| e.lesson_id).collect();
    assert_eq!(lessons, vec![10, 30]);
    assert!(listed.iter().all(|e| !e.completed && e.reschedule_count == 0));
}

// ---------------------------------------------------------------------------
// Test: filter bounds and limit
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn list_respects_range_and_limit(pool: PgPool) {
    let inputs: Vec<_> = (0..5).map(|d| new_event(1, 100 + d, d, vec![])).collect();
    CalendarEventRepo::create_many(&pool, &inputs).await.unwrap();

    let filter = CalendarEventFilter {
        student_id: 1,
        from: Some(base() + Duration::days(1)),
        to: Some(base() + Duration::days(3)),
        completed: None,
        limit: Some(2),
    };
    let listed = CalendarEventRepo::list(&pool, &filter).await.unwrap();
    let lessons: Vec<DbId> = listed.iter().map(|e| e.lesson_id).collect();
    assert_eq!(lessons, vec![101, 102]);
}

// ---------------------------------------------------------------------------
// Test: completion and reschedule bookkeeping
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn mark_complete_and_reschedule(pool: PgPool) {
    let event = CalendarEventRepo::create(&pool, &new_event(1, 10, 0, vec![]))
        .await
        .unwrap();

    let done_at = base() + Duration::hours(2);
    let done = CalendarEventRepo::mark_complete(&pool, event.id, done_at, Some(45))
        .await
        .unwrap()
        .unwrap();
    assert!(done.completed);
    assert_eq!(done.completed_at, Some(done_at));
    assert_eq!(done.actual_duration_minutes, Some(45));

    let moved_to = base() + Duration::days(4);
    let moved = CalendarEventRepo::reschedule(&pool, event.id, moved_to)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(moved.scheduled_date, moved_to);
    assert_eq!(moved.rescheduled_from, Some(base()));
    assert_eq!(moved.reschedule_count, 1);

    assert!(CalendarEventRepo::mark_complete(&pool, 9_999, done_at, None)
        .await
        .unwrap()
        .is_none());
}

// ---------------------------------------------------------------------------
// Test: dependents lookup and deletes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn dependents_are_scoped_to_student(pool: PgPool) {
    let created = CalendarEventRepo::create_many(
        &pool,
        &[
            new_event(1, 10, 0, vec![]),
            new_event(1, 11, 1, vec![10]),
            new_event(2, 12, 1, vec![10]),
        ],
    )
    .await
    .unwrap();

    let dependents = CalendarEventRepo::list_dependents(&pool, 1, 10, created[0].id)
        .await
        .unwrap();
    assert_eq!(dependents.len(), 1);
    assert_eq!(dependents[0].lesson_id, 11);

    let removed = CalendarEventRepo::delete_many(&pool, &[created[1].id, created[2].id])
        .await
        .unwrap();
    assert_eq!(removed, 2);
    assert!(CalendarEventRepo::delete(&pool, created[0].id).await.unwrap());
    assert!(!CalendarEventRepo::delete(&pool, created[0].id).await.unwrap());
}

// ---------------------------------------------------------------------------
// Test: study session lifecycle
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn session_start_and_end(pool: PgPool) {
    let session = StudySessionRepo::start(&pool, 1, None, base()).await.unwrap();
    assert_eq!(session.duration_minutes, 0);
    assert!(session.ended_at.is_none());

    let ended = StudySessionRepo::end(&pool, session.id, base() + Duration::minutes(50), 50, true)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ended.duration_minutes, 50);
    assert!(ended.completed);

    let sessions = StudySessionRepo::list_by_student(&pool, 1).await.unwrap();
    assert_eq!(sessions.len(), 1);
}

// ---------------------------------------------------------------------------
// Test: preferences upsert keeps one row per student
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn preferences_upsert_overwrites(pool: PgPool) {
    let mut prefs = OnboardingPreferences {
        skill_level: SkillLevel::Beginner,
        target_weeks: 4,
        hours_per_week: 5.0,
        preferred_days: vec![StudyDay::Monday],
        preferred_time_slots: vec![TimeSlot::Morning],
        session_length: SessionLength::Medium,
        learning_style: None,
        pace: None,
    };
    SchedulePreferencesRepo::upsert(
        &pool,
        &UpsertSchedulePreferences::from_onboarding(7, 1, &prefs, base()),
    )
    .await
    .unwrap();

    prefs.hours_per_week = 8.0;
    let row = SchedulePreferencesRepo::upsert(
        &pool,
        &UpsertSchedulePreferences::from_onboarding(7, 1, &prefs, base()),
    )
    .await
    .unwrap();
    assert_eq!(row.hours_per_week, 8.0);
    assert_eq!(row.target_completion_date, base() + Duration::days(28));

    assert_eq!(SchedulePreferencesRepo::list_student_ids(&pool).await.unwrap(), vec![7]);
    assert!(SchedulePreferencesRepo::find_by_student(&pool, 8).await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Test: catalog reads only processed lessons in course order
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires DATABASE_URL"]
async fn catalog_lists_processed_lessons(pool: PgPool) {
    sqlx::query(
        "INSERT INTO lessons (owner_id, title, duration_minutes, difficulty, status, position) VALUES \
         (1, 'Second', 30, 'beginner', 'processed', 2), \
         (1, 'First', 45, NULL, 'processed', 1), \
         (1, 'Draft', 20, NULL, 'pending', 0), \
         (2, 'Other owner', 20, NULL, 'processed', 0)",
    )
    .execute(&pool)
    .await
    .unwrap();

    let lessons = LessonRepo::list_processed_by_owner(&pool, 1).await.unwrap();
    let titles: Vec<&str> = lessons.iter().map(|l| l.title.as_str()).collect();
    assert_eq!(titles, vec!["First", "Second"]);
}
