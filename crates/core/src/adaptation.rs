//! Adaptive scheduling policy: drift classification and remediation math.
//!
//! Classification is a strict priority chain evaluated on a fresh
//! [`ProgressSnapshot`]; the first matching rule wins:
//!
//! 1. returning after a break (no completion for a week or more)
//! 2. behind schedule (more than five overdue events)
//! 3. ahead of schedule (pace ratio above 1.5)
//! 4. on track
//!
//! Suggestions are transient values and are never persisted.

use std::collections::HashSet;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::catalog::Lesson;
use crate::error::CoreError;
use crate::preferences::SkillLevel;
use crate::progress::{last_incomplete_date, EventProgress, ProgressSnapshot};
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

/// Days without a completion after which a student counts as returning.
pub const BREAK_THRESHOLD_DAYS: i64 = 7;
/// Overdue count above which a student is behind schedule.
pub const BEHIND_OVERDUE_THRESHOLD: usize = 5;
/// Overdue count above which being behind is high severity.
pub const HIGH_SEVERITY_OVERDUE_THRESHOLD: usize = 10;
/// Overdue events absorbed per extra week when behind.
pub const OVERDUE_PER_EXTRA_WEEK: usize = 3;
/// Pace ratio above which a student is ahead of schedule.
pub const AHEAD_PACE_THRESHOLD: f64 = 1.5;

// ---------------------------------------------------------------------------
// Action parameters
// ---------------------------------------------------------------------------

/// Weekly hours at or above which a reduction is proposed.
pub const REDUCE_HOURS_THRESHOLD: f64 = 10.0;
/// Hours removed by a reduction.
pub const REDUCE_HOURS_STEP: f64 = 3.0;
/// Floor for reduced weekly hours.
pub const MIN_WEEKLY_HOURS: f64 = 5.0;
/// Most events proposed for skipping.
pub const MAX_SKIPPED_EVENTS: usize = 3;
/// Highest difficulty an event may have to be skippable.
pub const SKIPPABLE_MAX_DIFFICULTY: i16 = 2;
/// Most advanced lessons proposed at once.
pub const MAX_ADVANCED_LESSONS: usize = 3;
/// Days pulled in per unit of pace above 1.0 when finishing early.
pub const FINISH_EARLY_DAYS_PER_PACE: f64 = 30.0;
/// Gap between the last event and each inserted bonus event.
pub const BONUS_SPACING_DAYS: i64 = 3;
/// Difficulty assigned to inserted bonus events.
pub const BONUS_DIFFICULTY: i16 = 4;
/// Planned minutes for inserted bonus events.
pub const BONUS_DURATION_MINUTES: i32 = 60;

// ---------------------------------------------------------------------------
// Suggestion types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdaptationType {
    OnTrack,
    BehindSchedule,
    AheadOfSchedule,
    ReturningAfterBreak,
}

impl AdaptationType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OnTrack => "on-track",
            Self::BehindSchedule => "behind-schedule",
            Self::AheadOfSchedule => "ahead-of-schedule",
            Self::ReturningAfterBreak => "returning-after-break",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// A lesson proposed as bonus material for a student who is ahead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedLesson {
    pub lesson_id: DbId,
    pub title: String,
    pub duration_minutes: u32,
}

/// A proposed remediation. Only some kinds mutate the calendar when applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum AdaptationAction {
    ExtendTimeline { weeks: u32 },
    ReduceHours { new_hours: f64 },
    SkipOptional { videos_to_skip: Vec<DbId> },
    AddAdvancedContent { videos: Vec<AdvancedLesson> },
    FinishEarly { new_date: Timestamp },
}

impl AdaptationAction {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ExtendTimeline { .. } => "extend-timeline",
            Self::ReduceHours { .. } => "reduce-hours",
            Self::SkipOptional { .. } => "skip-optional",
            Self::AddAdvancedContent { .. } => "add-advanced-content",
            Self::FinishEarly { .. } => "finish-early",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdaptationSuggestion {
    #[serde(rename = "type")]
    pub kind: AdaptationType,
    pub severity: Severity,
    pub message: String,
    pub actions: Vec<AdaptationAction>,
    pub snapshot: ProgressSnapshot,
}

/// Inputs beyond the snapshot that some rules need to build their actions.
#[derive(Debug, Clone, Default)]
pub struct AdaptationContext<'a> {
    pub events: &'a [EventProgress],
    /// Weekly hours from the saved preferences, if any.
    pub current_hours_per_week: Option<f64>,
    /// Unscheduled advanced lessons, already capped by the caller or not.
    pub advanced_candidates: &'a [AdvancedLesson],
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Classify a snapshot and build the matching actions.
pub fn classify(snapshot: &ProgressSnapshot, ctx: &AdaptationContext<'_>) -> AdaptationSuggestion {
    if snapshot.days_since_last_session >= BREAK_THRESHOLD_DAYS {
        let weeks = div_ceil(snapshot.days_since_last_session.max(0) as u64, 7) as u32;
        return AdaptationSuggestion {
            kind: AdaptationType::ReturningAfterBreak,
            severity: Severity::Medium,
            message: format!(
                "Welcome back! It has been {} days since your last session. \
                 Extending your timeline by {weeks} week(s) will help you ease back in.",
                snapshot.days_since_last_session
            ),
            actions: vec![AdaptationAction::ExtendTimeline { weeks }],
            snapshot: snapshot.clone(),
        };
    }

    if snapshot.overdue > BEHIND_OVERDUE_THRESHOLD {
        return behind_schedule(snapshot, ctx);
    }

    if snapshot.pace_ratio > AHEAD_PACE_THRESHOLD {
        return ahead_of_schedule(snapshot, ctx);
    }

    AdaptationSuggestion {
        kind: AdaptationType::OnTrack,
        severity: Severity::Low,
        message: "You're on track. Keep up the steady work!".to_string(),
        actions: Vec::new(),
        snapshot: snapshot.clone(),
    }
}

fn behind_schedule(
    snapshot: &ProgressSnapshot,
    ctx: &AdaptationContext<'_>,
) -> AdaptationSuggestion {
    let severity = if snapshot.overdue > HIGH_SEVERITY_OVERDUE_THRESHOLD {
        Severity::High
    } else {
        Severity::Medium
    };

    let weeks = div_ceil(snapshot.overdue as u64, OVERDUE_PER_EXTRA_WEEK as u64) as u32;
    let mut actions = vec![AdaptationAction::ExtendTimeline { weeks }];

    if let Some(hours) = ctx.current_hours_per_week {
        if hours >= REDUCE_HOURS_THRESHOLD {
            actions.push(AdaptationAction::ReduceHours {
                new_hours: (hours - REDUCE_HOURS_STEP).max(MIN_WEEKLY_HOURS),
            });
        }
    }

    let skip_limit = MAX_SKIPPED_EVENTS.min(snapshot.overdue / 2);
    let videos_to_skip = select_skippable(ctx.events, skip_limit);
    if !videos_to_skip.is_empty() {
        actions.push(AdaptationAction::SkipOptional { videos_to_skip });
    }

    AdaptationSuggestion {
        kind: AdaptationType::BehindSchedule,
        severity,
        message: format!(
            "You have {} overdue lessons. Adjusting the plan will help you catch up.",
            snapshot.overdue
        ),
        actions,
        snapshot: snapshot.clone(),
    }
}

fn ahead_of_schedule(
    snapshot: &ProgressSnapshot,
    ctx: &AdaptationContext<'_>,
) -> AdaptationSuggestion {
    let mut actions = Vec::new();

    if !ctx.advanced_candidates.is_empty() {
        actions.push(AdaptationAction::AddAdvancedContent {
            videos: ctx
                .advanced_candidates
                .iter()
                .take(MAX_ADVANCED_LESSONS)
                .cloned()
                .collect(),
        });
    }

    let days_early = ((snapshot.pace_ratio - 1.0) * FINISH_EARLY_DAYS_PER_PACE).floor() as i64;
    if days_early > 0 {
        if let Some(last) = last_incomplete_date(ctx.events) {
            actions.push(AdaptationAction::FinishEarly {
                new_date: last - Duration::days(days_early),
            });
        }
    }

    AdaptationSuggestion {
        kind: AdaptationType::AheadOfSchedule,
        severity: Severity::Low,
        message: format!(
            "You're ahead of schedule at {:.0}% of the planned pace. \
             Take on extra material or wrap up early.",
            snapshot.pace_ratio * 100.0
        ),
        actions,
        snapshot: snapshot.clone(),
    }
}

/// Lowest-difficulty incomplete events eligible for skipping, easiest first.
pub fn select_skippable(events: &[EventProgress], limit: usize) -> Vec<DbId> {
    let mut candidates: Vec<&EventProgress> = events
        .iter()
        .filter(|e| !e.completed && e.estimated_difficulty <= SKIPPABLE_MAX_DIFFICULTY)
        .collect();
    candidates.sort_by_key(|e| (e.estimated_difficulty, e.scheduled_date, e.id));
    candidates.into_iter().take(limit).map(|e| e.id).collect()
}

/// Advanced-tagged catalog lessons the student has not been scheduled yet.
pub fn select_advanced_candidates(
    catalog: &[Lesson],
    scheduled_lesson_ids: &HashSet<DbId>,
) -> Vec<AdvancedLesson> {
    catalog
        .iter()
        .filter(|l| l.difficulty == Some(SkillLevel::Advanced))
        .filter(|l| !scheduled_lesson_ids.contains(&l.id))
        .take(MAX_ADVANCED_LESSONS)
        .map(|l| AdvancedLesson {
            lesson_id: l.id,
            title: l.title.clone(),
            duration_minutes: l.duration_minutes,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Applying actions
// ---------------------------------------------------------------------------

/// Day offsets for extending a timeline by `weeks` over `count` events.
///
/// Event `i` (ascending date order) moves by `floor(weeks*7 * (i+1) / count)`
/// days, spreading the delay instead of bunching it at the end. Offsets are
/// non-decreasing and the last one equals `weeks * 7`.
pub fn extend_timeline_offsets(count: usize, weeks: u32) -> Vec<i64> {
    let total_days = i128::from(weeks) * 7;
    let n = count as i128;
    (1..=n)
        .map(|position| (total_days * position / n) as i64)
        .collect()
}

/// Dates for inserted bonus events: every [`BONUS_SPACING_DAYS`] after `last_event`.
pub fn bonus_event_dates(
    last_event: Timestamp,
    count: usize,
) -> Result<Vec<Timestamp>, CoreError> {
    (1..=count as i64)
        .map(|k| shift_by_days(last_event, BONUS_SPACING_DAYS * k))
        .collect()
}

/// `date` moved by `days`, or a validation error when the result leaves
/// the representable range.
pub fn shift_by_days(date: Timestamp, days: i64) -> Result<Timestamp, CoreError> {
    Duration::try_days(days)
        .and_then(|offset| date.checked_add_signed(offset))
        .ok_or_else(|| {
            CoreError::Validation(format!(
                "moving {date} by {days} days leaves the supported date range"
            ))
        })
}

fn div_ceil(numerator: u64, denominator: u64) -> u64 {
    numerator.div_ceil(denominator.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::compute_snapshot;
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 6, 10, 8, 0, 0).unwrap()
    }

    fn snapshot(overdue: usize, pace_ratio: f64, days_since_last_session: i64) -> ProgressSnapshot {
        ProgressSnapshot {
            total_scheduled: 20,
            completed: 2,
            overdue,
            pace_ratio,
            days_since_last_session,
        }
    }

    fn event(id: DbId, day_offset: i64, completed: bool, difficulty: i16) -> EventProgress {
        EventProgress {
            id,
            lesson_id: id * 10,
            scheduled_date: now() + Duration::days(day_offset),
            completed,
            completed_at: completed.then(now),
            estimated_difficulty: difficulty,
        }
    }

    // -----------------------------------------------------------------------
    // Priority order
    // -----------------------------------------------------------------------

    #[test]
    fn break_wins_over_behind() {
        let s = classify(&snapshot(8, 0.2, 10), &AdaptationContext::default());
        assert_eq!(s.kind, AdaptationType::ReturningAfterBreak);
        assert_eq!(s.severity, Severity::Medium);
        assert_eq!(s.actions, vec![AdaptationAction::ExtendTimeline { weeks: 2 }]);
    }

    #[test]
    fn never_studied_counts_as_break() {
        let s = classify(&snapshot(0, 1.0, 999), &AdaptationContext::default());
        assert_eq!(s.kind, AdaptationType::ReturningAfterBreak);
        assert_eq!(s.actions, vec![AdaptationAction::ExtendTimeline { weeks: 143 }]);
    }

    #[test]
    fn seven_overdue_is_medium_behind() {
        let s = classify(&snapshot(7, 0.3, 1), &AdaptationContext::default());
        assert_eq!(s.kind, AdaptationType::BehindSchedule);
        assert_eq!(s.severity, Severity::Medium);
        assert_eq!(s.actions[0], AdaptationAction::ExtendTimeline { weeks: 3 });
    }

    #[test]
    fn eleven_overdue_is_high_severity() {
        let s = classify(&snapshot(11, 0.3, 1), &AdaptationContext::default());
        assert_eq!(s.severity, Severity::High);
        assert_eq!(s.actions[0], AdaptationAction::ExtendTimeline { weeks: 4 });
    }

    #[test]
    fn five_overdue_is_not_behind() {
        let s = classify(&snapshot(5, 1.0, 1), &AdaptationContext::default());
        assert_eq!(s.kind, AdaptationType::OnTrack);
        assert!(s.actions.is_empty());
    }

    #[test]
    fn fast_pace_is_ahead() {
        let s = classify(&snapshot(0, 1.6, 0), &AdaptationContext::default());
        assert_eq!(s.kind, AdaptationType::AheadOfSchedule);
        assert_eq!(s.severity, Severity::Low);
    }

    #[test]
    fn pace_of_exactly_one_and_a_half_is_on_track() {
        let s = classify(&snapshot(0, 1.5, 0), &AdaptationContext::default());
        assert_eq!(s.kind, AdaptationType::OnTrack);
    }

    // -----------------------------------------------------------------------
    // Behind actions
    // -----------------------------------------------------------------------

    #[test]
    fn behind_reduces_hours_when_heavy() {
        let ctx = AdaptationContext {
            current_hours_per_week: Some(12.0),
            ..Default::default()
        };
        let s = classify(&snapshot(6, 0.3, 1), &ctx);
        assert!(s
            .actions
            .contains(&AdaptationAction::ReduceHours { new_hours: 9.0 }));

        let ctx = AdaptationContext {
            current_hours_per_week: Some(7.0),
            ..Default::default()
        };
        let s = classify(&snapshot(6, 0.3, 1), &ctx);
        assert!(!s.actions.iter().any(|a| a.kind() == "reduce-hours"));
    }

    #[test]
    fn reduced_hours_never_drop_below_floor() {
        let ctx = AdaptationContext {
            current_hours_per_week: Some(10.0),
            ..Default::default()
        };
        let s = classify(&snapshot(6, 0.3, 1), &ctx);
        assert!(s
            .actions
            .contains(&AdaptationAction::ReduceHours { new_hours: 7.0 }));
        assert_eq!((10.0_f64 - REDUCE_HOURS_STEP).max(MIN_WEEKLY_HOURS), 7.0);
        assert_eq!((6.0_f64 - REDUCE_HOURS_STEP).max(MIN_WEEKLY_HOURS), 5.0);
    }

    #[test]
    fn behind_skips_easiest_incomplete_events() {
        let events = vec![
            event(1, -9, false, 2),
            event(2, -8, false, 1),
            event(3, -7, false, 5),
            event(4, -6, true, 1),
            event(5, 4, false, 1),
            event(6, 5, false, 2),
        ];
        let ctx = AdaptationContext {
            events: &events,
            ..Default::default()
        };
        // overdue 7 -> floor(7/2)=3 -> min(3, 3) = 3
        let s = classify(&snapshot(7, 0.3, 1), &ctx);
        assert!(s.actions.contains(&AdaptationAction::SkipOptional {
            videos_to_skip: vec![2, 5, 1]
        }));
    }

    #[test]
    fn no_skip_action_without_easy_events() {
        let events = vec![event(1, -9, false, 4)];
        let ctx = AdaptationContext {
            events: &events,
            ..Default::default()
        };
        let s = classify(&snapshot(6, 0.3, 1), &ctx);
        assert!(!s.actions.iter().any(|a| a.kind() == "skip-optional"));
    }

    // -----------------------------------------------------------------------
    // Ahead actions
    // -----------------------------------------------------------------------

    #[test]
    fn ahead_offers_advanced_content_and_early_finish() {
        let events = vec![event(1, -3, true, 3), event(2, 20, false, 3), event(3, 10, false, 3)];
        let candidates: Vec<AdvancedLesson> = (1..=5)
            .map(|i| AdvancedLesson {
                lesson_id: 900 + i,
                title: format!("Deep dive {i}"),
                duration_minutes: 50,
            })
            .collect();
        let ctx = AdaptationContext {
            events: &events,
            current_hours_per_week: Some(6.0),
            advanced_candidates: &candidates,
        };
        let s = classify(&snapshot(0, 2.0, 0), &ctx);
        assert_eq!(s.kind, AdaptationType::AheadOfSchedule);
        match &s.actions[0] {
            AdaptationAction::AddAdvancedContent { videos } => assert_eq!(videos.len(), 3),
            other => panic!("unexpected action {other:?}"),
        }
        // floor((2.0 - 1) * 30) = 30 days before the last incomplete event
        assert_eq!(
            s.actions[1],
            AdaptationAction::FinishEarly {
                new_date: now() + Duration::days(20) - Duration::days(30)
            }
        );
    }

    #[test]
    fn ahead_without_candidates_or_pending_events_has_no_actions() {
        let events = vec![event(1, -3, true, 3)];
        let ctx = AdaptationContext {
            events: &events,
            ..Default::default()
        };
        let s = classify(&snapshot(0, 1.8, 0), &ctx);
        assert_eq!(s.kind, AdaptationType::AheadOfSchedule);
        assert!(s.actions.is_empty());
    }

    #[test]
    fn advanced_candidates_exclude_scheduled_and_non_advanced() {
        let lesson = |id: DbId, difficulty| Lesson {
            id,
            title: format!("L{id}"),
            duration_minutes: 30,
            difficulty,
            learning_objectives: vec![],
            prerequisites: vec![],
        };
        let catalog = vec![
            lesson(1, Some(SkillLevel::Advanced)),
            lesson(2, Some(SkillLevel::Beginner)),
            lesson(3, Some(SkillLevel::Advanced)),
            lesson(4, None),
            lesson(5, Some(SkillLevel::Advanced)),
        ];
        let scheduled = HashSet::from([1]);
        let picked: Vec<DbId> = select_advanced_candidates(&catalog, &scheduled)
            .into_iter()
            .map(|l| l.lesson_id)
            .collect();
        assert_eq!(picked, vec![3, 5]);
    }

    // -----------------------------------------------------------------------
    // Timeline math
    // -----------------------------------------------------------------------

    #[test]
    fn extend_offsets_spread_delay() {
        assert_eq!(extend_timeline_offsets(4, 1), vec![1, 3, 5, 7]);
        assert_eq!(extend_timeline_offsets(1, 2), vec![14]);
        assert!(extend_timeline_offsets(0, 3).is_empty());
    }

    #[test]
    fn extend_offsets_bounded_and_monotonic() {
        for n in 1..40usize {
            for weeks in 1..6u32 {
                let offsets = extend_timeline_offsets(n, weeks);
                assert_eq!(offsets.len(), n);
                assert!(offsets.windows(2).all(|w| w[0] <= w[1]));
                assert!(offsets.iter().all(|&d| d <= i64::from(weeks) * 7));
                assert_eq!(*offsets.last().unwrap(), i64::from(weeks) * 7);
            }
        }
    }

    #[test]
    fn bonus_dates_are_spaced_three_days() {
        let dates = bonus_event_dates(now(), 3).unwrap();
        assert_eq!(
            dates,
            vec![
                now() + Duration::days(3),
                now() + Duration::days(6),
                now() + Duration::days(9)
            ]
        );
    }

    #[test]
    fn out_of_range_shifts_are_validation_errors() {
        assert_eq!(shift_by_days(now(), -2).unwrap(), now() - Duration::days(2));
        assert_matches!(
            shift_by_days(now(), 20_000_000 * 7),
            Err(CoreError::Validation(_))
        );
        let near_end = chrono::DateTime::<Utc>::MAX_UTC - Duration::days(4);
        assert_matches!(bonus_event_dates(near_end, 2), Err(CoreError::Validation(_)));
    }

    #[test]
    fn huge_extensions_do_not_overflow_offsets() {
        let offsets = extend_timeline_offsets(3, u32::MAX);
        assert_eq!(*offsets.last().unwrap(), i64::from(u32::MAX) * 7);
    }

    #[test]
    fn snapshot_scenario_from_counts() {
        // 20 scheduled, 2 completed, 7 overdue, studied yesterday.
        let mut events = Vec::new();
        for i in 0..7 {
            events.push(event(i, -(i + 2), false, 3));
        }
        events.push(EventProgress {
            completed_at: Some(now() - Duration::days(1)),
            ..event(100, -1, true, 3)
        });
        events.push(EventProgress {
            completed_at: Some(now() - Duration::days(12)),
            ..event(101, -12, true, 3)
        });
        for i in 0..11 {
            events.push(event(200 + i, i + 1, false, 3));
        }
        let snap = compute_snapshot(&events, now());
        assert_eq!(snap.total_scheduled, 20);
        assert_eq!(snap.completed, 2);
        assert_eq!(snap.overdue, 7);
        assert_eq!(snap.days_since_last_session, 1);

        let s = classify(&snap, &AdaptationContext::default());
        assert_eq!(s.kind, AdaptationType::BehindSchedule);
        assert_eq!(s.severity, Severity::Medium);
    }

    #[test]
    fn actions_serialize_with_type_tag() {
        let json = serde_json::to_value(AdaptationAction::SkipOptional {
            videos_to_skip: vec![4],
        })
        .unwrap();
        assert_eq!(json["type"], "skip-optional");
        assert_eq!(json["videosToSkip"][0], 4);
    }
}
