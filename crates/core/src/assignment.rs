//! Contract with the external scheduling oracle.
//!
//! The oracle sees lessons only by their zero-based position in the
//! request's lesson list and answers with week/day/slot assignments that
//! reference those positions. Its output is untrusted: every item is
//! bounds-checked against the exact request it answers, and items that
//! fail are rejected individually rather than failing the whole schedule.

use chrono::{Datelike, Duration};
use serde::{Deserialize, Serialize};

use crate::catalog::Lesson;
use crate::error::CoreError;
use crate::preferences::{OnboardingPreferences, SkillLevel, StudyDay, TimeSlot};
use crate::types::Timestamp;

/// Lowest difficulty rating an assignment may carry.
pub const MIN_DIFFICULTY: i16 = 1;
/// Highest difficulty rating an assignment may carry.
pub const MAX_DIFFICULTY: i16 = 5;
/// Difficulty used when the oracle omits one.
pub const DEFAULT_DIFFICULTY: i16 = 3;

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// A lesson as presented to the oracle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestLesson {
    pub index: usize,
    pub title: String,
    pub duration_minutes: u32,
    pub difficulty: Option<SkillLevel>,
}

/// Everything the oracle needs to propose a schedule.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentRequest {
    pub skill_level: SkillLevel,
    pub hours_per_week: f64,
    pub target_weeks: u32,
    pub session_minutes: u32,
    pub sessions_per_week: u32,
    pub lessons: Vec<RequestLesson>,
    pub preferred_days: Vec<StudyDay>,
    pub preferred_time_slots: Vec<TimeSlot>,
    pub learning_style: Option<String>,
    pub pace: Option<String>,
}

impl AssignmentRequest {
    /// Build a request over `lessons`, indexing them in the given order.
    pub fn build(prefs: &OnboardingPreferences, lessons: &[Lesson]) -> Self {
        Self {
            skill_level: prefs.skill_level,
            hours_per_week: prefs.hours_per_week,
            target_weeks: prefs.target_weeks,
            session_minutes: prefs.session_minutes(),
            sessions_per_week: prefs.sessions_per_week(),
            lessons: lessons
                .iter()
                .enumerate()
                .map(|(index, lesson)| RequestLesson {
                    index,
                    title: lesson.title.clone(),
                    duration_minutes: lesson.duration_minutes,
                    difficulty: lesson.difficulty,
                })
                .collect(),
            preferred_days: prefs.preferred_days.clone(),
            preferred_time_slots: prefs.preferred_time_slots.clone(),
            learning_style: prefs.learning_style.clone(),
            pace: prefs.pace.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// One proposed session, as returned by the oracle.
///
/// Numeric fields are signed so that negative values survive parsing and
/// are rejected by validation instead of by the JSON decoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentItem {
    #[serde(alias = "lesson_index")]
    pub lesson_index: i64,
    #[serde(alias = "week_number")]
    pub week_number: i64,
    #[serde(alias = "dayOfWeek")]
    pub day: String,
    #[serde(alias = "time_slot")]
    pub time_slot: String,
    #[serde(default, alias = "estimated_duration")]
    pub estimated_duration: Option<i64>,
    #[serde(default, alias = "learning_objectives")]
    pub learning_objectives: Vec<String>,
    #[serde(default)]
    pub difficulty: Option<i64>,
}

/// Ordered list of proposed sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssignmentResponse {
    pub schedule: Vec<AssignmentItem>,
}

/// Parse oracle JSON. Accepts `{"schedule": [...]}` or a bare array.
pub fn parse_response(json: &str) -> Result<AssignmentResponse, CoreError> {
    let value: serde_json::Value = serde_json::from_str(json)
        .map_err(|e| CoreError::OracleResponse(format!("invalid JSON: {e}")))?;

    let items = match value {
        serde_json::Value::Array(items) => serde_json::Value::Array(items),
        serde_json::Value::Object(mut map) => map.remove("schedule").ok_or_else(|| {
            CoreError::OracleResponse("missing `schedule` array".to_string())
        })?,
        other => {
            return Err(CoreError::OracleResponse(format!(
                "expected object or array, got {other}"
            )))
        }
    };

    let schedule: Vec<AssignmentItem> = serde_json::from_value(items)
        .map_err(|e| CoreError::OracleResponse(format!("invalid schedule item: {e}")))?;
    Ok(AssignmentResponse { schedule })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Why a single oracle item was dropped.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RejectionReason {
    #[error("lesson index {index} out of range for {len} lessons")]
    LessonIndexOutOfRange { index: i64, len: usize },
    #[error("week {week} outside 1..={target_weeks}")]
    WeekOutOfRange { week: i64, target_weeks: u32 },
    #[error("unknown weekday {0:?}")]
    UnknownDay(String),
    #[error("weekday {} is not a preferred day", .0.as_str())]
    DayNotPreferred(StudyDay),
    #[error("unknown time slot {0:?}")]
    UnknownTimeSlot(String),
    #[error("time slot {} is not a preferred slot", .0.as_str())]
    TimeSlotNotPreferred(TimeSlot),
    #[error("week {week} cannot be placed on the calendar")]
    UnresolvableDate { week: u32 },
}

/// An oracle item that passed validation, bound to its lesson.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedAssignment {
    pub lesson: Lesson,
    pub week_number: u32,
    pub day: StudyDay,
    pub time_slot: TimeSlot,
    /// Absolute start of the session, see [`resolve_date`].
    pub scheduled_date: Timestamp,
    pub duration_minutes: u32,
    pub learning_objectives: Vec<String>,
    pub difficulty: i16,
}

/// An oracle item that failed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedAssignment {
    /// Position of the item in the oracle's schedule list.
    pub position: usize,
    pub reason: RejectionReason,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssignmentValidation {
    pub accepted: Vec<ValidatedAssignment>,
    pub rejected: Vec<RejectedAssignment>,
}

/// Validate `response` against the `request` it answers, resolving each
/// accepted item's date relative to `now`.
///
/// `lessons` must be the list the request was built from; a length
/// mismatch means the pairing is stale and is reported as an internal
/// error rather than risking a mis-mapped schedule.
pub fn validate_response(
    request: &AssignmentRequest,
    lessons: &[Lesson],
    response: &AssignmentResponse,
    now: Timestamp,
) -> Result<AssignmentValidation, CoreError> {
    if request.lessons.len() != lessons.len() {
        return Err(CoreError::Internal(format!(
            "assignment request has {} lessons but {} were supplied",
            request.lessons.len(),
            lessons.len()
        )));
    }

    let mut validation = AssignmentValidation::default();
    for (position, item) in response.schedule.iter().enumerate() {
        match validate_item(request, lessons, item, now) {
            Ok(accepted) => validation.accepted.push(accepted),
            Err(reason) => validation
                .rejected
                .push(RejectedAssignment { position, reason }),
        }
    }
    Ok(validation)
}

fn validate_item(
    request: &AssignmentRequest,
    lessons: &[Lesson],
    item: &AssignmentItem,
    now: Timestamp,
) -> Result<ValidatedAssignment, RejectionReason> {
    let lesson = usize::try_from(item.lesson_index)
        .ok()
        .and_then(|index| lessons.get(index))
        .ok_or(RejectionReason::LessonIndexOutOfRange {
            index: item.lesson_index,
            len: lessons.len(),
        })?;

    let week_number = u32::try_from(item.week_number)
        .ok()
        .filter(|week| (1..=request.target_weeks).contains(week))
        .ok_or(RejectionReason::WeekOutOfRange {
            week: item.week_number,
            target_weeks: request.target_weeks,
        })?;

    let day = StudyDay::parse(&item.day)
        .ok_or_else(|| RejectionReason::UnknownDay(item.day.clone()))?;
    if !request.preferred_days.contains(&day) {
        return Err(RejectionReason::DayNotPreferred(day));
    }

    let time_slot = TimeSlot::parse(&item.time_slot)
        .ok_or_else(|| RejectionReason::UnknownTimeSlot(item.time_slot.clone()))?;
    if !request.preferred_time_slots.contains(&time_slot) {
        return Err(RejectionReason::TimeSlotNotPreferred(time_slot));
    }

    let scheduled_date = resolve_date(now, week_number, day, time_slot)
        .ok_or(RejectionReason::UnresolvableDate { week: week_number })?;

    let duration_minutes = item
        .estimated_duration
        .and_then(|d| u32::try_from(d).ok())
        .filter(|d| *d > 0)
        .unwrap_or(request.session_minutes);

    let difficulty = item
        .difficulty
        .map(|d| d.clamp(i64::from(MIN_DIFFICULTY), i64::from(MAX_DIFFICULTY)) as i16)
        .unwrap_or(DEFAULT_DIFFICULTY);

    Ok(ValidatedAssignment {
        lesson: lesson.clone(),
        week_number,
        day,
        time_slot,
        scheduled_date,
        duration_minutes,
        learning_objectives: item.learning_objectives.clone(),
        difficulty,
    })
}

// ---------------------------------------------------------------------------
// Date resolution
// ---------------------------------------------------------------------------

/// Resolve (week, weekday, slot) into an absolute UTC timestamp.
///
/// The week starts `(week_number - 1) * 7` days after `now`; the date then
/// moves forward (never backward, at most six days) to the requested
/// weekday, and the time is set to the slot's start hour on the hour.
///
/// The hour is set on the resolved calendar day, so in week 1 a slot that
/// started earlier today resolves to a moment before `now`.
///
/// Returns `None` when the date falls outside the representable range.
pub fn resolve_date(
    now: Timestamp,
    week_number: u32,
    day: StudyDay,
    slot: TimeSlot,
) -> Option<Timestamp> {
    let week_offset = Duration::try_days(i64::from(week_number.saturating_sub(1)) * 7)?;
    let week_start = now.checked_add_signed(week_offset)?;
    let current = i64::from(week_start.weekday().num_days_from_monday());
    let target = i64::from(day.weekday().num_days_from_monday());
    let days_to_add = (target - current + 7) % 7;

    let day_start = week_start.checked_add_signed(Duration::days(days_to_add))?;
    Some(day_start.date_naive().and_time(slot.start_time()).and_utc())
}
