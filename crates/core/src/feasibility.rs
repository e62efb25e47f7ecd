//! Timeline feasibility check run before any oracle call.
//!
//! Raw content time is inflated by a fixed buffer for practice, quizzes
//! and breaks, then compared against the hours the student has available
//! over the requested number of weeks.

use serde::Serialize;

use crate::catalog::{total_minutes, Lesson};
use crate::error::CoreError;
use crate::preferences::OnboardingPreferences;

/// Multiplier applied to raw content duration for study overhead.
pub const FEASIBILITY_BUFFER: f64 = 1.5;

/// Minutes per hour (60.0).
pub const MINUTES_PER_HOUR: f64 = 60.0;

/// Figures behind a feasibility decision, kept for display either way.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeasibilityReport {
    pub total_minutes: u64,
    /// Raw content hours, rounded up.
    pub total_hours: u32,
    /// Content hours including the buffer, rounded up.
    pub estimated_hours: u32,
    pub available_hours: f64,
    pub feasible: bool,
    /// Weeks needed at the stated weekly hours; only set when infeasible.
    pub suggested_weeks: Option<u32>,
}

/// Compute whether `lessons` fit into the student's stated availability.
///
/// Pure and deterministic. Never clamps: an infeasible result carries the
/// suggested number of weeks instead.
pub fn check_feasibility(lessons: &[Lesson], prefs: &OnboardingPreferences) -> FeasibilityReport {
    let total_minutes = total_minutes(lessons);
    let raw_hours = total_minutes as f64 / MINUTES_PER_HOUR;
    let total_hours = raw_hours.ceil() as u32;
    let estimated_hours = (raw_hours * FEASIBILITY_BUFFER).ceil() as u32;
    let available_hours = f64::from(prefs.target_weeks) * prefs.hours_per_week;

    let feasible = f64::from(estimated_hours) <= available_hours;
    let suggested_weeks = if feasible {
        None
    } else {
        Some((f64::from(estimated_hours) / prefs.hours_per_week).ceil() as u32)
    };

    FeasibilityReport {
        total_minutes,
        total_hours,
        estimated_hours,
        available_hours,
        feasible,
        suggested_weeks,
    }
}

/// Like [`check_feasibility`], but an infeasible timeline becomes
/// [`CoreError::TimelineInfeasible`].
pub fn ensure_feasible(
    lessons: &[Lesson],
    prefs: &OnboardingPreferences,
) -> Result<FeasibilityReport, CoreError> {
    let report = check_feasibility(lessons, prefs);
    match report.suggested_weeks {
        Some(suggested_weeks) if !report.feasible => Err(CoreError::TimelineInfeasible {
            estimated_hours: report.estimated_hours,
            available_hours: report.available_hours,
            suggested_weeks,
        }),
        _ => Ok(report),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::filter_by_skill_level;
    use crate::preferences::{SessionLength, SkillLevel, StudyDay, TimeSlot};
    use assert_matches::assert_matches;

    fn lesson(id: i64, minutes: u32, difficulty: SkillLevel) -> Lesson {
        Lesson {
            id,
            title: format!("Lesson {id}"),
            duration_minutes: minutes,
            difficulty: Some(difficulty),
            learning_objectives: vec![],
            prerequisites: vec![],
        }
    }

    fn catalog() -> Vec<Lesson> {
        vec![
            lesson(1, 45, SkillLevel::Beginner),
            lesson(2, 60, SkillLevel::Beginner),
            lesson(3, 90, SkillLevel::Intermediate),
        ]
    }

    fn prefs(hours_per_week: f64, target_weeks: u32) -> OnboardingPreferences {
        OnboardingPreferences {
            skill_level: SkillLevel::Beginner,
            target_weeks,
            hours_per_week,
            preferred_days: vec![StudyDay::Monday],
            preferred_time_slots: vec![TimeSlot::Morning],
            session_length: SessionLength::Medium,
            learning_style: None,
            pace: None,
        }
    }

    // -----------------------------------------------------------------------
    // Worked examples
    // -----------------------------------------------------------------------

    #[test]
    fn comfortable_timeline_is_feasible() {
        let p = prefs(10.0, 12);
        let lessons = filter_by_skill_level(&catalog(), p.skill_level);
        assert_eq!(lessons.len(), 3);

        let report = check_feasibility(&lessons, &p);
        assert_eq!(report.total_minutes, 195);
        assert_eq!(report.total_hours, 4);
        assert_eq!(report.estimated_hours, 5);
        assert_eq!(report.available_hours, 120.0);
        assert!(report.feasible);
        assert_eq!(report.suggested_weeks, None);
    }

    #[test]
    fn tight_timeline_suggests_more_weeks() {
        let report = check_feasibility(&catalog(), &prefs(1.0, 2));
        assert_eq!(report.available_hours, 2.0);
        assert_eq!(report.estimated_hours, 5);
        assert!(!report.feasible);
        assert_eq!(report.suggested_weeks, Some(5));
    }

    #[test]
    fn ensure_feasible_maps_rejection_to_error() {
        let err = ensure_feasible(&catalog(), &prefs(1.0, 2)).unwrap_err();
        assert_matches!(
            err,
            CoreError::TimelineInfeasible {
                estimated_hours: 5,
                suggested_weeks: 5,
                ..
            }
        );
    }

    #[test]
    fn exact_fit_is_feasible() {
        // estimated 5h, 5 weeks * 1h = 5h available
        assert!(check_feasibility(&catalog(), &prefs(1.0, 5)).feasible);
    }

    #[test]
    fn empty_lesson_set_is_trivially_feasible() {
        let report = check_feasibility(&[], &prefs(1.0, 1));
        assert_eq!(report.estimated_hours, 0);
        assert!(report.feasible);
    }

    // -----------------------------------------------------------------------
    // Monotonicity
    // -----------------------------------------------------------------------

    #[test]
    fn more_weeks_never_turns_acceptance_into_rejection() {
        let lessons = catalog();
        for hours in [0.5, 1.0, 1.5, 3.0] {
            let mut seen_feasible = false;
            for weeks in 1..=20 {
                let feasible = check_feasibility(&lessons, &prefs(hours, weeks)).feasible;
                if seen_feasible {
                    assert!(feasible, "hours={hours} weeks={weeks} regressed");
                }
                seen_feasible |= feasible;
            }
            assert!(seen_feasible, "hours={hours} never became feasible");
        }
    }
}
