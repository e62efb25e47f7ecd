//! Lesson catalog types and the skill-level filter.

use serde::{Deserialize, Serialize};

use crate::preferences::SkillLevel;
use crate::types::DbId;

/// A processed video lesson owned by the content catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: DbId,
    pub title: String,
    pub duration_minutes: u32,
    #[serde(default)]
    pub difficulty: Option<SkillLevel>,
    #[serde(default)]
    pub learning_objectives: Vec<String>,
    /// Lessons that must be studied before this one.
    #[serde(default)]
    pub prerequisites: Vec<DbId>,
}

/// Select the lessons appropriate for a student's skill level.
///
/// - `Beginner` keeps lessons tagged beginner or intermediate.
/// - `Intermediate` drops lessons tagged beginner (untagged lessons stay).
/// - `Advanced` keeps the full catalog; ordering advanced material first is
///   left to the oracle.
///
/// Catalog order is preserved.
pub fn filter_by_skill_level(lessons: &[Lesson], level: SkillLevel) -> Vec<Lesson> {
    lessons
        .iter()
        .filter(|lesson| match level {
            SkillLevel::Beginner => matches!(
                lesson.difficulty,
                Some(SkillLevel::Beginner) | Some(SkillLevel::Intermediate)
            ),
            SkillLevel::Intermediate => lesson.difficulty != Some(SkillLevel::Beginner),
            SkillLevel::Advanced => true,
        })
        .cloned()
        .collect()
}

/// Sum of lesson durations in minutes.
pub fn total_minutes(lessons: &[Lesson]) -> u64 {
    lessons.iter().map(|l| u64::from(l.duration_minutes)).sum()
}
