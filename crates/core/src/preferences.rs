//! Student availability preferences captured during onboarding.
//!
//! [`OnboardingPreferences`] is the immutable input to a calendar
//! generation. The enums here double as the vocabulary shared with the
//! scheduling oracle, so their wire names are stable.

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Skill level
// ---------------------------------------------------------------------------

/// Self-reported skill level, also used as a lesson difficulty tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl SkillLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    /// Parse a stored tag. Unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "beginner" => Some(Self::Beginner),
            "intermediate" => Some(Self::Intermediate),
            "advanced" => Some(Self::Advanced),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Study days
// ---------------------------------------------------------------------------

/// A weekday name as exchanged with the oracle (`"monday"` .. `"sunday"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudyDay {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl StudyDay {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monday => "monday",
            Self::Tuesday => "tuesday",
            Self::Wednesday => "wednesday",
            Self::Thursday => "thursday",
            Self::Friday => "friday",
            Self::Saturday => "saturday",
            Self::Sunday => "sunday",
        }
    }

    /// Case-insensitive parse of a full weekday name.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "monday" => Some(Self::Monday),
            "tuesday" => Some(Self::Tuesday),
            "wednesday" => Some(Self::Wednesday),
            "thursday" => Some(Self::Thursday),
            "friday" => Some(Self::Friday),
            "saturday" => Some(Self::Saturday),
            "sunday" => Some(Self::Sunday),
            _ => None,
        }
    }

    pub fn weekday(self) -> Weekday {
        match self {
            Self::Monday => Weekday::Mon,
            Self::Tuesday => Weekday::Tue,
            Self::Wednesday => Weekday::Wed,
            Self::Thursday => Weekday::Thu,
            Self::Friday => Weekday::Fri,
            Self::Saturday => Weekday::Sat,
            Self::Sunday => Weekday::Sun,
        }
    }

    pub fn from_weekday(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => Self::Monday,
            Weekday::Tue => Self::Tuesday,
            Weekday::Wed => Self::Wednesday,
            Weekday::Thu => Self::Thursday,
            Weekday::Fri => Self::Friday,
            Weekday::Sat => Self::Saturday,
            Weekday::Sun => Self::Sunday,
        }
    }
}

// ---------------------------------------------------------------------------
// Time slots
// ---------------------------------------------------------------------------

/// Preferred time of day. Each slot resolves to a fixed wall-clock hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeSlot {
    Morning,
    Afternoon,
    Evening,
    LateNight,
}

impl TimeSlot {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
            Self::LateNight => "late-night",
        }
    }

    /// Case-insensitive parse; accepts `late-night`, `late_night` and `latenight`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "morning" => Some(Self::Morning),
            "afternoon" => Some(Self::Afternoon),
            "evening" => Some(Self::Evening),
            "late-night" | "late_night" | "latenight" => Some(Self::LateNight),
            _ => None,
        }
    }

    /// Wall-clock hour a session in this slot starts at.
    pub fn start_hour(self) -> u32 {
        match self {
            Self::Morning => 9,
            Self::Afternoon => 14,
            Self::Evening => 19,
            Self::LateNight => 22,
        }
    }

    pub fn start_time(self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.start_hour(), 0, 0).unwrap_or(NaiveTime::MIN)
    }
}

// ---------------------------------------------------------------------------
// Session length
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionLength {
    Short,
    Medium,
    Long,
}

impl SessionLength {
    pub fn minutes(self) -> u32 {
        match self {
            Self::Short => 30,
            Self::Medium => 60,
            Self::Long => 90,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Medium => "medium",
            Self::Long => "long",
        }
    }
}

// ---------------------------------------------------------------------------
// Onboarding preferences
// ---------------------------------------------------------------------------

/// Longest study plan accepted at onboarding: ten years.
pub const MAX_TARGET_WEEKS: u32 = 520;

/// Availability and learning preferences for one calendar generation.
///
/// `learning_style` and `pace` are descriptive tags forwarded to the
/// oracle untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnboardingPreferences {
    pub skill_level: SkillLevel,
    pub target_weeks: u32,
    pub hours_per_week: f64,
    pub preferred_days: Vec<StudyDay>,
    pub preferred_time_slots: Vec<TimeSlot>,
    pub session_length: SessionLength,
    #[serde(default)]
    pub learning_style: Option<String>,
    #[serde(default)]
    pub pace: Option<String>,
}

impl OnboardingPreferences {
    /// Check the numeric and set constraints before any generation work.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.target_weeks < 1 {
            return Err(CoreError::Validation(
                "target_weeks must be at least 1".to_string(),
            ));
        }
        if self.target_weeks > MAX_TARGET_WEEKS {
            return Err(CoreError::Validation(format!(
                "target_weeks must be at most {MAX_TARGET_WEEKS}, got {}",
                self.target_weeks
            )));
        }
        if !self.hours_per_week.is_finite() || self.hours_per_week <= 0.0 {
            return Err(CoreError::Validation(format!(
                "hours_per_week must be a positive number, got {}",
                self.hours_per_week
            )));
        }
        if self.preferred_days.is_empty() {
            return Err(CoreError::Validation(
                "preferred_days must not be empty".to_string(),
            ));
        }
        if self.preferred_time_slots.is_empty() {
            return Err(CoreError::Validation(
                "preferred_time_slots must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn session_minutes(&self) -> u32 {
        self.session_length.minutes()
    }

    /// Whole sessions that fit in the weekly budget.
    pub fn sessions_per_week(&self) -> u32 {
        let minutes = self.session_minutes().max(1) as f64;
        (self.hours_per_week * 60.0 / minutes).floor().max(0.0) as u32
    }

    /// Date the student expects to finish, counted from `now`.
    ///
    /// Saturates at the latest representable instant.
    pub fn target_completion_date(&self, now: Timestamp) -> Timestamp {
        chrono::Duration::try_days(i64::from(self.target_weeks) * 7)
            .and_then(|offset| now.checked_add_signed(offset))
            .unwrap_or(chrono::DateTime::<chrono::Utc>::MAX_UTC)
    }
}
