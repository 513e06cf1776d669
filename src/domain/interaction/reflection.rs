//! Critique value objects ("The Critic").

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

use crate::domain::foundation::ValidationError;

/// Mistakes reported when the critique service could not produce a result.
pub const FALLBACK_CRITIQUE_MISTAKES: [&str; 2] = [
    "AI service temporarily unavailable.",
    "Could not analyze leverage.",
];

/// Action reported when the critique service could not produce a result.
pub const FALLBACK_CRITIQUE_ACTION: &str = "Check internet connection and retry.";

/// Execution quality score: 1 (you are fired) to 10 (perfection).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CriticalScore(u8);

impl CriticalScore {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    /// Middle-of-the-road score used for fallbacks.
    pub const NEUTRAL: Self = Self(5);

    /// Creates a CriticalScore, returning error if out of range.
    pub fn try_new(value: i64) -> Result<Self, ValidationError> {
        if !(i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            return Err(ValidationError::out_of_range(
                "critical_score",
                i64::from(Self::MIN),
                i64::from(Self::MAX),
                value,
            ));
        }
        Ok(Self(value as u8))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for CriticalScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/10", self.0)
    }
}

/// Critical review of a single interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AiReflection {
    critical_score: CriticalScore,
    mistakes: Vec<String>,
    immediate_action: String,
}

impl AiReflection {
    /// Creates a reflection.
    ///
    /// Mistakes must be non-empty, individually non-blank and distinct;
    /// the immediate action must be non-blank.
    pub fn new(
        critical_score: CriticalScore,
        mistakes: Vec<String>,
        immediate_action: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        if mistakes.is_empty() {
            return Err(ValidationError::empty_field("mistakes"));
        }

        let mut seen = HashSet::new();
        for mistake in &mistakes {
            if mistake.trim().is_empty() {
                return Err(ValidationError::empty_field("mistakes"));
            }
            if !seen.insert(mistake.as_str()) {
                return Err(ValidationError::duplicate_entry("mistakes", mistake.clone()));
            }
        }

        let immediate_action = immediate_action.into();
        if immediate_action.trim().is_empty() {
            return Err(ValidationError::empty_field("immediate_action"));
        }

        Ok(Self {
            critical_score,
            mistakes,
            immediate_action,
        })
    }

    /// Low-confidence critique used when the analysis service fails.
    pub fn unavailable() -> Self {
        Self {
            critical_score: CriticalScore::NEUTRAL,
            mistakes: FALLBACK_CRITIQUE_MISTAKES
                .iter()
                .map(|m| m.to_string())
                .collect(),
            immediate_action: FALLBACK_CRITIQUE_ACTION.to_string(),
        }
    }

    pub fn critical_score(&self) -> CriticalScore {
        self.critical_score
    }

    pub fn mistakes(&self) -> &[String] {
        &self.mistakes
    }

    pub fn immediate_action(&self) -> &str {
        &self.immediate_action
    }
}
