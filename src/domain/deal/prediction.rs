//! Turning-point forecast value objects ("The Oracle").

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

use crate::domain::foundation::ValidationError;

/// Reasoning reported when the forecast service could not produce a result.
pub const FALLBACK_FORECAST_REASONING: &str =
    "Insufficient data or API error for trajectory analysis.";

/// Risk factor reported when the forecast service could not produce a result.
pub const FALLBACK_FORECAST_RISK: &str = "Data connectivity lost";

/// Probability of winning a deal, 0-100 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct WinProbability(u8);

impl WinProbability {
    /// Neutral coin-flip probability.
    pub const EVEN: Self = Self(50);

    /// Creates a WinProbability, returning error if out of range.
    pub fn try_new(value: i64) -> Result<Self, ValidationError> {
        if !(0..=100).contains(&value) {
            return Err(ValidationError::out_of_range("win_probability", 0, 100, value));
        }
        Ok(Self(value as u8))
    }

    /// Returns the value as u8.
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for WinProbability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Forecast of a deal's next make-or-break moment.
///
/// The turning point is not the close date; it is the next event that
/// decides the deal (budget committee, legal redline). The date may lie
/// in the past when the history suggests the moment already happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurningPointPrediction {
    win_probability: WinProbability,
    turning_point_date: NaiveDate,
    reasoning: String,
    risk_factors: Vec<String>,
}

impl TurningPointPrediction {
    /// Creates a prediction, rejecting blank reasoning or blank risk factors.
    pub fn new(
        win_probability: WinProbability,
        turning_point_date: NaiveDate,
        reasoning: impl Into<String>,
        risk_factors: Vec<String>,
    ) -> Result<Self, ValidationError> {
        let reasoning = reasoning.into();
        if reasoning.trim().is_empty() {
            return Err(ValidationError::empty_field("reasoning"));
        }
        if risk_factors.iter().any(|r| r.trim().is_empty()) {
            return Err(ValidationError::empty_field("risk_factors"));
        }
        Ok(Self {
            win_probability,
            turning_point_date,
            reasoning,
            risk_factors,
        })
    }

    /// Low-confidence forecast used when the analysis service fails.
    pub fn unavailable(today: NaiveDate) -> Self {
        Self {
            win_probability: WinProbability::EVEN,
            turning_point_date: today,
            reasoning: FALLBACK_FORECAST_REASONING.to_string(),
            risk_factors: vec![FALLBACK_FORECAST_RISK.to_string()],
        }
    }

    pub fn win_probability(&self) -> WinProbability {
        self.win_probability
    }

    pub fn turning_point_date(&self) -> NaiveDate {
        self.turning_point_date
    }

    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }

    pub fn risk_factors(&self) -> &[String] {
        &self.risk_factors
    }
}

/// A prediction together with the completion sequence number assigned
/// when it was merged into the deal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StampedPrediction {
    #[serde(flatten)]
    pub prediction: TurningPointPrediction,
    pub completion_seq: u64,
}
