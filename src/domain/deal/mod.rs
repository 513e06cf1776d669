//! Deal module - sales opportunities and their forecasts.

mod aggregate;
mod prediction;
mod stage;

pub use aggregate::{Deal, DealContext};
pub use prediction::{
    StampedPrediction, TurningPointPrediction, WinProbability, FALLBACK_FORECAST_REASONING,
    FALLBACK_FORECAST_RISK,
};
pub use stage::DealStage;
