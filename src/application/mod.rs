//! Application layer - the orchestration engine and its state.
//!
//! The engine owns a [`PipelineStore`], dispatches critiques and forecasts
//! through the [`AnalysisGateway`](crate::ports::AnalysisGateway) port, and
//! publishes [`PipelineSnapshot`]s for the presentation boundary.

mod engine;
mod seed;
mod snapshot;
mod store;

pub use engine::{ForecastReceipt, LogInteractionCommand, LogReceipt, OrchestrationEngine};
pub use seed::{DealSeed, InteractionSeed, PipelineSeed, ReflectionSeed, SeedError};
pub use snapshot::{BusyFlags, PipelineSnapshot};
pub use store::PipelineStore;
