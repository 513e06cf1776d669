//! AnalysisGateway port - the two derived artifacts the engine asks for.
//!
//! Both operations are total: implementations absorb every transport,
//! decode and validation failure and return the documented fallback value
//! instead. The engine therefore has no failure branch for these calls.
//!
//! Implementations never touch shared state; they map inputs to a value
//! that the engine merges.

use async_trait::async_trait;

use crate::domain::deal::{Deal, DealContext, TurningPointPrediction};
use crate::domain::foundation::{DealId, InteractionId};
use crate::domain::interaction::{AiReflection, Interaction, InteractionType};

/// Input for a critique of a single interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CritiqueRequest {
    pub deal_id: DealId,
    pub interaction_id: InteractionId,
    pub content: String,
    pub kind: InteractionType,
    /// Deal fields frozen at submission time.
    pub context: DealContext,
}

impl CritiqueRequest {
    /// Builds a request for `interaction` against the given deal snapshot.
    pub fn for_interaction(interaction: &Interaction, context: DealContext) -> Self {
        Self {
            deal_id: interaction.deal_id().clone(),
            interaction_id: interaction.id(),
            content: interaction.content().to_string(),
            kind: interaction.kind(),
            context,
        }
    }
}

/// Input for a turning-point forecast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastRequest {
    pub deal: Deal,
    history: Vec<Interaction>,
}

impl ForecastRequest {
    /// Builds a request; history is ordered oldest first by creation time.
    pub fn new(deal: Deal, mut history: Vec<Interaction>) -> Self {
        history.sort_by_key(|i| i.created_at());
        Self { deal, history }
    }

    /// Full interaction history, oldest first.
    pub fn history(&self) -> &[Interaction] {
        &self.history
    }
}

/// Capability interface for critique and forecast.
#[async_trait]
pub trait AnalysisGateway: Send + Sync {
    /// "The Critic": reviews one interaction. Never fails.
    async fn critique(&self, request: &CritiqueRequest) -> AiReflection;

    /// "The Oracle": predicts the deal's next pivotal moment. Never fails.
    async fn forecast(&self, request: &ForecastRequest) -> TurningPointPrediction;
}
