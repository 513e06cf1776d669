//! PipelineStore - the single owner of deal and interaction state.
//!
//! All mutation goes through these methods so the invariants on deals
//! and interactions hold no matter which command drives them:
//!
//! - interactions always reference a known deal
//! - feedback is attached once, to the interaction with the given id only
//! - a forecast is replaced wholesale and only by a newer completion
//! - creation timestamps are strictly increasing

use chrono::NaiveDate;

use super::snapshot::{BusyFlags, PipelineSnapshot};
use crate::domain::deal::{Deal, TurningPointPrediction};
use crate::domain::foundation::{DealId, DomainError, ErrorCode, InteractionId, Timestamp};
use crate::domain::interaction::{AiReflection, Interaction};

/// In-memory collections of deals and interactions plus the active-deal pointer.
#[derive(Debug, Default)]
pub struct PipelineStore {
    deals: Vec<Deal>,
    interactions: Vec<Interaction>,
    active_deal: Option<DealId>,
    last_created_at: Option<Timestamp>,
    completion_seq: u64,
}

impl PipelineStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a deal at intake.
    pub fn add_deal(&mut self, deal: Deal) -> Result<(), DomainError> {
        if self.deal(deal.id()).is_some() {
            return Err(DomainError::new(ErrorCode::DuplicateDeal, "Deal already exists")
                .with_detail("deal_id", deal.id().to_string()));
        }
        self.deals.push(deal);
        Ok(())
    }

    /// Adds an interaction and records the activity on its deal.
    pub fn add_interaction(&mut self, interaction: Interaction) -> Result<(), DomainError> {
        if self.interaction(interaction.id()).is_some() {
            return Err(DomainError::new(
                ErrorCode::DuplicateInteraction,
                "Interaction already exists",
            )
            .with_detail("interaction_id", interaction.id().to_string()));
        }

        let deal = self.deal_mut(interaction.deal_id())?;
        deal.record_activity(interaction.date());

        if self
            .last_created_at
            .map_or(true, |last| interaction.created_at().is_after(&last))
        {
            self.last_created_at = Some(interaction.created_at());
        }
        self.interactions.push(interaction);
        Ok(())
    }

    /// Returns all deals in intake order.
    pub fn deals(&self) -> &[Deal] {
        &self.deals
    }

    /// Looks up a deal.
    pub fn deal(&self, id: &DealId) -> Option<&Deal> {
        self.deals.iter().find(|d| d.id() == id)
    }

    fn deal_mut(&mut self, id: &DealId) -> Result<&mut Deal, DomainError> {
        self.deals
            .iter_mut()
            .find(|d| d.id() == id)
            .ok_or_else(|| {
                DomainError::new(ErrorCode::DealNotFound, "Deal not found")
                    .with_detail("deal_id", id.to_string())
            })
    }

    /// Looks up an interaction.
    pub fn interaction(&self, id: InteractionId) -> Option<&Interaction> {
        self.interactions.iter().find(|i| i.id() == id)
    }

    /// Points the active deal at `id`. Unknown ids leave the pointer unchanged.
    pub fn select(&mut self, id: &DealId) -> bool {
        if self.deal(id).is_none() {
            return false;
        }
        self.active_deal = Some(id.clone());
        true
    }

    /// Returns the active deal id, if it still resolves.
    pub fn active_deal_id(&self) -> Option<&DealId> {
        self.active_deal
            .as_ref()
            .filter(|id| self.deal(id).is_some())
    }

    /// Timestamp for the next interaction, strictly after every stored one.
    pub fn next_created_at(&self) -> Timestamp {
        Timestamp::now_after(self.last_created_at)
    }

    /// Full history of a deal, oldest first.
    pub fn history(&self, deal_id: &DealId) -> Vec<Interaction> {
        let mut history: Vec<Interaction> = self
            .interactions
            .iter()
            .filter(|i| i.deal_id() == deal_id)
            .cloned()
            .collect();
        history.sort_by_key(|i| i.created_at());
        history
    }

    /// Timeline of a deal, newest first.
    pub fn timeline(&self, deal_id: &DealId) -> Vec<Interaction> {
        let mut timeline = self.history(deal_id);
        timeline.reverse();
        timeline
    }

    /// Attaches a critique to the interaction with `id`.
    pub fn attach_feedback(
        &mut self,
        id: InteractionId,
        feedback: AiReflection,
    ) -> Result<(), DomainError> {
        let interaction = self
            .interactions
            .iter_mut()
            .find(|i| i.id() == id)
            .ok_or_else(|| {
                DomainError::new(ErrorCode::InteractionNotFound, "Interaction not found")
                    .with_detail("interaction_id", id.to_string())
            })?;
        interaction.attach_feedback(feedback)
    }

    /// Merges a completed forecast into its deal.
    ///
    /// Each merge takes the next completion sequence number, so the most
    /// recently completed forecast is the one left standing. Returns the
    /// stamp assigned.
    pub fn merge_prediction(
        &mut self,
        deal_id: &DealId,
        prediction: TurningPointPrediction,
    ) -> Result<u64, DomainError> {
        let seq = self.completion_seq + 1;
        let deal = self.deal_mut(deal_id)?;
        deal.replace_prediction(prediction, seq);
        self.completion_seq = seq;
        Ok(seq)
    }

    /// Read-only view for the presentation boundary.
    pub fn snapshot(&self, busy: BusyFlags) -> PipelineSnapshot {
        let active_deal_id = self.active_deal_id().cloned();
        let timeline = active_deal_id
            .as_ref()
            .map(|id| self.timeline(id))
            .unwrap_or_default();

        PipelineSnapshot {
            deals: self.deals.clone(),
            active_deal_id,
            timeline,
            busy,
        }
    }

    /// Today's calendar date (UTC), used as the occurrence date of new logs.
    pub fn today() -> NaiveDate {
        Timestamp::now().date()
    }
}
