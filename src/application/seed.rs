//! PipelineSeed - YAML intake of deals and historical interactions.
//!
//! Seeded records go through the same domain constructors as live ones,
//! so a seed file cannot smuggle in an out-of-range score or an
//! interaction for a deal that does not exist.

use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use super::store::PipelineStore;
use crate::domain::deal::{Deal, DealStage};
use crate::domain::foundation::{DealId, DomainError, InteractionId, Timestamp, ValidationError};
use crate::domain::interaction::{AiReflection, CriticalScore, Interaction, InteractionType};

/// Errors raised while loading a seed.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse seed: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid seed record: {0}")]
    Domain(#[from] DomainError),
}

impl From<ValidationError> for SeedError {
    fn from(err: ValidationError) -> Self {
        SeedError::Domain(err.into())
    }
}

/// Top-level seed document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PipelineSeed {
    #[serde(default)]
    pub deals: Vec<DealSeed>,
    #[serde(default)]
    pub interactions: Vec<InteractionSeed>,
    /// Deal selected after loading. Defaults to the first deal.
    #[serde(default)]
    pub active_deal: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DealSeed {
    pub id: String,
    pub client_name: String,
    #[serde(default)]
    pub contact_person: String,
    pub value: u64,
    pub stage: DealStage,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub last_activity: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InteractionSeed {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub deal_id: String,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: InteractionType,
    pub content: String,
    /// Creation time in unix milliseconds.
    pub created_at: i64,
    #[serde(default)]
    pub ai_feedback: Option<ReflectionSeed>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReflectionSeed {
    pub critical_score: i64,
    pub mistakes: Vec<String>,
    pub immediate_action: String,
}

impl PipelineSeed {
    /// Parses a seed from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SeedError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Reads and parses a seed file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SeedError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&text)
    }

    /// Validates every record and builds a populated store.
    pub fn into_store(self) -> Result<PipelineStore, SeedError> {
        let mut store = PipelineStore::new();

        for seed in self.deals {
            let mut deal = Deal::new(
                DealId::new(seed.id)?,
                seed.client_name,
                seed.contact_person,
                seed.value,
                seed.stage,
                seed.start_date,
            )?;
            if let Some(last_activity) = seed.last_activity {
                deal.record_activity(last_activity);
            }
            store.add_deal(deal)?;
        }

        for seed in self.interactions {
            let created_at = Timestamp::from_unix_millis(seed.created_at).ok_or_else(|| {
                ValidationError::invalid_format("created_at", "not a valid unix timestamp")
            })?;
            let id = seed
                .id
                .map(InteractionId::from_uuid)
                .unwrap_or_default();

            let mut interaction = Interaction::new(
                id,
                DealId::new(seed.deal_id)?,
                seed.date,
                seed.kind,
                seed.content,
                created_at,
            )?;
            if let Some(feedback) = seed.ai_feedback {
                interaction.attach_feedback(AiReflection::new(
                    CriticalScore::try_new(feedback.critical_score)?,
                    feedback.mistakes,
                    feedback.immediate_action,
                )?)?;
            }
            store.add_interaction(interaction)?;
        }

        let active = match self.active_deal {
            Some(id) => Some(DealId::new(id)?),
            None => store.deals().first().map(|d| d.id().clone()),
        };
        if let Some(id) = active {
            store.select(&id);
        }

        info!(deals = store.deals().len(), "Pipeline seeded");
        Ok(store)
    }
}
