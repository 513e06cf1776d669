//! Interaction entity - a timestamped record of client contact.

use chrono::NaiveDate;
use serde::Serialize;

use super::{AiReflection, InteractionType};
use crate::domain::foundation::{
    DealId, DomainError, ErrorCode, InteractionId, Timestamp, ValidationError,
};

/// A logged client interaction.
///
/// Everything except `ai_feedback` is fixed at construction. Feedback
/// starts absent (pending) and is attached at most once (resolved).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Interaction {
    id: InteractionId,
    deal_id: DealId,
    date: NaiveDate,
    #[serde(rename = "type")]
    kind: InteractionType,
    content: String,
    created_at: Timestamp,
    ai_feedback: Option<AiReflection>,
}

impl Interaction {
    /// Creates an interaction with no feedback. Content must not be blank.
    ///
    /// Whether `deal_id` refers to a known deal is checked by the store
    /// that accepts the interaction.
    pub fn new(
        id: InteractionId,
        deal_id: DealId,
        date: NaiveDate,
        kind: InteractionType,
        content: impl Into<String>,
        created_at: Timestamp,
    ) -> Result<Self, ValidationError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(ValidationError::empty_field("content"));
        }

        Ok(Self {
            id,
            deal_id,
            date,
            kind,
            content,
            created_at,
            ai_feedback: None,
        })
    }

    pub fn id(&self) -> InteractionId {
        self.id
    }

    pub fn deal_id(&self) -> &DealId {
        &self.deal_id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn kind(&self) -> InteractionType {
        self.kind
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn ai_feedback(&self) -> Option<&AiReflection> {
        self.ai_feedback.as_ref()
    }

    /// Returns true while the critique has not been attached.
    pub fn is_pending(&self) -> bool {
        self.ai_feedback.is_none()
    }

    /// Attaches the critique. Fails if one is already attached.
    pub fn attach_feedback(&mut self, feedback: AiReflection) -> Result<(), DomainError> {
        if self.ai_feedback.is_some() {
            return Err(DomainError::new(
                ErrorCode::FeedbackAlreadyAttached,
                "Interaction already has feedback",
            )
            .with_detail("interaction_id", self.id.to_string()));
        }
        self.ai_feedback = Some(feedback);
        Ok(())
    }
}
