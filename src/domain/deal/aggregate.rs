//! Deal aggregate - a sales opportunity and its latest forecast.

use chrono::NaiveDate;
use serde::Serialize;

use super::{DealStage, StampedPrediction, TurningPointPrediction};
use crate::domain::foundation::{DealId, ValidationError};

/// Frozen view of the deal fields the critique needs.
///
/// Captured when an interaction is submitted so later deal updates do not
/// leak into an in-flight critique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DealContext {
    pub client_name: String,
    pub stage: DealStage,
    pub value: u64,
}

/// A sales opportunity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deal {
    id: DealId,
    client_name: String,
    contact_person: String,
    value: u64,
    stage: DealStage,
    start_date: NaiveDate,
    last_activity: NaiveDate,
    prediction: Option<StampedPrediction>,
}

impl Deal {
    /// Creates a deal at intake. Last activity starts at the start date.
    pub fn new(
        id: DealId,
        client_name: impl Into<String>,
        contact_person: impl Into<String>,
        value: u64,
        stage: DealStage,
        start_date: NaiveDate,
    ) -> Result<Self, ValidationError> {
        let client_name = client_name.into();
        if client_name.trim().is_empty() {
            return Err(ValidationError::empty_field("client_name"));
        }

        Ok(Self {
            id,
            client_name,
            contact_person: contact_person.into(),
            value,
            stage,
            start_date,
            last_activity: start_date,
            prediction: None,
        })
    }

    pub fn id(&self) -> &DealId {
        &self.id
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    pub fn contact_person(&self) -> &str {
        &self.contact_person
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn stage(&self) -> DealStage {
        self.stage
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn last_activity(&self) -> NaiveDate {
        self.last_activity
    }

    /// Returns the live forecast, if one has been merged.
    pub fn prediction(&self) -> Option<&TurningPointPrediction> {
        self.prediction.as_ref().map(|p| &p.prediction)
    }

    /// Returns the completion stamp of the live forecast.
    pub fn prediction_seq(&self) -> Option<u64> {
        self.prediction.as_ref().map(|p| p.completion_seq)
    }

    /// Snapshot of the fields used as critique context.
    pub fn context(&self) -> DealContext {
        DealContext {
            client_name: self.client_name.clone(),
            stage: self.stage,
            value: self.value,
        }
    }

    /// Records client activity on `date`. Never moves last activity backwards.
    pub fn record_activity(&mut self, date: NaiveDate) {
        if date > self.last_activity {
            self.last_activity = date;
        }
    }

    /// Replaces the live forecast wholesale.
    ///
    /// Applies only when `completion_seq` is newer than the stored stamp;
    /// returns whether the replacement happened.
    pub fn replace_prediction(
        &mut self,
        prediction: TurningPointPrediction,
        completion_seq: u64,
    ) -> bool {
        if let Some(current) = self.prediction_seq() {
            if completion_seq <= current {
                return false;
            }
        }
        self.prediction = Some(StampedPrediction {
            prediction,
            completion_seq,
        });
        true
    }
}
