//! Read-only views published to the presentation boundary.

use serde::Serialize;

use crate::domain::deal::Deal;
use crate::domain::foundation::DealId;
use crate::domain::interaction::Interaction;

/// Whether any critique or forecast is still in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BusyFlags {
    /// At least one critique has been dispatched and not yet merged.
    pub analyzing_log: bool,
    /// At least one forecast has been dispatched and not yet merged.
    pub predicting: bool,
}

/// Everything a view needs to render the pipeline.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineSnapshot {
    pub deals: Vec<Deal>,
    pub active_deal_id: Option<DealId>,
    /// Interactions of the active deal, newest first.
    pub timeline: Vec<Interaction>,
    pub busy: BusyFlags,
}

impl PipelineSnapshot {
    /// The active deal, if one is selected.
    pub fn active_deal(&self) -> Option<&Deal> {
        let id = self.active_deal_id.as_ref()?;
        self.deals.iter().find(|d| d.id() == id)
    }
}

/// Counts of outstanding analysis calls.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct InFlight {
    pub critiques: usize,
    pub forecasts: usize,
}

impl InFlight {
    pub fn flags(&self) -> BusyFlags {
        BusyFlags {
            analyzing_log: self.critiques > 0,
            predicting: self.forecasts > 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_follow_counts() {
        let mut in_flight = InFlight::default();
        assert_eq!(in_flight.flags(), BusyFlags::default());

        in_flight.critiques = 2;
        assert!(in_flight.flags().analyzing_log);
        assert!(!in_flight.flags().predicting);

        in_flight.critiques = 0;
        in_flight.forecasts = 1;
        assert!(in_flight.flags().predicting);
    }

    #[test]
    fn busy_flags_serialize_by_field_name() {
        let json = serde_json::to_value(BusyFlags {
            analyzing_log: true,
            predicting: false,
        })
        .unwrap();
        assert_eq!(json["analyzing_log"], true);
        assert_eq!(json["predicting"], false);
    }
}
