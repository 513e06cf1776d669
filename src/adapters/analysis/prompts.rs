//! Prompt and schema assembly for the critique and forecast calls.

use serde_json::{json, Value};

use crate::ports::{CritiqueRequest, ForecastRequest};

/// Persona and output rules for "The Critic".
pub const CRITIC_SYSTEM_PROMPT: &str = r#"You are "The Critic", a ruthless sales director with twenty years in the field.
You are not a helpful assistant. You are a strict mentor reviewing a rep's log of a client contact.

Look for the flaws:
1. Did the rep ignore the client's subtext?
2. Did the rep reveal leverage before getting a budget commitment?
3. Is the next step passive ("waiting to hear back")?

Output rules:
- critical_score: integer 1-10 (1 = fired, 10 = flawless). Be harsh; most logs land at 4-6.
- mistakes: the specific tactical errors, most damaging first, no repeats.
- immediate_action: ONE concrete thing to do right now to recover."#;

/// Persona and output rules for "The Oracle".
pub const ORACLE_SYSTEM_PROMPT: &str = r#"You are "The Oracle", an analyst who predicts sales outcomes from behavioral patterns.

Read the interaction timeline for three signals:
1. Velocity delta: is the gap between responses growing (bad) or shrinking (good)?
2. Stakeholder depth: is the conversation moving from technicians to decision-makers?
3. Tone shift: are questions turning technical (stalling) or contractual (buying)?

Predict the turning point. This is NOT the close date; it is the date of the next deal-maker or
deal-breaker event (budget committee review, legal redline).

Calibration:
- Slowing communication with junior stakeholders means a low probability.
- Resolved technical objections with legal involved means a high probability.

Output rules:
- win_probability: integer 0-100.
- turning_point_date: YYYY-MM-DD.
- reasoning: concise analysis of velocity, stakeholders and tone.
- risk_factors: the top two or three hidden risks."#;

/// Renders the user payload for a critique.
pub fn critique_payload(request: &CritiqueRequest) -> String {
    format!(
        "Context:\nClient: {}\nStage: {}\nDeal Value: ${}\n\nNew Interaction ({}):\n\"{}\"",
        request.context.client_name,
        request.context.stage,
        request.context.value,
        request.kind,
        request.content
    )
}

/// Renders the user payload for a forecast: deal profile then the full
/// timeline, oldest first.
pub fn forecast_payload(request: &ForecastRequest) -> String {
    let timeline = if request.history().is_empty() {
        "(no interactions logged yet)".to_string()
    } else {
        request
            .history()
            .iter()
            .map(|i| {
                format!(
                    "[Date: {}] [Type: {}] Content: {}",
                    i.date().format("%Y-%m-%d"),
                    i.kind(),
                    i.content()
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    format!(
        "Client Profile:\nName: {}\nCurrent Stage: {}\nValue: ${}\n\nInteraction History (Timeline):\n{}",
        request.deal.client_name(),
        request.deal.stage(),
        request.deal.value(),
        timeline
    )
}

/// JSON schema of an `AiReflection`.
pub fn reflection_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "critical_score": {
                "type": "integer",
                "description": "Score from 1-10 indicating quality of execution"
            },
            "mistakes": {
                "type": "array",
                "items": {"type": "string"},
                "description": "List of tactical errors or missed subtext"
            },
            "immediate_action": {
                "type": "string",
                "description": "The single most important next step to recover leverage"
            }
        },
        "required": ["critical_score", "mistakes", "immediate_action"]
    })
}

/// JSON schema of a `TurningPointPrediction`.
pub fn prediction_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "turning_point_date": {
                "type": "string",
                "description": "YYYY-MM-DD. The date the next major pivot will occur."
            },
            "win_probability": {
                "type": "integer",
                "description": "0-100"
            },
            "reasoning": {
                "type": "string",
                "description": "Concise analysis of velocity, stakeholders, and tone."
            },
            "risk_factors": {
                "type": "array",
                "items": {"type": "string"},
                "description": "Top 2-3 hidden risks."
            }
        },
        "required": ["turning_point_date", "win_probability", "reasoning", "risk_factors"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::deal::{Deal, DealStage};
    use crate::domain::foundation::{DealId, InteractionId, Timestamp};
    use crate::domain::interaction::{Interaction, InteractionType};
    use chrono::NaiveDate;

    fn acme() -> Deal {
        Deal::new(
            DealId::new("1").unwrap(),
            "Acme Corp",
            "Wile E. Coyote",
            150_000,
            DealStage::Negotiation,
            NaiveDate::from_ymd_opt(2023, 10, 15).unwrap(),
        )
        .unwrap()
    }

    fn logged(millis: i64, kind: InteractionType, content: &str) -> Interaction {
        let created_at = Timestamp::from_unix_millis(millis).unwrap();
        Interaction::new(
            InteractionId::new(),
            DealId::new("1").unwrap(),
            created_at.date(),
            kind,
            content,
            created_at,
        )
        .unwrap()
    }

    #[test]
    fn critique_payload_embeds_context_and_log() {
        let interaction = logged(1_700_438_400_000, InteractionType::Call, "No budget discussed.");
        let request = CritiqueRequest::for_interaction(&interaction, acme().context());

        let payload = critique_payload(&request);
        assert!(payload.contains("Client: Acme Corp"));
        assert!(payload.contains("Stage: NEGOTIATION"));
        assert!(payload.contains("Deal Value: $150000"));
        assert!(payload.contains("New Interaction (CALL):"));
        assert!(payload.contains("\"No budget discussed.\""));
    }

    #[test]
    fn forecast_payload_lists_timeline_oldest_first() {
        let request = ForecastRequest::new(
            acme(),
            vec![
                logged(1_700_438_400_000, InteractionType::Meeting, "Demo of the Anvil."),
                logged(1_697_328_000_000, InteractionType::Email, "Initial outreach."),
            ],
        );

        let payload = forecast_payload(&request);
        let first = payload.find("Initial outreach.").unwrap();
        let second = payload.find("Demo of the Anvil.").unwrap();
        assert!(first < second);
        assert!(payload.contains("[Date: 2023-10-15] [Type: EMAIL] Content: Initial outreach."));
        assert!(payload.contains("Current Stage: NEGOTIATION"));
    }

    #[test]
    fn forecast_payload_marks_empty_history() {
        let request = ForecastRequest::new(acme(), vec![]);
        assert!(forecast_payload(&request).contains("(no interactions logged yet)"));
    }

    #[test]
    fn schemas_require_every_field() {
        assert_eq!(reflection_schema()["required"].as_array().unwrap().len(), 3);
        assert_eq!(prediction_schema()["required"].as_array().unwrap().len(), 4);
        assert_eq!(prediction_schema()["properties"]["win_probability"]["type"], "integer");
    }
}
