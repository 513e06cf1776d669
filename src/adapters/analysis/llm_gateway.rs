//! AI-powered AnalysisGateway implementation.
//!
//! One remote attempt per call. Every failure (transport, truncated or
//! filtered output, malformed JSON, out-of-range values) collapses into the
//! fixed fallback value, so both operations are total.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use super::prompts::{
    critique_payload, forecast_payload, prediction_schema, reflection_schema,
    CRITIC_SYSTEM_PROMPT, ORACLE_SYSTEM_PROMPT,
};
use crate::domain::deal::{TurningPointPrediction, WinProbability};
use crate::domain::foundation::{DealId, Timestamp, ValidationError};
use crate::domain::interaction::{AiReflection, CriticalScore};
use crate::ports::{
    AIError, AIProvider, AnalysisGateway, AnalysisKind, CompletionRequest, CritiqueRequest,
    FinishReason, ForecastRequest, MessageRole, RequestMetadata,
};

/// Why a remote analysis was rejected.
#[derive(Debug, Error)]
pub enum AnalysisFailure {
    #[error("provider error: {0}")]
    Provider(#[from] AIError),

    #[error("response incomplete: finish reason {0:?}")]
    Incomplete(FinishReason),

    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("response out of contract: {0}")]
    OutOfContract(#[from] ValidationError),
}

#[derive(Debug, Deserialize)]
struct ReflectionPayload {
    critical_score: i64,
    mistakes: Vec<String>,
    immediate_action: String,
}

#[derive(Debug, Deserialize)]
struct PredictionPayload {
    win_probability: i64,
    turning_point_date: String,
    reasoning: String,
    risk_factors: Vec<String>,
}

/// Strips a surrounding markdown code fence, if any.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.strip_prefix("json").unwrap_or(rest);
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Decodes and validates a critique response body.
pub fn decode_reflection(raw: &str) -> Result<AiReflection, AnalysisFailure> {
    let payload: ReflectionPayload = serde_json::from_str(strip_code_fence(raw))?;
    let score = CriticalScore::try_new(payload.critical_score)?;
    Ok(AiReflection::new(
        score,
        payload.mistakes,
        payload.immediate_action,
    )?)
}

/// Decodes and validates a forecast response body.
pub fn decode_prediction(raw: &str) -> Result<TurningPointPrediction, AnalysisFailure> {
    let payload: PredictionPayload = serde_json::from_str(strip_code_fence(raw))?;
    let probability = WinProbability::try_new(payload.win_probability)?;
    let date = NaiveDate::parse_from_str(payload.turning_point_date.trim(), "%Y-%m-%d").map_err(
        |e| ValidationError::invalid_format("turning_point_date", e.to_string()),
    )?;
    Ok(TurningPointPrediction::new(
        probability,
        date,
        payload.reasoning,
        payload.risk_factors,
    )?)
}

/// Analysis gateway backed by a generative model.
pub struct LlmAnalysisGateway {
    ai_provider: Arc<dyn AIProvider>,
}

impl LlmAnalysisGateway {
    pub fn new(ai_provider: Arc<dyn AIProvider>) -> Self {
        Self { ai_provider }
    }

    fn metadata(deal_id: &DealId, kind: AnalysisKind) -> RequestMetadata {
        RequestMetadata::new(
            deal_id.clone(),
            kind,
            format!("{:?}-{}", kind, uuid::Uuid::new_v4()).to_lowercase(),
        )
    }

    /// Makes the single remote attempt and returns the raw body.
    async fn call(&self, request: CompletionRequest) -> Result<String, AnalysisFailure> {
        let trace_id = request.metadata.trace_id.clone();
        let response = self.ai_provider.complete(request).await?;

        debug!(
            trace_id = %trace_id,
            model = %response.model,
            "Analysis response received"
        );

        if response.finish_reason != FinishReason::Stop {
            return Err(AnalysisFailure::Incomplete(response.finish_reason));
        }
        Ok(response.content)
    }

    async fn try_critique(&self, request: &CritiqueRequest) -> Result<AiReflection, AnalysisFailure> {
        let completion = CompletionRequest::new(Self::metadata(
            &request.deal_id,
            AnalysisKind::Critique,
        ))
        .with_system_prompt(CRITIC_SYSTEM_PROMPT)
        .with_message(MessageRole::User, critique_payload(request))
        .with_response_schema(reflection_schema());

        let raw = self.call(completion).await?;
        decode_reflection(&raw)
    }

    async fn try_forecast(
        &self,
        request: &ForecastRequest,
    ) -> Result<TurningPointPrediction, AnalysisFailure> {
        let completion = CompletionRequest::new(Self::metadata(
            request.deal.id(),
            AnalysisKind::Forecast,
        ))
        .with_system_prompt(ORACLE_SYSTEM_PROMPT)
        .with_message(MessageRole::User, forecast_payload(request))
        .with_response_schema(prediction_schema());

        let raw = self.call(completion).await?;
        decode_prediction(&raw)
    }
}

#[async_trait]
impl AnalysisGateway for LlmAnalysisGateway {
    async fn critique(&self, request: &CritiqueRequest) -> AiReflection {
        match self.try_critique(request).await {
            Ok(reflection) => reflection,
            Err(err) => {
                warn!(
                    deal_id = %request.deal_id,
                    interaction_id = %request.interaction_id,
                    error = %err,
                    "Critique failed, using fallback"
                );
                AiReflection::unavailable()
            }
        }
    }

    async fn forecast(&self, request: &ForecastRequest) -> TurningPointPrediction {
        match self.try_forecast(request).await {
            Ok(prediction) => prediction,
            Err(err) => {
                warn!(
                    deal_id = %request.deal.id(),
                    history_len = request.history().len(),
                    error = %err,
                    "Forecast failed, using fallback"
                );
                TurningPointPrediction::unavailable(Timestamp::now().date())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockAIProvider, MockError, MockResponse};
    use crate::domain::deal::{Deal, DealStage};
    use crate::domain::foundation::{InteractionId, Timestamp};
    use crate::domain::interaction::{Interaction, InteractionType};
    use proptest::prelude::*;

    const GOOD_REFLECTION: &str = r#"{
        "critical_score": 3,
        "mistakes": ["Offered discount immediately.", "No clear call to action."],
        "immediate_action": "Send a follow-up on value."
    }"#;

    const GOOD_PREDICTION: &str = r#"{
        "win_probability": 72,
        "turning_point_date": "2024-02-14",
        "reasoning": "Legal is now involved.",
        "risk_factors": ["Budget freeze", "Competing vendor"]
    }"#;

    fn deal() -> Deal {
        Deal::new(
            DealId::new("2").unwrap(),
            "Stark Industries",
            "Pepper Potts",
            2_500_000,
            DealStage::Discovery,
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
        )
        .unwrap()
    }

    fn interaction() -> Interaction {
        let now = Timestamp::now();
        Interaction::new(
            InteractionId::new(),
            DealId::new("2").unwrap(),
            now.date(),
            InteractionType::Wechat,
            "Pepper asked about delivery timelines.",
            now,
        )
        .unwrap()
    }

    fn critique_request() -> CritiqueRequest {
        CritiqueRequest::for_interaction(&interaction(), deal().context())
    }

    fn gateway(provider: MockAIProvider) -> LlmAnalysisGateway {
        LlmAnalysisGateway::new(Arc::new(provider))
    }

    #[test]
    fn decode_reflection_accepts_valid_body() {
        let reflection = decode_reflection(GOOD_REFLECTION).unwrap();
        assert_eq!(reflection.critical_score().value(), 3);
        assert_eq!(reflection.mistakes().len(), 2);
    }

    #[test]
    fn decode_reflection_unwraps_code_fence() {
        let fenced = format!("```json\n{}\n```", GOOD_REFLECTION);
        assert!(decode_reflection(&fenced).is_ok());
    }

    #[test]
    fn decode_reflection_rejects_out_of_range_score() {
        let body = r#"{"critical_score": 11, "mistakes": ["x"], "immediate_action": "y"}"#;
        assert!(matches!(
            decode_reflection(body),
            Err(AnalysisFailure::OutOfContract(_))
        ));
    }

    #[test]
    fn decode_reflection_rejects_missing_key() {
        let body = r#"{"critical_score": 4, "mistakes": ["x"]}"#;
        assert!(matches!(decode_reflection(body), Err(AnalysisFailure::Malformed(_))));
    }

    #[test]
    fn decode_reflection_rejects_empty_mistakes() {
        let body = r#"{"critical_score": 4, "mistakes": [], "immediate_action": "y"}"#;
        assert!(decode_reflection(body).is_err());
    }

    #[test]
    fn decode_prediction_accepts_valid_body() {
        let prediction = decode_prediction(GOOD_PREDICTION).unwrap();
        assert_eq!(prediction.win_probability().value(), 72);
        assert_eq!(
            prediction.turning_point_date(),
            NaiveDate::from_ymd_opt(2024, 2, 14).unwrap()
        );
    }

    #[test]
    fn decode_prediction_rejects_bad_date() {
        let body = r#"{"win_probability": 40, "turning_point_date": "next week",
                       "reasoning": "r", "risk_factors": []}"#;
        assert!(matches!(
            decode_prediction(body),
            Err(AnalysisFailure::OutOfContract(_))
        ));
    }

    #[test]
    fn decode_prediction_rejects_fractional_probability() {
        let body = r#"{"win_probability": 40.5, "turning_point_date": "2024-01-01",
                       "reasoning": "r", "risk_factors": []}"#;
        assert!(decode_prediction(body).is_err());
    }

    #[tokio::test]
    async fn critique_returns_model_result() {
        let provider = MockAIProvider::new().with_kind_response(AnalysisKind::Critique, GOOD_REFLECTION);
        let reflection = gateway(provider.clone()).critique(&critique_request()).await;

        assert_eq!(reflection.critical_score().value(), 3);

        let calls = provider.get_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].system_prompt.as_deref(), Some(CRITIC_SYSTEM_PROMPT));
        assert!(calls[0].response_schema.is_some());
        assert!(calls[0].messages[0].content.contains("Stark Industries"));
    }

    #[tokio::test]
    async fn critique_falls_back_on_transport_failure() {
        let provider = MockAIProvider::failing(MockError::Timeout { timeout_secs: 60 });
        let reflection = gateway(provider.clone()).critique(&critique_request()).await;

        assert_eq!(reflection, AiReflection::unavailable());
        assert_eq!(provider.call_count(), 1, "exactly one remote attempt");
    }

    #[tokio::test]
    async fn critique_falls_back_on_malformed_body() {
        let provider = MockAIProvider::new().with_response("I think the rep did fine.");
        let reflection = gateway(provider).critique(&critique_request()).await;
        assert_eq!(reflection, AiReflection::unavailable());
    }

    #[tokio::test]
    async fn critique_falls_back_on_truncated_output() {
        let provider = MockAIProvider::new().with_default_response(MockResponse::Success {
            content: GOOD_REFLECTION.to_string(),
            finish_reason: FinishReason::Length,
        });
        let reflection = gateway(provider).critique(&critique_request()).await;
        assert_eq!(reflection, AiReflection::unavailable());
    }

    #[tokio::test]
    async fn forecast_returns_model_result() {
        let provider = MockAIProvider::new().with_kind_response(AnalysisKind::Forecast, GOOD_PREDICTION);
        let request = ForecastRequest::new(deal(), vec![interaction()]);

        let prediction = gateway(provider.clone()).forecast(&request).await;

        assert_eq!(prediction.reasoning(), "Legal is now involved.");
        let calls = provider.get_calls();
        assert_eq!(calls[0].metadata.kind, AnalysisKind::Forecast);
        assert!(calls[0].messages[0].content.contains("Pepper asked about delivery timelines."));
    }

    #[tokio::test]
    async fn forecast_falls_back_with_today() {
        let provider = MockAIProvider::failing(MockError::Unavailable {
            message: "503".to_string(),
        });
        let request = ForecastRequest::new(deal(), vec![]);

        let before = Timestamp::now().date();
        let prediction = gateway(provider).forecast(&request).await;
        let after = Timestamp::now().date();

        assert_eq!(prediction.win_probability().value(), 50);
        assert!(prediction.turning_point_date() >= before);
        assert!(prediction.turning_point_date() <= after);
        assert_eq!(prediction.risk_factors(), &["Data connectivity lost".to_string()]);
    }

    proptest! {
        #[test]
        fn decoders_never_panic(raw in ".*") {
            let _ = decode_reflection(&raw);
            let _ = decode_prediction(&raw);
        }

        #[test]
        fn decoded_scores_always_in_range(score in any::<i64>()) {
            let body = format!(
                r#"{{"critical_score": {}, "mistakes": ["m"], "immediate_action": "a"}}"#,
                score
            );
            match decode_reflection(&body) {
                Ok(r) => prop_assert!((1..=10).contains(&r.critical_score().value())),
                Err(_) => prop_assert!(!(1..=10).contains(&score)),
            }
        }

        #[test]
        fn decoded_probabilities_always_in_range(p in any::<i64>()) {
            let body = format!(
                r#"{{"win_probability": {}, "turning_point_date": "2024-01-01", "reasoning": "r", "risk_factors": []}}"#,
                p
            );
            match decode_prediction(&body) {
                Ok(pred) => prop_assert!(pred.win_probability().value() <= 100),
                Err(_) => prop_assert!(!(0..=100).contains(&p)),
            }
        }
    }
}
