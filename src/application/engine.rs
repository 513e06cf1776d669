//! OrchestrationEngine - the command surface over the pipeline store.
//!
//! Commands return as soon as the optimistic part of their work is in the
//! store. Critiques and forecasts run on spawned tasks and merge their
//! results back under the store lock:
//!
//! 1. `log_interaction` inserts the interaction as pending and dispatches
//!    a critique against a frozen copy of the deal context.
//! 2. When the critique lands it is attached by interaction id, and a
//!    forecast for the same deal is triggered.
//! 3. `refresh_forecast` snapshots the deal and its full history and
//!    dispatches a forecast. Whichever forecast completes last wins.
//!
//! Every state change publishes a fresh [`PipelineSnapshot`] on a watch
//! channel.

use std::sync::Arc;

use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::snapshot::{BusyFlags, InFlight, PipelineSnapshot};
use super::store::PipelineStore;
use crate::domain::foundation::{DealId, InteractionId};
use crate::domain::interaction::{Interaction, InteractionType};
use crate::ports::{AnalysisGateway, CritiqueRequest, ForecastRequest};

/// Command to record a new interaction against the active deal.
#[derive(Debug, Clone)]
pub struct LogInteractionCommand {
    pub content: String,
    pub kind: InteractionType,
}

impl LogInteractionCommand {
    pub fn new(content: impl Into<String>, kind: InteractionType) -> Self {
        Self {
            content: content.into(),
            kind,
        }
    }
}

/// Handle on the background work started by `log_interaction`.
#[derive(Debug)]
pub struct LogReceipt {
    pub interaction_id: InteractionId,
    pub deal_id: DealId,
    handle: JoinHandle<()>,
}

impl LogReceipt {
    /// Waits for the critique and the forecast it triggers to be merged.
    pub async fn settled(self) {
        if let Err(err) = self.handle.await {
            warn!(interaction_id = %self.interaction_id, error = %err, "Critique task aborted");
        }
    }
}

/// Handle on a dispatched forecast.
#[derive(Debug)]
pub struct ForecastReceipt {
    pub deal_id: DealId,
    handle: JoinHandle<()>,
}

impl ForecastReceipt {
    /// Waits for the forecast to be merged.
    pub async fn settled(self) {
        if let Err(err) = self.handle.await {
            warn!(deal_id = %self.deal_id, error = %err, "Forecast task aborted");
        }
    }
}

struct EngineState {
    store: PipelineStore,
    in_flight: InFlight,
}

impl EngineState {
    fn snapshot(&self) -> PipelineSnapshot {
        self.store.snapshot(self.in_flight.flags())
    }
}

struct EngineInner {
    state: RwLock<EngineState>,
    gateway: Arc<dyn AnalysisGateway>,
    snapshots: watch::Sender<PipelineSnapshot>,
}

/// Coordinates user commands with asynchronous critique and forecast calls.
///
/// Cheap to clone; clones share the same store.
#[derive(Clone)]
pub struct OrchestrationEngine {
    inner: Arc<EngineInner>,
}

impl OrchestrationEngine {
    /// Creates an engine over a pre-populated store.
    pub fn new(store: PipelineStore, gateway: Arc<dyn AnalysisGateway>) -> Self {
        let state = EngineState {
            store,
            in_flight: InFlight::default(),
        };
        let (snapshots, _) = watch::channel(state.snapshot());

        Self {
            inner: Arc::new(EngineInner {
                state: RwLock::new(state),
                gateway,
                snapshots,
            }),
        }
    }

    /// Current view of the pipeline.
    pub async fn snapshot(&self) -> PipelineSnapshot {
        self.inner.state.read().await.snapshot()
    }

    /// Current busy indicators.
    pub async fn busy(&self) -> BusyFlags {
        self.inner.state.read().await.in_flight.flags()
    }

    /// Looks up a single interaction by id.
    pub async fn interaction(&self, id: InteractionId) -> Option<Interaction> {
        self.inner.state.read().await.store.interaction(id).cloned()
    }

    /// Receives a new snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<PipelineSnapshot> {
        self.inner.snapshots.subscribe()
    }

    fn publish(&self, state: &EngineState) {
        self.inner.snapshots.send_replace(state.snapshot());
    }

    /// Makes `deal_id` the active deal. Unknown ids are ignored.
    pub async fn select_deal(&self, deal_id: &DealId) -> bool {
        let mut state = self.inner.state.write().await;
        let selected = state.store.select(deal_id);
        if selected {
            debug!(deal_id = %deal_id, "Active deal changed");
            self.publish(&state);
        } else {
            warn!(deal_id = %deal_id, "Ignoring selection of unknown deal");
        }
        selected
    }

    /// Records an interaction against the active deal and starts its critique.
    ///
    /// Returns `None` without touching the store when no deal is active or
    /// the content is blank.
    pub async fn log_interaction(&self, cmd: LogInteractionCommand) -> Option<LogReceipt> {
        let mut state = self.inner.state.write().await;

        let deal = match state.store.active_deal_id().and_then(|id| state.store.deal(id)) {
            Some(deal) => deal,
            None => {
                warn!("No active deal, interaction not logged");
                return None;
            }
        };
        let deal_id = deal.id().clone();
        let context = deal.context();

        let created_at = state.store.next_created_at();
        let interaction = match Interaction::new(
            InteractionId::new(),
            deal_id.clone(),
            PipelineStore::today(),
            cmd.kind,
            cmd.content,
            created_at,
        ) {
            Ok(interaction) => interaction,
            Err(err) => {
                warn!(deal_id = %deal_id, error = %err, "Rejected interaction");
                return None;
            }
        };

        let request = CritiqueRequest::for_interaction(&interaction, context);
        let interaction_id = interaction.id();

        if let Err(err) = state.store.add_interaction(interaction) {
            warn!(deal_id = %deal_id, error = %err, "Failed to store interaction");
            return None;
        }
        state.in_flight.critiques += 1;
        self.publish(&state);
        drop(state);

        info!(
            deal_id = %deal_id,
            interaction_id = %interaction_id,
            kind = %cmd.kind,
            "Interaction logged, critique dispatched"
        );

        let engine = self.clone();
        let handle = tokio::spawn(async move {
            engine.run_critique(request).await;
        });

        Some(LogReceipt {
            interaction_id,
            deal_id,
            handle,
        })
    }

    async fn run_critique(&self, request: CritiqueRequest) {
        let feedback = self.inner.gateway.critique(&request).await;

        {
            let mut state = self.inner.state.write().await;
            match state.store.attach_feedback(request.interaction_id, feedback) {
                Ok(()) => debug!(
                    interaction_id = %request.interaction_id,
                    "Critique attached"
                ),
                Err(err) => debug!(
                    interaction_id = %request.interaction_id,
                    error = %err,
                    "Dropping critique"
                ),
            }
            state.in_flight.critiques -= 1;
            self.publish(&state);
        }

        if let Some(receipt) = self.refresh_forecast(Some(request.deal_id)).await {
            receipt.settled().await;
        }
    }

    /// Requests a fresh forecast for `deal_id`, or the active deal when `None`.
    ///
    /// Returns `None` without calling the gateway when the deal cannot be
    /// resolved.
    pub async fn refresh_forecast(&self, deal_id: Option<DealId>) -> Option<ForecastReceipt> {
        let mut state = self.inner.state.write().await;

        let target = match deal_id.or_else(|| state.store.active_deal_id().cloned()) {
            Some(id) => id,
            None => {
                warn!("No active deal, forecast not requested");
                return None;
            }
        };
        let deal = match state.store.deal(&target) {
            Some(deal) => deal.clone(),
            None => {
                warn!(deal_id = %target, "Unknown deal, forecast not requested");
                return None;
            }
        };

        let request = ForecastRequest::new(deal, state.store.history(&target));
        state.in_flight.forecasts += 1;
        self.publish(&state);
        drop(state);

        debug!(
            deal_id = %target,
            history_len = request.history().len(),
            "Forecast dispatched"
        );

        let engine = self.clone();
        let handle = tokio::spawn(async move {
            engine.run_forecast(request).await;
        });

        Some(ForecastReceipt {
            deal_id: target,
            handle,
        })
    }

    async fn run_forecast(&self, request: ForecastRequest) {
        let prediction = self.inner.gateway.forecast(&request).await;
        let deal_id = request.deal.id();

        let mut state = self.inner.state.write().await;
        match state.store.merge_prediction(deal_id, prediction) {
            Ok(seq) => debug!(deal_id = %deal_id, completion_seq = seq, "Forecast merged"),
            Err(err) => debug!(deal_id = %deal_id, error = %err, "Dropping forecast"),
        }
        state.in_flight.forecasts -= 1;
        self.publish(&state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::deal::{Deal, DealStage, TurningPointPrediction, WinProbability};
    use crate::domain::interaction::{AiReflection, CriticalScore};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    /// Gateway that answers immediately and records what it saw.
    #[derive(Default)]
    struct RecordingGateway {
        critiques: Mutex<Vec<CritiqueRequest>>,
        forecasts: Mutex<Vec<ForecastRequest>>,
    }

    #[async_trait]
    impl AnalysisGateway for RecordingGateway {
        async fn critique(&self, request: &CritiqueRequest) -> AiReflection {
            self.critiques.lock().unwrap().push(request.clone());
            AiReflection::new(
                CriticalScore::try_new(6).unwrap(),
                vec![format!("Reviewed: {}", request.content)],
                "Follow up.",
            )
            .unwrap()
        }

        async fn forecast(&self, request: &ForecastRequest) -> TurningPointPrediction {
            self.forecasts.lock().unwrap().push(request.clone());
            TurningPointPrediction::new(
                WinProbability::try_new(request.history().len() as i64 * 10).unwrap(),
                NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                format!("{} interactions", request.history().len()),
                vec![],
            )
            .unwrap()
        }
    }

    fn engine(gateway: Arc<RecordingGateway>) -> OrchestrationEngine {
        let mut store = PipelineStore::new();
        for id in ["1", "2"] {
            store
                .add_deal(
                    Deal::new(
                        DealId::new(id).unwrap(),
                        format!("Client {}", id),
                        "Contact",
                        50_000,
                        DealStage::Negotiation,
                        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                    )
                    .unwrap(),
                )
                .unwrap();
        }
        OrchestrationEngine::new(store, gateway)
    }

    #[tokio::test]
    async fn log_without_active_deal_is_noop() {
        let gateway = Arc::new(RecordingGateway::default());
        let engine = engine(gateway.clone());

        let receipt = engine
            .log_interaction(LogInteractionCommand::new("hello", InteractionType::Call))
            .await;

        assert!(receipt.is_none());
        assert!(engine.snapshot().await.timeline.is_empty());
        assert!(gateway.critiques.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_content_is_rejected() {
        let gateway = Arc::new(RecordingGateway::default());
        let engine = engine(gateway.clone());
        engine.select_deal(&DealId::new("1").unwrap()).await;

        let receipt = engine
            .log_interaction(LogInteractionCommand::new("   ", InteractionType::Email))
            .await;

        assert!(receipt.is_none());
        assert!(engine.snapshot().await.timeline.is_empty());
    }

    #[tokio::test]
    async fn select_unknown_deal_keeps_current() {
        let engine = engine(Arc::new(RecordingGateway::default()));
        assert!(engine.select_deal(&DealId::new("2").unwrap()).await);
        assert!(!engine.select_deal(&DealId::new("99").unwrap()).await);

        assert_eq!(
            engine.snapshot().await.active_deal_id,
            Some(DealId::new("2").unwrap())
        );
    }

    #[tokio::test]
    async fn logged_interaction_gets_feedback_and_forecast() {
        let gateway = Arc::new(RecordingGateway::default());
        let engine = engine(gateway.clone());
        engine.select_deal(&DealId::new("1").unwrap()).await;

        let receipt = engine
            .log_interaction(LogInteractionCommand::new("Sent pricing.", InteractionType::Email))
            .await
            .unwrap();
        let id = receipt.interaction_id;
        receipt.settled().await;

        let interaction = engine.interaction(id).await.unwrap();
        assert_eq!(
            interaction.ai_feedback().unwrap().mistakes(),
            ["Reviewed: Sent pricing.".to_string()]
        );

        let snapshot = engine.snapshot().await;
        let deal = snapshot.active_deal().unwrap();
        assert_eq!(deal.prediction().unwrap().reasoning(), "1 interactions");
        assert_eq!(snapshot.busy, BusyFlags::default());
    }

    #[tokio::test]
    async fn critique_sees_deal_context() {
        let gateway = Arc::new(RecordingGateway::default());
        let engine = engine(gateway.clone());
        engine.select_deal(&DealId::new("2").unwrap()).await;

        engine
            .log_interaction(LogInteractionCommand::new("WeChat ping", InteractionType::Wechat))
            .await
            .unwrap()
            .settled()
            .await;

        let critiques = gateway.critiques.lock().unwrap();
        assert_eq!(critiques[0].context.client_name, "Client 2");
        assert_eq!(critiques[0].context.stage, DealStage::Negotiation);
        assert_eq!(critiques[0].kind, InteractionType::Wechat);
    }

    #[tokio::test]
    async fn explicit_deal_forecast_ignores_active_pointer() {
        let gateway = Arc::new(RecordingGateway::default());
        let engine = engine(gateway.clone());
        engine.select_deal(&DealId::new("1").unwrap()).await;

        engine
            .refresh_forecast(Some(DealId::new("2").unwrap()))
            .await
            .unwrap()
            .settled()
            .await;

        let snapshot = engine.snapshot().await;
        let deal_two = snapshot
            .deals
            .iter()
            .find(|d| d.id().as_str() == "2")
            .unwrap();
        assert!(deal_two.prediction().is_some());
        assert!(snapshot.active_deal().unwrap().prediction().is_none());
    }

    #[tokio::test]
    async fn refresh_for_unknown_deal_is_noop() {
        let gateway = Arc::new(RecordingGateway::default());
        let engine = engine(gateway.clone());

        assert!(engine
            .refresh_forecast(Some(DealId::new("404").unwrap()))
            .await
            .is_none());
        assert!(gateway.forecasts.lock().unwrap().is_empty());
    }

    /// Collects formatted log lines emitted at `WARN` and above.
    #[derive(Clone, Default)]
    struct WarnLog(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for WarnLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl WarnLog {
        fn install(&self) -> tracing::subscriber::DefaultGuard {
            let sink = self.clone();
            let subscriber = tracing_subscriber::fmt()
                .with_max_level(tracing::Level::WARN)
                .with_ansi(false)
                .with_writer(move || sink.clone())
                .finish();
            tracing::subscriber::set_default(subscriber)
        }

        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    #[tokio::test]
    async fn rejected_commands_are_logged_as_warnings() {
        let log = WarnLog::default();
        let _guard = log.install();
        let engine = engine(Arc::new(RecordingGateway::default()));

        engine
            .log_interaction(LogInteractionCommand::new("hello", InteractionType::Call))
            .await;
        engine.refresh_forecast(None).await;
        engine
            .refresh_forecast(Some(DealId::new("404").unwrap()))
            .await;
        engine.select_deal(&DealId::new("404").unwrap()).await;
        engine.select_deal(&DealId::new("1").unwrap()).await;
        engine
            .log_interaction(LogInteractionCommand::new("   ", InteractionType::Email))
            .await;

        let out = log.contents();
        assert!(out.contains("WARN"));
        assert!(out.contains("No active deal, interaction not logged"));
        assert!(out.contains("No active deal, forecast not requested"));
        assert!(out.contains("Unknown deal, forecast not requested"));
        assert!(out.contains("Ignoring selection of unknown deal"));
        assert!(out.contains("Rejected interaction"));
    }

    #[tokio::test]
    async fn subscribers_see_state_changes() {
        let engine = engine(Arc::new(RecordingGateway::default()));
        let mut rx = engine.subscribe();

        engine.select_deal(&DealId::new("1").unwrap()).await;

        rx.changed().await.unwrap();
        assert_eq!(
            rx.borrow().active_deal_id,
            Some(DealId::new("1").unwrap())
        );
    }
}
