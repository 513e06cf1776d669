//! Line-oriented driver for the deal pipeline.
//!
//! Reads one command per line from stdin and prints the resulting
//! pipeline snapshot as JSON on stdout. Logs go to stderr.
//!
//! ```text
//! select <deal-id>
//! log <MEETING|EMAIL|WECHAT|CALL> <content...>
//! forecast [deal-id]
//! wait
//! show
//! quit
//! ```

use std::error::Error;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use deal_pilot::adapters::{provider_from_config, LlmAnalysisGateway};
use deal_pilot::application::{
    ForecastReceipt, LogInteractionCommand, LogReceipt, OrchestrationEngine, PipelineSeed,
    PipelineStore,
};
use deal_pilot::config::{AppConfig, LoggingConfig};
use deal_pilot::domain::foundation::DealId;
use deal_pilot::domain::interaction::InteractionType;

enum Pending {
    Log(LogReceipt),
    Forecast(ForecastReceipt),
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if logging.json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging);

    let config = match config.validated() {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "Invalid configuration");
            return Err(err.into());
        }
    };

    let provider = provider_from_config(&config.ai)?;
    let info = provider.provider_info();
    info!(provider = %info.name, model = %info.model, "Analysis provider ready");

    let store = match &config.pipeline.seed_path {
        Some(path) => PipelineSeed::from_path(path)?.into_store()?,
        None => PipelineStore::new(),
    };
    let engine = OrchestrationEngine::new(store, Arc::new(LlmAnalysisGateway::new(provider)));

    let mut pending = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();

        match command {
            "select" => match DealId::new(rest) {
                Ok(id) => {
                    engine.select_deal(&id).await;
                }
                Err(err) => warn!(error = %err, "Bad deal id"),
            },
            "log" => {
                let (kind, content) = rest.split_once(' ').unwrap_or((rest, ""));
                match kind.parse::<InteractionType>() {
                    Ok(kind) => {
                        let cmd = LogInteractionCommand::new(content, kind);
                        if let Some(receipt) = engine.log_interaction(cmd).await {
                            pending.push(Pending::Log(receipt));
                        }
                    }
                    Err(err) => warn!(error = %err, "Unknown interaction type"),
                }
            }
            "forecast" => {
                let target = if rest.is_empty() {
                    None
                } else {
                    DealId::new(rest).ok()
                };
                if let Some(receipt) = engine.refresh_forecast(target).await {
                    pending.push(Pending::Forecast(receipt));
                }
            }
            "wait" => {
                for receipt in pending.drain(..) {
                    match receipt {
                        Pending::Log(r) => r.settled().await,
                        Pending::Forecast(r) => r.settled().await,
                    }
                }
            }
            "show" => {}
            "quit" | "exit" => break,
            other => {
                warn!(command = other, "Unknown command");
                continue;
            }
        }

        println!("{}", serde_json::to_string_pretty(&engine.snapshot().await)?);
    }

    for receipt in pending {
        match receipt {
            Pending::Log(r) => r.settled().await,
            Pending::Forecast(r) => r.settled().await,
        }
    }
    Ok(())
}
