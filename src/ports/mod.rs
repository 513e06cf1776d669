//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the core and the outside world. Adapters implement these ports.
//!
//! - `AIProvider` - one remote generative model call
//! - `AnalysisGateway` - total critique/forecast operations used by the engine

mod ai_provider;
mod analysis_gateway;

pub use ai_provider::{
    classify_transport_error, parse_retry_after, AIError, AIProvider, AnalysisKind,
    CompletionRequest, CompletionResponse, FinishReason, Message, MessageRole, ProviderInfo,
    RequestMetadata,
};
pub use analysis_gateway::{AnalysisGateway, CritiqueRequest, ForecastRequest};
