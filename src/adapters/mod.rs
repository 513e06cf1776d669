//! Adapters - Implementations of port interfaces.
//!
//! - `ai` - Generative model providers (Gemini, OpenAI, mock)
//! - `analysis` - The LLM-backed analysis gateway

pub mod ai;
pub mod analysis;

pub use ai::{provider_from_config, MockAIProvider};
pub use analysis::LlmAnalysisGateway;
