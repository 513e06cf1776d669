//! AI Provider Adapters.
//!
//! Implementations of the AIProvider port for generative model services.
//!
//! ## Available Adapters
//!
//! - `GeminiProvider` - Google Gemini with native structured output
//! - `OpenAIProvider` - OpenAI chat models with `json_schema` response format
//! - `MockAIProvider` - Configurable mock for testing and offline runs

mod factory;
mod gemini_provider;
mod mock_provider;
mod openai_provider;

pub use factory::provider_from_config;
pub use gemini_provider::{GeminiConfig, GeminiProvider};
pub use mock_provider::{MockAIProvider, MockError, MockResponse};
pub use openai_provider::{OpenAIConfig, OpenAIProvider};
