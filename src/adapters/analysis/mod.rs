//! Analysis gateway adapters.
//!
//! - `LlmAnalysisGateway` - critique and forecast over any `AIProvider`

mod llm_gateway;
mod prompts;

pub use llm_gateway::{decode_prediction, decode_reflection, AnalysisFailure, LlmAnalysisGateway};
pub use prompts::{CRITIC_SYSTEM_PROMPT, ORACLE_SYSTEM_PROMPT};
