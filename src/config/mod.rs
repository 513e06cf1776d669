//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `DEAL_PILOT` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use deal_pilot::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Analysis provider: {:?}", config.ai.provider);
//! ```

mod ai;
mod error;
mod pipeline;

pub use ai::{AiConfig, AiProvider};
pub use error::{ConfigError, ValidationError};
pub use pipeline::{LoggingConfig, PipelineConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Every section has defaults, so an empty environment loads. Whether the
/// result is usable is decided by [`AppConfig::validate()`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// AI provider configuration (Gemini/OpenAI/mock)
    #[serde(default)]
    pub ai: AiConfig,

    /// Seed data for the pipeline
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Log output options
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `DEAL_PILOT` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `DEAL_PILOT__AI__PROVIDER=openai` -> `ai.provider = openai`
    /// - `DEAL_PILOT__PIPELINE__SEED_PATH=seeds/pipeline.yaml` -> `pipeline.seed_path`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("DEAL_PILOT")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the selected provider has no key, the
    /// timeout is zero, or the seed file does not exist.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.ai.validate()?;
        self.pipeline.validate()?;
        Ok(())
    }

    /// Validates and returns the configuration, lifting failures into [`ConfigError`].
    pub fn validated(self) -> Result<Self, ConfigError> {
        self.validate()?;
        Ok(self)
    }
}
