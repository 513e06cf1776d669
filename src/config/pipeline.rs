//! Pipeline and logging configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

/// Where the initial deals and interactions come from
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PipelineConfig {
    /// YAML seed file; the pipeline starts empty without one
    pub seed_path: Option<PathBuf>,
}

impl PipelineConfig {
    /// Validate pipeline configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        match &self.seed_path {
            Some(path) if !path.is_file() => Err(ValidationError::SeedFileMissing(path.clone())),
            _ => Ok(()),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable text
    #[serde(default)]
    pub json: bool,
}
