//! Builds the configured AIProvider.

use secrecy::{ExposeSecret, Secret};
use std::sync::Arc;

use super::{GeminiConfig, GeminiProvider, MockAIProvider, MockError, OpenAIConfig, OpenAIProvider};
use crate::config::{AiConfig, AiProvider};
use crate::ports::{AIError, AIProvider};

/// Creates the provider selected in `config`.
///
/// The mock provider fails every call, so every critique and forecast
/// resolves to its fallback value.
pub fn provider_from_config(config: &AiConfig) -> Result<Arc<dyn AIProvider>, AIError> {
    match config.provider {
        AiProvider::Gemini => {
            let mut gemini = GeminiConfig::new(require_key(&config.gemini_api_key)?)
                .with_timeout(config.timeout());
            if let Some(model) = &config.model {
                gemini = gemini.with_model(model);
            }
            if let Some(url) = &config.base_url {
                gemini = gemini.with_base_url(url);
            }
            Ok(Arc::new(GeminiProvider::new(gemini)?))
        }
        AiProvider::OpenAI => {
            let mut openai = OpenAIConfig::new(require_key(&config.openai_api_key)?)
                .with_timeout(config.timeout());
            if let Some(model) = &config.model {
                openai = openai.with_model(model);
            }
            if let Some(url) = &config.base_url {
                openai = openai.with_base_url(url);
            }
            Ok(Arc::new(OpenAIProvider::new(openai)?))
        }
        AiProvider::Mock => Ok(Arc::new(MockAIProvider::failing(MockError::Unavailable {
            message: "offline mode".to_string(),
        }))),
    }
}

fn require_key(key: &Option<Secret<String>>) -> Result<String, AIError> {
    key.as_ref()
        .map(|k| k.expose_secret().clone())
        .filter(|k| !k.trim().is_empty())
        .ok_or(AIError::AuthenticationFailed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(value: &str) -> Option<Secret<String>> {
        Some(Secret::new(value.to_string()))
    }

    #[test]
    fn gemini_is_built_with_overrides() {
        let config = AiConfig {
            provider: AiProvider::Gemini,
            gemini_api_key: key("g-key"),
            model: Some("gemini-2.5-pro".to_string()),
            ..Default::default()
        };
        let provider = provider_from_config(&config).unwrap();
        let info = provider.provider_info();
        assert_eq!(info.name, "gemini");
        assert_eq!(info.model, "gemini-2.5-pro");
    }

    #[test]
    fn openai_uses_its_default_model() {
        let config = AiConfig {
            provider: AiProvider::OpenAI,
            openai_api_key: key("sk-xxx"),
            ..Default::default()
        };
        let info = provider_from_config(&config).unwrap().provider_info();
        assert_eq!(info.name, "openai");
        assert_eq!(info.model, "gpt-4o-mini");
    }

    #[test]
    fn missing_key_is_rejected() {
        let config = AiConfig {
            provider: AiProvider::Gemini,
            ..Default::default()
        };
        assert!(matches!(
            provider_from_config(&config),
            Err(AIError::AuthenticationFailed)
        ));
    }

    #[test]
    fn mock_needs_no_key() {
        let config = AiConfig {
            provider: AiProvider::Mock,
            ..Default::default()
        };
        assert_eq!(provider_from_config(&config).unwrap().provider_info().name, "mock");
    }
}
