//! Voxchat LLM crate - language-model collaborator interface and backends.
//!
//! The orchestrator only ever sees [`LanguageModel`]: an async
//! `generate(context) -> text` capability. Concrete backends talk to hosted
//! providers over HTTP; [`ScriptedLanguageModel`] replays canned replies for
//! tests and local development.

use std::sync::Arc;

use async_trait::async_trait;
use voxchat_core::config::{LmConfig, LmProvider};
use voxchat_core::Turn;

pub mod backends;
pub mod error;
pub mod mock;

pub use backends::gemini::GeminiBackend;
pub use backends::openai::OpenAiBackend;
pub use error::LlmError;
pub use mock::ScriptedLanguageModel;

/// A hosted language model that turns an ordered conversation into a reply.
///
/// Implementations apply no timeout of their own; callers bound the call.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate the next assistant reply for `context`.
    ///
    /// `context` is in append order and ends with the user turn being
    /// answered.
    async fn generate(&self, context: &[Turn]) -> Result<String, LlmError>;

    /// Short identifier for logs (e.g. `gemini:gemini-1.5-flash`).
    fn name(&self) -> String;
}

/// Build the backend selected by `config`.
///
/// Fails when the provider needs an API key and none is configured.
pub fn build_language_model(config: &LmConfig) -> Result<Arc<dyn LanguageModel>, LlmError> {
    let key = config
        .api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| {
            LlmError::NotConfigured(format!(
                "{} is not set",
                config.provider.api_key_var()
            ))
        })?;

    let model: Arc<dyn LanguageModel> = match config.provider {
        LmProvider::Gemini => Arc::new(GeminiBackend::new(config, key)),
        LmProvider::OpenAi => Arc::new(OpenAiBackend::new(config, key)),
    };
    tracing::info!(backend = %model.name(), "Language model backend ready");
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_requires_key() {
        let config = LmConfig::default();
        let err = build_language_model(&config).err().unwrap();
        assert!(matches!(err, LlmError::NotConfigured(_)));
        assert!(err.to_string().contains("GOOGLE_API_KEY"));
    }

    #[test]
    fn test_build_rejects_blank_key() {
        let config = LmConfig {
            api_key: Some("   ".to_string()),
            ..LmConfig::default()
        };
        assert!(build_language_model(&config).is_err());
    }

    #[test]
    fn test_build_selects_provider() {
        let config = LmConfig {
            api_key: Some("k".to_string()),
            ..LmConfig::default()
        };
        let model = build_language_model(&config).unwrap();
        assert_eq!(model.name(), "gemini:gemini-1.5-flash");

        let config = LmConfig {
            provider: LmProvider::OpenAi,
            model: "gpt-4o-mini".to_string(),
            api_key: Some("k".to_string()),
            ..LmConfig::default()
        };
        let model = build_language_model(&config).unwrap();
        assert_eq!(model.name(), "openai:gpt-4o-mini");
    }
}
