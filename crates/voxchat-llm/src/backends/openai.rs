use async_trait::async_trait;
use voxchat_core::config::LmConfig;
use voxchat_core::{Role, Turn};

use super::send_json;
use crate::error::LlmError;
use crate::LanguageModel;

/// OpenAI-compatible chat completions backend.
///
/// Works with OpenAI and any gateway exposing `/v1/chat/completions`
/// (OpenRouter, Groq, Ollama, vLLM).
pub struct OpenAiBackend {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    temperature: f32,
    system_prompt: String,
}

impl OpenAiBackend {
    pub fn new(config: &LmConfig, api_key: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.resolved_base_url(),
            model: config.model.clone(),
            api_key,
            temperature: config.temperature,
            system_prompt: config.system_prompt.clone(),
        }
    }

    fn build_messages(&self, context: &[Turn]) -> Vec<serde_json::Value> {
        let mut messages = Vec::with_capacity(context.len() + 1);
        if !self.system_prompt.trim().is_empty() {
            messages.push(serde_json::json!({
                "role": "system",
                "content": self.system_prompt
            }));
        }
        for turn in context {
            messages.push(serde_json::json!({
                "role": match turn.role() {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                },
                "content": turn.content()
            }));
        }
        messages
    }
}

#[async_trait]
impl LanguageModel for OpenAiBackend {
    async fn generate(&self, context: &[Turn]) -> Result<String, LlmError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": self.build_messages(context),
        });
        tracing::debug!(model = %self.model, turns = context.len(), "Sending request to OpenAI-compatible API");

        let request = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body);
        let resp_body = send_json(request).await?;

        parse_openai_response(&resp_body)
    }

    fn name(&self) -> String {
        format!("openai:{}", self.model)
    }
}

fn parse_openai_response(body: &serde_json::Value) -> Result<String, LlmError> {
    let text = body["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| LlmError::InvalidResponse("response has no choices".to_string()))?;
    if text.trim().is_empty() {
        return Err(LlmError::InvalidResponse("empty completion".to_string()));
    }
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxchat_core::config::LmProvider;
    use voxchat_core::Modality;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> LmConfig {
        LmConfig {
            provider: LmProvider::OpenAi,
            model: "gpt-4o-mini".to_string(),
            base_url: Some(server.uri()),
            ..LmConfig::default()
        }
    }

    #[test]
    fn test_build_messages_prepends_system() {
        let backend = OpenAiBackend::new(&LmConfig::default(), "k".to_string());
        let msgs = backend.build_messages(&[
            Turn::user("hello", Modality::Typed),
            Turn::assistant("hi", Modality::Typed),
        ]);
        assert_eq!(msgs.len(), 3);
        assert_eq!(msgs[0]["role"], "system");
        assert_eq!(msgs[1]["role"], "user");
        assert_eq!(msgs[2]["role"], "assistant");
    }

    #[test]
    fn test_build_messages_without_system_prompt() {
        let config = LmConfig {
            system_prompt: String::new(),
            ..LmConfig::default()
        };
        let backend = OpenAiBackend::new(&config, "k".to_string());
        let msgs = backend.build_messages(&[Turn::user("hello", Modality::Typed)]);
        assert_eq!(msgs.len(), 1);
    }

    #[test]
    fn test_parse_missing_choices() {
        let body = serde_json::json!({ "error": "nope" });
        assert!(matches!(
            parse_openai_response(&body),
            Err(LlmError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_generate_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer secret"))
            .and(body_partial_json(serde_json::json!({ "model": "gpt-4o-mini" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "role": "assistant", "content": "hi there" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let backend = OpenAiBackend::new(&config_for(&server), "secret".to_string());
        let text = backend
            .generate(&[Turn::user("hello", Modality::Typed)])
            .await
            .unwrap();
        assert_eq!(text, "hi there");
    }

    #[tokio::test]
    async fn test_generate_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let backend = OpenAiBackend::new(&config_for(&server), "wrong".to_string());
        let err = backend
            .generate(&[Turn::user("hello", Modality::Typed)])
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Api { status: 401, .. }));
    }
}
