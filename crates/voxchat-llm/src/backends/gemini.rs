use async_trait::async_trait;
use voxchat_core::config::LmConfig;
use voxchat_core::{Role, Turn};

use super::send_json;
use crate::error::LlmError;
use crate::LanguageModel;

/// Google Gemini `generateContent` backend.
pub struct GeminiBackend {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    temperature: f32,
    system_prompt: String,
}

impl GeminiBackend {
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

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    /// Convert turns to Gemini `contents`.
    ///
    /// Gemini requires the conversation to open with a user turn and to
    /// alternate roles, so leading assistant turns (left over from context
    /// truncation) are dropped and consecutive same-role turns (left over
    /// from a failed call followed by a retry) are merged.
    fn build_contents(context: &[Turn]) -> Vec<serde_json::Value> {
        let mut merged: Vec<(Role, String)> = Vec::new();
        for turn in context
            .iter()
            .skip_while(|t| t.role() == Role::Assistant)
        {
            match merged.last_mut() {
                Some((role, text)) if *role == turn.role() => {
                    text.push('\n');
                    text.push_str(turn.content());
                }
                _ => merged.push((turn.role(), turn.content().to_string())),
            }
        }

        merged
            .into_iter()
            .map(|(role, text)| {
                serde_json::json!({
                    "role": match role {
                        Role::User => "user",
                        Role::Assistant => "model",
                    },
                    "parts": [{ "text": text }]
                })
            })
            .collect()
    }

    fn build_body(&self, context: &[Turn]) -> serde_json::Value {
        let mut body = serde_json::json!({
            "contents": Self::build_contents(context),
            "generationConfig": { "temperature": self.temperature },
        });
        if !self.system_prompt.trim().is_empty() {
            body["systemInstruction"] = serde_json::json!({
                "parts": [{ "text": self.system_prompt }]
            });
        }
        body
    }
}

#[async_trait]
impl LanguageModel for GeminiBackend {
    async fn generate(&self, context: &[Turn]) -> Result<String, LlmError> {
        let body = self.build_body(context);
        tracing::debug!(model = %self.model, turns = context.len(), "Sending request to Gemini");

        let request = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body);
        let resp_body = send_json(request).await?;

        parse_gemini_response(&resp_body)
    }

    fn name(&self) -> String {
        format!("gemini:{}", self.model)
    }
}

/// Extract the reply text from a `generateContent` response.
fn parse_gemini_response(body: &serde_json::Value) -> Result<String, LlmError> {
    if let Some(reason) = body["promptFeedback"]["blockReason"].as_str() {
        return Err(LlmError::InvalidResponse(format!(
            "prompt blocked: {}",
            reason
        )));
    }

    let parts = body["candidates"][0]["content"]["parts"]
        .as_array()
        .ok_or_else(|| LlmError::InvalidResponse("response has no candidates".to_string()))?;

    let text: String = parts
        .iter()
        .filter_map(|p| p["text"].as_str())
        .collect::<Vec<_>>()
        .join("");

    if text.trim().is_empty() {
        return Err(LlmError::InvalidResponse("empty completion".to_string()));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxchat_core::Modality;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> LmConfig {
        LmConfig {
            base_url: Some(server.uri()),
            ..LmConfig::default()
        }
    }

    fn reply(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] }
            }]
        })
    }

    #[test]
    fn test_build_contents_maps_roles() {
        let ctx = vec![
            Turn::user("hello", Modality::Typed),
            Turn::assistant("hi there", Modality::Typed),
            Turn::user("how are you", Modality::Spoken),
        ];
        let contents = GeminiBackend::build_contents(&ctx);
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[1]["parts"][0]["text"], "hi there");
    }

    #[test]
    fn test_build_contents_merges_consecutive_user_turns() {
        let ctx = vec![
            Turn::user("first try", Modality::Typed),
            Turn::user("second try", Modality::Typed),
        ];
        let contents = GeminiBackend::build_contents(&ctx);
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0]["parts"][0]["text"], "first try\nsecond try");
    }

    #[test]
    fn test_build_contents_drops_leading_assistant() {
        let ctx = vec![
            Turn::assistant("orphaned reply", Modality::Typed),
            Turn::user("question", Modality::Typed),
        ];
        let contents = GeminiBackend::build_contents(&ctx);
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0]["role"], "user");
    }

    #[test]
    fn test_parse_joins_parts() {
        let body = serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": "Hel" }, { "text": "lo" }] } }]
        });
        assert_eq!(parse_gemini_response(&body).unwrap(), "Hello");
    }

    #[test]
    fn test_parse_blocked_prompt() {
        let body = serde_json::json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        let err = parse_gemini_response(&body).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_parse_empty_completion() {
        let body = reply("   ");
        assert!(matches!(
            parse_gemini_response(&body),
            Err(LlmError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_generate_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
            .and(header("x-goog-api-key", "secret"))
            .and(body_partial_json(serde_json::json!({
                "contents": [{ "role": "user", "parts": [{ "text": "hello" }] }],
                "systemInstruction": {
                    "parts": [{ "text": "You are a helpful AI assistant. Respond concisely and naturally." }]
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(reply("hi there")))
            .expect(1)
            .mount(&server)
            .await;

        let backend = GeminiBackend::new(&config_for(&server), "secret".to_string());
        let text = backend
            .generate(&[Turn::user("hello", Modality::Typed)])
            .await
            .unwrap();
        assert_eq!(text, "hi there");
    }

    #[tokio::test]
    async fn test_generate_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let backend = GeminiBackend::new(&config_for(&server), "secret".to_string());
        let err = backend
            .generate(&[Turn::user("hello", Modality::Typed)])
            .await
            .unwrap_err();
        match err {
            LlmError::Api { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "overloaded");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_generate_connection_refused() {
        let config = LmConfig {
            base_url: Some("http://127.0.0.1:9".to_string()),
            ..LmConfig::default()
        };
        let backend = GeminiBackend::new(&config, "secret".to_string());
        let err = backend
            .generate(&[Turn::user("hello", Modality::Typed)])
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Http(_)));
    }
}
