//! HTTP backends for hosted language-model providers.
//!
//! To add a provider: implement [`crate::LanguageModel`] in a new module
//! here, add the variant to `LmProvider`, and wire it in
//! [`crate::build_language_model`].

pub mod gemini;
pub mod openai;

use crate::error::LlmError;

/// Send a prepared request and decode the JSON body, mapping non-2xx
/// statuses to [`LlmError::Api`].
pub(crate) async fn send_json(
    request: reqwest::RequestBuilder,
) -> Result<serde_json::Value, LlmError> {
    let resp = request.send().await?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        return Err(LlmError::Api {
            status: status.as_u16(),
            body,
        });
    }
    resp.json::<serde_json::Value>()
        .await
        .map_err(|e| LlmError::InvalidResponse(e.to_string()))
}
