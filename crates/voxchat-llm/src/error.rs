//! Error types for language-model collaborators.

/// Errors from a language-model backend.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("provider returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
    #[error("language model not configured: {0}")]
    NotConfigured(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        LlmError::Http(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_llm_error_display() {
        let err = LlmError::Http("connection refused".to_string());
        assert_eq!(err.to_string(), "HTTP error: connection refused");

        let err = LlmError::Api {
            status: 429,
            body: "quota exceeded".to_string(),
        };
        assert_eq!(err.to_string(), "provider returned 429: quota exceeded");

        let err = LlmError::InvalidResponse("no candidates".to_string());
        assert_eq!(err.to_string(), "invalid provider response: no candidates");

        let err = LlmError::NotConfigured("missing api key".to_string());
        assert_eq!(
            err.to_string(),
            "language model not configured: missing api key"
        );
    }
}
