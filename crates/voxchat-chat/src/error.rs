//! Error types for the turn-taking engine.

use std::fmt;

use serde::Serialize;

/// Errors from the chat engine.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyInput,
    #[error("speech confidence {confidence:.2} is below the threshold of {threshold:.2}")]
    LowConfidence { confidence: f32, threshold: f32 },
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("invalid session id: {0}")]
    InvalidSessionId(String),
    #[error("turn content cannot be empty")]
    InvalidTurn,
    #[error("session not found: {0}")]
    SessionNotFound(String),
    #[error("session {0} was cleared or ended while the reply was in flight")]
    SessionReset(String),
    #[error("language model error: {0}")]
    Upstream(String),
    #[error("speech recognition error: {0}")]
    Transcription(String),
    #[error("speech synthesis error: {0}")]
    Synthesis(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ChatError {
    /// Input-side failures: the caller should ask the user to try again.
    pub fn needs_reprompt(&self) -> bool {
        matches!(
            self,
            ChatError::EmptyInput | ChatError::LowConfidence { .. } | ChatError::MessageTooLong(_)
        )
    }

    /// Transient failures: resubmitting the same input may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ChatError::Upstream(_) | ChatError::Transcription(_) | ChatError::SessionReset(_)
        )
    }

    /// Machine-readable kind, stable across message wording changes.
    pub fn kind(&self) -> &'static str {
        match self {
            ChatError::EmptyInput => "empty_input",
            ChatError::LowConfidence { .. } => "low_confidence",
            ChatError::MessageTooLong(_) => "message_too_long",
            ChatError::InvalidSessionId(_) => "invalid_session_id",
            ChatError::InvalidTurn => "invalid_turn",
            ChatError::SessionNotFound(_) => "session_not_found",
            ChatError::SessionReset(_) => "session_reset",
            ChatError::Upstream(_) => "upstream_error",
            ChatError::Transcription(_) => "transcription_error",
            ChatError::Synthesis(_) => "synthesis_error",
            ChatError::Internal(_) => "internal_error",
        }
    }
}

/// Map a poisoned lock into [`ChatError::Internal`].
pub(crate) fn poisoned<T>(what: &str) -> impl FnOnce(std::sync::PoisonError<T>) -> ChatError + '_ {
    move |e| ChatError::Internal(format!("{} lock poisoned: {}", what, e))
}

// =============================================================================
// Query failures
// =============================================================================

/// Active stage of a query.
///
/// A query runs `Normalizing -> AwaitingModel -> Rendering`; a failure in any
/// stage ends the query and leaves the session idle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStage {
    Normalizing,
    AwaitingModel,
    Rendering,
}

impl fmt::Display for QueryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QueryStage::Normalizing => "normalizing",
            QueryStage::AwaitingModel => "awaiting_model",
            QueryStage::Rendering => "rendering",
        };
        f.write_str(s)
    }
}

/// A failed query, with the session and stage it failed in.
#[derive(Debug, thiserror::Error)]
#[error("query for session '{session_id}' failed while {stage}: {error}")]
pub struct QueryFailure {
    pub session_id: String,
    pub stage: QueryStage,
    #[source]
    pub error: ChatError,
}

impl QueryFailure {
    pub fn new(session_id: impl Into<String>, stage: QueryStage, error: ChatError) -> Self {
        Self {
            session_id: session_id.into(),
            stage,
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_error_display() {
        assert_eq!(ChatError::EmptyInput.to_string(), "message cannot be empty");
        assert_eq!(
            ChatError::LowConfidence {
                confidence: 0.41,
                threshold: 0.6
            }
            .to_string(),
            "speech confidence 0.41 is below the threshold of 0.60"
        );
        assert_eq!(
            ChatError::MessageTooLong(2000).to_string(),
            "message exceeds maximum length of 2000 characters"
        );
        assert_eq!(
            ChatError::SessionNotFound("s1".to_string()).to_string(),
            "session not found: s1"
        );
        assert_eq!(
            ChatError::Upstream("timed out".to_string()).to_string(),
            "language model error: timed out"
        );
    }

    #[test]
    fn test_reprompt_and_retry_classes_are_disjoint() {
        let all = [
            ChatError::EmptyInput,
            ChatError::LowConfidence {
                confidence: 0.1,
                threshold: 0.5,
            },
            ChatError::MessageTooLong(1),
            ChatError::InvalidSessionId(String::new()),
            ChatError::InvalidTurn,
            ChatError::SessionNotFound("x".to_string()),
            ChatError::SessionReset("x".to_string()),
            ChatError::Upstream("x".to_string()),
            ChatError::Transcription("x".to_string()),
            ChatError::Synthesis("x".to_string()),
            ChatError::Internal("x".to_string()),
        ];
        for err in &all {
            assert!(!(err.needs_reprompt() && err.is_retryable()), "{:?}", err);
        }
        assert!(ChatError::EmptyInput.needs_reprompt());
        assert!(ChatError::Upstream("x".to_string()).is_retryable());
        assert!(!ChatError::Synthesis("x".to_string()).is_retryable());
    }

    #[test]
    fn test_kind_codes() {
        assert_eq!(ChatError::EmptyInput.kind(), "empty_input");
        assert_eq!(ChatError::Upstream(String::new()).kind(), "upstream_error");
        assert_eq!(
            ChatError::SessionReset(String::new()).kind(),
            "session_reset"
        );
    }

    #[test]
    fn test_query_failure_display_and_source() {
        let failure = QueryFailure::new(
            "s1",
            QueryStage::AwaitingModel,
            ChatError::Upstream("connection reset".to_string()),
        );
        assert_eq!(
            failure.to_string(),
            "query for session 's1' failed while awaiting_model: language model error: connection reset"
        );
        let source = std::error::Error::source(&failure).unwrap();
        assert_eq!(source.to_string(), "language model error: connection reset");
    }

    #[test]
    fn test_stage_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&QueryStage::AwaitingModel).unwrap(),
            "\"awaiting_model\""
        );
    }
}
