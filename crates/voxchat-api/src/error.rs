//! API error types and JSON error response formatting.
//!
//! ApiError provides a consistent JSON error response format across all
//! endpoints, mapping chat-engine errors to appropriate HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use voxchat_chat::{ChatError, QueryFailure};

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g., "empty_input", "not_found").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional structured details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 404 Not Found - resource does not exist.
    NotFound(String),
    /// 429 Too Many Requests - global rate limit exceeded.
    TooManyRequests(String),
    /// Error from a session operation.
    Chat(ChatError),
    /// Failed query, with the stage it failed in.
    Query(QueryFailure),
}

/// Status code for a chat-engine error.
pub fn chat_status(err: &ChatError) -> StatusCode {
    match err {
        ChatError::EmptyInput
        | ChatError::LowConfidence { .. }
        | ChatError::MessageTooLong(_)
        | ChatError::InvalidSessionId(_)
        | ChatError::InvalidTurn => StatusCode::UNPROCESSABLE_ENTITY,
        ChatError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        ChatError::SessionReset(_) => StatusCode::CONFLICT,
        ChatError::Upstream(_) | ChatError::Transcription(_) | ChatError::Synthesis(_) => {
            StatusCode::BAD_GATEWAY
        }
        ChatError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::TooManyRequests(msg) => {
                (StatusCode::TOO_MANY_REQUESTS, "too_many_requests", msg, None)
            }
            ApiError::Chat(err) => (chat_status(&err), err.kind(), err.to_string(), None),
            ApiError::Query(failure) => {
                let details = serde_json::json!({
                    "session_id": failure.session_id,
                    "stage": failure.stage,
                    "retryable": failure.error.is_retryable(),
                    "reprompt": failure.error.needs_reprompt(),
                });
                (
                    chat_status(&failure.error),
                    failure.error.kind(),
                    failure.error.to_string(),
                    Some(details),
                )
            }
        };

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = error_code, %message, "Request failed");
        }

        let body = ErrorBody {
            error: error_code.to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        ApiError::Chat(err)
    }
}

impl From<QueryFailure> for ApiError {
    fn from(failure: QueryFailure) -> Self {
        ApiError::Query(failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxchat_chat::QueryStage;

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), 64 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_chat_status_mapping() {
        assert_eq!(
            chat_status(&ChatError::EmptyInput),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            chat_status(&ChatError::SessionNotFound("s".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            chat_status(&ChatError::SessionReset("s".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            chat_status(&ChatError::Upstream("x".to_string())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            chat_status(&ChatError::Internal("x".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_query_failure_body_has_details() {
        let failure = QueryFailure::new(
            "s1",
            QueryStage::AwaitingModel,
            ChatError::Upstream("timed out".to_string()),
        );
        let resp = ApiError::from(failure).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

        let json = body_json(resp).await;
        assert_eq!(json["error"], "upstream_error");
        assert_eq!(json["details"]["stage"], "awaiting_model");
        assert_eq!(json["details"]["session_id"], "s1");
        assert_eq!(json["details"]["retryable"], true);
    }

    #[tokio::test]
    async fn test_plain_error_omits_details() {
        let resp = ApiError::NotFound("nothing here".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let json = body_json(resp).await;
        assert_eq!(json["error"], "not_found");
        assert!(json.get("details").is_none());
    }
}
