//! Route handler functions for all API endpoints.
//!
//! Each handler extracts path parameters and bodies via axum extractors,
//! calls into the chat orchestrator held by [`AppState`], and returns JSON.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use voxchat_chat::{ChatReply, MessageOutcome, SessionSummary};
use voxchat_core::{OutputMode, Turn};

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request types
// =============================================================================

/// Request body for POST /chat.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Generated when omitted; echoed back in the response.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Free-form client metadata, attached to the request's log lines.
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Request body for PUT /chat/{session_id}/output.
#[derive(Debug, Deserialize)]
pub struct OutputModeRequest {
    pub output_mode: OutputMode,
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
    /// Base64-encoded synthesized audio, when the session wants audio.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    /// Set when the message was a chat command instead of a query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Recognized text, for voice requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
}

impl ChatResponse {
    fn from_reply(reply: ChatReply) -> Self {
        Self {
            response: reply.rendered.text,
            session_id: reply.session_id,
            audio: reply.rendered.audio.map(|a| BASE64.encode(a)),
            warnings: reply.rendered.warnings,
            command: None,
            transcript: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub session_id: String,
    pub turns: Vec<Turn>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OutputModeResponse {
    pub session_id: String,
    pub output_mode: OutputMode,
}

#[derive(Debug, Serialize)]
pub struct SessionsResponse {
    pub sessions: Vec<SessionSummary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub active_sessions: u64,
    pub model: String,
}

// =============================================================================
// Chat
// =============================================================================

/// POST /chat - typed message or chat command.
pub async fn chat(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let session_id = body
        .session_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    match &body.metadata {
        Some(metadata) => {
            tracing::info!(session_id = %session_id, metadata = %metadata, "Received chat request")
        }
        None => tracing::info!(session_id = %session_id, "Received chat request"),
    }

    let outcome = state
        .orchestrator
        .handle_message(&session_id, &body.message)
        .await?;

    let response = match outcome {
        MessageOutcome::Reply(reply) => ChatResponse::from_reply(reply),
        MessageOutcome::Command(cmd) => ChatResponse {
            response: cmd.message,
            session_id,
            audio: None,
            warnings: Vec::new(),
            command: Some(cmd.command.to_string()),
            transcript: None,
        },
    };
    Ok(Json(response))
}

/// POST /chat/{session_id}/voice - recorded audio as the request body.
pub async fn chat_voice(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    audio: Bytes,
) -> Result<Json<ChatResponse>, ApiError> {
    tracing::info!(session_id = %session_id, bytes = audio.len(), "Received voice request");
    let voice = state
        .orchestrator
        .handle_voice(&session_id, &audio)
        .await?;

    let mut response = ChatResponse::from_reply(voice.reply);
    response.transcript = Some(voice.transcription.text);
    Ok(Json(response))
}

/// DELETE /chat/{session_id} - clear a session's history.
pub async fn clear_chat(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.orchestrator.sessions().clear(&session_id)?;
    Ok(Json(MessageResponse {
        message: format!("Chat history cleared for session {}", session_id),
    }))
}

/// GET /chat/{session_id}/history - ordered transcript.
pub async fn chat_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let turns = state.orchestrator.sessions().history(&session_id)?;
    Ok(Json(HistoryResponse { session_id, turns }))
}

/// GET /chat/{session_id}/output - current output preference.
pub async fn get_output_mode(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<OutputModeResponse>, ApiError> {
    let output_mode = state.orchestrator.sessions().output_mode(&session_id)?;
    Ok(Json(OutputModeResponse {
        session_id,
        output_mode,
    }))
}

/// PUT /chat/{session_id}/output - change the output preference.
pub async fn set_output_mode(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(body): Json<OutputModeRequest>,
) -> Result<Json<OutputModeResponse>, ApiError> {
    state
        .orchestrator
        .sessions()
        .set_output_mode(&session_id, body.output_mode)?;
    Ok(Json(OutputModeResponse {
        session_id,
        output_mode: body.output_mode,
    }))
}

// =============================================================================
// Sessions
// =============================================================================

/// GET /sessions - live session summaries.
pub async fn list_sessions(
    State(state): State<AppState>,
) -> Result<Json<SessionsResponse>, ApiError> {
    let sessions = state.orchestrator.sessions().list()?;
    Ok(Json(SessionsResponse { sessions }))
}

/// DELETE /sessions/{session_id} - end a session.
pub async fn end_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !state.orchestrator.sessions().remove(&session_id)? {
        return Err(ApiError::NotFound(format!(
            "Session not found: {}",
            session_id
        )));
    }
    Ok(Json(MessageResponse {
        message: format!("Session {} ended", session_id),
    }))
}

/// GET /health - health check.
pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let active_sessions = state.orchestrator.sessions().len()? as u64;
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        active_sessions,
        model: state.orchestrator.model_name(),
    }))
}
