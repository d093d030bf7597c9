//! Chat orchestrator: central coordinator wiring input, sessions, the
//! language model and the renderer.
//!
//! One query moves through `Idle -> Normalizing -> AwaitingModel ->
//! Rendering -> Idle`. Any failure returns to `Idle` and is reported as a
//! [`QueryFailure`] carrying the stage it happened in.

use std::sync::Arc;
use std::time::{Duration, Instant};

use voxchat_core::config::ChatConfig;
use voxchat_core::{OutputMode, Transcription, Turn};
use voxchat_llm::LanguageModel;
use voxchat_speech::{SpeechRecognizer, SpeechSynthesizer};

use crate::command::ChatCommand;
use crate::error::{ChatError, QueryFailure, QueryStage};
use crate::input::{InputNormalizer, Query, RawInput};
use crate::render::{RenderDirective, RenderedReply, ResponseRenderer};
use crate::session::SessionManager;

/// Result of a completed query.
#[derive(Clone, Debug)]
pub struct ChatReply {
    pub session_id: String,
    pub query: Query,
    pub user_turn: Turn,
    pub assistant_turn: Turn,
    pub rendered: RenderedReply,
}

/// Result of a completed voice query: the transcription it was built from,
/// plus the reply.
#[derive(Clone, Debug)]
pub struct VoiceReply {
    pub transcription: Transcription,
    pub reply: ChatReply,
}

/// Result of applying a chat command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandOutcome {
    pub command: ChatCommand,
    pub message: String,
    /// The session's output preference after the command, when it still
    /// exists.
    pub output_mode: Option<OutputMode>,
}

/// What a typed message turned out to be.
#[derive(Clone, Debug)]
pub enum MessageOutcome {
    Reply(ChatReply),
    Command(CommandOutcome),
}

/// Central chat orchestrator.
pub struct ChatOrchestrator {
    normalizer: InputNormalizer,
    sessions: SessionManager,
    renderer: ResponseRenderer,
    lm: Arc<dyn LanguageModel>,
    recognizer: Arc<dyn SpeechRecognizer>,
    context_window: usize,
    lm_timeout: Duration,
}

impl ChatOrchestrator {
    pub fn new(
        config: &ChatConfig,
        lm: Arc<dyn LanguageModel>,
        recognizer: Arc<dyn SpeechRecognizer>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        tracing::info!(
            model = %lm.name(),
            context_window = config.context_window_turns,
            lm_timeout_ms = config.lm_timeout_ms,
            "Chat orchestrator ready"
        );
        Self {
            normalizer: InputNormalizer::new(
                config.confidence_threshold,
                config.max_message_chars,
            ),
            sessions: SessionManager::new(config.output_mode, config.session_timeout_minutes),
            renderer: ResponseRenderer::new(synthesizer),
            lm,
            recognizer,
            context_window: config.context_window_turns,
            lm_timeout: Duration::from_millis(config.lm_timeout_ms),
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn model_name(&self) -> String {
        self.lm.name()
    }

    /// Handle a typed message: a chat command if it is one, otherwise a
    /// query.
    pub async fn handle_message(
        &self,
        session_id: &str,
        message: &str,
    ) -> Result<MessageOutcome, QueryFailure> {
        if let Some(command) = ChatCommand::parse(message) {
            return self
                .apply_command(session_id, command)
                .map(MessageOutcome::Command)
                .map_err(|e| QueryFailure::new(session_id, QueryStage::Normalizing, e));
        }
        self.handle_query(session_id, RawInput::Typed(message.to_string()))
            .await
            .map(MessageOutcome::Reply)
    }

    /// Apply a chat command. Never calls the model and never adds turns.
    pub fn apply_command(
        &self,
        session_id: &str,
        command: ChatCommand,
    ) -> Result<CommandOutcome, ChatError> {
        tracing::info!(session_id, command = %command, "Applying chat command");
        let output_mode = match command {
            ChatCommand::Clear => {
                let session = self.sessions.get_or_create(session_id)?;
                self.sessions.clear(session_id)?;
                Some(session.output_mode()?)
            }
            ChatCommand::TypeMode => {
                self.sessions
                    .set_output_mode(session_id, OutputMode::TextOnly)?;
                Some(OutputMode::TextOnly)
            }
            ChatCommand::VoiceMode => {
                self.sessions
                    .set_output_mode(session_id, OutputMode::TextAndAudio)?;
                Some(OutputMode::TextAndAudio)
            }
            ChatCommand::Quit => {
                self.sessions.remove(session_id)?;
                None
            }
        };
        Ok(CommandOutcome {
            command,
            message: command.acknowledgement().to_string(),
            output_mode,
        })
    }

    /// Run one query through the session's turn-taking pipeline.
    ///
    /// Input errors never create or touch the session. A model failure or
    /// timeout leaves the user turn in place with no reply. A reply that
    /// arrives after the session was cleared or ended is discarded and
    /// reported as [`ChatError::SessionReset`].
    pub async fn handle_query(
        &self,
        session_id: &str,
        raw: RawInput,
    ) -> Result<ChatReply, QueryFailure> {
        let started = Instant::now();
        let fail = |stage: QueryStage| {
            move |error: ChatError| {
                tracing::warn!(session_id, stage = %stage, error = %error, "Query failed");
                QueryFailure::new(session_id, stage, error)
            }
        };

        // -- Normalizing ------------------------------------------------------
        tracing::debug!(session_id, stage = %QueryStage::Normalizing, "Query received");
        let query = self
            .normalizer
            .normalize(raw)
            .map_err(fail(QueryStage::Normalizing))?;
        let session = self
            .sessions
            .get_or_create(session_id)
            .map_err(fail(QueryStage::Normalizing))?;

        // Held until the reply is rendered: one query per session at a time.
        let _turn = session.acquire_turn().await;

        // -- AwaitingModel ----------------------------------------------------
        let stage = QueryStage::AwaitingModel;
        let (user_turn, epoch) = self
            .sessions
            .commit_user_turn(&session, &query)
            .map_err(fail(stage))?;
        let context = session.context(self.context_window).map_err(fail(stage))?;
        tracing::debug!(
            session_id,
            stage = %stage,
            turns = context.len(),
            "Calling language model"
        );

        let text = match tokio::time::timeout(self.lm_timeout, self.lm.generate(&context)).await {
            Ok(Ok(text)) if !text.trim().is_empty() => text,
            Ok(Ok(_)) => {
                return Err(fail(stage)(ChatError::Upstream(
                    "model returned an empty reply".to_string(),
                )))
            }
            Ok(Err(e)) => return Err(fail(stage)(ChatError::Upstream(e.to_string()))),
            Err(_) => {
                return Err(fail(stage)(ChatError::Upstream(format!(
                    "no reply within {} ms",
                    self.lm_timeout.as_millis()
                ))))
            }
        };

        let reset = || fail(stage)(ChatError::SessionReset(session_id.to_string()));
        if !self.sessions.is_current(&session).map_err(fail(stage))? {
            return Err(reset());
        }
        let assistant_turn = session
            .append_in_epoch(epoch, Turn::assistant(text, query.modality()))
            .map_err(fail(stage))?
            .ok_or_else(reset)?;

        // -- Rendering --------------------------------------------------------
        let stage = QueryStage::Rendering;
        let directive = RenderDirective::from(session.output_mode().map_err(fail(stage))?);
        let rendered = self
            .renderer
            .render(assistant_turn.content(), directive)
            .await;

        tracing::info!(
            session_id,
            modality = %query.modality(),
            seq = assistant_turn.seq(),
            audio = rendered.audio.is_some(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Query answered"
        );

        Ok(ChatReply {
            session_id: session_id.to_string(),
            query,
            user_turn,
            assistant_turn,
            rendered,
        })
    }

    /// Transcribe `audio` and run the result as a spoken query.
    pub async fn handle_voice(
        &self,
        session_id: &str,
        audio: &[u8],
    ) -> Result<VoiceReply, QueryFailure> {
        let transcription = self.recognizer.transcribe(audio).await.map_err(|e| {
            let error = ChatError::Transcription(e.to_string());
            tracing::warn!(session_id, error = %error, "Transcription failed");
            QueryFailure::new(session_id, QueryStage::Normalizing, error)
        })?;
        tracing::debug!(
            session_id,
            confidence = transcription.confidence,
            "Audio transcribed"
        );

        let reply = self
            .handle_query(session_id, RawInput::Spoken(transcription.clone()))
            .await?;
        Ok(VoiceReply {
            transcription,
            reply,
        })
    }
}
