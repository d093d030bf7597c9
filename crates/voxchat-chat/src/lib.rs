//! Chat-session and turn-taking engine for Voxchat.
//!
//! Tracks per-session conversation history, keeps typed and spoken turns in
//! one strictly ordered transcript, and mediates between input capture, the
//! language-model call and output rendering.

pub mod command;
pub mod error;
pub mod input;
pub mod orchestrator;
pub mod render;
pub mod session;
pub mod transcript;

pub use command::ChatCommand;
pub use error::{ChatError, QueryFailure, QueryStage};
pub use input::{InputNormalizer, Query, RawInput};
pub use orchestrator::{ChatOrchestrator, ChatReply, CommandOutcome, MessageOutcome, VoiceReply};
pub use render::{RenderDirective, RenderedReply, ResponseRenderer};
pub use session::{Session, SessionManager, SessionSummary};
pub use transcript::TranscriptStore;
