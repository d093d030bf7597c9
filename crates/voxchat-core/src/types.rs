use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::VoxchatError;

// =============================================================================
// Enums
// =============================================================================

/// Who produced a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The human side of the conversation.
    User,
    /// The language model's reply.
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => f.write_str("user"),
            Role::Assistant => f.write_str("assistant"),
        }
    }
}

/// How an input reached the system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    /// Entered on a keyboard.
    Typed,
    /// Captured from a microphone and transcribed.
    Spoken,
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modality::Typed => f.write_str("typed"),
            Modality::Spoken => f.write_str("spoken"),
        }
    }
}

/// User-level output preference held alongside a session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Display the reply as text only (default).
    #[default]
    TextOnly,
    /// Display the reply and speak it.
    TextAndAudio,
}

impl OutputMode {
    /// Whether replies in this mode should be synthesized to audio.
    pub fn wants_audio(self) -> bool {
        matches!(self, OutputMode::TextAndAudio)
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::TextOnly => f.write_str("text_only"),
            OutputMode::TextAndAudio => f.write_str("text_and_audio"),
        }
    }
}

impl FromStr for OutputMode {
    type Err = VoxchatError;

    /// Accepts snake_case, kebab-case and camelCase spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "textonly" | "text" => Ok(OutputMode::TextOnly),
            "textandaudio" | "audio" | "voice" => Ok(OutputMode::TextAndAudio),
            _ => Err(VoxchatError::Config(format!(
                "unknown output mode '{}': expected text_only or text_and_audio",
                s
            ))),
        }
    }
}

// =============================================================================
// Turns
// =============================================================================

/// One utterance in a conversation.
///
/// Fields are private: once a turn has been committed to a transcript it can
/// only be read. Sequence number and commit timestamp are assigned by the
/// transcript through [`Turn::committed`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    seq: u64,
    role: Role,
    content: String,
    modality: Modality,
    timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create an uncommitted turn stamped with the current time.
    pub fn new(role: Role, content: impl Into<String>, modality: Modality) -> Self {
        Self {
            seq: 0,
            role,
            content: content.into(),
            modality,
            timestamp: Utc::now(),
        }
    }

    /// Shorthand for a user turn.
    pub fn user(content: impl Into<String>, modality: Modality) -> Self {
        Self::new(Role::User, content, modality)
    }

    /// Shorthand for an assistant turn.
    pub fn assistant(content: impl Into<String>, modality: Modality) -> Self {
        Self::new(Role::Assistant, content, modality)
    }

    /// Finalize ordering metadata when the turn is appended.
    ///
    /// The timestamp is clamped so it never precedes `not_before`, keeping
    /// timestamps non-decreasing within a transcript even if the wall clock
    /// steps backwards.
    pub fn committed(mut self, seq: u64, not_before: Option<DateTime<Utc>>) -> Self {
        self.seq = seq;
        if let Some(floor) = not_before {
            if self.timestamp < floor {
                self.timestamp = floor;
            }
        }
        self
    }

    /// Position of the turn within its transcript (1-based once committed).
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn modality(&self) -> Modality {
        self.modality
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// A turn is valid when its content has at least one non-whitespace char.
    pub fn is_valid(&self) -> bool {
        !self.content.trim().is_empty()
    }
}

// =============================================================================
// Speech
// =============================================================================

/// Result of a speech-recognition call: text plus engine confidence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transcription {
    /// Recognized text, untrimmed.
    pub text: String,
    /// Engine confidence in `[0.0, 1.0]`.
    pub confidence: f32,
}

impl Transcription {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}
