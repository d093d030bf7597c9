//! Voxchat speech crate - speech-recognition and synthesis collaborators.
//!
//! Acoustic modeling and synthesis are out of scope: this crate only defines
//! the narrow capability traits the chat engine consumes, plus HTTP adapters
//! for external engines, an "unavailable" engine used when nothing is
//! configured, and scripted engines for tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use voxchat_core::config::SpeechConfig;
use voxchat_core::Transcription;

pub mod error;
pub mod http;
pub mod mock;

pub use error::SpeechError;
pub use http::{HttpSpeechRecognizer, HttpSpeechSynthesizer};
pub use mock::{ScriptedRecognizer, ScriptedSynthesizer};

// =============================================================================
// Traits
// =============================================================================

/// Converts recorded audio into text with a confidence score.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Transcribe encoded audio (WAV, WebM, ... as the engine accepts).
    async fn transcribe(&self, audio: &[u8]) -> Result<Transcription, SpeechError>;
}

/// Converts reply text into playable audio.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` into encoded audio bytes.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError>;
}

// =============================================================================
// Unavailable engine
// =============================================================================

/// Engine used when no recognition or synthesis endpoint is configured.
///
/// Every call fails with [`SpeechError::Unavailable`].
#[derive(Debug, Clone)]
pub struct UnavailableEngine {
    reason: String,
}

impl UnavailableEngine {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl SpeechRecognizer for UnavailableEngine {
    async fn transcribe(&self, _audio: &[u8]) -> Result<Transcription, SpeechError> {
        Err(SpeechError::Unavailable(self.reason.clone()))
    }
}

#[async_trait]
impl SpeechSynthesizer for UnavailableEngine {
    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>, SpeechError> {
        Err(SpeechError::Unavailable(self.reason.clone()))
    }
}

// =============================================================================
// Factories
// =============================================================================

/// Build the recognizer described by `config`.
pub fn build_recognizer(config: &SpeechConfig) -> Result<Arc<dyn SpeechRecognizer>, SpeechError> {
    match config.stt_url.as_deref() {
        Some(url) => {
            tracing::info!(url, "Speech recognition engine configured");
            Ok(Arc::new(HttpSpeechRecognizer::new(
                url,
                Duration::from_millis(config.request_timeout_ms),
            )?))
        }
        None => {
            tracing::info!("No speech recognition engine configured; voice input disabled");
            Ok(Arc::new(UnavailableEngine::new(
                "speech.stt_url is not configured",
            )))
        }
    }
}

/// Build the synthesizer described by `config`.
pub fn build_synthesizer(
    config: &SpeechConfig,
) -> Result<Arc<dyn SpeechSynthesizer>, SpeechError> {
    match config.tts_url.as_deref() {
        Some(url) => {
            tracing::info!(url, "Speech synthesis engine configured");
            Ok(Arc::new(HttpSpeechSynthesizer::new(
                url,
                config.tts_rate,
                config.tts_volume,
                Duration::from_millis(config.request_timeout_ms),
            )?))
        }
        None => {
            tracing::info!("No speech synthesis engine configured; replies are text only");
            Ok(Arc::new(UnavailableEngine::new(
                "speech.tts_url is not configured",
            )))
        }
    }
}
