//! Error types for speech collaborators.

/// Errors from a speech-recognition or synthesis engine.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("speech engine unavailable: {0}")]
    Unavailable(String),
    #[error("no audio supplied")]
    EmptyAudio,
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("engine returned {status}: {body}")]
    Engine { status: u16, body: String },
    #[error("invalid engine response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for SpeechError {
    fn from(err: reqwest::Error) -> Self {
        SpeechError::Http(err.to_string())
    }
}
