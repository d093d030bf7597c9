//! Scripted speech engines for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use voxchat_core::Transcription;

use crate::error::SpeechError;
use crate::{SpeechRecognizer, SpeechSynthesizer};

/// Recognizer that returns queued results; fails with `Unavailable` once the
/// queue is drained.
#[derive(Default)]
pub struct ScriptedRecognizer {
    script: Mutex<VecDeque<Result<Transcription, SpeechError>>>,
}

impl ScriptedRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, text: impl Into<String>, confidence: f32) {
        if let Ok(mut s) = self.script.lock() {
            s.push_back(Ok(Transcription::new(text, confidence)));
        }
    }

    pub fn push_error(&self, err: SpeechError) {
        if let Ok(mut s) = self.script.lock() {
            s.push_back(Err(err));
        }
    }
}

#[async_trait]
impl SpeechRecognizer for ScriptedRecognizer {
    async fn transcribe(&self, audio: &[u8]) -> Result<Transcription, SpeechError> {
        if audio.is_empty() {
            return Err(SpeechError::EmptyAudio);
        }
        self.script
            .lock()
            .ok()
            .and_then(|mut s| s.pop_front())
            .unwrap_or_else(|| Err(SpeechError::Unavailable("script exhausted".to_string())))
    }
}

/// Synthesizer that encodes text as its UTF-8 bytes, or fails on demand.
#[derive(Default)]
pub struct ScriptedSynthesizer {
    failing: bool,
    spoken: Mutex<Vec<String>>,
}

impl ScriptedSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synthesizer whose every call fails with `Unavailable`.
    pub fn failing() -> Self {
        Self {
            failing: true,
            spoken: Mutex::new(Vec::new()),
        }
    }

    /// Texts synthesized so far.
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SpeechSynthesizer for ScriptedSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError> {
        if self.failing {
            return Err(SpeechError::Unavailable("engine offline".to_string()));
        }
        if let Ok(mut s) = self.spoken.lock() {
            s.push(text.to_string());
        }
        Ok(text.as_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_recognizer_order() {
        let stt = ScriptedRecognizer::new();
        stt.push("first", 0.9);
        stt.push_error(SpeechError::Http("reset".to_string()));
        assert_eq!(stt.transcribe(b"a").await.unwrap().text, "first");
        assert!(matches!(
            stt.transcribe(b"a").await,
            Err(SpeechError::Http(_))
        ));
        assert!(matches!(
            stt.transcribe(b"a").await,
            Err(SpeechError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_scripted_synthesizer_records() {
        let tts = ScriptedSynthesizer::new();
        assert_eq!(tts.synthesize("hi").await.unwrap(), b"hi".to_vec());
        assert_eq!(tts.spoken(), vec!["hi".to_string()]);

        let tts = ScriptedSynthesizer::failing();
        assert!(tts.synthesize("hi").await.is_err());
        assert!(tts.spoken().is_empty());
    }
}
