//! HTTP adapters for external speech engines.
//!
//! Recognition: `POST <stt_url>` with the raw audio as the body, expecting
//! `{"text": "...", "confidence": 0.93}` back. Synthesis: `POST <tts_url>`
//! with `{"text", "rate", "volume"}`, expecting audio bytes back.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use voxchat_core::Transcription;

use crate::error::SpeechError;
use crate::{SpeechRecognizer, SpeechSynthesizer};

#[derive(Debug, Deserialize)]
struct RecognitionResponse {
    text: String,
    /// Engines that report no score are trusted fully.
    #[serde(default = "full_confidence")]
    confidence: f32,
}

fn full_confidence() -> f32 {
    1.0
}

#[derive(Debug, Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    rate: u32,
    volume: f32,
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, SpeechError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp
        .text()
        .await
        .unwrap_or_else(|_| "unknown error".to_string());
    Err(SpeechError::Engine {
        status: status.as_u16(),
        body,
    })
}

// =============================================================================
// Recognizer
// =============================================================================

/// Speech recognizer backed by an HTTP transcription service.
pub struct HttpSpeechRecognizer {
    http: reqwest::Client,
    url: String,
}

impl HttpSpeechRecognizer {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, SpeechError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl SpeechRecognizer for HttpSpeechRecognizer {
    async fn transcribe(&self, audio: &[u8]) -> Result<Transcription, SpeechError> {
        if audio.is_empty() {
            return Err(SpeechError::EmptyAudio);
        }
        tracing::debug!(bytes = audio.len(), "Sending audio for transcription");

        let resp = self
            .http
            .post(&self.url)
            .header("content-type", "application/octet-stream")
            .body(audio.to_vec())
            .send()
            .await?;
        let resp = check_status(resp).await?;
        let parsed: RecognitionResponse = resp
            .json()
            .await
            .map_err(|e| SpeechError::InvalidResponse(e.to_string()))?;

        tracing::debug!(confidence = parsed.confidence, "Transcription received");
        Ok(Transcription::new(parsed.text, parsed.confidence))
    }
}

// =============================================================================
// Synthesizer
// =============================================================================

/// Speech synthesizer backed by an HTTP TTS service.
pub struct HttpSpeechSynthesizer {
    http: reqwest::Client,
    url: String,
    rate: u32,
    volume: f32,
}

impl HttpSpeechSynthesizer {
    pub fn new(url: &str, rate: u32, volume: f32, timeout: Duration) -> Result<Self, SpeechError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.to_string(),
            rate,
            volume,
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSpeechSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError> {
        let body = SynthesisRequest {
            text,
            rate: self.rate,
            volume: self.volume,
        };
        let resp = self.http.post(&self.url).json(&body).send().await?;
        let resp = check_status(resp).await?;
        let audio = resp.bytes().await?;
        if audio.is_empty() {
            return Err(SpeechError::InvalidResponse(
                "engine returned no audio".to_string(),
            ));
        }
        tracing::debug!(bytes = audio.len(), "Speech synthesized");
        Ok(audio.to_vec())
    }
}
