//! Response renderer: text always, audio when the session asks for it.

use std::sync::Arc;

use voxchat_core::OutputMode;
use voxchat_speech::SpeechSynthesizer;

use crate::error::ChatError;

/// How a reply should be presented.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderDirective {
    TextOnly,
    TextAndAudio,
}

impl From<OutputMode> for RenderDirective {
    fn from(mode: OutputMode) -> Self {
        if mode.wants_audio() {
            RenderDirective::TextAndAudio
        } else {
            RenderDirective::TextOnly
        }
    }
}

/// A rendered reply. `audio` is present only when synthesis was requested
/// and succeeded; otherwise `warnings` says why it is missing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedReply {
    pub text: String,
    pub audio: Option<Vec<u8>>,
    pub warnings: Vec<String>,
}

impl RenderedReply {
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            audio: None,
            warnings: Vec::new(),
        }
    }
}

pub struct ResponseRenderer {
    synthesizer: Arc<dyn SpeechSynthesizer>,
}

impl ResponseRenderer {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>) -> Self {
        Self { synthesizer }
    }

    /// Render `text` per `directive`. Never fails: a synthesis error becomes
    /// a warning and the text is still returned.
    pub async fn render(&self, text: &str, directive: RenderDirective) -> RenderedReply {
        let mut reply = RenderedReply::text_only(text);
        if directive == RenderDirective::TextOnly {
            return reply;
        }

        match self.synthesizer.synthesize(text).await {
            Ok(audio) => {
                tracing::debug!(bytes = audio.len(), "Reply synthesized");
                reply.audio = Some(audio);
            }
            Err(e) => {
                let err = ChatError::Synthesis(e.to_string());
                tracing::warn!(error = %err, "Speech synthesis failed, returning text only");
                reply.warnings.push(err.to_string());
            }
        }
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxchat_speech::ScriptedSynthesizer;

    #[tokio::test]
    async fn test_text_only_skips_synthesis() {
        let tts = Arc::new(ScriptedSynthesizer::new());
        let renderer = ResponseRenderer::new(tts.clone());
        let reply = renderer.render("hi there", RenderDirective::TextOnly).await;
        assert_eq!(reply.text, "hi there");
        assert!(reply.audio.is_none());
        assert!(reply.warnings.is_empty());
        assert!(tts.spoken().is_empty());
    }

    #[tokio::test]
    async fn test_text_and_audio() {
        let tts = Arc::new(ScriptedSynthesizer::new());
        let renderer = ResponseRenderer::new(tts.clone());
        let reply = renderer
            .render("hi there", RenderDirective::TextAndAudio)
            .await;
        assert_eq!(reply.text, "hi there");
        assert_eq!(reply.audio, Some(b"hi there".to_vec()));
        assert_eq!(tts.spoken(), vec!["hi there".to_string()]);
    }

    #[tokio::test]
    async fn test_synthesis_failure_is_warning() {
        let renderer = ResponseRenderer::new(Arc::new(ScriptedSynthesizer::failing()));
        let reply = renderer
            .render("hi there", RenderDirective::TextAndAudio)
            .await;
        assert_eq!(reply.text, "hi there");
        assert!(reply.audio.is_none());
        assert_eq!(reply.warnings.len(), 1);
        assert!(reply.warnings[0].starts_with("speech synthesis error"));
    }

    #[test]
    fn test_directive_from_output_mode() {
        assert_eq!(
            RenderDirective::from(OutputMode::TextOnly),
            RenderDirective::TextOnly
        );
        assert_eq!(
            RenderDirective::from(OutputMode::TextAndAudio),
            RenderDirective::TextAndAudio
        );
    }
}
