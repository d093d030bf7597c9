//! Input normalizer: turns raw typed or spoken input into a canonical query.

use voxchat_core::{Modality, Transcription};

use crate::error::ChatError;

/// Input as it arrives from a client, before any validation.
#[derive(Clone, Debug, PartialEq)]
pub enum RawInput {
    /// Text entered on a keyboard.
    Typed(String),
    /// Output of a speech recognizer.
    Spoken(Transcription),
}

impl RawInput {
    pub fn modality(&self) -> Modality {
        match self {
            RawInput::Typed(_) => Modality::Typed,
            RawInput::Spoken(_) => Modality::Spoken,
        }
    }
}

/// A validated, trimmed query ready to be submitted as a user turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Query {
    text: String,
    modality: Modality,
}

impl Query {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn modality(&self) -> Modality {
        self.modality
    }
}

/// Validates raw input against the confidence threshold and length limit.
#[derive(Clone, Debug)]
pub struct InputNormalizer {
    confidence_threshold: f32,
    max_chars: usize,
}

impl InputNormalizer {
    pub fn new(confidence_threshold: f32, max_chars: usize) -> Self {
        Self {
            confidence_threshold,
            max_chars,
        }
    }

    /// Normalize `raw` into a [`Query`].
    ///
    /// Spoken input is checked for confidence first, so a low-confidence
    /// transcription is reported as such even when its text is also blank.
    /// A confidence exactly at the threshold is accepted; NaN is not.
    pub fn normalize(&self, raw: RawInput) -> Result<Query, ChatError> {
        let modality = raw.modality();
        let text = match raw {
            RawInput::Typed(text) => text,
            RawInput::Spoken(Transcription { text, confidence }) => {
                if confidence.is_nan() || confidence < self.confidence_threshold {
                    return Err(ChatError::LowConfidence {
                        confidence,
                        threshold: self.confidence_threshold,
                    });
                }
                text
            }
        };

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ChatError::EmptyInput);
        }
        if trimmed.chars().count() > self.max_chars {
            return Err(ChatError::MessageTooLong(self.max_chars));
        }

        Ok(Query {
            text: trimmed.to_string(),
            modality,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> InputNormalizer {
        InputNormalizer::new(0.6, 2000)
    }

    #[test]
    fn test_typed_input_trimmed() {
        let q = normalizer()
            .normalize(RawInput::Typed("  What's the weather?\n".to_string()))
            .unwrap();
        assert_eq!(q.text(), "What's the weather?");
        assert_eq!(q.modality(), Modality::Typed);
    }

    #[test]
    fn test_typed_blank_rejected() {
        for s in ["", "   ", "\n\t "] {
            assert!(matches!(
                normalizer().normalize(RawInput::Typed(s.to_string())),
                Err(ChatError::EmptyInput)
            ));
        }
    }

    #[test]
    fn test_spoken_accepted_above_threshold() {
        let q = normalizer()
            .normalize(RawInput::Spoken(Transcription::new(" hello there ", 0.92)))
            .unwrap();
        assert_eq!(q.text(), "hello there");
        assert_eq!(q.modality(), Modality::Spoken);
    }

    #[test]
    fn test_spoken_at_threshold_accepted() {
        let q = normalizer()
            .normalize(RawInput::Spoken(Transcription::new("ok", 0.6)))
            .unwrap();
        assert_eq!(q.text(), "ok");
    }

    #[test]
    fn test_spoken_low_confidence_rejected() {
        let err = normalizer()
            .normalize(RawInput::Spoken(Transcription::new("turn on", 0.41)))
            .unwrap_err();
        match err {
            ChatError::LowConfidence {
                confidence,
                threshold,
            } => {
                assert!((confidence - 0.41).abs() < 1e-6);
                assert!((threshold - 0.6).abs() < 1e-6);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_low_confidence_checked_before_text() {
        assert!(matches!(
            normalizer().normalize(RawInput::Spoken(Transcription::new("  ", 0.1))),
            Err(ChatError::LowConfidence { .. })
        ));
    }

    #[test]
    fn test_spoken_blank_rejected_when_confident() {
        assert!(matches!(
            normalizer().normalize(RawInput::Spoken(Transcription::new(" ", 0.99))),
            Err(ChatError::EmptyInput)
        ));
    }

    #[test]
    fn test_nan_confidence_rejected() {
        assert!(matches!(
            normalizer().normalize(RawInput::Spoken(Transcription::new("hi", f32::NAN))),
            Err(ChatError::LowConfidence { .. })
        ));
    }

    #[test]
    fn test_message_length_counts_chars() {
        let n = InputNormalizer::new(0.6, 5);
        // Five multi-byte chars fit, six do not.
        assert!(n.normalize(RawInput::Typed("ééééé".to_string())).is_ok());
        assert!(matches!(
            n.normalize(RawInput::Typed("éééééé".to_string())),
            Err(ChatError::MessageTooLong(5))
        ));
    }

    #[test]
    fn test_length_measured_after_trim() {
        let n = InputNormalizer::new(0.6, 3);
        assert!(n.normalize(RawInput::Typed("   abc   ".to_string())).is_ok());
    }
}
