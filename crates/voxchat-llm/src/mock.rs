//! Scripted language model for tests and offline development.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use voxchat_core::Turn;

use crate::error::LlmError;
use crate::LanguageModel;

/// Language model that replays queued outcomes, then falls back to a fixed
/// reply.
///
/// Every call records the context it received so tests can assert on
/// truncation and ordering.
pub struct ScriptedLanguageModel {
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    fallback: String,
    delay: Duration,
    calls: Mutex<Vec<Vec<Turn>>>,
}

impl ScriptedLanguageModel {
    /// Model that always answers `fallback`.
    pub fn new(fallback: impl Into<String>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: fallback.into(),
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Sleep this long before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Queue a successful reply.
    pub fn push_reply(&self, text: impl Into<String>) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(Ok(text.into()));
        }
    }

    /// Queue a failure.
    pub fn push_error(&self, err: LlmError) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(Err(err));
        }
    }

    /// Contexts received so far, oldest call first.
    pub fn calls(&self) -> Vec<Vec<Turn>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LanguageModel for ScriptedLanguageModel {
    async fn generate(&self, context: &[Turn]) -> Result<String, LlmError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(context.to_vec());
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
        match next {
            Some(outcome) => outcome,
            None => Ok(self.fallback.clone()),
        }
    }

    fn name(&self) -> String {
        "scripted".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxchat_core::Modality;

    #[tokio::test]
    async fn test_fallback_reply() {
        let lm = ScriptedLanguageModel::new("ok");
        let ctx = [Turn::user("hi", Modality::Typed)];
        assert_eq!(lm.generate(&ctx).await.unwrap(), "ok");
        assert_eq!(lm.generate(&ctx).await.unwrap(), "ok");
        assert_eq!(lm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_script_consumed_in_order() {
        let lm = ScriptedLanguageModel::new("fallback");
        lm.push_reply("one");
        lm.push_error(LlmError::Http("down".to_string()));
        lm.push_reply("three");

        let ctx = [Turn::user("hi", Modality::Typed)];
        assert_eq!(lm.generate(&ctx).await.unwrap(), "one");
        assert!(lm.generate(&ctx).await.is_err());
        assert_eq!(lm.generate(&ctx).await.unwrap(), "three");
        assert_eq!(lm.generate(&ctx).await.unwrap(), "fallback");
    }

    #[tokio::test]
    async fn test_records_context() {
        let lm = ScriptedLanguageModel::new("ok");
        let ctx = [
            Turn::user("a", Modality::Typed),
            Turn::assistant("b", Modality::Typed),
            Turn::user("c", Modality::Spoken),
        ];
        lm.generate(&ctx).await.unwrap();
        let calls = lm.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].len(), 3);
        assert_eq!(calls[0][2].content(), "c");
    }
}
