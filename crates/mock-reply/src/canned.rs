//! Canned reply engine - returns a fixed reply and counts calls.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use reply_core::{ChatTurn, ReplyEngine, ReplyError};

/// Default canned reply, shaped like the counselor persona output.
const DEFAULT_REPLY: &str = "\
1) Validation: That sounds really hard.
2) Thought pattern: all-or-nothing
3) Reframe: One setback does not define what you are capable of.
4) Coping:
- Write down the thought and one piece of evidence against it.
- Take a short walk before revisiting the problem.
5) Tiny step: Spend ten minutes reviewing what went well.";

/// An engine that returns a fixed reply without any network I/O.
///
/// Tracks how many times `generate` was invoked, so tests can assert that
/// rejected requests never reach generation.
#[derive(Debug, Clone)]
pub struct CannedReplyEngine {
    reply: String,
    calls: Arc<AtomicUsize>,
}

impl Default for CannedReplyEngine {
    fn default() -> Self {
        Self::with_reply(DEFAULT_REPLY)
    }
}

impl CannedReplyEngine {
    /// Create an engine with the default structured reply.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with a custom reply.
    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of times `generate` has been invoked.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReplyEngine for CannedReplyEngine {
    async fn generate(&self, _utterance: &str, _history: &[ChatTurn]) -> Result<String, ReplyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }

    fn name(&self) -> &str {
        "CannedReplyEngine"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_canned_reply_and_count() {
        let engine = CannedReplyEngine::with_reply("hello");

        let reply = engine.generate("anything", &[]).await.unwrap();
        assert_eq!(reply, "hello");
        assert_eq!(engine.call_count(), 1);

        let _ = engine.generate("again", &[]).await.unwrap();
        assert_eq!(engine.call_count(), 2);
    }

    #[tokio::test]
    async fn test_default_reply_is_structured() {
        let engine = CannedReplyEngine::new();
        let reply = engine.generate("I failed my exam", &[]).await.unwrap();

        assert!(reply.contains("Validation:"));
        assert!(reply.contains("Thought pattern:"));
        assert!(reply.contains("Reframe:"));
        assert!(reply.contains("Coping:"));
        assert!(reply.contains("Tiny step:"));
    }
}
