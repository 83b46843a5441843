//! Failing reply engine - always errors.

use async_trait::async_trait;

use reply_core::{ChatTurn, ReplyEngine, ReplyError};

/// An engine that always fails with an exhausted-providers error.
///
/// Useful for testing terminal generation-failure handling.
#[derive(Debug, Clone)]
pub struct FailingReplyEngine {
    message: String,
}

impl Default for FailingReplyEngine {
    fn default() -> Self {
        Self::with_message("simulated provider failure")
    }
}

impl FailingReplyEngine {
    /// Create an engine failing with the default message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine failing with a custom underlying message.
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl ReplyEngine for FailingReplyEngine {
    async fn generate(&self, _utterance: &str, _history: &[ChatTurn]) -> Result<String, ReplyError> {
        Err(ReplyError::Exhausted {
            last: self.message.clone(),
        })
    }

    fn name(&self) -> &str {
        "FailingReplyEngine"
    }
}
