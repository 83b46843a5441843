//! Delayed reply engine - wraps another engine with artificial delay.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use reply_core::{ChatTurn, ReplyEngine, ReplyError};

/// An engine that wraps another engine and adds artificial delay.
///
/// Useful for testing composing-state timeouts and simulating provider
/// latency.
pub struct DelayedReplyEngine<E: ReplyEngine> {
    inner: E,
    delay: Duration,
}

impl<E: ReplyEngine> DelayedReplyEngine<E> {
    /// Wrap the given engine with the specified delay.
    pub fn new(inner: E, delay: Duration) -> Self {
        Self { inner, delay }
    }

    /// Wrap with a delay in milliseconds.
    pub fn with_millis(inner: E, millis: u64) -> Self {
        Self::new(inner, Duration::from_millis(millis))
    }
}

#[async_trait]
impl<E: ReplyEngine> ReplyEngine for DelayedReplyEngine<E> {
    async fn generate(&self, utterance: &str, history: &[ChatTurn]) -> Result<String, ReplyError> {
        sleep(self.delay).await;
        self.inner.generate(utterance, history).await
    }

    fn name(&self) -> &str {
        "DelayedReplyEngine"
    }
}
