//! The ReplyEngine trait definition.

use async_trait::async_trait;

use crate::error::ReplyError;
use crate::turn::ChatTurn;

/// A trait for generating counselor-style replies to user utterances.
///
/// Implementations can range from canned test engines to hosted model
/// providers. This trait is object-safe and can be used with
/// `Box<dyn ReplyEngine>`.
#[async_trait]
pub trait ReplyEngine: Send + Sync {
    /// Generate a reply for a user utterance.
    ///
    /// # Arguments
    ///
    /// * `utterance` - The new user message to respond to.
    /// * `history` - Prior conversation turns, oldest-first.
    ///
    /// # Returns
    ///
    /// The reply text, or an error once the engine has exhausted its
    /// options. Callers must not retry automatically; a fresh user message
    /// is the retry path.
    async fn generate(&self, utterance: &str, history: &[ChatTurn]) -> Result<String, ReplyError>;

    /// Get a human-readable name for this engine implementation.
    fn name(&self) -> &str;
}
