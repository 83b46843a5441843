//! Error types for reply generation.

use thiserror::Error;

/// Errors that can occur during reply generation.
#[derive(Debug, Error)]
pub enum ReplyError {
    /// The engine is misconfigured (e.g. missing API key).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A network-level failure talking to a provider.
    #[error("network error: {0}")]
    Network(String),

    /// The provider returned an error response.
    #[error("provider error ({status}): {message}")]
    Provider { status: u16, message: String },

    /// The provider returned a completion with no usable text.
    #[error("provider returned empty completion")]
    EmptyCompletion,

    /// Every configured provider candidate failed. Carries the message of
    /// the last underlying failure.
    #[error("all providers exhausted: {last}")]
    Exhausted { last: String },
}
