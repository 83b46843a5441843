//! Error types for trigger handling.

use chat_backend::BackendError;
use thiserror::Error;

/// Errors that can terminate a trigger request.
///
/// Rejected outcomes (caller-caused) map to 4xx statuses and are surfaced
/// verbatim; Failed outcomes (generation exhausted, posting failed) map to
/// 500 and carry diagnostic detail. Degraded steps (history fetch,
/// membership repair) never produce an error at all.
#[derive(Debug, Error)]
pub enum TriggerError {
    /// Caller lacks a permitted role.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Caller exceeded the per-caller request budget.
    #[error("rate limit exceeded")]
    RateLimited,

    /// Malformed request (missing channel reference or message text).
    #[error("invalid request: {0}")]
    Invalid(String),

    /// Reply generation exhausted every provider candidate. Carries the
    /// provider error message for caller-side diagnosis.
    #[error("generation failed: {0}")]
    Generation(String),

    /// Posting the generated reply into the channel failed.
    #[error("posting reply failed: {0}")]
    Post(#[from] BackendError),
}

impl TriggerError {
    /// HTTP-equivalent status for this outcome.
    pub fn status(&self) -> u16 {
        match self {
            TriggerError::Forbidden(_) => 403,
            TriggerError::RateLimited => 429,
            TriggerError::Invalid(_) => 400,
            TriggerError::Generation(_) | TriggerError::Post(_) => 500,
        }
    }

    /// Machine-readable reason tag for error bodies.
    pub fn reason(&self) -> &'static str {
        match self {
            TriggerError::Forbidden(_) => "forbidden",
            TriggerError::RateLimited => "rate_limited",
            TriggerError::Invalid(_) => "invalid_request",
            TriggerError::Generation(_) => "generation_failed",
            TriggerError::Post(_) => "post_failed",
        }
    }
}
