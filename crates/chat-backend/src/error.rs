//! Error types for the messaging backend client.

use thiserror::Error;

/// Errors that can occur when interacting with the messaging backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error response from the backend.
    #[error("backend error {status}: {message}")]
    Api { status: u16, message: String },

    /// A distinct channel for the requested member set already exists.
    #[error("distinct channel already exists for member set")]
    ChannelExists,

    /// The requested channel was not found.
    #[error("channel not found")]
    ChannelNotFound,

    /// Backend health check failed.
    #[error("health check failed")]
    HealthCheckFailed,

    /// SSE stream error.
    #[error("SSE error: {0}")]
    Sse(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}
