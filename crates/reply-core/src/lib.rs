//! Core trait and types for reply engines.
//!
//! This crate provides the shared interface between the conversation
//! orchestrator and the backing text-generation providers. It defines:
//!
//! - [`ReplyEngine`] - The trait that all reply engines must implement
//! - [`ChatTurn`] / [`TurnRole`] - Conversation turns passed as context
//! - [`ReplyError`] - Error types for reply generation
//! - [`history_window`] - Windowing helper that turns raw channel messages
//!   into labeled turns
//!
//! # Example
//!
//! ```rust
//! use reply_core::{ChatTurn, ReplyEngine, ReplyError};
//! use async_trait::async_trait;
//!
//! struct MyEngine;
//!
//! #[async_trait]
//! impl ReplyEngine for MyEngine {
//!     async fn generate(&self, utterance: &str, history: &[ChatTurn]) -> Result<String, ReplyError> {
//!         Ok(format!("You said: {}", utterance))
//!     }
//!
//!     fn name(&self) -> &str {
//!         "MyEngine"
//!     }
//! }
//! ```

mod engine;
mod error;
mod prompt;
mod turn;

pub use engine::ReplyEngine;
pub use error::ReplyError;
pub use prompt::{hash_prompt, CLARIFYING_PROMPT, COUNSELOR_PROMPT};
pub use turn::{history_window, ChatTurn, TurnRole};

// Re-export async_trait for convenience
pub use async_trait::async_trait;
