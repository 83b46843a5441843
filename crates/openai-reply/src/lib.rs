//! OpenAI-compatible reply engine with ordered model fallback.
//!
//! This crate implements the [`reply_core::ReplyEngine`] trait against any
//! OpenAI-compatible chat-completions endpoint. It maintains an ordered
//! list of candidate models and fails over to the next candidate on any
//! request failure, succeeding on the first candidate that returns
//! non-empty text.
//!
//! Empty or whitespace-only utterances are answered with a fixed
//! clarifying prompt without contacting any provider.

mod api_types;
mod config;
mod engine;

pub use config::OpenAiReplyConfig;
pub use engine::OpenAiReplyEngine;

// Re-export reply-core types for convenience
pub use reply_core::{ChatTurn, ReplyEngine, ReplyError, TurnRole};
