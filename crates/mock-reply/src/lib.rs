//! Mock reply engines for testing the conversation orchestrator.
//!
//! This crate provides mock implementations of the `ReplyEngine` trait:
//! - `CannedReplyEngine` - Returns a fixed reply and counts invocations
//! - `FailingReplyEngine` - Always fails with a configurable message
//! - `DelayedReplyEngine` - Wraps another engine with artificial delay
//!
//! For production generation, use the `openai-reply` crate instead.

mod canned;
mod delayed;
mod failing;

// Re-export reply-core types for convenience
pub use reply_core::{async_trait, ChatTurn, ReplyEngine, ReplyError, TurnRole};

pub use canned::CannedReplyEngine;
pub use delayed::DelayedReplyEngine;
pub use failing::FailingReplyEngine;
