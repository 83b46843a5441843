//! Conversation orchestrator for the Solace counseling assistant.
//!
//! This crate is the server-side control point for bot-mediated
//! conversations. It provides:
//!
//! - [`ChannelProvisioner`] - idempotent, order-insensitive provisioning of
//!   the distinct channel for an unordered member pair, with a one-time
//!   welcome message when the bot channel is first created
//! - [`TriggerPipeline`] - the per-request state machine that authorizes a
//!   trigger, repairs bot membership, fetches history, generates a reply
//!   and posts it back into the channel
//! - [`SlidingWindowLimiter`] - per-caller request budgeting
//!
//! The pipeline is strictly sequential per request and holds no shared
//! mutable state across requests beyond the rate-limit counters.

mod error;
mod pipeline;
mod provision;
mod rate;

pub use error::TriggerError;
pub use pipeline::{Caller, PipelineConfig, TriggerPipeline, TriggerRequest, CLIENT_ROLE};
pub use provision::{ChannelProvisioner, Provisioned, BOT_CHANNEL_TYPE, WELCOME_MESSAGE};
pub use rate::SlidingWindowLimiter;
