//! Client library for the Solace messaging backend.
//!
//! This crate provides a Rust client for the external messaging backend
//! over HTTP. It supports:
//!
//! - Idempotent user upserts and distinct-channel provisioning primitives
//! - Channel queries with ordered, limited message retrieval
//! - Sending messages authored by an arbitrary member identity
//! - Receiving new-message events via Server-Sent Events (SSE)
//!
//! The [`Backend`] trait is the seam the orchestrator and coordinator are
//! written against; [`ChatClient`] is the HTTP implementation, and the
//! `mock` feature adds an in-memory implementation for tests.
//!
//! # Example
//!
//! ```no_run
//! use chat_backend::{Backend, BackendConfig, ChannelRef, ChatClient};
//!
//! # async fn example() -> Result<(), chat_backend::BackendError> {
//! let config = BackendConfig::new("http://localhost:8080");
//! let client = ChatClient::connect(config).await?;
//!
//! let channel = ChannelRef::messaging("abc123");
//! let message = client.send_message(&channel, "Hello!", "solace-bot").await?;
//! println!("Sent message {}", message.id);
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod client;
pub mod config;
pub mod error;
pub mod sse;
pub mod types;

#[cfg(any(test, feature = "mock"))]
pub mod memory;

pub use backend::{Backend, MessageStream};
pub use client::ChatClient;
pub use config::BackendConfig;
pub use error::BackendError;
pub use types::{ChannelRef, ChannelState, Message, UserSpec, LOCAL_ID_PREFIX};

#[cfg(any(test, feature = "mock"))]
pub use memory::InMemoryBackend;

/// Crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
