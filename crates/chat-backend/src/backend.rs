//! The Backend trait: the seam between core logic and the messaging
//! backend.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::BackendError;
use crate::types::{ChannelRef, ChannelState, Message, UserSpec};

/// A stream of new messages observed on a watched channel.
pub type MessageStream = BoxStream<'static, Result<Message, BackendError>>;

/// Operations the orchestrator and coordinator require of the messaging
/// backend.
///
/// The backend is an external collaborator; this trait captures exactly the
/// contract the core depends on: idempotent distinct-channel semantics,
/// ordered message retrieval with limit, and delivery of new-message events
/// to active watchers.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Ensure the given users exist (create-if-absent, else no-op).
    async fn upsert_users(&self, users: &[UserSpec]) -> Result<(), BackendError>;

    /// Create a distinct channel for the exact member set.
    ///
    /// Fails with [`BackendError::ChannelExists`] when a distinct channel
    /// for that member set already exists.
    async fn create_distinct_channel(
        &self,
        channel_type: &str,
        members: &[String],
        created_by: &str,
    ) -> Result<ChannelRef, BackendError>;

    /// Resolve the existing distinct channel for a member set.
    async fn resolve_distinct_channel(
        &self,
        channel_type: &str,
        members: &[String],
    ) -> Result<ChannelRef, BackendError>;

    /// Query a channel's member set and most recent messages (ordered,
    /// oldest-first, limited).
    async fn channel_state(
        &self,
        channel: &ChannelRef,
        message_limit: usize,
    ) -> Result<ChannelState, BackendError>;

    /// Add members to a channel.
    async fn add_members(&self, channel: &ChannelRef, members: &[String])
        -> Result<(), BackendError>;

    /// Send a message into a channel authored by the given identity.
    async fn send_message(
        &self,
        channel: &ChannelRef,
        text: &str,
        author_id: &str,
    ) -> Result<Message, BackendError>;

    /// Subscribe to new-message events on a channel.
    async fn watch(&self, channel: &ChannelRef) -> Result<MessageStream, BackendError>;
}
