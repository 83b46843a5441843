//! In-memory backend for tests.
//!
//! Implements [`Backend`] with the same distinct-channel semantics the real
//! backend guarantees, plus failure injection for exercising degraded and
//! terminal paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use futures::StreamExt;
use tokio::sync::{broadcast, RwLock};
use tokio_stream::wrappers::BroadcastStream;

use crate::backend::{Backend, MessageStream};
use crate::error::BackendError;
use crate::types::{ChannelRef, ChannelState, Message, UserSpec};

#[derive(Debug, Default)]
struct ChannelRecord {
    members: Vec<String>,
    messages: Vec<Message>,
}

#[derive(Default)]
struct State {
    users: HashMap<String, UserSpec>,
    channels: HashMap<String, ChannelRecord>,
    distinct: HashMap<(String, Vec<String>), String>,
}

/// An in-memory messaging backend.
///
/// Cloning shares the underlying state, so a test can hand the same backend
/// to the orchestrator and the coordinator.
#[derive(Clone)]
pub struct InMemoryBackend {
    state: Arc<RwLock<State>>,
    events: broadcast::Sender<(String, Message)>,
    next_id: Arc<AtomicU64>,
    fail_channel_state: Arc<AtomicBool>,
    fail_add_members: Arc<AtomicBool>,
    fail_next_send: Arc<AtomicBool>,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    /// Create an empty backend.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            state: Arc::new(RwLock::new(State::default())),
            events,
            next_id: Arc::new(AtomicU64::new(1)),
            fail_channel_state: Arc::new(AtomicBool::new(false)),
            fail_add_members: Arc::new(AtomicBool::new(false)),
            fail_next_send: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Toggle persistent failure of `channel_state` queries.
    pub fn set_fail_channel_state(&self, fail: bool) {
        self.fail_channel_state.store(fail, Ordering::SeqCst);
    }

    /// Toggle persistent failure of `add_members` calls.
    pub fn set_fail_add_members(&self, fail: bool) {
        self.fail_add_members.store(fail, Ordering::SeqCst);
    }

    /// Make the next `send_message` call fail.
    pub fn fail_next_send(&self) {
        self.fail_next_send.store(true, Ordering::SeqCst);
    }

    /// All messages currently in a channel, for assertions.
    pub async fn messages(&self, channel: &ChannelRef) -> Vec<Message> {
        let state = self.state.read().await;
        state
            .channels
            .get(&channel.cid())
            .map(|record| record.messages.clone())
            .unwrap_or_default()
    }

    /// Current member set of a channel, for assertions.
    pub async fn members(&self, channel: &ChannelRef) -> Vec<String> {
        let state = self.state.read().await;
        state
            .channels
            .get(&channel.cid())
            .map(|record| record.members.clone())
            .unwrap_or_default()
    }

    /// Whether a user has been upserted.
    pub async fn user_exists(&self, id: &str) -> bool {
        let state = self.state.read().await;
        state.users.contains_key(id)
    }

    fn next(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.next_id.fetch_add(1, Ordering::SeqCst))
    }

}

fn injected(what: &str) -> BackendError {
    BackendError::Api {
        status: 500,
        message: format!("injected {} failure", what),
    }
}

#[async_trait]
impl Backend for InMemoryBackend {
    async fn upsert_users(&self, users: &[UserSpec]) -> Result<(), BackendError> {
        let mut state = self.state.write().await;
        for user in users {
            // Create-if-absent; an existing user is left untouched.
            state
                .users
                .entry(user.id.clone())
                .or_insert_with(|| user.clone());
        }
        Ok(())
    }

    async fn create_distinct_channel(
        &self,
        channel_type: &str,
        members: &[String],
        _created_by: &str,
    ) -> Result<ChannelRef, BackendError> {
        let mut sorted = members.to_vec();
        sorted.sort();
        let key = (channel_type.to_string(), sorted.clone());

        let mut state = self.state.write().await;
        if state.distinct.contains_key(&key) {
            return Err(BackendError::ChannelExists);
        }

        let channel = ChannelRef::new(channel_type, self.next("chan"));
        state.distinct.insert(key, channel.cid());
        state.channels.insert(
            channel.cid(),
            ChannelRecord {
                members: sorted,
                messages: Vec::new(),
            },
        );
        Ok(channel)
    }

    async fn resolve_distinct_channel(
        &self,
        channel_type: &str,
        members: &[String],
    ) -> Result<ChannelRef, BackendError> {
        let mut sorted = members.to_vec();
        sorted.sort();
        let key = (channel_type.to_string(), sorted);

        let state = self.state.read().await;
        let cid = state
            .distinct
            .get(&key)
            .ok_or(BackendError::ChannelNotFound)?;
        ChannelRef::parse_cid(cid).ok_or(BackendError::ChannelNotFound)
    }

    async fn channel_state(
        &self,
        channel: &ChannelRef,
        message_limit: usize,
    ) -> Result<ChannelState, BackendError> {
        if self.fail_channel_state.load(Ordering::SeqCst) {
            return Err(injected("channel_state"));
        }

        let state = self.state.read().await;
        let record = state
            .channels
            .get(&channel.cid())
            .ok_or(BackendError::ChannelNotFound)?;

        let start = record.messages.len().saturating_sub(message_limit);
        Ok(ChannelState {
            members: record.members.clone(),
            messages: record.messages[start..].to_vec(),
        })
    }

    async fn add_members(
        &self,
        channel: &ChannelRef,
        members: &[String],
    ) -> Result<(), BackendError> {
        if self.fail_add_members.load(Ordering::SeqCst) {
            return Err(injected("add_members"));
        }

        let mut state = self.state.write().await;
        let record = state
            .channels
            .get_mut(&channel.cid())
            .ok_or(BackendError::ChannelNotFound)?;
        for member in members {
            if !record.members.contains(member) {
                record.members.push(member.clone());
            }
        }
        Ok(())
    }

    async fn send_message(
        &self,
        channel: &ChannelRef,
        text: &str,
        author_id: &str,
    ) -> Result<Message, BackendError> {
        if self.fail_next_send.swap(false, Ordering::SeqCst) {
            return Err(injected("send_message"));
        }

        let message = Message {
            id: self.next("msg"),
            user_id: author_id.to_string(),
            text: text.to_string(),
            created_at: Some(Utc::now()),
        };

        {
            let mut state = self.state.write().await;
            let record = state
                .channels
                .get_mut(&channel.cid())
                .ok_or(BackendError::ChannelNotFound)?;
            record.messages.push(message.clone());
        }

        // Fan out to active watchers; no watchers is fine.
        let _ = self.events.send((channel.cid(), message.clone()));

        Ok(message)
    }

    async fn watch(&self, channel: &ChannelRef) -> Result<MessageStream, BackendError> {
        {
            let state = self.state.read().await;
            if !state.channels.contains_key(&channel.cid()) {
                return Err(BackendError::ChannelNotFound);
            }
        }

        let cid = channel.cid();
        let stream = BroadcastStream::new(self.events.subscribe()).filter_map(move |item| {
            let cid = cid.clone();
            async move {
                match item {
                    Ok((event_cid, message)) if event_cid == cid => Some(Ok(message)),
                    Ok(_) => None,
                    Err(e) => Some(Err(BackendError::Sse(e.to_string()))),
                }
            }
        });
        Ok(stream.boxed())
    }
}
