//! Trigger deduplication keys.

use std::collections::VecDeque;

use chat_backend::Message;

/// Identity of one trigger-worthy message: its text plus the
/// server-assigned timestamp in milliseconds.
///
/// The backend can deliver the same message more than once (reconnects,
/// event replays, local echo followed by the acknowledged copy). Two
/// deliveries of the same message always agree on text and timestamp, so
/// this pair identifies a trigger without relying on message ids, which
/// differ between the provisional and acknowledged copies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerKey(String);

impl TriggerKey {
    /// Key for a message, or None when the message has no server
    /// timestamp yet.
    pub fn of(message: &Message) -> Option<Self> {
        let created_at = message.created_at?;
        Some(Self(format!(
            "{}|{}",
            message.text,
            created_at.timestamp_millis()
        )))
    }
}

/// Bounded memory of recently fired trigger keys, oldest evicted first.
#[derive(Debug)]
pub struct RecentKeys {
    keys: VecDeque<TriggerKey>,
    capacity: usize,
}

impl RecentKeys {
    pub fn new(capacity: usize) -> Self {
        Self {
            keys: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a key. Returns false when the key was already present
    /// (duplicate delivery), true when it is new.
    pub fn insert(&mut self, key: TriggerKey) -> bool {
        if self.keys.contains(&key) {
            return false;
        }
        if self.keys.len() == self.capacity {
            self.keys.pop_front();
        }
        self.keys.push_back(key);
        true
    }
}
