//! Conversation turns and history windowing.

use serde::{Deserialize, Serialize};

/// The author side of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// The human participant.
    User,
    /// The automated counselor.
    Assistant,
}

impl TurnRole {
    /// Wire-format role string ("user" / "assistant").
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        }
    }
}

/// A single prior turn passed to a reply engine as context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub content: String,
}

impl ChatTurn {
    /// Create a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }
}

/// Build a generation-context window from raw channel messages.
///
/// Takes `(author_id, text)` pairs in channel order (oldest-first), drops
/// turns with empty text, labels each remaining turn `Assistant` when the
/// author is the bot identity and `User` otherwise, and keeps only the most
/// recent `max_turns` turns, still oldest-first.
///
/// The window is ephemeral generation context; it is never persisted.
pub fn history_window<'a, I>(messages: I, bot_id: &str, max_turns: usize) -> Vec<ChatTurn>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut turns: Vec<ChatTurn> = messages
        .into_iter()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(author, text)| {
            if author == bot_id {
                ChatTurn::assistant(text)
            } else {
                ChatTurn::user(text)
            }
        })
        .collect();

    if turns.len() > max_turns {
        let excess = turns.len() - max_turns;
        turns.drain(0..excess);
    }

    turns
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOT: &str = "solace-bot";

    #[test]
    fn test_labels_by_author() {
        let turns = history_window(
            vec![("alice", "hi"), (BOT, "hello, how can I help?")],
            BOT,
            10,
        );

        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, TurnRole::User);
        assert_eq!(turns[1].role, TurnRole::Assistant);
        assert_eq!(turns[1].content, "hello, how can I help?");
    }

    #[test]
    fn test_drops_empty_text() {
        let turns = history_window(vec![("alice", "hi"), ("alice", "   "), (BOT, "")], BOT, 10);

        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].content, "hi");
    }

    #[test]
    fn test_keeps_most_recent_oldest_first() {
        let messages: Vec<(String, String)> = (0..15)
            .map(|i| ("alice".to_string(), format!("message {}", i)))
            .collect();
        let turns = history_window(
            messages.iter().map(|(a, t)| (a.as_str(), t.as_str())),
            BOT,
            10,
        );

        assert_eq!(turns.len(), 10);
        assert_eq!(turns[0].content, "message 5");
        assert_eq!(turns[9].content, "message 14");
    }

    #[test]
    fn test_role_wire_strings() {
        assert_eq!(TurnRole::User.as_str(), "user");
        assert_eq!(TurnRole::Assistant.as_str(), "assistant");
    }
}
