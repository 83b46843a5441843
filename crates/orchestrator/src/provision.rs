//! Idempotent channel provisioning.

use chat_backend::{Backend, BackendError, ChannelRef, UserSpec};
use tracing::{debug, info, warn};

/// Channel type used for bot-mediated and direct conversations.
pub const BOT_CHANNEL_TYPE: &str = "messaging";

/// Welcome message the bot posts when its channel is first created.
pub const WELCOME_MESSAGE: &str = "Hi, I'm here whenever you want to talk something through. \
What's on your mind today?";

/// Result of provisioning a channel for a member pair.
#[derive(Debug, Clone)]
pub struct Provisioned {
    /// Fully-qualified channel reference for downstream addressing.
    pub channel: ChannelRef,
    /// Whether this call created the channel (vs. resolved an existing
    /// one). Guards the one-time welcome message.
    pub created: bool,
}

/// Provisions the distinct conversation channel for an unordered member
/// pair.
///
/// Provisioning is idempotent and commutative in its arguments: the pair
/// (A, B) and (B, A) map to the same channel, and repeated calls return the
/// same channel without error.
pub struct ChannelProvisioner<B: Backend> {
    backend: B,
    bot_id: String,
    bot_name: String,
}

impl<B: Backend> ChannelProvisioner<B> {
    /// Create a provisioner for the given bot identity.
    pub fn new(backend: B, bot_id: impl Into<String>) -> Self {
        Self {
            backend,
            bot_id: bot_id.into(),
            bot_name: "Solace Assistant".to_string(),
        }
    }

    /// Override the bot's display name.
    pub fn with_bot_name(mut self, name: impl Into<String>) -> Self {
        self.bot_name = name.into();
        self
    }

    /// The bot identity this provisioner recognizes.
    pub fn bot_id(&self) -> &str {
        &self.bot_id
    }

    /// Provision the distinct channel for `member_a` and `member_b`.
    ///
    /// Sorts the pair, upserts both identities, attempts creation, and
    /// falls back to resolving the existing channel when the backend
    /// reports the member set already has one. If this call created a
    /// channel that includes the bot, a single welcome message authored by
    /// the bot is sent.
    pub async fn provision(
        &self,
        member_a: &str,
        member_b: &str,
        created_by: &str,
    ) -> Result<Provisioned, BackendError> {
        let mut members = vec![member_a.to_string(), member_b.to_string()];
        members.sort();

        let users: Vec<UserSpec> = members
            .iter()
            .map(|id| {
                if id == &self.bot_id {
                    UserSpec::named(id, self.bot_name.clone())
                } else {
                    UserSpec::bare(id)
                }
            })
            .collect();
        self.backend.upsert_users(&users).await?;

        let provisioned = match self
            .backend
            .create_distinct_channel(BOT_CHANNEL_TYPE, &members, created_by)
            .await
        {
            Ok(channel) => {
                info!("Created channel {} for members {:?}", channel.cid(), members);
                Provisioned {
                    channel,
                    created: true,
                }
            }
            Err(BackendError::ChannelExists) => {
                let channel = self
                    .backend
                    .resolve_distinct_channel(BOT_CHANNEL_TYPE, &members)
                    .await?;
                debug!("Resolved existing channel {} for members {:?}", channel.cid(), members);
                Provisioned {
                    channel,
                    created: false,
                }
            }
            Err(e) => return Err(e),
        };

        // Welcome exactly when this call created a bot channel; the
        // create-vs-resolve result is the guard, not message history.
        if provisioned.created && members.iter().any(|id| id == &self.bot_id) {
            if let Err(e) = self
                .backend
                .send_message(&provisioned.channel, WELCOME_MESSAGE, &self.bot_id)
                .await
            {
                warn!(
                    "Failed to send welcome message to {}: {}",
                    provisioned.channel.cid(),
                    e
                );
            }
        }

        Ok(provisioned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_backend::InMemoryBackend;

    const BOT: &str = "solace-bot";

    #[tokio::test]
    async fn test_provision_idempotent_and_order_insensitive() {
        let backend = InMemoryBackend::new();
        let provisioner = ChannelProvisioner::new(backend.clone(), BOT);

        let first = provisioner.provision("alice", BOT, "alice").await.unwrap();
        assert!(first.created);

        // Reversed argument order resolves the same channel.
        let second = provisioner.provision(BOT, "alice", "alice").await.unwrap();
        assert!(!second.created);
        assert_eq!(second.channel, first.channel);
    }

    #[tokio::test]
    async fn test_welcome_sent_only_on_creation() {
        let backend = InMemoryBackend::new();
        let provisioner = ChannelProvisioner::new(backend.clone(), BOT);

        let first = provisioner.provision("alice", BOT, "alice").await.unwrap();
        let _ = provisioner.provision("alice", BOT, "alice").await.unwrap();
        let _ = provisioner.provision(BOT, "alice", "alice").await.unwrap();

        let messages = backend.messages(&first.channel).await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].text, WELCOME_MESSAGE);
        assert!(messages[0].is_from(BOT));
    }

    #[tokio::test]
    async fn test_no_welcome_for_human_pair() {
        let backend = InMemoryBackend::new();
        let provisioner = ChannelProvisioner::new(backend.clone(), BOT);

        let provisioned = provisioner.provision("alice", "bob", "alice").await.unwrap();
        assert!(provisioned.created);

        let messages = backend.messages(&provisioned.channel).await;
        assert!(messages.is_empty());
    }

    #[tokio::test]
    async fn test_members_upserted() {
        let backend = InMemoryBackend::new();
        let provisioner = ChannelProvisioner::new(backend.clone(), BOT);

        provisioner.provision("alice", BOT, "alice").await.unwrap();

        assert!(backend.user_exists("alice").await);
        assert!(backend.user_exists(BOT).await);
    }
}
