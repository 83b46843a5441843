//! Configuration types for the messaging backend client.

use std::env;

use crate::error::BackendError;
use crate::types::ChannelRef;

/// Configuration for connecting to the messaging backend.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL of the backend HTTP server (e.g., "http://localhost:8080").
    pub base_url: String,
    /// Server API key sent as a bearer credential. If None, requests are
    /// unauthenticated (local development backends).
    pub api_key: Option<String>,
}

impl BackendConfig {
    /// Create a new configuration with the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
        }
    }

    /// Create configuration with an API key.
    pub fn with_api_key(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: Some(api_key.into()),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Required:
    /// - `CHAT_BACKEND_URL` - Base URL of the backend
    ///
    /// Optional:
    /// - `CHAT_BACKEND_API_KEY` - Bearer credential for server calls
    pub fn from_env() -> Result<Self, BackendError> {
        let base_url = env::var("CHAT_BACKEND_URL")
            .map_err(|_| BackendError::Config("CHAT_BACKEND_URL not set".to_string()))?;
        let api_key = env::var("CHAT_BACKEND_API_KEY").ok();
        Ok(Self { base_url, api_key })
    }

    /// URL for user upserts.
    pub fn users_url(&self) -> String {
        format!("{}/api/v1/users", self.base_url)
    }

    /// URL for channel creation.
    pub fn channels_url(&self) -> String {
        format!("{}/api/v1/channels", self.base_url)
    }

    /// URL for distinct-channel resolution.
    pub fn channels_query_url(&self) -> String {
        format!("{}/api/v1/channels/query", self.base_url)
    }

    /// URL for a channel's state (members + recent messages).
    pub fn channel_url(&self, channel: &ChannelRef, message_limit: usize) -> String {
        format!(
            "{}/api/v1/channels/{}/{}?message_limit={}",
            self.base_url,
            urlencoding::encode(&channel.channel_type),
            urlencoding::encode(&channel.id),
            message_limit
        )
    }

    /// URL for membership changes on a channel.
    pub fn members_url(&self, channel: &ChannelRef) -> String {
        format!(
            "{}/api/v1/channels/{}/{}/members",
            self.base_url,
            urlencoding::encode(&channel.channel_type),
            urlencoding::encode(&channel.id)
        )
    }

    /// URL for sending messages into a channel.
    pub fn messages_url(&self, channel: &ChannelRef) -> String {
        format!(
            "{}/api/v1/channels/{}/{}/messages",
            self.base_url,
            urlencoding::encode(&channel.channel_type),
            urlencoding::encode(&channel.id)
        )
    }

    /// URL for a channel's SSE event stream.
    pub fn events_url(&self, channel: &ChannelRef) -> String {
        format!(
            "{}/api/v1/channels/{}/{}/events",
            self.base_url,
            urlencoding::encode(&channel.channel_type),
            urlencoding::encode(&channel.id)
        )
    }

    /// URL for the health check endpoint.
    pub fn check_url(&self) -> String {
        format!("{}/api/v1/check", self.base_url)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::new("http://localhost:8080")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_helpers() {
        let config = BackendConfig::new("http://localhost:9000");
        let channel = ChannelRef::messaging("abc");

        assert_eq!(config.check_url(), "http://localhost:9000/api/v1/check");
        assert_eq!(
            config.channel_url(&channel, 10),
            "http://localhost:9000/api/v1/channels/messaging/abc?message_limit=10"
        );
        assert_eq!(
            config.events_url(&channel),
            "http://localhost:9000/api/v1/channels/messaging/abc/events"
        );
    }
}
