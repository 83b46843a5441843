//! Messaging backend HTTP client.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::backend::{Backend, MessageStream};
use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::sse::EventStream;
use crate::types::{ChannelRef, ChannelState, Message, UserSpec};

/// Error body returned by the backend.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetails,
}

#[derive(Debug, Deserialize)]
struct ErrorDetails {
    message: String,
}

#[derive(Debug, Serialize)]
struct UpsertUsersBody<'a> {
    users: &'a [UserSpec],
}

#[derive(Debug, Serialize)]
struct CreateChannelBody<'a> {
    channel_type: &'a str,
    members: &'a [String],
    distinct: bool,
    created_by: &'a str,
}

#[derive(Debug, Serialize)]
struct QueryChannelBody<'a> {
    channel_type: &'a str,
    members: &'a [String],
    distinct: bool,
}

#[derive(Debug, Serialize)]
struct AddMembersBody<'a> {
    add: &'a [String],
}

#[derive(Debug, Serialize)]
struct SendMessageBody<'a> {
    text: &'a str,
    user_id: &'a str,
}

/// Client for communicating with the messaging backend.
#[derive(Clone)]
pub struct ChatClient {
    http: Client,
    config: BackendConfig,
    connected: Arc<AtomicBool>,
}

impl ChatClient {
    /// Connect to the messaging backend.
    ///
    /// Verifies reachability with a health check before returning.
    pub async fn connect(config: BackendConfig) -> Result<Self, BackendError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(BackendError::Http)?;

        let client = Self {
            http,
            config,
            connected: Arc::new(AtomicBool::new(false)),
        };

        if client.health_check().await? {
            client.connected.store(true, Ordering::SeqCst);
            info!("Connected to messaging backend at {}", client.config.base_url);
        } else {
            return Err(BackendError::HealthCheckFailed);
        }

        Ok(client)
    }

    /// Create a client without probing the backend. Useful when the caller
    /// manages liveness itself.
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(BackendError::Http)?;

        Ok(Self {
            http,
            config,
            connected: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Check if the last health probe succeeded.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Get the configuration.
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Perform a health check against the backend.
    pub async fn health_check(&self) -> Result<bool, BackendError> {
        let url = self.config.check_url();
        debug!("Health check: {}", url);

        match self.authorized(self.http.get(&url)).send().await {
            Ok(resp) => {
                let ok = resp.status().is_success();
                self.connected.store(ok, Ordering::SeqCst);
                Ok(ok)
            }
            Err(e) => {
                self.connected.store(false, Ordering::SeqCst);
                Err(BackendError::Http(e))
            }
        }
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.header("Authorization", format!("Bearer {}", key)),
            None => request,
        }
    }

    /// POST a JSON body and decode a JSON response, mapping backend error
    /// statuses onto the [`BackendError`] taxonomy.
    async fn post_json<T: Serialize, R: DeserializeOwned>(
        &self,
        url: &str,
        body: &T,
    ) -> Result<R, BackendError> {
        let response = self
            .authorized(self.http.post(url))
            .json(body)
            .send()
            .await
            .map_err(BackendError::Http)?;

        let status = response.status();
        if status.is_success() {
            return response.json().await.map_err(BackendError::Http);
        }

        let text = response.text().await.unwrap_or_default();
        Err(Self::map_error(status.as_u16(), text))
    }

    async fn get_json<R: DeserializeOwned>(&self, url: &str) -> Result<R, BackendError> {
        let response = self
            .authorized(self.http.get(url))
            .send()
            .await
            .map_err(BackendError::Http)?;

        let status = response.status();
        if status.is_success() {
            return response.json().await.map_err(BackendError::Http);
        }

        let text = response.text().await.unwrap_or_default();
        Err(Self::map_error(status.as_u16(), text))
    }

    fn map_error(status: u16, body: String) -> BackendError {
        match status {
            409 => BackendError::ChannelExists,
            404 => BackendError::ChannelNotFound,
            _ => {
                let message = match serde_json::from_str::<ErrorBody>(&body) {
                    Ok(parsed) => parsed.error.message,
                    Err(_) => body,
                };
                BackendError::Api { status, message }
            }
        }
    }
}

#[async_trait]
impl Backend for ChatClient {
    async fn upsert_users(&self, users: &[UserSpec]) -> Result<(), BackendError> {
        let _: serde_json::Value = self
            .post_json(&self.config.users_url(), &UpsertUsersBody { users })
            .await?;
        Ok(())
    }

    async fn create_distinct_channel(
        &self,
        channel_type: &str,
        members: &[String],
        created_by: &str,
    ) -> Result<ChannelRef, BackendError> {
        self.post_json(
            &self.config.channels_url(),
            &CreateChannelBody {
                channel_type,
                members,
                distinct: true,
                created_by,
            },
        )
        .await
    }

    async fn resolve_distinct_channel(
        &self,
        channel_type: &str,
        members: &[String],
    ) -> Result<ChannelRef, BackendError> {
        self.post_json(
            &self.config.channels_query_url(),
            &QueryChannelBody {
                channel_type,
                members,
                distinct: true,
            },
        )
        .await
    }

    async fn channel_state(
        &self,
        channel: &ChannelRef,
        message_limit: usize,
    ) -> Result<ChannelState, BackendError> {
        self.get_json(&self.config.channel_url(channel, message_limit))
            .await
    }

    async fn add_members(
        &self,
        channel: &ChannelRef,
        members: &[String],
    ) -> Result<(), BackendError> {
        let _: serde_json::Value = self
            .post_json(&self.config.members_url(channel), &AddMembersBody { add: members })
            .await?;
        Ok(())
    }

    async fn send_message(
        &self,
        channel: &ChannelRef,
        text: &str,
        author_id: &str,
    ) -> Result<Message, BackendError> {
        self.post_json(
            &self.config.messages_url(channel),
            &SendMessageBody {
                text,
                user_id: author_id,
            },
        )
        .await
    }

    async fn watch(&self, channel: &ChannelRef) -> Result<MessageStream, BackendError> {
        let stream = EventStream::open(&self.config, channel)?;
        Ok(stream.boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_error_statuses() {
        assert!(matches!(
            ChatClient::map_error(409, String::new()),
            BackendError::ChannelExists
        ));
        assert!(matches!(
            ChatClient::map_error(404, String::new()),
            BackendError::ChannelNotFound
        ));

        let err = ChatClient::map_error(500, r#"{"error":{"message":"boom"}}"#.to_string());
        match err {
            BackendError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }
}
