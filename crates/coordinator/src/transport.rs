//! Transport to the gateway's trigger and provisioning endpoints.

use async_trait::async_trait;
use chat_backend::ChannelRef;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

/// Errors from the trigger transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP transport failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway rejected the request.
    #[error("gateway error ({status}): {message}")]
    Gateway { status: u16, message: String },

    /// The gateway returned an unusable payload.
    #[error("malformed gateway response: {0}")]
    Malformed(String),
}

/// How the coordinator reaches the gateway.
///
/// A trait so tests can drive the coordinator against an in-process
/// pipeline instead of a live HTTP server.
#[async_trait]
pub trait TriggerTransport: Send + Sync {
    /// Provision (or resolve) the direct channel for a member pair.
    async fn provision_direct(
        &self,
        member_a: &str,
        member_b: &str,
    ) -> Result<ChannelRef, TransportError>;

    /// Ask the assistant to reply to `message` in `channel`. The reply
    /// itself arrives through the channel watch, not this call.
    async fn trigger(&self, channel: &ChannelRef, message: &str) -> Result<(), TransportError>;
}

#[derive(Debug, Deserialize)]
struct DirectChannelBody {
    cid: String,
}

/// HTTP transport talking to the gateway with a caller bearer token.
#[derive(Debug, Clone)]
pub struct HttpTrigger {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpTrigger {
    /// Create a transport for the gateway at `base_url`, authenticating
    /// with the caller's bearer token.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    async fn post(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<reqwest::Response, TransportError> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TransportError::Gateway {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl TriggerTransport for HttpTrigger {
    async fn provision_direct(
        &self,
        member_a: &str,
        member_b: &str,
    ) -> Result<ChannelRef, TransportError> {
        let response = self
            .post(
                "/v1/channels/direct",
                json!({ "members": [member_a, member_b] }),
            )
            .await?;

        let body: DirectChannelBody = response.json().await?;
        ChannelRef::parse_cid(&body.cid)
            .ok_or_else(|| TransportError::Malformed(format!("bad channel cid: {}", body.cid)))
    }

    async fn trigger(&self, channel: &ChannelRef, message: &str) -> Result<(), TransportError> {
        self.post(
            "/v1/assistant/message",
            json!({ "channel_cid": channel.cid(), "message": message }),
        )
        .await?;
        Ok(())
    }
}
