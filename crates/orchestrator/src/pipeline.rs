//! The per-trigger request pipeline.

use std::time::Duration;

use chat_backend::{Backend, ChannelRef};
use reply_core::{history_window, ReplyEngine};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::TriggerError;
use crate::rate::SlidingWindowLimiter;

/// The only role permitted to invoke the trigger endpoint.
pub const CLIENT_ROLE: &str = "client";

/// Sliding rate-limit window.
const RATE_WINDOW: Duration = Duration::from_secs(60);

/// Maximum trigger requests per caller per window.
const RATE_MAX: usize = 20;

/// Number of recent messages fetched as generation context.
const HISTORY_LIMIT: usize = 10;

/// Caller identity and role, as supplied by the identity provider. The
/// pipeline trusts whatever the provider yielded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: String,
    pub role: String,
}

impl Caller {
    pub fn new(id: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: role.into(),
        }
    }
}

/// A trigger request: a channel reference (by id or compound id) plus the
/// human message text to reply to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_cid: Option<String>,
    #[serde(default)]
    pub message: String,
}

/// Configuration for [`TriggerPipeline`].
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The bot identity replies are authored as.
    pub bot_id: String,
    /// Sliding rate-limit window.
    pub rate_window: Duration,
    /// Maximum requests per caller per window.
    pub rate_max: usize,
    /// Recent messages fetched as generation context.
    pub history_limit: usize,
}

impl PipelineConfig {
    /// Defaults for the given bot identity (60 s window, 20 requests,
    /// 10-message history).
    pub fn new(bot_id: impl Into<String>) -> Self {
        Self {
            bot_id: bot_id.into(),
            rate_window: RATE_WINDOW,
            rate_max: RATE_MAX,
            history_limit: HISTORY_LIMIT,
        }
    }
}

/// Server-side state machine handling one trigger request at a time.
///
/// Each request runs the strictly sequential pipeline: authorize →
/// rate-limit → validate → ensure bot membership → fetch history →
/// generate → post. Membership repair and history fetch are best-effort;
/// generation and posting failures are terminal. No step is retried
/// within a single invocation.
pub struct TriggerPipeline<B: Backend, E: ReplyEngine> {
    backend: B,
    engine: E,
    config: PipelineConfig,
    limiter: SlidingWindowLimiter,
}

impl<B: Backend, E: ReplyEngine> TriggerPipeline<B, E> {
    /// Create a pipeline over the given backend and reply engine.
    pub fn new(backend: B, engine: E, config: PipelineConfig) -> Self {
        let limiter = SlidingWindowLimiter::new(config.rate_window, config.rate_max);
        Self {
            backend,
            engine,
            config,
            limiter,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Handle one trigger request to completion.
    ///
    /// Returns the reply text on success. The orchestrator keeps no record
    /// of the exchange beyond the backend's own message log.
    pub async fn handle(
        &self,
        caller: &Caller,
        request: &TriggerRequest,
    ) -> Result<String, TriggerError> {
        // Authorize
        if caller.role != CLIENT_ROLE {
            return Err(TriggerError::Forbidden(
                "assistant is available to clients only".to_string(),
            ));
        }

        // Rate-limit
        if !self.limiter.try_acquire(&caller.id).await {
            return Err(TriggerError::RateLimited);
        }

        // Validate
        let channel = resolve_channel(request)?;
        if request.message.is_empty() {
            return Err(TriggerError::Invalid(
                "channel reference and message are required".to_string(),
            ));
        }

        info!(
            "Trigger from {} on {}: {}",
            caller.id,
            channel.cid(),
            request.message
        );

        // Ensure bot membership (best-effort: failures never abort the flow)
        self.ensure_bot_membership(&channel).await;

        // Fetch history (best-effort: degrade to empty context on failure)
        let history = match self.backend.channel_state(&channel, self.config.history_limit).await {
            Ok(state) => history_window(
                state
                    .messages
                    .iter()
                    .map(|m| (m.user_id.as_str(), m.text.as_str())),
                &self.config.bot_id,
                self.config.history_limit,
            ),
            Err(e) => {
                warn!("History fetch failed for {}: {}", channel.cid(), e);
                Vec::new()
            }
        };

        // Generate (terminal on failure; the provider message is surfaced
        // to the caller for diagnosis)
        let reply = self
            .engine
            .generate(request.message.trim(), &history)
            .await
            .map_err(|e| TriggerError::Generation(e.to_string()))?;

        // Post as the bot (terminal on failure; the generated text is lost
        // and a fresh human message is the retry path)
        self.backend
            .send_message(&channel, &reply, &self.config.bot_id)
            .await?;

        debug!("Replied on {} as {}", channel.cid(), self.config.bot_id);
        Ok(reply)
    }

    /// Query the channel and add the bot if it is not currently a member.
    /// If the query itself fails, still attempt the add.
    async fn ensure_bot_membership(&self, channel: &ChannelRef) {
        let bot = std::slice::from_ref(&self.config.bot_id);
        match self.backend.channel_state(channel, 0).await {
            Ok(state) => {
                if !state.members.contains(&self.config.bot_id) {
                    if let Err(e) = self.backend.add_members(channel, bot).await {
                        warn!("Failed to add bot to {}: {}", channel.cid(), e);
                    }
                }
            }
            Err(e) => {
                warn!("Membership query failed for {}: {}", channel.cid(), e);
                if let Err(e) = self.backend.add_members(channel, bot).await {
                    warn!("Failed to add bot to {}: {}", channel.cid(), e);
                }
            }
        }
    }
}

/// Resolve the channel reference from a request, preferring the compound
/// id when both are present.
fn resolve_channel(request: &TriggerRequest) -> Result<ChannelRef, TriggerError> {
    if let Some(cid) = request.channel_cid.as_deref() {
        return ChannelRef::parse_cid(cid)
            .ok_or_else(|| TriggerError::Invalid(format!("malformed channel cid: {}", cid)));
    }
    match request.channel_id.as_deref() {
        Some(id) if !id.is_empty() => Ok(ChannelRef::messaging(id)),
        _ => Err(TriggerError::Invalid(
            "channel reference and message are required".to_string(),
        )),
    }
}
