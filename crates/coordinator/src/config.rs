//! Configuration for the trigger coordinator.

use std::time::Duration;

/// Default time the composing indicator stays up without a bot reply.
const DEFAULT_COMPOSING_TIMEOUT: Duration = Duration::from_secs(30);

/// Number of recent trigger keys remembered for deduplication.
const DEFAULT_RECENT_KEYS: usize = 8;

/// Configuration for [`TriggerCoordinator`](crate::TriggerCoordinator).
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// The identity this coordinator acts for. Only messages from this
    /// identity fire triggers.
    pub user_id: String,

    /// The assistant identity. Messages from it clear the composing
    /// indicator.
    pub bot_id: String,

    /// How long the composing indicator stays up without a bot reply
    /// before being cleared. Default: 30 seconds.
    pub composing_timeout: Duration,

    /// How many recent trigger keys are remembered for deduplication.
    /// Default: 8.
    pub recent_keys: usize,
}

impl CoordinatorConfig {
    /// Config for the given user/bot pair with default timings.
    pub fn new(user_id: impl Into<String>, bot_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            bot_id: bot_id.into(),
            composing_timeout: DEFAULT_COMPOSING_TIMEOUT,
            recent_keys: DEFAULT_RECENT_KEYS,
        }
    }

    /// Override the composing timeout.
    pub fn with_composing_timeout(mut self, timeout: Duration) -> Self {
        self.composing_timeout = timeout;
        self
    }
}
