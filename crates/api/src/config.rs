//! Server configuration.

use std::env;

/// Configuration for the gateway server itself. Backend and provider
/// configuration come from their own crates' `from_env`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to listen on.
    pub addr: String,
    /// Identity the assistant acts as.
    pub bot_id: String,
    /// Token table spec, `token=user:role` entries joined with commas.
    pub tokens: String,
}

impl ServerConfig {
    /// Read configuration from environment variables.
    ///
    /// - `SOLACE_API_ADDR` - listen address (default "127.0.0.1:8787")
    /// - `SOLACE_BOT_ID` - assistant identity (default "solace-bot")
    /// - `SOLACE_API_TOKENS` - caller token table, e.g.
    ///   `tok-a=alice:client,tok-c=carol:counselor`
    pub fn from_env() -> Self {
        Self {
            addr: env::var("SOLACE_API_ADDR").unwrap_or_else(|_| "127.0.0.1:8787".to_string()),
            bot_id: env::var("SOLACE_BOT_ID").unwrap_or_else(|_| "solace-bot".to_string()),
            tokens: env::var("SOLACE_API_TOKENS").unwrap_or_default(),
        }
    }
}
