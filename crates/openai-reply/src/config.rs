//! Configuration for the OpenAI-compatible reply engine.

use std::env;

use reply_core::{ReplyError, COUNSELOR_PROMPT};

/// Configuration for [`crate::OpenAiReplyEngine`].
#[derive(Debug, Clone)]
pub struct OpenAiReplyConfig {
    /// Chat-completions API base URL.
    pub api_url: String,

    /// API key for authentication.
    pub api_key: String,

    /// Ordered candidate models. Tried in order; the first candidate that
    /// returns non-empty text wins.
    pub models: Vec<String>,

    /// System instruction constraining the reply persona.
    pub system_prompt: String,

    /// Maximum tokens for the reply.
    pub max_tokens: Option<u32>,

    /// Temperature for generation.
    pub temperature: Option<f32>,
}

impl Default for OpenAiReplyConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com".to_string(),
            api_key: String::new(),
            models: vec![
                "gpt-4o-mini".to_string(),
                "gpt-4o".to_string(),
                "gpt-3.5-turbo".to_string(),
            ],
            system_prompt: COUNSELOR_PROMPT.to_string(),
            max_tokens: Some(180),
            temperature: Some(0.5),
        }
    }
}

impl OpenAiReplyConfig {
    /// Create configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `OPENAI_API_KEY` - API key for authentication
    ///
    /// Optional environment variables:
    /// - `OPENAI_API_URL` - API base URL (default: https://api.openai.com)
    /// - `OPENAI_MODELS` - Comma-separated model fallback chain
    /// - `OPENAI_MAX_TOKENS` - Max tokens (default: 180)
    /// - `OPENAI_TEMPERATURE` - Temperature (default: 0.5)
    pub fn from_env() -> Result<Self, ReplyError> {
        let api_key = env::var("OPENAI_API_KEY")
            .map_err(|_| ReplyError::Configuration("OPENAI_API_KEY not set".to_string()))?;

        let defaults = Self::default();

        let api_url = env::var("OPENAI_API_URL").unwrap_or(defaults.api_url);

        let models = match env::var("OPENAI_MODELS") {
            Ok(raw) => {
                let parsed: Vec<String> = raw
                    .split(',')
                    .map(|m| m.trim().to_string())
                    .filter(|m| !m.is_empty())
                    .collect();
                if parsed.is_empty() {
                    return Err(ReplyError::Configuration(
                        "OPENAI_MODELS is set but contains no model names".to_string(),
                    ));
                }
                parsed
            }
            Err(_) => defaults.models,
        };

        let max_tokens = env::var("OPENAI_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(defaults.max_tokens);

        let temperature = env::var("OPENAI_TEMPERATURE")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(defaults.temperature);

        Ok(Self {
            api_url,
            api_key,
            models,
            system_prompt: defaults.system_prompt,
            max_tokens,
            temperature,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_fallback_chain() {
        let config = OpenAiReplyConfig::default();
        assert_eq!(config.models.len(), 3);
        assert_eq!(config.models[0], "gpt-4o-mini");
    }
}
