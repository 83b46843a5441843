//! OpenAiReplyEngine implementation.

use reply_core::{
    async_trait, hash_prompt, ChatTurn, ReplyEngine, ReplyError, CLARIFYING_PROMPT,
};
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::api_types::{ApiError, ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use crate::config::OpenAiReplyConfig;

/// Maximum number of prior turns forwarded to the provider.
const MAX_HISTORY_TURNS: usize = 10;

/// A reply engine backed by an OpenAI-compatible chat-completions API.
///
/// Candidate models are tried in configuration order; any request failure
/// (network error, error status, malformed body, empty completion) records
/// the error and moves to the next candidate. The engine holds no
/// conversation state and performs no caching: history arrives per call
/// from the orchestrator.
pub struct OpenAiReplyEngine {
    client: Client,
    config: OpenAiReplyConfig,
}

impl OpenAiReplyEngine {
    /// Create a new engine with the given configuration.
    pub fn new(config: OpenAiReplyConfig) -> Result<Self, ReplyError> {
        let client = Client::builder().build().map_err(|e| {
            ReplyError::Configuration(format!("Failed to create HTTP client: {}", e))
        })?;

        info!(
            "OpenAiReplyEngine initialized with models: [{}], prompt fingerprint: {}",
            config.models.join(", "),
            hash_prompt(&config.system_prompt)
        );

        Ok(Self { client, config })
    }

    /// Create an engine from environment variables.
    ///
    /// See [`OpenAiReplyConfig::from_env`] for the variables read.
    pub fn from_env() -> Result<Self, ReplyError> {
        Self::new(OpenAiReplyConfig::from_env()?)
    }

    /// Get the configuration.
    pub fn config(&self) -> &OpenAiReplyConfig {
        &self.config
    }

    /// Build the messages array for a chat completion request.
    fn build_messages(&self, utterance: &str, history: &[ChatTurn]) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len().min(MAX_HISTORY_TURNS) + 2);

        messages.push(ChatMessage::system(self.config.system_prompt.clone()));

        let tail_start = history.len().saturating_sub(MAX_HISTORY_TURNS);
        for turn in &history[tail_start..] {
            messages.push(ChatMessage {
                role: turn.role.as_str().to_string(),
                content: turn.content.clone(),
            });
        }

        messages.push(ChatMessage::user(utterance));

        messages
    }

    /// Make a chat completion request for a single candidate model.
    ///
    /// Returns the trimmed completion text; an empty completion is an error
    /// so the caller advances to the next candidate.
    async fn chat_completion(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<String, ReplyError> {
        let url = format!("{}/v1/chat/completions", self.config.api_url);

        let request = ChatCompletionRequest {
            model: model.to_string(),
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        debug!("Sending chat completion request for model {}", model);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ReplyError::Network(format!("Failed to send request: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            // Try to parse as API error
            let message = match serde_json::from_str::<ApiError>(&error_text) {
                Ok(api_error) => api_error.error.message,
                Err(_) => error_text,
            };

            return Err(ReplyError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ReplyError::Network(format!("Failed to parse response: {}", e)))?;

        let text = completion
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .map(str::trim)
            .unwrap_or_default();

        if text.is_empty() {
            return Err(ReplyError::EmptyCompletion);
        }

        Ok(text.to_string())
    }
}

#[async_trait]
impl ReplyEngine for OpenAiReplyEngine {
    async fn generate(&self, utterance: &str, history: &[ChatTurn]) -> Result<String, ReplyError> {
        let input = utterance.trim();
        if input.is_empty() {
            // No network call for an empty utterance
            return Ok(CLARIFYING_PROMPT.to_string());
        }

        let messages = self.build_messages(input, history);

        let mut last_error: Option<ReplyError> = None;
        for model in &self.config.models {
            match self.chat_completion(model, messages.clone()).await {
                Ok(text) => {
                    debug!("Model {} produced a reply", model);
                    return Ok(text);
                }
                Err(e) => {
                    warn!("Model {} failed: {}", model, e);
                    last_error = Some(e);
                }
            }
        }

        let last = last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no candidate models configured".to_string());
        Err(ReplyError::Exhausted { last })
    }

    fn name(&self) -> &str {
        "OpenAiReplyEngine"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn engine_for(server: &MockServer, models: &[&str]) -> OpenAiReplyEngine {
        let config = OpenAiReplyConfig {
            api_url: server.uri(),
            api_key: "test-key".to_string(),
            models: models.iter().map(|m| m.to_string()).collect(),
            ..Default::default()
        };
        OpenAiReplyEngine::new(config).unwrap()
    }

    fn completion_body(text: &str) -> serde_json::Value {
        json!({
            "choices": [{"message": {"role": "assistant", "content": text}}]
        })
    }

    #[tokio::test]
    async fn test_first_candidate_success_skips_later_candidates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({"model": "model-a"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("hello")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({"model": "model-b"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("unused")))
            .expect(0)
            .mount(&server)
            .await;

        let engine = engine_for(&server, &["model-a", "model-b"]);
        let reply = engine.generate("hi", &[]).await.unwrap();

        assert_eq!(reply, "hello");
    }

    #[tokio::test]
    async fn test_fallback_to_next_candidate_on_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({"model": "model-a"})))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "error": {"message": "model-a is down"}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({"model": "model-b"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("fallback reply")))
            .expect(1)
            .mount(&server)
            .await;

        let engine = engine_for(&server, &["model-a", "model-b"]);
        let reply = engine.generate("hi", &[]).await.unwrap();

        assert_eq!(reply, "fallback reply");
    }

    #[tokio::test]
    async fn test_empty_completion_counts_as_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({"model": "model-a"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("   ")))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({"model": "model-b"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("real reply")))
            .mount(&server)
            .await;

        let engine = engine_for(&server, &["model-a", "model-b"]);
        let reply = engine.generate("hi", &[]).await.unwrap();

        assert_eq!(reply, "real reply");
    }

    #[tokio::test]
    async fn test_all_candidates_exhausted_carries_last_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({"model": "model-a"})))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "error": {"message": "first failure"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({"model": "model-b"})))
            .respond_with(ResponseTemplate::new(503).set_body_json(json!({
                "error": {"message": "second failure"}
            })))
            .mount(&server)
            .await;

        let engine = engine_for(&server, &["model-a", "model-b"]);
        let err = engine.generate("hi", &[]).await.unwrap_err();

        match err {
            ReplyError::Exhausted { last } => {
                assert!(last.contains("second failure"), "last: {}", last);
            }
            other => panic!("expected Exhausted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_utterance_never_contacts_provider() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("unused")))
            .expect(0)
            .mount(&server)
            .await;

        let engine = engine_for(&server, &["model-a"]);
        let reply = engine.generate("   \n ", &[]).await.unwrap();

        assert_eq!(reply, CLARIFYING_PROMPT);
    }

    #[tokio::test]
    async fn test_history_truncated_to_most_recent_ten() {
        let server = MockServer::start().await;

        let engine = engine_for(&server, &["model-a"]);
        let history: Vec<ChatTurn> = (0..15).map(|i| ChatTurn::user(format!("turn {}", i))).collect();
        let messages = engine.build_messages("latest", &history);

        // system + 10 history turns + new utterance
        assert_eq!(messages.len(), 12);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].content, "turn 5");
        assert_eq!(messages[10].content, "turn 14");
        assert_eq!(messages[11].content, "latest");
    }
}
