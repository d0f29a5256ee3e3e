//! Chat completion client
//!
//! The interviewer persona runs on an OpenAI-compatible chat-completions
//! endpoint (DeepSeek by default, as in the original deployment). The session
//! layer talks to it through the [`ChatBackend`] trait so tests can stub the
//! collaborator out.

use std::time::Duration;

use async_trait::async_trait;

use crate::session::Message;
use crate::{Error, Result};

/// Default chat endpoint (DeepSeek's OpenAI-compatible API)
pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";

/// Default chat model
pub const DEFAULT_MODEL: &str = "deepseek-chat";

/// Request timeout for chat completions
const CHAT_TIMEOUT: Duration = Duration::from_secs(60);

/// Interface the conversation core needs from the chat collaborator:
/// ordered message list in, one assistant reply out
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Produce one assistant reply for the given conversation
    ///
    /// # Errors
    ///
    /// Returns error if the completion fails.
    async fn complete(&self, messages: &[Message]) -> Result<String>;
}

#[derive(serde::Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
}

#[derive(serde::Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(serde::Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(serde::Deserialize)]
struct CompletionMessage {
    content: String,
}

/// Chat-completions client for OpenAI-compatible endpoints
pub struct ChatClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl ChatClient {
    /// Create a new chat client
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or the HTTP client cannot be
    /// built.
    pub fn new(api_key: String, base_url: String, model: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "chat API key required (set DEEPSEEK_API_KEY)".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(CHAT_TIMEOUT)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        })
    }

    /// The configured model identifier
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ChatBackend for ChatClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        tracing::debug!(
            model = %self.model,
            message_count = messages.len(),
            "requesting chat completion"
        );

        let request = CompletionRequest {
            model: &self.model,
            messages,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "chat request failed");
                Error::Chat(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "chat API error");
            return Err(Error::Chat(format!("chat API error {status}: {body}")));
        }

        let completion: CompletionResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "failed to parse chat response");
            Error::Chat(e.to_string())
        })?;

        let reply = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::Chat("chat response contained no choices".to_string()))?;

        tracing::info!(reply_chars = reply.len(), "chat completion received");
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_api_key() {
        let result = ChatClient::new(
            String::new(),
            DEFAULT_BASE_URL.to_string(),
            DEFAULT_MODEL.to_string(),
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn normalizes_trailing_slash_in_base_url() {
        let client = ChatClient::new(
            "key".to_string(),
            "https://api.deepseek.com/".to_string(),
            DEFAULT_MODEL.to_string(),
        )
        .unwrap();
        assert_eq!(client.base_url, "https://api.deepseek.com");
    }

    #[test]
    fn request_serializes_with_lowercase_roles() {
        let messages = vec![
            Message::system("persona"),
            Message::user("hello"),
        ];
        let request = CompletionRequest {
            model: "deepseek-chat",
            messages: &messages,
            stream: false,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["stream"], false);
    }
}
