//! Text generation for the booking conversation.
//! The session only sees the `TextGenerator` seam; `ClaudeClient` is the
//! production implementation against the Anthropic Messages API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::GenerationError;
use crate::session::{ChatTurn, Role};

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Produces the assistant's next reply for `history`, whose last turn is
    /// the user's new message.
    async fn reply(&self, system: &str, history: &[ChatTurn]) -> Result<String, GenerationError>;
}

/// Claude API request
#[derive(Debug, Serialize)]
pub struct ClaudeRequest {
    pub model: String,
    pub max_tokens: i32,
    pub system: String,
    pub messages: Vec<ClaudeMessage>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ClaudeMessage {
    pub role: String,
    pub content: String,
}

/// Claude API response
#[derive(Debug, Deserialize)]
pub struct ClaudeResponse {
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub stop_reason: String,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(default)]
    pub text: String,
}

pub struct ClaudeClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    url: String,
    timeout: Duration,
    max_tokens: i32,
}

impl ClaudeClient {
    pub fn new(config: &LlmConfig) -> Result<Self, GenerationError> {
        Ok(Self {
            client: reqwest::Client::builder().build()?,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            url: config.url.clone(),
            timeout: config.timeout,
            max_tokens: config.max_tokens,
        })
    }

    /// One request/response exchange; the timeout covers the body too.
    async fn send_once(&self, request: &ClaudeRequest) -> Result<String, GenerationError> {
        tokio::time::timeout(self.timeout, self.exchange(request))
            .await
            .map_err(|_| GenerationError::Timeout(self.timeout))?
    }

    async fn exchange(&self, request: &ClaudeRequest) -> Result<String, GenerationError> {
        let response = self
            .client
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let claude_response: ClaudeResponse = response.json().await?;
        tracing::debug!(stop_reason = %claude_response.stop_reason, "Claude replied");

        match claude_response.content.first() {
            Some(block) if !block.text.is_empty() => Ok(block.text.clone()),
            _ => Err(GenerationError::Empty),
        }
    }
}

#[async_trait]
impl TextGenerator for ClaudeClient {
    async fn reply(&self, system: &str, history: &[ChatTurn]) -> Result<String, GenerationError> {
        let request = ClaudeRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            system: system.to_string(),
            messages: to_claude_messages(history),
        };

        match self.send_once(&request).await {
            Err(e) if e.is_transient() => {
                tracing::warn!("⚠ Claude call failed ({}), retrying once", e);
                self.send_once(&request).await
            }
            other => other,
        }
    }
}

/// The API wants a user-first history, so the opening greeting is dropped.
pub fn to_claude_messages(history: &[ChatTurn]) -> Vec<ClaudeMessage> {
    history
        .iter()
        .skip_while(|turn| turn.role == Role::Assistant)
        .map(|turn| ClaudeMessage {
            role: turn.role.as_str().to_string(),
            content: turn.text.clone(),
        })
        .collect()
}
