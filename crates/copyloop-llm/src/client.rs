//! OpenAI-compatible chat completions client.

use std::sync::Arc;

use async_trait::async_trait;
use copyloop_core::{JudgeBackend, JudgeError};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{LlmConfig, ModelSettings};
use crate::error::LlmError;
use crate::retry::{with_retry, RetryPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat client shared by the generator and the judges.
pub struct ChatClient {
    http: reqwest::Client,
    chat_url: String,
    api_key: String,
    retry: RetryPolicy,
}

impl ChatClient {
    /// Build a client. Fails with [`LlmError::MissingApiKey`] when no key is
    /// configured.
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = config.api_key.clone().ok_or(LlmError::MissingApiKey)?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("copyloop/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            chat_url: config.chat_url(),
            api_key,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }

    /// Send `messages` and return the first choice's trimmed content,
    /// retrying transient failures.
    pub async fn complete(
        &self,
        settings: &ModelSettings,
        messages: &[ChatMessage],
    ) -> Result<String, LlmError> {
        with_retry(&self.retry, || self.send_once(settings, messages)).await
    }

    async fn send_once(
        &self,
        settings: &ModelSettings,
        messages: &[ChatMessage],
    ) -> Result<String, LlmError> {
        let request = ChatRequest {
            model: &settings.model,
            messages,
            temperature: settings.temperature,
        };

        let response = self
            .http
            .post(&self.chat_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = serde_json::from_str(&body)?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(LlmError::EmptyResponse)?;

        debug!(model = %settings.model, chars = content.len(), "chat completion received");
        Ok(content)
    }
}

/// [`JudgeBackend`] that sends each judge prompt as a single user message.
pub struct ChatJudge {
    client: Arc<ChatClient>,
    settings: ModelSettings,
}

impl ChatJudge {
    pub fn new(client: Arc<ChatClient>, settings: ModelSettings) -> Self {
        Self { client, settings }
    }
}

#[async_trait]
impl JudgeBackend for ChatJudge {
    async fn judge(&self, prompt: &str) -> Result<String, JudgeError> {
        self.client
            .complete(&self.settings, &[ChatMessage::user(prompt)])
            .await
            .map_err(|e| JudgeError(e.to_string()))
    }
}
