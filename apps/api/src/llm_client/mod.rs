/// LLM Client: the single point of entry for all OpenAI calls in Larder.
///
/// ARCHITECTURAL RULE: No other module may call the model API directly.
/// Orchestrators depend on the `ChatModel` trait; `LlmClient` is the production
/// implementation and tests substitute a scripted fake.
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

#[cfg(test)]
pub mod fake;

const MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

impl LlmError {
    /// Short class name used when logging upstream failures.
    pub fn kind(&self) -> &'static str {
        match self {
            LlmError::Http(_) => "LlmError::Http",
            LlmError::Api { .. } => "LlmError::Api",
            LlmError::RateLimited { .. } => "LlmError::RateLimited",
            LlmError::EmptyContent => "LlmError::EmptyContent",
        }
    }
}

/// One chat turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A chat-completion request, in the shape the API expects.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ChatRequest {
    pub fn system_user(
        model: &str,
        system: &str,
        user: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature,
            max_tokens,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    size: &'a str,
    n: u32,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// The model operations the orchestrators depend on.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Returns the text content of the first choice, empty when the model
    /// answered with nothing.
    async fn chat(&self, request: ChatRequest) -> Result<String, LlmError>;

    /// Returns a URL to the generated image.
    async fn generate_image(&self, prompt: &str, size: &str) -> Result<String, LlmError>;

    /// Fetches a generated image's bytes.
    async fn download(&self, url: &str) -> Result<Bytes, LlmError>;
}

/// Connection settings for `LlmClient`.
#[derive(Debug, Clone)]
pub struct LlmClientConfig {
    pub api_key: String,
    pub base_url: String,
    pub image_model: String,
    pub timeout: Duration,
    /// Delay before the first transport retry; doubles each attempt.
    pub backoff: Duration,
}

/// OpenAI-compatible client with transport retry on 429/5xx.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    base_url: String,
    image_model: String,
    backoff: Duration,
}

impl LlmClient {
    pub fn new(config: LlmClientConfig) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(config.timeout).build()?,
            api_key: config.api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            image_model: config.image_model,
            backoff: config.backoff,
        })
    }

    /// POSTs `body` to `path`, retrying on 429 (rate limit) and 5xx errors with
    /// exponential backoff. Other failures return immediately.
    async fn post_json<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, LlmError> {
        let url = format!("{}{}", self.base_url, path);
        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                let delay = self.backoff * (1 << (attempt - 1));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            return Ok(response);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_ATTEMPTS,
        }))
    }
}

#[async_trait]
impl ChatModel for LlmClient {
    async fn chat(&self, request: ChatRequest) -> Result<String, LlmError> {
        let response = self.post_json("/v1/chat/completions", &request).await?;
        let completion: ChatCompletion = response.json().await?;

        if let Some(usage) = &completion.usage {
            debug!(
                "LLM call succeeded: model={}, prompt_tokens={}, completion_tokens={}",
                request.model, usage.prompt_tokens, usage.completion_tokens
            );
        }

        // Blank or null content goes to the extractor like any other answer.
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        if content.trim().is_empty() {
            warn!("LLM call returned no content (model={})", request.model);
        }
        Ok(content)
    }

    async fn generate_image(&self, prompt: &str, size: &str) -> Result<String, LlmError> {
        let request = ImageRequest {
            model: &self.image_model,
            prompt,
            size,
            n: 1,
        };
        let response = self.post_json("/v1/images/generations", &request).await?;
        let images: ImageResponse = response.json().await?;

        images
            .data
            .into_iter()
            .find_map(|d| d.url)
            .ok_or(LlmError::EmptyContent)
    }

    async fn download(&self, url: &str) -> Result<Bytes, LlmError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: format!("image download failed for {url}"),
            });
        }
        Ok(response.bytes().await?)
    }
}
