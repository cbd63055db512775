//! Scripted `ChatModel` for tests.
//!
//! Chat responses are served in the order they were queued; every request is
//! recorded so tests can assert on prompts and temperatures.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use super::{ChatModel, ChatRequest, LlmError};

#[derive(Default)]
pub struct FakeChatModel {
    responses: Mutex<VecDeque<Result<String, LlmError>>>,
    requests: Mutex<Vec<ChatRequest>>,
    image: Option<(String, Bytes)>,
}

impl FakeChatModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful chat response.
    pub fn respond(self, text: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(text.to_string()));
        self
    }

    /// Queues a failed chat call.
    pub fn fail(self, error: LlmError) -> Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    /// Makes image generation succeed with this URL and payload.
    pub fn with_image(mut self, url: &str, bytes: &'static [u8]) -> Self {
        self.image = Some((url.to_string(), Bytes::from_static(bytes)));
        self
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for FakeChatModel {
    async fn chat(&self, request: ChatRequest) -> Result<String, LlmError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(LlmError::EmptyContent))
    }

    async fn generate_image(&self, _prompt: &str, _size: &str) -> Result<String, LlmError> {
        self.image
            .as_ref()
            .map(|(url, _)| url.clone())
            .ok_or(LlmError::EmptyContent)
    }

    async fn download(&self, _url: &str) -> Result<Bytes, LlmError> {
        self.image
            .as_ref()
            .map(|(_, bytes)| bytes.clone())
            .ok_or(LlmError::EmptyContent)
    }
}
