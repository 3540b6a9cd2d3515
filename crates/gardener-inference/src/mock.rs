//! Mock chat backend for deterministic testing.
//!
//! Replies are served in the order they were queued; once the queue is
//! exhausted every further call gets the default reply. Every request is
//! recorded for assertions.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gardener_inference::mock::MockChatBackend;
//!
//! let backend = MockChatBackend::new()
//!     .with_response(r#"{"filenames": []}"#)
//!     .then_network_error("connection refused");
//! assert_eq!(backend.call_count(), 0);
//! ```

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use gardener_core::{ChatBackend, CompletionRequest, Error, Result};

/// What the mock does for one call.
#[derive(Debug, Clone, PartialEq)]
pub enum MockReply {
    Content(String),
    NetworkError(String),
    ApiError(String),
}

/// Mock chat backend for testing.
#[derive(Clone)]
pub struct MockChatBackend {
    config: Arc<MockConfig>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

#[derive(Debug, Clone)]
struct MockConfig {
    model: String,
    queued: Vec<MockReply>,
    default_reply: MockReply,
    latency_ms: u64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            model: "mock-model".to_string(),
            queued: Vec::new(),
            default_reply: MockReply::Content("Mock response".to_string()),
            latency_ms: 0,
        }
    }
}

impl Default for MockChatBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChatBackend {
    /// Create a new mock backend with default configuration.
    pub fn new() -> Self {
        Self {
            config: Arc::new(MockConfig::default()),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Reply to every call with this content.
    pub fn with_response(mut self, content: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).default_reply = MockReply::Content(content.into());
        self
    }

    /// Reply to every call with this JSON value.
    pub fn with_json(self, value: &serde_json::Value) -> Self {
        self.with_response(value.to_string())
    }

    /// Fail every call as if the network were down.
    pub fn with_network_error(mut self, message: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).default_reply = MockReply::NetworkError(message.into());
        self
    }

    /// Fail every call as if the API returned an error status.
    pub fn with_api_error(mut self, message: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).default_reply = MockReply::ApiError(message.into());
        self
    }

    /// Queue a reply for the next unanswered call.
    pub fn then_reply(mut self, reply: MockReply) -> Self {
        Arc::make_mut(&mut self.config).queued.push(reply);
        self
    }

    pub fn then_respond(self, content: impl Into<String>) -> Self {
        self.then_reply(MockReply::Content(content.into()))
    }

    pub fn then_network_error(self, message: impl Into<String>) -> Self {
        self.then_reply(MockReply::NetworkError(message.into()))
    }

    /// Set simulated latency for every call.
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        Arc::make_mut(&mut self.config).latency_ms = latency_ms;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).model = model.into();
        self
    }

    /// All recorded requests, oldest first.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn record(&self, request: &CompletionRequest) -> usize {
        let mut requests = self.requests.lock().unwrap();
        requests.push(request.clone());
        requests.len() - 1
    }
}

#[async_trait]
impl ChatBackend for MockChatBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let call = self.record(request);

        if self.config.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
        }

        let reply = self
            .config
            .queued
            .get(call)
            .unwrap_or(&self.config.default_reply);

        match reply {
            MockReply::Content(content) => Ok(content.clone()),
            MockReply::NetworkError(message) => Err(Error::Request(message.clone())),
            MockReply::ApiError(message) => Err(Error::Inference(message.clone())),
        }
    }

    fn default_model(&self) -> &str {
        &self.config.model
    }
}
