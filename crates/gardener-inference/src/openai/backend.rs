//! OpenAI-compatible chat backend implementation.

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};

use gardener_core::defaults::{OPENAI_MODEL, OPENAI_URL, REQUEST_TIMEOUT_SECS};
use gardener_core::{ChatBackend, CompletionRequest, Error, Result, Settings};

use super::error::{to_gardener_error, OpenAIErrorCode};
use super::types::*;

/// Configuration for OpenAI-compatible backend.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// Base URL for the API endpoint.
    pub base_url: String,
    /// API key for authentication (optional for local endpoints).
    pub api_key: Option<String>,
    /// Model used when a request does not name one.
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: OPENAI_URL.to_string(),
            api_key: None,
            model: OPENAI_MODEL.to_string(),
            timeout_seconds: REQUEST_TIMEOUT_SECS,
        }
    }
}

impl OpenAIConfig {
    /// Build from the persisted settings.
    pub fn from_settings(settings: &Settings) -> Self {
        let api_key = settings.api_key.trim();
        Self {
            base_url: settings.base_url.clone(),
            api_key: (!api_key.is_empty()).then(|| api_key.to_string()),
            model: settings.model.clone(),
            timeout_seconds: settings.timeout_seconds,
        }
    }

    /// Build from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| OPENAI_URL.to_string()),
            api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| OPENAI_MODEL.to_string()),
            timeout_seconds: std::env::var("OPENAI_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(REQUEST_TIMEOUT_SECS),
        }
    }
}

/// OpenAI-compatible chat backend.
pub struct OpenAIBackend {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIBackend {
    /// Create a new OpenAI backend with the given configuration.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Inference(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "inference",
            component = "openai",
            url = %config.base_url,
            model = %config.model,
            "Initializing OpenAI backend"
        );

        Ok(Self { client, config })
    }

    /// Create from the persisted settings.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(OpenAIConfig::from_settings(settings))
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(OpenAIConfig::from_env())
    }

    /// Get the current configuration.
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint)
    }

    /// Build a POST request with authentication if configured.
    fn build_request(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let mut req = self.client.post(self.url(endpoint));
        if let Some(ref api_key) = self.config.api_key {
            req = req.bearer_auth(api_key);
        }
        req.header("Content-Type", "application/json")
    }

    /// Build a GET request with authentication.
    fn build_get_request(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let mut req = self.client.get(self.url(endpoint));
        if let Some(ref api_key) = self.config.api_key {
            req = req.bearer_auth(api_key);
        }
        req
    }

    fn to_wire(&self, request: &CompletionRequest) -> ChatCompletionRequest {
        let model = if request.model.trim().is_empty() {
            self.config.model.clone()
        } else {
            request.model.clone()
        };

        ChatCompletionRequest {
            model,
            messages: request
                .messages
                .iter()
                .map(|m| ChatMessage {
                    role: m.role.as_str().to_string(),
                    content: Some(m.content.clone()),
                })
                .collect(),
            temperature: Some(request.temperature),
            max_tokens: Some(request.max_tokens),
            stream: false,
            response_format: request.json_response.then(ResponseFormat::json_object),
        }
    }
}

#[async_trait]
impl ChatBackend for OpenAIBackend {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let body = self.to_wire(request);
        debug!(
            model = %body.model,
            messages = body.messages.len(),
            json = request.json_response,
            "Sending chat completion"
        );

        let response = self
            .build_request("/chat/completions")
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Request(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body: OpenAIErrorResponse = response.json().await.unwrap_or(OpenAIErrorResponse {
                error: OpenAIError {
                    message: "Unknown error".to_string(),
                    error_type: "unknown".to_string(),
                    code: None,
                },
            });
            let error_type = body.error.code.as_deref().unwrap_or(&body.error.error_type);
            let code = OpenAIErrorCode::from_response(status.as_u16(), error_type);
            warn!(status = %status, code = ?code, "OpenAI returned an error");
            return Err(to_gardener_error(
                code,
                &format!("OpenAI returned {}: {}", status, body.error.message),
            ));
        }

        let result: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Inference(format!("Failed to parse response: {}", e)))?;

        if let Some(usage) = &result.usage {
            debug!(
                id = %result.id,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "Token usage"
            );
        }

        let Some(choice) = result.choices.into_iter().next() else {
            warn!(id = %result.id, "Chat completion had no choices");
            return Ok(String::new());
        };
        let content = choice.message.content.unwrap_or_default();

        debug!(
            index = choice.index,
            finish_reason = choice.finish_reason.as_deref().unwrap_or("unknown"),
            response_len = content.len(),
            "Chat completion received"
        );
        Ok(content)
    }

    fn default_model(&self) -> &str {
        &self.config.model
    }

    async fn health_check(&self) -> Result<bool> {
        let response = self
            .build_get_request("/models")
            .timeout(Duration::from_secs(5))
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                info!("OpenAI health check passed");
                Ok(true)
            }
            Ok(resp) => {
                warn!(status = %resp.status(), "OpenAI health check failed");
                Ok(false)
            }
            Err(e) => {
                warn!(error = %e, "OpenAI health check error");
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gardener_core::ChatMessage as CoreMessage;

    #[test]
    fn test_default_config() {
        let config = OpenAIConfig::default();
        assert_eq!(config.base_url, OPENAI_URL);
        assert_eq!(config.model, OPENAI_MODEL);
        assert_eq!(config.timeout_seconds, REQUEST_TIMEOUT_SECS);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_config_from_settings() {
        let settings = Settings {
            api_key: "  sk-test ".to_string(),
            model: "gpt-4".to_string(),
            base_url: "http://localhost:8080/v1".to_string(),
            timeout_seconds: 30,
            ..Default::default()
        };
        let config = OpenAIConfig::from_settings(&settings);
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.model, "gpt-4");
        assert_eq!(config.base_url, "http://localhost:8080/v1");
        assert_eq!(config.timeout_seconds, 30);
    }

    #[test]
    fn test_config_from_settings_without_key() {
        let config = OpenAIConfig::from_settings(&Settings::default());
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_to_wire_json_mode() {
        let backend = OpenAIBackend::new(OpenAIConfig::default()).unwrap();
        let request = CompletionRequest {
            model: String::new(),
            messages: vec![CoreMessage::system("persona"), CoreMessage::user("query")],
            temperature: 0.5,
            max_tokens: 150,
            json_response: true,
        };

        let wire = backend.to_wire(&request);
        assert_eq!(wire.model, OPENAI_MODEL);
        assert_eq!(wire.messages[0].role, "system");
        assert_eq!(wire.messages[1].content.as_deref(), Some("query"));
        assert_eq!(wire.response_format, Some(ResponseFormat::json_object()));
        assert!(!wire.stream);
    }

    #[test]
    fn test_default_model_accessor() {
        let backend = OpenAIBackend::new(OpenAIConfig {
            model: "custom".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(backend.default_model(), "custom");
    }
}
