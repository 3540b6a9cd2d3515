//! Completion client: the single boundary between commands and the model.
//!
//! Every call runs under a deadline and a [`CancelToken`]. Whatever goes
//! wrong (network, API status, timeout, cancellation, unusable JSON) comes
//! back as [`CompletionOutcome::Failed`], never as an `Err`.

use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, field, info, info_span, warn, Instrument, Span};

use gardener_core::defaults::{
    APOLOGY_MESSAGE, CANCELLED_MESSAGE, MALFORMED_RESPONSE_MESSAGE, REQUEST_MAX_TOKENS,
    REQUEST_TEMPERATURE, REQUEST_TIMEOUT_SECS, TEMPERATURE_MAX,
};
use gardener_core::logging;
use gardener_core::{
    ChatBackend, CompletionFailure, CompletionOutcome, CompletionRequest, ComposedPrompt, Error,
    FailureKind, RequestOptions, Result, StructuredResponse,
};

use crate::cancel::CancelToken;

/// Sends composed prompts to a [`ChatBackend`] and turns the answers into
/// typed outcomes.
#[derive(Clone)]
pub struct CompletionClient {
    backend: Arc<dyn ChatBackend>,
    timeout: Duration,
}

impl CompletionClient {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self {
            backend,
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }

    /// Override the per-request deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Client over the OpenAI backend configured by `settings`.
    #[cfg(feature = "openai")]
    pub fn from_settings(settings: &gardener_core::Settings) -> Result<Self> {
        let backend = crate::openai::OpenAIBackend::from_settings(settings)?;
        Ok(Self::new(Arc::new(backend))
            .with_timeout(Duration::from_secs(settings.timeout_seconds.max(1))))
    }

    pub fn backend(&self) -> &Arc<dyn ChatBackend> {
        &self.backend
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fill unset options with the request defaults.
    pub fn resolve_request(
        &self,
        prompt: &ComposedPrompt,
        options: &RequestOptions,
        json_response: bool,
    ) -> CompletionRequest {
        let model = options
            .model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| self.backend.default_model())
            .to_string();

        let temperature = options
            .temperature
            .filter(|t| t.is_finite())
            .map(|t| t.clamp(0.0, TEMPERATURE_MAX))
            .unwrap_or(REQUEST_TEMPERATURE);

        let max_tokens = options
            .max_tokens
            .filter(|t| *t > 0)
            .unwrap_or(REQUEST_MAX_TOKENS);

        CompletionRequest {
            model,
            messages: prompt.messages().to_vec(),
            temperature,
            max_tokens,
            json_response,
        }
    }

    /// Request a JSON object and parse it into `T`.
    pub async fn request_json<T: StructuredResponse>(
        &self,
        prompt: &ComposedPrompt,
        options: &RequestOptions,
        cancel: &CancelToken,
    ) -> CompletionOutcome<T> {
        let span = info_span!(
            "request_json",
            subsystem = "inference",
            component = "client",
            op = "request_json",
            shape = T::SHAPE,
            model = field::Empty,
            prompt_len = field::Empty,
            response_len = field::Empty,
            duration_ms = field::Empty,
        );

        async move {
            let request = self.resolve_request(prompt, options, true);
            let content = match self.send(&request, cancel).await {
                Ok(content) => content,
                Err(e) => return CompletionOutcome::Failed(self.failure_from_error(&e)),
            };

            match parse_structured::<T>(&content) {
                Ok(value) => {
                    info!("JSON completion parsed");
                    CompletionOutcome::Success(value)
                }
                Err(failure) => {
                    warn!(
                        failure_kind = failure.kind.as_str(),
                        error = %failure.error,
                        "JSON completion rejected"
                    );
                    CompletionOutcome::Failed(failure)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Request free text.
    pub async fn request_chat(
        &self,
        prompt: &ComposedPrompt,
        options: &RequestOptions,
        cancel: &CancelToken,
    ) -> CompletionOutcome<String> {
        let span = info_span!(
            "request_chat",
            subsystem = "inference",
            component = "client",
            op = "request_chat",
            model = field::Empty,
            prompt_len = field::Empty,
            response_len = field::Empty,
            duration_ms = field::Empty,
        );

        async move {
            let request = self.resolve_request(prompt, options, false);
            match self.send(&request, cancel).await {
                Ok(content) => {
                    info!("Chat completion received");
                    CompletionOutcome::Success(content)
                }
                Err(e) => CompletionOutcome::Failed(self.failure_from_error(&e)),
            }
        }
        .instrument(span)
        .await
    }

    /// Run the backend call, racing it against cancellation and the deadline.
    async fn send(&self, request: &CompletionRequest, cancel: &CancelToken) -> Result<String> {
        let span = Span::current();
        span.record(logging::MODEL, request.model.as_str());
        span.record(
            logging::PROMPT_LEN,
            request.messages.iter().map(|m| m.content.len()).sum::<usize>(),
        );
        debug!(
            temperature = request.temperature,
            max_tokens = request.max_tokens,
            json = request.json_response,
            "Dispatching completion request"
        );

        if cancel.is_cancelled() {
            return Err(Error::Cancelled("cancelled before sending".to_string()));
        }

        let start = Instant::now();
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled("cancelled by user".to_string())),
            outcome = tokio::time::timeout(self.timeout, self.backend.complete(request)) => {
                match outcome {
                    Ok(result) => result,
                    Err(_) => Err(Error::Timeout(self.timeout.as_secs())),
                }
            }
        };

        span.record(logging::DURATION_MS, start.elapsed().as_millis() as u64);
        if let Ok(ref content) = result {
            span.record(logging::RESPONSE_LEN, content.len());
        }
        result
    }

    fn failure_from_error(&self, err: &Error) -> CompletionFailure {
        let failure = match err {
            Error::Cancelled(_) => CompletionFailure::new(FailureKind::Cancelled, "", CANCELLED_MESSAGE),
            Error::Timeout(_) => {
                CompletionFailure::new(FailureKind::Timeout, err.to_string(), APOLOGY_MESSAGE)
            }
            Error::Request(_) | Error::Io(_) => {
                CompletionFailure::new(FailureKind::Network, err.to_string(), APOLOGY_MESSAGE)
            }
            Error::MalformedResponse(detail) => CompletionFailure::new(
                FailureKind::MalformedResponse,
                detail.clone(),
                MALFORMED_RESPONSE_MESSAGE,
            ),
            _ => CompletionFailure::new(FailureKind::Api, err.to_string(), APOLOGY_MESSAGE),
        };
        warn!(
            failure_kind = failure.kind.as_str(),
            error = %err,
            "Completion request failed"
        );
        failure
    }
}

/// Remove a surrounding markdown code fence (```` ```json ```` … ```` ``` ````).
pub fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. `json`) on the opening line, or before
    // the body when the whole reply is on one line.
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest.strip_prefix("json").unwrap_or(rest),
    };
    rest.trim_end().trim_end_matches("```").trim()
}

/// Parse model output into `T`, classifying every way it can go wrong.
pub fn parse_structured<T: StructuredResponse>(
    content: &str,
) -> std::result::Result<T, CompletionFailure> {
    let malformed = |detail: String| {
        CompletionFailure::new(
            FailureKind::MalformedResponse,
            detail,
            MALFORMED_RESPONSE_MESSAGE,
        )
    };

    let json = strip_code_fences(content);
    if json.is_empty() {
        return Err(malformed("empty response".to_string()));
    }

    let value: JsonValue = serde_json::from_str(json)
        .map_err(|e| malformed(format!("response is not valid JSON: {}", e)))?;

    if let Some(obj) = value.as_object() {
        if let Some(error) = obj.get("error") {
            let error = match error {
                JsonValue::String(s) => s.clone(),
                other => other.to_string(),
            };
            let message = obj
                .get("message")
                .and_then(JsonValue::as_str)
                .unwrap_or_default();
            return Err(CompletionFailure::new(
                FailureKind::ModelReported,
                error,
                message,
            ));
        }
    }

    let parsed: T = serde_json::from_value(value)
        .map_err(|e| malformed(format!("expected {} shape: {}", T::SHAPE, e)))?;
    parsed
        .validate()
        .map_err(|e| malformed(format!("invalid {}: {}", T::SHAPE, e)))?;
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockChatBackend;
    use gardener_core::{FilenamesResult, NewFileResult};
    use serde_json::json;

    fn prompt() -> ComposedPrompt {
        ComposedPrompt::new("You are the Digital Gardener.", "Plan a trip")
    }

    fn client(backend: &MockChatBackend) -> CompletionClient {
        CompletionClient::new(Arc::new(backend.clone()))
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{}\n```\n"), "{}");
        assert_eq!(strip_code_fences("  {\"a\":1} "), "{\"a\":1}");
        assert_eq!(strip_code_fences("```json{\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```[1, 2]```"), "[1, 2]");
    }

    #[test]
    fn test_resolve_request_defaults() {
        let backend = MockChatBackend::new().with_model("gpt-35-turbo");
        let request = client(&backend).resolve_request(&prompt(), &RequestOptions::default(), true);

        assert_eq!(request.model, "gpt-35-turbo");
        assert_eq!(request.temperature, 0.5);
        assert_eq!(request.max_tokens, 150);
        assert!(request.json_response);
        assert_eq!(request.messages.len(), 2);
    }

    #[test]
    fn test_resolve_request_overrides_and_clamps() {
        let backend = MockChatBackend::new();
        let options = RequestOptions {
            model: Some("gpt-4".to_string()),
            temperature: Some(9.0),
            max_tokens: Some(0),
        };
        let request = client(&backend).resolve_request(&prompt(), &options, false);

        assert_eq!(request.model, "gpt-4");
        assert_eq!(request.temperature, 2.0);
        assert_eq!(request.max_tokens, 150);
    }

    #[tokio::test]
    async fn test_request_json_success() {
        let backend = MockChatBackend::new().with_json(&json!({
            "filename": "Trip Plan",
            "content": "Day one",
            "frontmatter": {"tags": ["travel"]}
        }));

        let outcome = client(&backend)
            .request_json::<NewFileResult>(&prompt(), &RequestOptions::default(), &CancelToken::new())
            .await;

        match outcome {
            CompletionOutcome::Success(result) => {
                assert_eq!(result.filename, "Trip Plan");
                assert_eq!(result.frontmatter["tags"], json!(["travel"]));
            }
            CompletionOutcome::Failed(f) => panic!("unexpected failure: {:?}", f),
        }
        assert!(backend.last_request().unwrap().json_response);
    }

    #[tokio::test]
    async fn test_request_json_strips_fences() {
        let backend = MockChatBackend::new()
            .with_response("```json\n{\"filenames\": [{\"fileName\": \"Kyoto\", \"reason\": \"r\", \"score\": 0.9}]}\n```");

        let outcome = client(&backend)
            .request_json::<FilenamesResult>(&prompt(), &RequestOptions::default(), &CancelToken::new())
            .await;
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_request_json_accepts_one_line_fence() {
        let backend = MockChatBackend::new()
            .with_response("```json{\"filenames\": [{\"fileName\": \"Kyoto\", \"reason\": \"r\", \"score\": 0.9}]}```");

        let outcome = client(&backend)
            .request_json::<FilenamesResult>(&prompt(), &RequestOptions::default(), &CancelToken::new())
            .await;
        assert!(outcome.is_success());
    }

    #[tokio::test]
    async fn test_model_reported_error() {
        let backend = MockChatBackend::new()
            .with_json(&json!({"error": "unsafe_request", "message": "I can't help with that."}));

        let outcome = client(&backend)
            .request_json::<NewFileResult>(&prompt(), &RequestOptions::default(), &CancelToken::new())
            .await;

        let failure = outcome.failure().unwrap();
        assert_eq!(failure.kind, FailureKind::ModelReported);
        assert_eq!(failure.display_text(), "I can't help with that. unsafe_request");
    }

    #[tokio::test]
    async fn test_wrong_shape_is_malformed() {
        let backend = MockChatBackend::new().with_json(&json!({"title": "nope"}));

        let outcome = client(&backend)
            .request_json::<NewFileResult>(&prompt(), &RequestOptions::default(), &CancelToken::new())
            .await;
        assert_eq!(outcome.failure().unwrap().kind, FailureKind::MalformedResponse);
    }

    #[tokio::test]
    async fn test_invalid_json_is_malformed() {
        let backend = MockChatBackend::new().with_response("Sure! Here is your file.");

        let outcome = client(&backend)
            .request_json::<NewFileResult>(&prompt(), &RequestOptions::default(), &CancelToken::new())
            .await;
        assert_eq!(outcome.failure().unwrap().kind, FailureKind::MalformedResponse);
    }

    #[tokio::test]
    async fn test_validation_failure_is_malformed() {
        let backend = MockChatBackend::new().with_json(&json!({"filename": "  ", "content": "x"}));

        let outcome = client(&backend)
            .request_json::<NewFileResult>(&prompt(), &RequestOptions::default(), &CancelToken::new())
            .await;
        let failure = outcome.failure().unwrap();
        assert_eq!(failure.kind, FailureKind::MalformedResponse);
        assert!(failure.error.contains("filename is empty"));
    }

    #[tokio::test]
    async fn test_network_failure_uses_apology() {
        let backend = MockChatBackend::new().with_network_error("connection refused");

        let outcome = client(&backend)
            .request_chat(&prompt(), &RequestOptions::default(), &CancelToken::new())
            .await;
        let failure = outcome.failure().unwrap();
        assert_eq!(failure.kind, FailureKind::Network);
        assert_eq!(failure.message, APOLOGY_MESSAGE);
    }

    #[tokio::test]
    async fn test_api_failure_uses_apology() {
        let backend = MockChatBackend::new().with_api_error("Rate limit exceeded");

        let outcome = client(&backend)
            .request_chat(&prompt(), &RequestOptions::default(), &CancelToken::new())
            .await;
        let failure = outcome.failure().unwrap();
        assert_eq!(failure.kind, FailureKind::Api);
        assert_eq!(failure.message, APOLOGY_MESSAGE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout() {
        let backend = MockChatBackend::new().with_latency_ms(10_000);
        let client = client(&backend).with_timeout(Duration::from_secs(2));

        let outcome = client
            .request_chat(&prompt(), &RequestOptions::default(), &CancelToken::new())
            .await;
        let failure = outcome.failure().unwrap();
        assert_eq!(failure.kind, FailureKind::Timeout);
        assert_eq!(failure.error, "Timed out after 2s");
    }

    #[tokio::test]
    async fn test_cancel_during_request() {
        let backend = MockChatBackend::new().with_latency_ms(5_000);
        let client = client(&backend);
        let cancel = CancelToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let outcome = client
            .request_chat(&prompt(), &RequestOptions::default(), &cancel)
            .await;
        assert_eq!(outcome.failure().unwrap().kind, FailureKind::Cancelled);
    }

    #[tokio::test]
    async fn test_cancelled_before_sending_never_calls_backend() {
        let backend = MockChatBackend::new();
        let cancel = CancelToken::new();
        cancel.cancel();

        let outcome = client(&backend)
            .request_chat(&prompt(), &RequestOptions::default(), &cancel)
            .await;
        assert_eq!(outcome.failure().unwrap().kind, FailureKind::Cancelled);
        assert_eq!(backend.call_count(), 0);
    }
}
