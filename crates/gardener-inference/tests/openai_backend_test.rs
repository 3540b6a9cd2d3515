//! OpenAI backend against a mock HTTP server.

use std::sync::Arc;

use gardener_core::{
    ChatBackend, CompletionOutcome, ComposedPrompt, FailureKind, RequestOptions,
    WikiLinksResult,
};
use gardener_inference::{CancelToken, CompletionClient, OpenAIBackend, OpenAIConfig};
use serde_json::json;
use wiremock::matchers::{bearer_token, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend_for(server: &MockServer) -> OpenAIBackend {
    OpenAIBackend::new(OpenAIConfig {
        base_url: format!("{}/v1", server.uri()),
        api_key: Some("sk-test".to_string()),
        model: "gpt-35-turbo".to_string(),
        timeout_seconds: 5,
    })
    .unwrap()
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
    })
}

fn prompt() -> ComposedPrompt {
    ComposedPrompt::new("You are the Digital Gardener.", "# Trip\nKyoto next week")
}

#[tokio::test]
async fn test_json_request_wire_format() {
    let server = MockServer::start().await;
    let content = json!({"wikiLinks": [{
        "fileName": "Kyoto.md",
        "linkLabel": "Kyoto",
        "reason": "same trip",
        "score": 0.9
    }]})
    .to_string();

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(bearer_token("sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-35-turbo",
            "temperature": 0.5,
            "max_tokens": 150,
            "stream": false,
            "response_format": {"type": "json_object"},
            "messages": [
                {"role": "system", "content": "You are the Digital Gardener."},
                {"role": "user", "content": "# Trip\nKyoto next week"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(&content)))
        .expect(1)
        .mount(&server)
        .await;

    let client = CompletionClient::new(Arc::new(backend_for(&server)));
    let outcome = client
        .request_json::<WikiLinksResult>(&prompt(), &RequestOptions::default(), &CancelToken::new())
        .await;

    match outcome {
        CompletionOutcome::Success(result) => {
            assert_eq!(result.wiki_links.len(), 1);
            assert_eq!(result.wiki_links[0].link_label, "Kyoto");
        }
        CompletionOutcome::Failed(f) => panic!("unexpected failure: {:?}", f),
    }
}

#[tokio::test]
async fn test_chat_request_has_no_response_format() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Hello gardener")))
        .mount(&server)
        .await;

    let client = CompletionClient::new(Arc::new(backend_for(&server)));
    let options = RequestOptions {
        model: Some("gpt-4".to_string()),
        temperature: Some(0.2),
        max_tokens: Some(500),
    };
    let outcome = client
        .request_chat(&prompt(), &options, &CancelToken::new())
        .await;
    assert_eq!(outcome, CompletionOutcome::Success("Hello gardener".to_string()));

    let received = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&received[0].body).unwrap();
    assert_eq!(body["model"], "gpt-4");
    assert_eq!(body["max_tokens"], 500);
    assert!(body.get("response_format").is_none());
}

#[tokio::test]
async fn test_response_without_choices_or_usage_is_empty_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let client = CompletionClient::new(Arc::new(backend_for(&server)));
    let outcome = client
        .request_chat(&prompt(), &RequestOptions::default(), &CancelToken::new())
        .await;
    assert_eq!(outcome, CompletionOutcome::Success(String::new()));
}

#[tokio::test]
async fn test_unauthorized_is_api_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {
                "message": "Incorrect API key provided",
                "type": "invalid_request_error",
                "code": "invalid_api_key"
            }
        })))
        .mount(&server)
        .await;

    let client = CompletionClient::new(Arc::new(backend_for(&server)));
    let request = client.resolve_request(&prompt(), &RequestOptions::default(), false);
    let err = client.backend().complete(&request).await.unwrap_err().to_string();
    assert!(err.contains("Authentication failed"));
    assert!(err.contains("Incorrect API key provided"));

    let outcome = client
        .request_chat(&prompt(), &RequestOptions::default(), &CancelToken::new())
        .await;
    let failure = outcome.failure().unwrap();
    assert_eq!(failure.kind, FailureKind::Api);
    assert!(failure.message.starts_with("My apologies"));
}

#[tokio::test]
async fn test_unreachable_server_is_network_failure() {
    let backend = OpenAIBackend::new(OpenAIConfig {
        base_url: "http://127.0.0.1:1/v1".to_string(),
        timeout_seconds: 2,
        ..Default::default()
    })
    .unwrap();

    let client = CompletionClient::new(Arc::new(backend));
    let outcome = client
        .request_chat(&prompt(), &RequestOptions::default(), &CancelToken::new())
        .await;
    assert_eq!(outcome.failure().unwrap().kind, FailureKind::Network);
}

#[tokio::test]
async fn test_health_check() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&server)
        .await;

    assert!(backend_for(&server).health_check().await.unwrap());

    let down = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/models"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&down)
        .await;
    assert!(!backend_for(&down).health_check().await.unwrap());
}
