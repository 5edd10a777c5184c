//! Tests for the async-openai generation adapter against a mock
//! OpenAI-compatible endpoint.

use api_lib::adapters::OpenAiGenerationAdapter;
use api_lib::config::Config;
use fit_advisor_core::domain::ImageInput;
use fit_advisor_core::ports::{GenerationRequest, GenerationService, PortError};
use futures::StreamExt;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn adapter_for(server: &MockServer) -> OpenAiGenerationAdapter {
    let config = Config {
        generation_api_base: server.uri(),
        text_model: "text-model".to_string(),
        vision_model: "vision-model".to_string(),
        ..Config::default()
    };
    OpenAiGenerationAdapter::from_config(&config, "test-key")
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": "text-model",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

#[tokio::test]
async fn generate_returns_the_first_choice_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({ "model": "text-model", "temperature": 0.5 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Size M fits")))
        .expect(1)
        .mount(&server)
        .await;

    let text = adapter_for(&server)
        .generate(GenerationRequest::prompt("tips please").with_sampling(0.5, 256))
        .await
        .unwrap();
    assert_eq!(text, "Size M fits");
}

#[tokio::test]
async fn image_requests_use_the_vision_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({ "model": "vision-model" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("{}")))
        .expect(1)
        .mount(&server)
        .await;

    let request = GenerationRequest::prompt("analyse")
        .with_image(ImageInput::new("image/jpeg", vec![0xFFu8, 0xD8, 0xFF]));
    let text = adapter_for(&server).generate(request).await.unwrap();
    assert_eq!(text, "{}");
}

#[tokio::test]
async fn api_errors_are_collaborator_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "message": "API key not valid",
                "type": "invalid_request_error",
                "param": null,
                "code": null
            }
        })))
        .mount(&server)
        .await;

    let err = adapter_for(&server)
        .generate(GenerationRequest::prompt("hello"))
        .await
        .unwrap_err();
    match err {
        PortError::CollaboratorUnavailable(message) => {
            assert!(message.contains("API key not valid"))
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn empty_choices_are_malformed() {
    let server = MockServer::start().await;
    let mut body = completion("unused");
    body["choices"] = json!([]);
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let err = adapter_for(&server)
        .generate(GenerationRequest::prompt("hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::MalformedResponse(_)));
}

#[tokio::test]
async fn stream_yields_delta_text() {
    let server = MockServer::start().await;
    let chunk = |text: &str| {
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion.chunk",
            "created": 1_700_000_000,
            "model": "text-model",
            "choices": [{ "index": 0, "delta": { "content": text } }]
        })
    };
    let body = format!(
        "data: {}\n\ndata: {}\n\ndata: [DONE]\n\n",
        chunk("Hello"),
        chunk(" there")
    );
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({ "stream": true })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let stream = adapter_for(&server)
        .generate_stream(GenerationRequest::prompt("hi"))
        .await
        .unwrap();
    let chunks: Vec<String> = stream.map(|c| c.unwrap()).collect().await;
    assert_eq!(chunks.concat(), "Hello there");
}
