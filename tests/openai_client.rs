use httpmock::prelude::*;
use reply_helper::llm::ChatMessage;
use reply_helper::{Completer, CompletionError, CompletionRequest, OpenAiResponses};
use serde_json::json;

fn request() -> CompletionRequest {
    CompletionRequest {
        model: "gpt-4.1-mini".into(),
        messages: vec![ChatMessage::system("be brief"), ChatMessage::user("hi")],
    }
}

#[tokio::test]
async fn posts_messages_and_reads_output_text() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/responses")
                .header("authorization", "Bearer sk-test")
                .json_body(json!({
                    "model": "gpt-4.1-mini",
                    "input": [
                        {"role": "system", "content": "be brief"},
                        {"role": "user", "content": "hi"}
                    ]
                }));
            then.status(200)
                .json_body(json!({"id": "resp_1", "output_text": "hello!"}));
        })
        .await;

    let client = OpenAiResponses::new(server.url("/v1"), "sk-test");
    let resp = client.complete(&request()).await.unwrap();
    mock.assert_async().await;
    assert_eq!(resp.text(), "hello!");
}

#[tokio::test]
async fn reads_structured_output_list() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/responses");
            then.status(200).json_body(json!({
                "output": [
                    {"type": "message", "role": "assistant", "content": [
                        {"type": "output_text", "text": "line one", "annotations": []},
                        {"type": "output_text", "text": "line two", "annotations": []}
                    ]}
                ]
            }));
        })
        .await;

    let client = OpenAiResponses::new(server.url("/v1/"), "k");
    let resp = client.complete(&request()).await.unwrap();
    assert_eq!(resp.text(), "line one\nline two");
}

#[tokio::test]
async fn quota_errors_are_recognised() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/responses");
            then.status(429).json_body(json!({
                "error": {
                    "message": "You exceeded your current quota, please check your plan and billing details.",
                    "type": "insufficient_quota",
                    "code": "insufficient_quota"
                }
            }));
        })
        .await;

    let client = OpenAiResponses::new(server.url("/v1"), "k");
    let err = client.complete(&request()).await.unwrap_err();
    assert!(matches!(err, CompletionError::QuotaExceeded(_)));
}

#[tokio::test]
async fn other_errors_carry_status_and_body() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/responses");
            then.status(500).body("upstream exploded");
        })
        .await;

    let client = OpenAiResponses::new(server.url("/v1"), "k");
    let err = client.complete(&request()).await.unwrap_err();
    match err {
        CompletionError::Remote(msg) => {
            assert!(msg.contains("500"));
            assert!(msg.contains("upstream exploded"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_json_is_a_remote_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/responses");
            then.status(200).body("<html>");
        })
        .await;

    let client = OpenAiResponses::new(server.url("/v1"), "k");
    let err = client.complete(&request()).await.unwrap_err();
    assert!(matches!(err, CompletionError::Remote(_)));
}

#[tokio::test]
async fn null_content_items_are_skipped() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/responses");
            then.status(200).json_body(json!({
                "output": [
                    {"type": "reasoning", "content": null},
                    {"type": "message", "content": [{"type": "output_text", "text": "hello"}]}
                ]
            }));
        })
        .await;

    let client = OpenAiResponses::new(server.url("/v1"), "k");
    let resp = client.complete(&request()).await.unwrap();
    assert_eq!(resp.text(), "hello");
}
