//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use git_auto_commit::OpenAiClient;

pub const TEST_MODEL: &str = "gpt-4o-mini";
pub const TEST_KEY: &str = "sk-test";

/// A streamed chunk carrying `text` as content for choice 0.
pub fn content_chunk(text: &str) -> String {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion.chunk",
        "choices": [{"index": 0, "delta": {"content": text}, "finish_reason": null}]
    })
    .to_string()
}

/// A streamed chunk carrying `text` as refusal for choice 0.
pub fn refusal_chunk(text: &str) -> String {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion.chunk",
        "choices": [{"index": 0, "delta": {"refusal": text}, "finish_reason": null}]
    })
    .to_string()
}

/// The final chunk for choice 0.
pub fn finish_chunk(reason: &str) -> String {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion.chunk",
        "choices": [{"index": 0, "delta": {}, "finish_reason": reason}]
    })
    .to_string()
}

/// Frame chunks as an SSE body terminated by `[DONE]`.
pub fn sse_body(chunks: &[String]) -> String {
    let mut body = String::new();
    for chunk in chunks {
        body.push_str("data: ");
        body.push_str(chunk);
        body.push_str("\n\n");
    }
    body.push_str("data: [DONE]\n\n");
    body
}

/// SSE body that streams `text` in word-sized pieces and finishes normally.
pub fn completion_body(text: &str) -> String {
    let mut chunks: Vec<String> = text
        .split_inclusive(' ')
        .map(content_chunk)
        .collect();
    chunks.push(finish_chunk("stop"));
    sse_body(&chunks)
}

pub fn sse_response(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/event-stream")
}

/// Serve every chat-completion request with `body`.
pub async fn mount_completion(server: &MockServer, body: String) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(sse_response(body))
        .mount(server)
        .await;
}

/// Client pointed at the mock server.
pub fn client_for(server: &MockServer) -> OpenAiClient {
    OpenAiClient::new(server.uri(), TEST_KEY, TEST_MODEL).expect("Failed to build client")
}

/// JSON bodies of every request the server has seen.
pub async fn request_bodies(server: &MockServer) -> Vec<serde_json::Value> {
    server
        .received_requests()
        .await
        .expect("request recording is enabled")
        .iter()
        .map(|r| r.body_json().expect("request body is JSON"))
        .collect()
}

/// Entries in the system temp dir whose names start with `prefix`.
pub fn temp_entries(prefix: &str) -> HashSet<PathBuf> {
    std::fs::read_dir(std::env::temp_dir())
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .filter(|e| e.file_name().to_string_lossy().starts_with(prefix))
                .map(|e| e.path())
                .collect()
        })
        .unwrap_or_default()
}

/// A one-shot HTTP server that answers with SSE headers and `events`, then
/// holds the connection open without sending anything else.
///
/// Returns the base URI and a receiver that fires once `events` is written.
pub async fn stalling_sse_server(events: String) -> (String, oneshot::Receiver<()>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("listener has an address");
    let (sent_tx, sent_rx) = oneshot::channel();

    tokio::spawn(async move {
        let Ok((mut socket, _)) = listener.accept().await else {
            return;
        };

        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            match socket.read(&mut buf).await {
                Ok(0) | Err(_) => return,
                Ok(n) => request.extend_from_slice(&buf[..n]),
            }
        }

        let head = "HTTP/1.1 200 OK\r\n\
                    Content-Type: text/event-stream\r\n\
                    Transfer-Encoding: chunked\r\n\r\n";
        let chunk = format!("{:x}\r\n{}\r\n", events.len(), events);
        if socket.write_all(head.as_bytes()).await.is_err()
            || socket.write_all(chunk.as_bytes()).await.is_err()
            || socket.flush().await.is_err()
        {
            return;
        }
        let _ = sent_tx.send(());

        tokio::time::sleep(Duration::from_secs(60)).await;
    });

    (format!("http://{}", addr), sent_rx)
}
