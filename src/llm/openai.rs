//! Streaming chat completions against an OpenAI-compatible endpoint.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use super::accumulator::{ChatChunk, StreamAccumulator, StreamState};
use super::sse::{SseDecoder, SseEvent};
use super::CompletionClient;
use crate::config::Config;
use crate::error::CompletionError;

/// Fixed sampling seed so the same diff yields the same suggestion.
pub const SEED: i64 = 0;

const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Streaming chat-completion client.
#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    seed: i64,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// A streamed payload is either a chunk or an error object.
#[derive(Debug, Deserialize)]
struct StreamPayload {
    #[serde(default)]
    error: Option<ApiErrorBody>,
    #[serde(flatten)]
    chunk: ChatChunk,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

/// Pull the human-readable message out of an error response body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

impl OpenAiClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, CompletionError> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(CompletionError::Transport)?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// Build the client for the configured provider.
    pub fn from_config(config: &Config) -> Result<Self, CompletionError> {
        if !config.provider.eq_ignore_ascii_case("openai") {
            return Err(CompletionError::UnsupportedProvider(config.provider.clone()));
        }
        Self::new(&config.base_url, &config.api_key, &config.model)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Apply one SSE event to the accumulator and return the new state.
    fn apply_event(acc: &mut StreamAccumulator, event: SseEvent, status: u16) -> StreamState {
        let data = match event {
            SseEvent::Done => {
                acc.complete();
                return acc.state();
            }
            SseEvent::Data(data) => data,
        };

        match serde_json::from_str::<StreamPayload>(&data) {
            Ok(StreamPayload {
                error: Some(err), ..
            }) => acc.fail(CompletionError::Api {
                status,
                message: err.message,
            }),
            Ok(payload) => {
                let state = acc.add_chunk(payload.chunk);
                debug!(chunks = acc.chunks_seen(), "stream chunk received");
                if state == StreamState::Refused {
                    warn!(refusal = acc.refusal().unwrap_or_default(), "model refused to respond");
                }
            }
            Err(e) => acc.fail(CompletionError::Decode(e.to_string())),
        }
        acc.state()
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn generate_completion(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String, CompletionError> {
        debug!(model = %self.model, prompt_len = prompt.len(), "requesting completion");

        let request = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            seed: SEED,
            stream: true,
        };

        let send = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send();

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(CompletionError::Cancelled),
            response = send => response.map_err(CompletionError::Transport)?,
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = error_message(&body);
            error!(status = status.as_u16(), %message, "completion request rejected");
            return Err(CompletionError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let mut body = Box::pin(response.bytes_stream());
        let mut decoder = SseDecoder::new();
        let mut acc = StreamAccumulator::new();

        'stream: loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    acc.fail(CompletionError::Cancelled);
                    break 'stream;
                }
                next = body.next() => next,
            };

            match next {
                Some(Ok(bytes)) => {
                    for event in decoder.push(&bytes) {
                        if Self::apply_event(&mut acc, event, status.as_u16()).is_terminal() {
                            break 'stream;
                        }
                    }
                }
                Some(Err(e)) => {
                    error!(error = %e, "stream error while generating completion");
                    acc.fail(CompletionError::Transport(e));
                    break 'stream;
                }
                None => {
                    if let Some(event) = decoder.finish() {
                        Self::apply_event(&mut acc, event, status.as_u16());
                    }
                    acc.complete();
                    break 'stream;
                }
            }
        }

        debug!(chunks = acc.chunks_seen(), state = ?acc.state(), "stream finished");
        acc.finish()
    }
}
