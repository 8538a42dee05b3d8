//! Streaming LLM completions.

pub mod accumulator;
pub mod openai;
pub mod sse;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::CompletionError;

pub use accumulator::{ChatChunk, StreamAccumulator, StreamState};
pub use openai::OpenAiClient;

/// Turns a rendered prompt into the model's reply.
///
/// This abstraction allows mocking the provider in flow tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Stream a completion for a single user message and return the final text.
    ///
    /// Returns [`CompletionError::Refusal`] as soon as the provider finishes a
    /// refusal, and [`CompletionError::Cancelled`] promptly once `cancel` fires.
    async fn generate_completion(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String, CompletionError>;
}
