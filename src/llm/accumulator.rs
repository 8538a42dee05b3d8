//! Per-request accumulation of streamed chat-completion chunks.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::CompletionError;

/// One `data:` payload of a streamed chat completion.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub delta: Delta,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Delta {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub refusal: Option<String>,
}

/// Where the stream stands. Everything but `Streaming` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Streaming,
    Refused,
    Completed,
    TransportFailed,
}

impl StreamState {
    pub fn is_terminal(self) -> bool {
        self != StreamState::Streaming
    }
}

#[derive(Debug, Default)]
struct ChoiceBuffer {
    content: String,
    refusal: String,
}

/// Builds the final message from chunks and stops at the first finished refusal.
///
/// Owned by exactly one in-flight request.
#[derive(Debug)]
pub struct StreamAccumulator {
    state: StreamState,
    chunks_seen: usize,
    choices: BTreeMap<u32, ChoiceBuffer>,
    refusal: Option<String>,
    error: Option<CompletionError>,
}

impl Default for StreamAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self {
            state: StreamState::Streaming,
            chunks_seen: 0,
            choices: BTreeMap::new(),
            refusal: None,
            error: None,
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn chunks_seen(&self) -> usize {
        self.chunks_seen
    }

    /// Content accumulated so far for the first choice.
    pub fn partial_content(&self) -> &str {
        self.choices
            .values()
            .next()
            .map(|c| c.content.as_str())
            .unwrap_or("")
    }

    pub fn refusal(&self) -> Option<&str> {
        self.refusal.as_deref()
    }

    /// Fold one chunk in and return the resulting state.
    ///
    /// A refusal counts as finished when its choice reports a finish reason,
    /// or when a later chunk for that choice stops carrying refusal text.
    /// Chunks arriving after a terminal state are ignored.
    pub fn add_chunk(&mut self, chunk: ChatChunk) -> StreamState {
        if self.state.is_terminal() {
            return self.state;
        }
        self.chunks_seen += 1;

        for choice in chunk.choices {
            let buffer = self.choices.entry(choice.index).or_default();
            let had_refusal = !buffer.refusal.is_empty();

            let refusal_delta = choice.delta.refusal.filter(|r| !r.is_empty());
            let refusal_continues = refusal_delta.is_some();
            if let Some(text) = refusal_delta {
                buffer.refusal.push_str(&text);
            }
            if let Some(text) = choice.delta.content {
                buffer.content.push_str(&text);
            }

            let finished = choice.finish_reason.is_some() || (had_refusal && !refusal_continues);
            if !buffer.refusal.is_empty() && finished {
                self.refusal = Some(buffer.refusal.clone());
                self.state = StreamState::Refused;
                return self.state;
            }
        }

        self.state
    }

    /// Record that the provider signalled a normal end of stream.
    pub fn complete(&mut self) {
        if !self.state.is_terminal() {
            self.state = StreamState::Completed;
        }
    }

    /// Record a transport failure. Terminal.
    pub fn fail(&mut self, error: CompletionError) {
        if !self.state.is_terminal() {
            self.state = StreamState::TransportFailed;
            self.error = Some(error);
        }
    }

    /// Resolve to the first choice's message, or the terminal error.
    ///
    /// A refusal still in progress when the stream ends is reported as a
    /// refusal, never as message content.
    pub fn finish(self) -> Result<String, CompletionError> {
        match self.state {
            StreamState::Refused => Err(CompletionError::Refusal(self.refusal.unwrap_or_default())),
            StreamState::TransportFailed => Err(self.error.unwrap_or(CompletionError::Cancelled)),
            StreamState::Streaming | StreamState::Completed => {
                if let Some(pending) = self.choices.values().find(|c| !c.refusal.is_empty()) {
                    return Err(CompletionError::Refusal(pending.refusal.clone()));
                }
                self.choices
                    .into_values()
                    .next()
                    .map(|c| c.content)
                    .ok_or(CompletionError::EmptyResponse)
            }
        }
    }
}
