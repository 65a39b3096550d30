//! StreamAssembler — reconstructs a structured assistant turn from raw
//! completion fragments.
//!
//! The provider forwards deltas exactly as they arrive: partial content
//! and partial tool-call id/name/arguments, each optionally empty. The
//! assembler buffers them in arrival order and resolves the whole stream
//! to exactly one of two outcomes: plain content, or a tool invocation.

use fireside_core::completion::StreamFragment;
use fireside_core::message::{Message, MessageToolCall};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("fragment pushed after the stream was finalized")]
    Finalized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Accumulating,
    Finalized,
}

/// What a completed stream resolved to.
///
/// A tool-call stream may also carry stray content deltas; those are
/// discarded, the two never coexist in the outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Content(String),
    ToolCall(MessageToolCall),
}

impl TurnOutcome {
    /// Render the outcome as the assistant message to append to the
    /// transcript.
    pub fn into_message(self) -> Message {
        match self {
            TurnOutcome::Content(text) => Message::assistant(text),
            TurnOutcome::ToolCall(call) => Message::assistant_tool_calls(vec![call]),
        }
    }
}

/// Accumulates stream fragments for a single completion pass.
#[derive(Debug)]
pub struct StreamAssembler {
    state: State,
    content: String,
    id: String,
    name: String,
    arguments: String,
}

impl Default for StreamAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamAssembler {
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            content: String::new(),
            id: String::new(),
            name: String::new(),
            arguments: String::new(),
        }
    }

    /// Fold one fragment into the buffers.
    ///
    /// Returns the content delta (if the fragment carried one) so the
    /// caller can forward it for live display. Empty deltas are no-op
    /// appends and return `None`.
    pub fn push(&mut self, fragment: &StreamFragment) -> Result<Option<String>, AssembleError> {
        if self.state == State::Finalized {
            return Err(AssembleError::Finalized);
        }
        self.state = State::Accumulating;

        if let Some(tc) = &fragment.tool_call {
            if let Some(id) = &tc.id {
                self.id.push_str(id);
            }
            if let Some(name) = &tc.name {
                self.name.push_str(name);
            }
            if let Some(arguments) = &tc.arguments {
                self.arguments.push_str(arguments);
            }
        }

        match &fragment.content {
            Some(delta) if !delta.is_empty() => {
                self.content.push_str(delta);
                Ok(Some(delta.clone()))
            }
            _ => Ok(None),
        }
    }

    /// Resolve the accumulated buffers into the turn outcome.
    ///
    /// A non-empty id buffer means the stream was a tool invocation; any
    /// buffered content is discarded in that case.
    pub fn finish(&mut self) -> Result<TurnOutcome, AssembleError> {
        if self.state == State::Finalized {
            return Err(AssembleError::Finalized);
        }
        self.state = State::Finalized;

        if self.id.is_empty() {
            return Ok(TurnOutcome::Content(std::mem::take(&mut self.content)));
        }

        if !self.content.is_empty() {
            debug!(
                discarded = self.content.len(),
                "Tool-call stream carried content deltas, discarding"
            );
        }
        Ok(TurnOutcome::ToolCall(MessageToolCall::new(
            std::mem::take(&mut self.id),
            std::mem::take(&mut self.name),
            std::mem::take(&mut self.arguments),
        )))
    }
}
