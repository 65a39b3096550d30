//! Session-level streaming events.
//!
//! `SessionEvent` wraps provider-level stream fragments into higher-level
//! events a frontend can render live: text chunks, tool round-trips, and
//! turn completion.

use serde::{Deserialize, Serialize};

/// Events emitted by the coordinator while processing a turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Partial text from the completion service.
    Chunk { content: String },

    /// The assistant is calling a tool.
    ToolCall {
        id: String,
        name: String,
        arguments: String,
    },

    /// Tool execution completed.
    ToolResult { id: String, output: String },

    /// An error occurred; the turn resolves to an error-content message.
    Error { message: String },

    /// The turn is complete — how many completion rounds it took.
    Done { rounds: u32 },
}

impl SessionEvent {
    /// Wire-level event name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Chunk { .. } => "chunk",
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
            Self::Error { .. } => "error",
            Self::Done { .. } => "done",
        }
    }
}
