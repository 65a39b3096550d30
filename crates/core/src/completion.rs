//! CompletionService trait — the abstraction over the hosted
//! language-completion collaborator.
//!
//! A service knows how to send an ordered message list (plus tool schemas)
//! and get back either a complete message or a sequence of incremental
//! fragments. Assembly of fragments into a structured turn is the session
//! layer's job, not the service's.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CompletionError;
use crate::message::Message;

/// Configuration for a completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The model to use (e.g., "gpt-4o")
    pub model: String,

    /// The ordered conversation messages
    pub messages: Vec<Message>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Available tools the model can call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,

    /// Whether to stream the response
    #[serde(default)]
    pub stream: bool,
}

fn default_temperature() -> f32 {
    0.7
}

impl CompletionRequest {
    /// A plain request with no tools and no streaming — used for
    /// summarization during consolidation.
    pub fn plain(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: default_temperature(),
            max_tokens: None,
            tools: Vec::new(),
            stream: false,
        }
    }
}

/// A tool definition sent to the service so the model knows what it can call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// A single incremental fragment of a streamed completion.
///
/// Each fragment carries zero or more of: a content delta, a tool-call
/// delta. Every delta field may be empty; empty deltas are no-op appends.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamFragment {
    /// Partial content delta
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Partial tool-call delta
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<ToolCallFragment>,

    /// Whether this is the final fragment
    #[serde(default)]
    pub done: bool,
}

impl StreamFragment {
    pub fn content(delta: impl Into<String>) -> Self {
        Self {
            content: Some(delta.into()),
            ..Self::default()
        }
    }

    pub fn done() -> Self {
        Self {
            done: true,
            ..Self::default()
        }
    }
}

/// A partial tool call — id, name, and arguments each arrive as fragments
/// that must be concatenated in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallFragment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

/// A receiver of streamed fragments. Errors mid-stream arrive in-band.
pub type FragmentReceiver =
    tokio::sync::mpsc::Receiver<std::result::Result<StreamFragment, CompletionError>>;

/// The core CompletionService trait.
///
/// The session coordinator calls `complete()` or `stream()` without knowing
/// which backend is in use — pure polymorphism.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// A human-readable name for this service (e.g., "openai").
    fn name(&self) -> &str;

    /// Send a request and get a complete response message.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<Message, CompletionError>;

    /// Send a request and get a stream of response fragments.
    ///
    /// Default implementation calls `complete()` and replays the result as
    /// content fragments followed by a final done fragment.
    async fn stream(
        &self,
        request: CompletionRequest,
    ) -> std::result::Result<FragmentReceiver, CompletionError> {
        let message = self.complete(request).await?;
        let (tx, rx) = tokio::sync::mpsc::channel(8);
        let _ = tx.send(Ok(StreamFragment::content(message.content))).await;
        for tc in message.tool_calls {
            let _ = tx
                .send(Ok(StreamFragment {
                    tool_call: Some(ToolCallFragment {
                        id: Some(tc.id),
                        name: Some(tc.name),
                        arguments: Some(tc.arguments),
                    }),
                    ..StreamFragment::default()
                }))
                .await;
        }
        let _ = tx.send(Ok(StreamFragment::done())).await;
        Ok(rx)
    }
}
