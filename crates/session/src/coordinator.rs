//! SessionCoordinator — the turn loop, inactivity monitor, and
//! consolidation lifecycle.
//!
//! One coordinator drives one live session. The foreground path runs
//! `process_turn`; a single background task watches for inactivity and
//! consolidates the transcript into a durable Conversation memory.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use fireside_core::completion::{CompletionRequest, CompletionService};
use fireside_core::error::CompletionError;
use fireside_core::memory::{Conversation, Memory};
use fireside_core::message::{Message, Role};
use fireside_memory::{MemoryStore, Persistence};
use fireside_tools::ToolRouter;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::assembler::{StreamAssembler, TurnOutcome};
use crate::event::SessionEvent;
use crate::transcript::TranscriptStore;

/// Runtime knobs for a session, resolved from configuration.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Model name passed through to the completion service
    pub model: String,

    /// Sampling temperature for every request
    pub temperature: f32,

    /// Standing instructions prepended to the system context
    pub initial_prompt: String,

    /// Instructions for the consolidation summary request
    pub summary_prompt: String,

    /// Where the user is, stamped into each user turn's marker
    pub location: String,

    /// Idle time after which the transcript is consolidated
    pub inactivity_threshold: Duration,

    /// How often the monitor checks for inactivity
    pub poll_interval: Duration,

    /// Tool round-trips allowed per turn before failing closed
    pub max_tool_rounds: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".into(),
            temperature: 0.7,
            initial_prompt: "You are a warm, attentive personal companion. \
                             Speak naturally and remember what matters to the user."
                .into(),
            summary_prompt: "Summarize the following conversation in a few sentences, \
                             keeping names, decisions, and anything worth remembering."
                .into(),
            location: "unknown".into(),
            inactivity_threshold: Duration::from_secs(180),
            poll_interval: Duration::from_secs(15),
            max_tool_rounds: 8,
        }
    }
}

/// Orchestrates a single live session.
pub struct SessionCoordinator {
    service: Arc<dyn CompletionService>,
    memory: Arc<MemoryStore>,
    transcript: Arc<TranscriptStore>,
    tools: ToolRouter,
    settings: SessionSettings,
    last_activity: Mutex<Instant>,
    monitor: Mutex<Option<JoinHandle<()>>>,
}

impl SessionCoordinator {
    pub fn new(
        service: Arc<dyn CompletionService>,
        memory: Arc<MemoryStore>,
        transcript: Arc<TranscriptStore>,
        tools: ToolRouter,
        settings: SessionSettings,
    ) -> Self {
        Self {
            service,
            memory,
            transcript,
            tools,
            settings,
            last_activity: Mutex::new(Instant::now()),
            monitor: Mutex::new(None),
        }
    }

    /// Bring the session up: build the system context from memory and
    /// spawn the inactivity monitor. Safe to call once per coordinator.
    pub async fn start_up(self: &Arc<Self>) {
        info!(service = self.service.name(), "Starting session");
        self.build_system_context().await;
        self.spawn_monitor().await;
    }

    /// Process one inbound message and drive it to a final assistant turn.
    ///
    /// Streams `SessionEvent`s to `events` along the way and always returns
    /// the final text: assembled content, or a clearly marked error string.
    /// Completion failures and tool-loop overruns resolve to an error turn;
    /// they never tear the session down.
    pub async fn process_turn(
        &self,
        text: impl Into<String>,
        role: Role,
        events: &mpsc::Sender<SessionEvent>,
    ) -> String {
        let text = text.into();

        if role == Role::User {
            let marker = format!(
                "Current time: {}. Location: {}.",
                Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
                self.settings.location
            );
            self.append(Message::system(marker)).await;
        }

        let inbound = match role {
            Role::User => Message::user(text),
            Role::Assistant => Message::assistant(text),
            Role::System => Message::system(text),
            Role::Tool => Message::tool_result("", text),
        };
        self.append(inbound).await;

        let mut rounds = 0u32;
        loop {
            rounds += 1;

            if rounds > self.settings.max_tool_rounds {
                let message = format!(
                    "error: tool loop exceeded {} rounds without a final response",
                    self.settings.max_tool_rounds
                );
                warn!(rounds, "Tool loop bound reached, failing the turn closed");
                return self.fail_turn(message, events).await;
            }

            match self.stream_once(events).await {
                Ok(TurnOutcome::Content(content)) => {
                    self.append(Message::assistant(content.clone())).await;
                    let _ = events.send(SessionEvent::Done { rounds }).await;
                    self.update_activity().await;
                    return content;
                }
                Ok(TurnOutcome::ToolCall(call)) => {
                    debug!(tool = %call.name, id = %call.id, "Assistant requested a tool");
                    let _ = events
                        .send(SessionEvent::ToolCall {
                            id: call.id.clone(),
                            name: call.name.clone(),
                            arguments: call.arguments.clone(),
                        })
                        .await;
                    self.append(Message::assistant_tool_calls(vec![call.clone()]))
                        .await;

                    let output = self.tools.dispatch(&call.name, &call.arguments).await;
                    let _ = events
                        .send(SessionEvent::ToolResult {
                            id: call.id.clone(),
                            output: output.clone(),
                        })
                        .await;
                    self.append(Message::tool_result(call.id, output)).await;
                }
                Err(e) => {
                    warn!(error = %e, "Completion service failed mid-turn");
                    let message = format!("error: completion service failure: {e}");
                    return self.fail_turn(message, events).await;
                }
            }
        }
    }

    /// Record that the user is active, pushing back the inactivity clock.
    pub async fn update_activity(&self) {
        *self.last_activity.lock().await = Instant::now();
    }

    /// Fold the current transcript into a Conversation memory.
    ///
    /// An empty trimmed transcript is a no-op. A failed summarization leaves
    /// the transcript untouched for a later attempt. Returns whether a
    /// consolidation actually happened.
    pub async fn consolidate(&self) -> bool {
        let trimmed = self.transcript.view(true).await;
        let rendered = render_transcript(&trimmed);
        if rendered.trim().is_empty() {
            debug!("Nothing to consolidate");
            return false;
        }

        let summary = match self.summarize(&rendered).await {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "Summarization failed, keeping transcript for a later attempt");
                return false;
            }
        };

        let conversation = match Conversation::new(rendered, summary) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Could not build conversation record");
                return false;
            }
        };

        match self.memory.add(Memory::Conversation(conversation)).await {
            Persistence::Durable => info!("Consolidated conversation into memory"),
            Persistence::MemoryOnly => {
                warn!("Consolidated conversation is held in memory only")
            }
        }

        self.transcript.clear().await;
        self.build_system_context().await;
        true
    }

    /// Stop the monitor and consolidate whatever is left.
    pub async fn shutdown(&self) {
        if let Some(handle) = self.monitor.lock().await.take() {
            handle.abort();
        }
        self.consolidate().await;
        info!("Session shut down");
    }

    /// Append the system context: identity, memory recap, and any pending
    /// notes queued by the store.
    async fn build_system_context(&self) {
        let identity = self.memory.identity().await;
        let recap = self.memory.recap().await;
        let recap_json = serde_json::to_string(&recap).unwrap_or_else(|_| "[]".into());
        let identity_json = serde_json::to_string(&identity).unwrap_or_else(|_| "{}".into());

        let mut context = format!(
            "Your name is {}. {}\n\nWho you are: {}\n\nRecap of your memories: {}",
            identity.name, self.settings.initial_prompt, identity_json, recap_json
        );
        let details = self.memory.misc_details().await;
        if !details.is_empty() {
            context.push_str("\n\nNotes to yourself: ");
            context.push_str(&details.join("; "));
        }

        self.append(Message::system(context)).await;
    }

    async fn spawn_monitor(self: &Arc<Self>) {
        let mut slot = self.monitor.lock().await;
        if slot.is_some() {
            return;
        }

        let coordinator = Arc::clone(self);
        *slot = Some(tokio::spawn(async move {
            loop {
                tokio::time::sleep(coordinator.settings.poll_interval).await;
                let idle = coordinator.last_activity.lock().await.elapsed();
                if idle >= coordinator.settings.inactivity_threshold {
                    info!(idle_secs = idle.as_secs(), "Inactivity threshold reached");
                    coordinator.consolidate().await;
                    coordinator.update_activity().await;
                }
            }
        }));
    }

    /// One streaming pass over the full transcript, resolved through the
    /// assembler into content or a tool call.
    async fn stream_once(
        &self,
        events: &mpsc::Sender<SessionEvent>,
    ) -> Result<TurnOutcome, CompletionError> {
        let mut request = CompletionRequest::plain(
            self.settings.model.clone(),
            self.transcript.view(false).await,
        );
        request.temperature = self.settings.temperature;
        request.tools = self.tools.definitions();
        request.stream = true;

        let mut rx = self.service.stream(request).await?;
        let mut assembler = StreamAssembler::new();
        while let Some(item) = rx.recv().await {
            let fragment = item?;
            if let Ok(Some(delta)) = assembler.push(&fragment) {
                let _ = events.send(SessionEvent::Chunk { content: delta }).await;
            }
            if fragment.done {
                break;
            }
        }
        assembler
            .finish()
            .map_err(|e| CompletionError::StreamInterrupted(e.to_string()))
    }

    async fn summarize(&self, transcript: &str) -> Result<String, CompletionError> {
        let messages = vec![
            Message::system(self.settings.summary_prompt.clone()),
            Message::user(transcript),
        ];
        let mut request = CompletionRequest::plain(self.settings.model.clone(), messages);
        request.temperature = self.settings.temperature;

        let response = self.service.complete(request).await?;
        if response.content.trim().is_empty() {
            return Err(CompletionError::EmptyResponse);
        }
        Ok(response.content)
    }

    /// Resolve the turn to an error-content message.
    async fn fail_turn(&self, message: String, events: &mpsc::Sender<SessionEvent>) -> String {
        let _ = events
            .send(SessionEvent::Error {
                message: message.clone(),
            })
            .await;
        self.append(Message::assistant(message.clone())).await;
        self.update_activity().await;
        message
    }

    async fn append(&self, message: Message) {
        if let Err(e) = self.transcript.append(message).await {
            warn!(error = %e, "Dropping message that violates transcript invariants");
        }
    }
}

/// Render a trimmed transcript as readable `[Role]: text` lines.
///
/// Every non-system message is kept, tool exchanges included: a tool-call
/// request renders as a `(called ...)` marker and a tool result as a
/// `[Tool]:` line, so the consolidated record preserves what happened.
fn render_transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| {
            let label = match m.role {
                Role::User => "User",
                Role::Assistant => "Assistant",
                Role::System => "System",
                Role::Tool => "Tool",
            };
            if m.tool_calls.is_empty() {
                format!("[{label}]: {}", m.content)
            } else {
                let names: Vec<&str> = m.tool_calls.iter().map(|tc| tc.name.as_str()).collect();
                format!("[{label}]: (called {})", names.join(", "))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
