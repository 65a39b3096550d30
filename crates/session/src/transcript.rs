//! TranscriptStore — the ordered message log for the active session.
//!
//! The in-memory log is the source of truth; `chat.json` is a best-effort
//! mirror rewritten in full after every append, so a crash loses at most
//! the write in flight. Persistence failures are logged, never propagated.

use std::path::PathBuf;

use fireside_core::error::TranscriptError;
use fireside_core::message::{Message, Role};
use tokio::sync::RwLock;
use tracing::{debug, warn};

pub struct TranscriptStore {
    path: Option<PathBuf>,
    log: RwLock<Vec<Message>>,
}

impl TranscriptStore {
    /// Open a transcript backed by `chat.json` at the given path, restoring
    /// any previously persisted log. A missing or corrupt file starts empty.
    pub fn open(path: PathBuf) -> Self {
        let log = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Vec<Message>>(&content) {
                Ok(messages) => {
                    debug!(count = messages.len(), "Restored persisted transcript");
                    messages
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Transcript file is corrupt, starting empty");
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };
        Self {
            path: Some(path),
            log: RwLock::new(log),
        }
    }

    /// A transcript with no backing file.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            log: RwLock::new(Vec::new()),
        }
    }

    /// Append a message to the log.
    ///
    /// A `tool` message must reference a tool-call id emitted by an earlier
    /// assistant message; anything else is rejected.
    pub async fn append(&self, message: Message) -> Result<(), TranscriptError> {
        let snapshot = {
            let mut log = self.log.write().await;

            if message.role == Role::Tool {
                let id = message.tool_call_id.as_deref().unwrap_or("");
                let known = log
                    .iter()
                    .flat_map(|m| m.tool_calls.iter())
                    .any(|tc| tc.id == id);
                if !known {
                    return Err(TranscriptError::DanglingToolCall(id.to_string()));
                }
            }

            log.push(message);
            log.clone()
        };
        self.persist(&snapshot);
        Ok(())
    }

    /// The ordered log; `trimmed` drops `system` scaffolding, preserving
    /// the relative order of everything else.
    pub async fn view(&self, trimmed: bool) -> Vec<Message> {
        let log = self.log.read().await;
        if trimmed {
            log.iter()
                .filter(|m| m.role != Role::System)
                .cloned()
                .collect()
        } else {
            log.clone()
        }
    }

    /// Empty the log. Used only by consolidation.
    pub async fn clear(&self) {
        let mut log = self.log.write().await;
        log.clear();
        drop(log);
        self.persist(&[]);
    }

    pub async fn len(&self) -> usize {
        self.log.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.log.read().await.is_empty()
    }

    fn persist(&self, snapshot: &[Message]) {
        let Some(path) = &self.path else {
            return;
        };
        let content = match serde_json::to_string_pretty(snapshot) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Could not serialize transcript, keeping in-memory only");
                return;
            }
        };
        if let Some(parent) = path.parent()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(path = %path.display(), error = %e, "Could not create transcript directory");
            return;
        }
        if let Err(e) = std::fs::write(path, content) {
            warn!(path = %path.display(), error = %e, "Could not persist transcript, keeping in-memory only");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fireside_core::message::MessageToolCall;
    use tempfile::TempDir;

    #[tokio::test]
    async fn trimmed_view_drops_system_and_keeps_order() {
        let store = TranscriptStore::in_memory();
        store.append(Message::system("scaffolding")).await.unwrap();
        store.append(Message::user("hi")).await.unwrap();
        store.append(Message::assistant("hello")).await.unwrap();

        let full = store.view(false).await;
        assert_eq!(full.len(), 3);

        let trimmed = store.view(true).await;
        assert_eq!(trimmed.len(), 2);
        assert_eq!(trimmed[0].role, Role::User);
        assert_eq!(trimmed[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn tool_message_requires_known_call_id() {
        let store = TranscriptStore::in_memory();

        let err = store
            .append(Message::tool_result("call_9", "output"))
            .await
            .unwrap_err();
        assert!(matches!(err, TranscriptError::DanglingToolCall(id) if id == "call_9"));

        store
            .append(Message::assistant_tool_calls(vec![MessageToolCall::new(
                "call_9",
                "echo",
                "{}",
            )]))
            .await
            .unwrap();
        store
            .append(Message::tool_result("call_9", "output"))
            .await
            .unwrap();
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn clear_empties_the_log() {
        let store = TranscriptStore::in_memory();
        store.append(Message::user("hi")).await.unwrap();
        store.clear().await;
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn persists_and_restores_across_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chat.json");

        let store = TranscriptStore::open(path.clone());
        store.append(Message::user("remember me")).await.unwrap();
        store.append(Message::assistant("I will")).await.unwrap();
        drop(store);

        let restored = TranscriptStore::open(path);
        let log = restored.view(false).await;
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].content, "remember me");
    }

    #[tokio::test]
    async fn corrupt_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chat.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = TranscriptStore::open(path);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn unwritable_path_keeps_in_memory_state() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();

        // Parent is a regular file, so every persist attempt fails.
        let store = TranscriptStore::open(blocker.join("chat.json"));
        store.append(Message::user("still here")).await.unwrap();
        assert_eq!(store.len().await, 1);
    }
}
