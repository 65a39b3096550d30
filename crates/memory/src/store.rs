//! File-backed memory store — persistent typed records in a single JSON file.
//!
//! Storage format: `{ "memories": [ { "kind": "Person", ... }, ... ] }`.
//! Records are loaded into memory on open and rewritten in full on every
//! mutation. Unknown `kind` tags and malformed elements are skipped with a
//! warning, never fatal.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use fireside_core::memory::{Conversation, Memory, Person};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// How many times a failed disk write is attempted before giving up.
const PERSIST_ATTEMPTS: u32 = 3;

/// Initial delay between persist attempts; doubles per retry.
const PERSIST_BACKOFF: Duration = Duration::from_millis(100);

/// The durability outcome of a mutating store operation.
///
/// Persistence failures are a warning, not an error: the in-memory state
/// stays authoritative either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persistence {
    /// The change reached disk.
    Durable,
    /// All write attempts failed; the change lives only in memory.
    MemoryOnly,
}

struct Inner {
    memories: Vec<Memory>,
    ids: HashSet<String>,
    /// Pending notes surfaced into the next system context.
    misc_details: Vec<String>,
}

/// The assistant's long-lived memory store.
pub struct MemoryStore {
    path: PathBuf,
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Open a store at the given path, loading any persisted records.
    ///
    /// A missing file starts empty. A corrupt file is logged and treated as
    /// empty rather than aborting.
    pub fn open(path: PathBuf) -> Self {
        let memories = Self::load_from_disk(&path);
        let ids = memories.iter().map(|m| m.id().to_string()).collect();
        debug!(path = %path.display(), count = memories.len(), "Memory store loaded");
        Self {
            path,
            inner: RwLock::new(Inner {
                memories,
                ids,
                misc_details: Vec::new(),
            }),
        }
    }

    fn load_from_disk(path: &PathBuf) -> Vec<Memory> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return Vec::new(), // File doesn't exist yet — start empty
        };

        let root: serde_json::Value = match serde_json::from_str(&content) {
            Ok(v) => v,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Memory file is corrupt, starting empty");
                return Vec::new();
            }
        };

        let Some(records) = root.get("memories").and_then(|m| m.as_array()) else {
            warn!(path = %path.display(), "Memory file has no 'memories' array, starting empty");
            return Vec::new();
        };

        let mut memories = Vec::with_capacity(records.len());
        let mut seen = HashSet::new();
        for record in records {
            match Memory::from_value(record.clone()) {
                Ok(memory) => {
                    if seen.insert(memory.id().to_string()) {
                        memories.push(memory);
                    } else {
                        warn!(id = memory.id(), "Skipping duplicate memory ID on load");
                    }
                }
                Err(e) => warn!(error = %e, "Skipping unreadable memory record"),
            }
        }
        memories
    }

    /// Add a record. Idempotent by ID: adding an existing ID is a no-op.
    ///
    /// Triggers a full persist; write failures are retried with bounded
    /// backoff and reported through the returned [`Persistence`].
    pub async fn add(&self, memory: Memory) -> Persistence {
        let snapshot = {
            let mut inner = self.inner.write().await;
            if !inner.ids.insert(memory.id().to_string()) {
                info!(id = memory.id(), kind = memory.kind(), "Memory already exists, skipping");
                return Persistence::Durable;
            }
            debug!(id = memory.id(), kind = memory.kind(), "Memory added");
            inner.memories.push(memory);
            inner.memories.clone()
        };
        self.persist(&snapshot).await
    }

    /// The active identity: the first Person record with `is_self = true`.
    ///
    /// If none exists (first run), a default self Person is synthesized,
    /// added, and persisted. If corrupted data yields more than one, the
    /// first encountered in load order wins.
    pub async fn identity(&self) -> Person {
        {
            let inner = self.inner.read().await;
            if let Some(person) = Self::find_identity(&inner.memories) {
                return person.clone();
            }
        }

        info!("No identity record found, synthesizing a default");
        let person = Person::new("Fireside", "self")
            .expect("default identity name is not blank")
            .as_self();
        self.add(Memory::Person(person.clone())).await;
        person
    }

    fn find_identity(memories: &[Memory]) -> Option<&Person> {
        memories.iter().find_map(|m| match m {
            Memory::Person(p) if p.is_self => Some(p),
            _ => None,
        })
    }

    /// The bounded recap view used to seed a session's system context.
    ///
    /// All records are returned, but only the most recent Conversation keeps
    /// its transcript; older Conversations are transcript-stripped so prompt
    /// size stays bounded over time. A note about the latest conversation is
    /// queued into the misc-details collection as a side effect.
    pub async fn recap(&self) -> Vec<Memory> {
        let mut inner = self.inner.write().await;

        let latest_conversation = inner
            .memories
            .iter()
            .filter_map(|m| match m {
                Memory::Conversation(c) => Some(c),
                _ => None,
            })
            .max_by_key(|c| c.created_at)
            .cloned();

        if let Some(latest) = &latest_conversation {
            let note = format!(
                "Last conversation ({}): {}",
                latest.created_at.format("%a, %d %b %Y %I:%M %p"),
                latest.summary
            );
            inner.misc_details.push(note);
        }

        let latest_id = latest_conversation.map(|c| c.id);
        inner
            .memories
            .iter()
            .map(|m| match m {
                Memory::Conversation(c) if Some(&c.id) != latest_id.as_ref() => {
                    Memory::Conversation(Conversation {
                        transcript: String::new(),
                        ..c.clone()
                    })
                }
                other => other.clone(),
            })
            .collect()
    }

    /// Drain the pending misc-detail notes.
    ///
    /// Notes are consumed on read so repeated recap/rebuild cycles do not
    /// pile near-duplicate notes into every future system context.
    pub async fn misc_details(&self) -> Vec<String> {
        std::mem::take(&mut self.inner.write().await.misc_details)
    }

    pub async fn count(&self) -> usize {
        self.inner.read().await.memories.len()
    }

    /// Write the full record set to disk, retrying with bounded backoff.
    async fn persist(&self, memories: &[Memory]) -> Persistence {
        let body = serde_json::json!({ "memories": memories });
        let content = match serde_json::to_string_pretty(&body) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to serialize memories, state kept in memory only");
                return Persistence::MemoryOnly;
            }
        };

        let mut delay = PERSIST_BACKOFF;
        for attempt in 1..=PERSIST_ATTEMPTS {
            match self.write_file(&content) {
                Ok(()) => return Persistence::Durable,
                Err(e) => {
                    warn!(attempt, error = %e, "Memory persist failed");
                    if attempt < PERSIST_ATTEMPTS {
                        tokio::time::sleep(delay).await;
                        delay *= 2;
                    }
                }
            }
        }

        warn!(
            path = %self.path.display(),
            "Memory persist exhausted retries; in-memory state is authoritative but not durable"
        );
        Persistence::MemoryOnly
    }

    fn write_file(&self, content: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fireside_core::memory::{Event, Fact};
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> MemoryStore {
        MemoryStore::open(dir.path().join("memories.json"))
    }

    #[tokio::test]
    async fn save_then_load_roundtrips_every_kind() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let person = Person::new("Ada", "friend").unwrap();
        let person_id = person.id.clone();
        store.add(Memory::Person(person)).await;
        store
            .add(Memory::Event(
                Event::new("moved house").unwrap().with_dates(vec!["2026-03-01".into()]),
            ))
            .await;
        store
            .add(Memory::Fact(Fact::new("chat", "prefers tea").unwrap()))
            .await;
        store
            .add(Memory::Conversation(
                Conversation::new("[User]: hi", "greeting").unwrap(),
            ))
            .await;

        let reloaded = store_in(&dir);
        assert_eq!(reloaded.count().await, 4);

        let recap = reloaded.recap().await;
        let person = recap
            .iter()
            .find_map(|m| match m {
                Memory::Person(p) => Some(p),
                _ => None,
            })
            .unwrap();
        assert_eq!(person.id, person_id);
        assert_eq!(person.name, "Ada");
        assert_eq!(person.relation, "friend");
    }

    #[tokio::test]
    async fn unknown_kinds_are_skipped_on_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("memories.json");
        std::fs::write(
            &path,
            serde_json::json!({
                "memories": [
                    {"kind": "Fact", "id": "f1", "created_at": "2026-01-01T00:00:00Z",
                     "source": "chat", "note": "valid"},
                    {"kind": "Dream", "id": "d1", "created_at": "2026-01-01T00:00:00Z"},
                    {"kind": "Event", "id": "e1", "created_at": "2026-01-02T00:00:00Z",
                     "note": "also valid"}
                ]
            })
            .to_string(),
        )
        .unwrap();

        let store = MemoryStore::open(path);
        assert_eq!(store.count().await, 2);
    }

    #[tokio::test]
    async fn corrupt_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("memories.json");
        std::fs::write(&path, "this is not json").unwrap();

        let store = MemoryStore::open(path);
        assert_eq!(store.count().await, 0);
    }

    #[tokio::test]
    async fn identity_synthesized_and_persisted_on_first_run() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let identity = store.identity().await;
        assert!(identity.is_self);
        assert_eq!(identity.name, "Fireside");

        // Synthesized identity survives a reload
        let reloaded = store_in(&dir);
        let again = reloaded.identity().await;
        assert_eq!(again.id, identity.id);
    }

    #[tokio::test]
    async fn identity_picks_first_self_person_deterministically() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let first = Person::new("First", "self").unwrap().as_self();
        let first_id = first.id.clone();
        store.add(Memory::Person(first)).await;
        store
            .add(Memory::Person(Person::new("Second", "self").unwrap().as_self()))
            .await;

        assert_eq!(store.identity().await.id, first_id);
        // Same answer after a reload (load order is file order)
        assert_eq!(store_in(&dir).identity().await.id, first_id);
    }

    #[tokio::test]
    async fn add_is_idempotent_by_id() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let fact = Fact::new("chat", "likes rust").unwrap();
        store.add(Memory::Fact(fact.clone())).await;
        store.add(Memory::Fact(fact)).await;

        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn recap_strips_all_but_latest_conversation_transcript() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let mut old = Conversation::new("old transcript", "old summary").unwrap();
        old.created_at = chrono::Utc::now() - chrono::Duration::hours(2);
        store.add(Memory::Conversation(old)).await;
        store
            .add(Memory::Conversation(
                Conversation::new("new transcript", "new summary").unwrap(),
            ))
            .await;

        let recap = store.recap().await;
        let transcripts: Vec<&str> = recap
            .iter()
            .filter_map(|m| match m {
                Memory::Conversation(c) => Some(c.transcript.as_str()),
                _ => None,
            })
            .collect();

        assert_eq!(transcripts.len(), 2);
        assert!(transcripts.contains(&""));
        assert!(transcripts.contains(&"new transcript"));

        // The underlying records are untouched — only the view is stripped
        let reloaded = store_in(&dir);
        let full = reloaded.recap().await;
        assert!(
            full.iter().any(
                |m| matches!(m, Memory::Conversation(c) if c.transcript == "new transcript")
            )
        );
    }

    #[tokio::test]
    async fn recap_queues_latest_conversation_note() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store
            .add(Memory::Conversation(
                Conversation::new("transcript", "talked about tea").unwrap(),
            ))
            .await;

        let _ = store.recap().await;
        let details = store.misc_details().await;
        assert_eq!(details.len(), 1);
        assert!(details[0].contains("talked about tea"));
        // The full transcript never leaks into the note
        assert!(!details[0].contains("transcript"));

        // Notes are drained on read, so the next context starts clean
        assert!(store.misc_details().await.is_empty());
    }

    #[tokio::test]
    async fn repeated_recaps_do_not_accumulate_notes() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store
            .add(Memory::Conversation(
                Conversation::new("transcript", "first chat").unwrap(),
            ))
            .await;

        for _ in 0..3 {
            let _ = store.recap().await;
            let _ = store.misc_details().await;
        }
        let _ = store.recap().await;
        assert_eq!(store.misc_details().await.len(), 1);
    }

    #[tokio::test]
    async fn unwritable_path_reports_memory_only() {
        let dir = TempDir::new().unwrap();
        // Parent "dir" is actually a file, so create_dir_all must fail
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let store = MemoryStore::open(blocker.join("memories.json"));

        let outcome = store
            .add(Memory::Fact(Fact::new("chat", "volatile").unwrap()))
            .await;
        assert_eq!(outcome, Persistence::MemoryOnly);
        // In-memory state is still authoritative
        assert_eq!(store.count().await, 1);
    }
}
