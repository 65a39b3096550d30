//! Typed memory records — the durable facts the assistant keeps about
//! the user, itself, and past conversations.
//!
//! `Memory` is a closed tagged sum type. The `kind` tag on the wire drives
//! deserialization into the right variant; unknown tags are rejected with a
//! typed error so callers can skip them without aborting a load.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MemoryError;
use crate::message::new_id;

/// A persisted, typed memory record.
///
/// Serialized internally tagged: `{"kind": "Person", ...}`. The tag is the
/// variant name, which matches the on-disk format exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Memory {
    Person(Person),
    Event(Event),
    Fact(Fact),
    Conversation(Conversation),
}

impl Memory {
    /// The unique record ID.
    pub fn id(&self) -> &str {
        match self {
            Memory::Person(p) => &p.id,
            Memory::Event(e) => &e.id,
            Memory::Fact(f) => &f.id,
            Memory::Conversation(c) => &c.id,
        }
    }

    /// The kind tag, as written on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Memory::Person(_) => "Person",
            Memory::Event(_) => "Event",
            Memory::Fact(_) => "Fact",
            Memory::Conversation(_) => "Conversation",
        }
    }

    /// When the record was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Memory::Person(p) => p.created_at,
            Memory::Event(e) => e.created_at,
            Memory::Fact(f) => f.created_at,
            Memory::Conversation(c) => c.created_at,
        }
    }

    /// Whether this record is the distinguished self Person.
    pub fn is_identity(&self) -> bool {
        matches!(self, Memory::Person(p) if p.is_self)
    }

    /// Decode a single record from a loose JSON value.
    ///
    /// Distinguishes an unknown `kind` tag (skippable) from a structurally
    /// invalid record so the store can log each appropriately.
    pub fn from_value(value: serde_json::Value) -> Result<Self, MemoryError> {
        let kind = value
            .get("kind")
            .and_then(|k| k.as_str())
            .ok_or_else(|| MemoryError::Invalid("record has no 'kind' tag".into()))?
            .to_string();

        match kind.as_str() {
            "Person" | "Event" | "Fact" | "Conversation" => serde_json::from_value(value)
                .map_err(|e| MemoryError::Invalid(format!("malformed {kind} record: {e}"))),
            _ => Err(MemoryError::UnknownKind(kind)),
        }
    }
}

/// A person the assistant knows about — possibly itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub relation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alive: Option<bool>,
    /// Marks the record representing the assistant itself.
    #[serde(default)]
    pub is_self: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub current_objectives: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub misc_details: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub personality: String,
}

impl Person {
    /// Create a new Person record. The name must not be blank.
    pub fn new(
        name: impl Into<String>,
        relation: impl Into<String>,
    ) -> Result<Self, MemoryError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(MemoryError::Invalid("Person name must not be blank".into()));
        }
        Ok(Self {
            id: new_id(),
            created_at: Utc::now(),
            name,
            relation: relation.into(),
            alive: None,
            is_self: false,
            relationships: Vec::new(),
            current_objectives: Vec::new(),
            misc_details: Vec::new(),
            personality: String::new(),
        })
    }

    /// Mark this Person as the assistant's own identity.
    pub fn as_self(mut self) -> Self {
        self.is_self = true;
        self
    }
}

/// Something that happened, with its associated dates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub note: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dates: Vec<String>,
}

impl Event {
    pub fn new(note: impl Into<String>) -> Result<Self, MemoryError> {
        let note = note.into();
        if note.trim().is_empty() {
            return Err(MemoryError::Invalid("Event note must not be blank".into()));
        }
        Ok(Self {
            id: new_id(),
            created_at: Utc::now(),
            note,
            dates: Vec::new(),
        })
    }

    pub fn with_dates(mut self, dates: Vec<String>) -> Self {
        self.dates = dates;
        self
    }
}

/// A sourced factual note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fact {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub source: String,
    pub note: String,
}

impl Fact {
    pub fn new(source: impl Into<String>, note: impl Into<String>) -> Result<Self, MemoryError> {
        let note = note.into();
        if note.trim().is_empty() {
            return Err(MemoryError::Invalid("Fact note must not be blank".into()));
        }
        Ok(Self {
            id: new_id(),
            created_at: Utc::now(),
            source: source.into(),
            note,
        })
    }
}

/// A consolidated past conversation: full transcript plus its summary.
///
/// The summary is empty only transiently, before summarization completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub transcript: String,
    #[serde(default)]
    pub summary: String,
}

impl Conversation {
    pub fn new(
        transcript: impl Into<String>,
        summary: impl Into<String>,
    ) -> Result<Self, MemoryError> {
        let transcript = transcript.into();
        if transcript.trim().is_empty() {
            return Err(MemoryError::Invalid(
                "Conversation transcript must not be blank".into(),
            ));
        }
        Ok(Self {
            id: new_id(),
            created_at: Utc::now(),
            transcript,
            summary: summary.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn person_constructor_rejects_blank_name() {
        assert!(Person::new("  ", "friend").is_err());
        assert!(Person::new("Ada", "friend").is_ok());
    }

    #[test]
    fn event_constructor_rejects_blank_note() {
        assert!(Event::new("").is_err());
    }

    #[test]
    fn conversation_requires_transcript() {
        assert!(Conversation::new("", "summary").is_err());
        let convo = Conversation::new("[User]: hi", "greeting").unwrap();
        assert_eq!(convo.summary, "greeting");
    }

    #[test]
    fn memory_kind_tags() {
        let person = Memory::Person(Person::new("Ada", "friend").unwrap());
        assert_eq!(person.kind(), "Person");
        let fact = Memory::Fact(Fact::new("user", "likes tea").unwrap());
        assert_eq!(fact.kind(), "Fact");
    }

    #[test]
    fn memory_serializes_with_kind_tag() {
        let mem = Memory::Event(Event::new("birthday").unwrap());
        let json = serde_json::to_value(&mem).unwrap();
        assert_eq!(json["kind"], "Event");
        assert_eq!(json["note"], "birthday");
    }

    #[test]
    fn memory_roundtrips_every_kind() {
        let memories = vec![
            Memory::Person(Person::new("Ada", "friend").unwrap().as_self()),
            Memory::Event(Event::new("moved house").unwrap().with_dates(vec!["2026-01-01".into()])),
            Memory::Fact(Fact::new("chat", "prefers coffee").unwrap()),
            Memory::Conversation(Conversation::new("[User]: hi", "greeting").unwrap()),
        ];
        for mem in memories {
            let json = serde_json::to_string(&mem).unwrap();
            let back: Memory = serde_json::from_str(&json).unwrap();
            assert_eq!(back.id(), mem.id());
            assert_eq!(back.kind(), mem.kind());
        }
    }

    #[test]
    fn from_value_rejects_unknown_kind() {
        let value = serde_json::json!({"kind": "Dream", "id": "x", "note": "?"});
        let err = Memory::from_value(value).unwrap_err();
        assert!(matches!(err, MemoryError::UnknownKind(k) if k == "Dream"));
    }

    #[test]
    fn from_value_names_the_kind_in_malformed_errors() {
        // Known tag, but created_at is missing entirely.
        let value = serde_json::json!({"kind": "Person", "id": "x"});
        let err = Memory::from_value(value).unwrap_err();
        assert!(matches!(&err, MemoryError::Invalid(msg) if msg.contains("Person")));
    }

    #[test]
    fn from_value_rejects_missing_tag() {
        let value = serde_json::json!({"id": "x"});
        assert!(matches!(
            Memory::from_value(value),
            Err(MemoryError::Invalid(_))
        ));
    }

    #[test]
    fn is_identity_only_for_self_person() {
        let plain = Memory::Person(Person::new("Ada", "friend").unwrap());
        assert!(!plain.is_identity());
        let own = Memory::Person(Person::new("Fireside", "self").unwrap().as_self());
        assert!(own.is_identity());
    }
}
