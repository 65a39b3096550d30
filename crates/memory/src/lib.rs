//! Memory persistence for Fireside.
//!
//! A single file-backed store holds every typed memory record the assistant
//! keeps across sessions.

pub mod store;

pub use store::{MemoryStore, Persistence};
