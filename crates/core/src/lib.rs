//! # Fireside Core
//!
//! Domain types, traits, and error definitions for the Fireside companion
//! runtime. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator is defined as a trait here. Implementations live in
//! their respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod completion;
pub mod error;
pub mod memory;
pub mod message;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use completion::{
    CompletionRequest, CompletionService, FragmentReceiver, StreamFragment, ToolCallFragment,
    ToolDefinition,
};
pub use error::{Error, Result};
pub use memory::{Conversation, Event, Fact, Memory, Person};
pub use message::{Message, MessageToolCall, Role};
pub use tool::{Tool, ToolRegistry};
