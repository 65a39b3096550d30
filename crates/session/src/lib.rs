//! Session orchestration for Fireside.
//!
//! Wires the transcript, memory store, tool router, and completion service
//! into a live session: streamed turns with bounded tool round-trips, an
//! inactivity monitor, and consolidation of finished conversations into
//! long-term memory.

pub mod assembler;
pub mod coordinator;
pub mod event;
pub mod transcript;

pub use assembler::{AssembleError, StreamAssembler, TurnOutcome};
pub use coordinator::{SessionCoordinator, SessionSettings};
pub use event::SessionEvent;
pub use transcript::TranscriptStore;
