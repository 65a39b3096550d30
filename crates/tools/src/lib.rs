//! Built-in tools and tool routing for Fireside.
//!
//! The assistant keeps a lightweight "remember list" — a JSON file of items
//! it decided were worth recalling mid-conversation, separate from the
//! typed long-term memory store.

pub mod remember;
pub mod router;

use std::path::Path;

use fireside_core::tool::ToolRegistry;

pub use remember::{AddRememberItemTool, ReadRememberListTool};
pub use router::ToolRouter;

/// Create the default tool registry, with both remember-list tools backed
/// by `remember.json` under the given data directory.
pub fn default_registry(data_dir: &Path) -> ToolRegistry {
    let path = data_dir.join("remember.json");
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(AddRememberItemTool::new(path.clone())));
    registry.register(Box::new(ReadRememberListTool::new(path)));
    registry
}
