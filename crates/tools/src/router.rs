//! ToolRouter — fault-tolerant dispatch from tool name to handler.
//!
//! The router never raises: unknown names and handler failures both come
//! back as plain result strings so the conversation can continue.

use fireside_core::completion::ToolDefinition;
use fireside_core::tool::ToolRegistry;
use tracing::{debug, warn};

/// Routes a tool-call name to a registered handler and returns result text.
pub struct ToolRouter {
    registry: ToolRegistry,
}

impl ToolRouter {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    /// Tool definitions for the completion request.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.registry.definitions()
    }

    /// Dispatch a tool call by name.
    ///
    /// Lookup is exact first, then substring in either direction. Every
    /// failure path returns a describing string rather than an error.
    pub async fn dispatch(&self, name: &str, arguments_json: &str) -> String {
        let Some(tool) = self.registry.find(name) else {
            warn!(tool = name, "No such tool registered");
            return format!("error: no such tool '{name}'");
        };

        let arguments: serde_json::Value = if arguments_json.trim().is_empty() {
            serde_json::json!({})
        } else {
            match serde_json::from_str(arguments_json) {
                Ok(v) => v,
                Err(e) => {
                    warn!(tool = name, error = %e, "Tool arguments are not valid JSON");
                    return format!("error: arguments for '{name}' are not valid JSON: {e}");
                }
            }
        };

        debug!(tool = tool.name(), "Dispatching tool call");
        match tool.execute(arguments).await {
            Ok(output) => output,
            Err(e) => {
                warn!(tool = tool.name(), error = %e, "Tool execution failed");
                format!("error: tool '{}' failed: {e}", tool.name())
            }
        }
    }
}
