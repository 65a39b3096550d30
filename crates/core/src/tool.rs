//! Tool trait — the abstraction over agent capabilities.
//!
//! Tools are small side-effecting handlers the model can invoke during a
//! turn. Each returns a textual result that is fed back to the model as a
//! tool-role message.

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::completion::ToolDefinition;
use crate::error::ToolError;

/// The core Tool trait.
///
/// Implementations are registered in the `ToolRegistry` and exposed to the
/// completion service via `ToolDefinition`s.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "add_remember_item").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments, returning result text.
    async fn execute(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<String, ToolError>;

    /// Convert this tool into a ToolDefinition for the completion request.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// A registry of available tools, keyed by name.
///
/// BTreeMap keeps `definitions()` output in a stable order across runs.
pub struct ToolRegistry {
    tools: BTreeMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        self.tools.insert(name, tool);
    }

    /// Get a tool by exact name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// Find a tool by exact name first, then by substring match in either
    /// direction. Returns the first match in name order.
    pub fn find(&self, name: &str) -> Option<&dyn Tool> {
        if let Some(tool) = self.get(name) {
            return Some(tool);
        }
        let needle = name.to_lowercase();
        self.tools
            .iter()
            .find(|(key, _)| {
                let key = key.to_lowercase();
                key.contains(&needle) || needle.contains(&key)
            })
            .map(|(_, t)| t.as_ref())
    }

    /// Get all tool definitions (for the completion request).
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.to_definition()).collect()
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echoes back the input"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "text": { "type": "string" }
                },
                "required": ["text"]
            })
        }
        async fn execute(
            &self,
            arguments: serde_json::Value,
        ) -> std::result::Result<String, ToolError> {
            Ok(arguments["text"].as_str().unwrap_or("").to_string())
        }
    }

    #[test]
    fn registry_register_and_lookup() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));
        assert!(registry.get("echo").is_some());
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn registry_find_matches_substring_both_directions() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));
        // Registered name contained in the requested name
        assert!(registry.find("echo_v2").is_some());
        // Requested name contained in the registered name
        assert!(registry.find("ech").is_some());
        assert!(registry.find("calculator").is_none());
    }

    #[test]
    fn registry_definitions() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool));
        let defs = registry.definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "echo");
    }

    #[tokio::test]
    async fn tool_executes() {
        let tool = EchoTool;
        let out = tool
            .execute(serde_json::json!({"text": "hello world"}))
            .await
            .unwrap();
        assert_eq!(out, "hello world");
    }
}
