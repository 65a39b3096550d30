//! Remember-list tools — the agent's scratchpad of noteworthy items.
//!
//! Backed by a plain JSON array in `remember.json`. Read fully, rewritten
//! fully; a missing or corrupt file reads as an empty list.

use async_trait::async_trait;
use chrono::Utc;
use fireside_core::error::ToolError;
use fireside_core::tool::Tool;
use std::path::PathBuf;
use tracing::warn;

fn read_list(path: &PathBuf) -> Vec<serde_json::Value> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => return Vec::new(),
    };
    match serde_json::from_str(&content) {
        Ok(items) => items,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Remember file is corrupt, treating as empty");
            Vec::new()
        }
    }
}

fn write_list(path: &PathBuf, items: &[serde_json::Value]) -> Result<(), ToolError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ToolError::ExecutionFailed {
            tool_name: "add_remember_item".into(),
            reason: format!("creating data directory: {e}"),
        })?;
    }
    let content = serde_json::to_string_pretty(items).map_err(|e| ToolError::ExecutionFailed {
        tool_name: "add_remember_item".into(),
        reason: format!("serializing remember list: {e}"),
    })?;
    std::fs::write(path, content).map_err(|e| ToolError::ExecutionFailed {
        tool_name: "add_remember_item".into(),
        reason: format!("writing remember file: {e}"),
    })
}

/// Appends an item to the remember list.
pub struct AddRememberItemTool {
    path: PathBuf,
}

impl AddRememberItemTool {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl Tool for AddRememberItemTool {
    fn name(&self) -> &str {
        "add_remember_item"
    }

    fn description(&self) -> &str {
        "Adds an item to the remember list. Use if you need to recall something \
         for the user, or for any information that seems especially important to \
         you to recall. Also use this if you learn something novel about your \
         user or yourself."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "required": ["item_name", "item_details"],
            "properties": {
                "item_name": {
                    "type": "string",
                    "description": "The name of the item to remember"
                },
                "item_details": {
                    "type": "string",
                    "description": "Additional details or context about the item"
                },
                "tags": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Optional tags for categorizing the item"
                }
            },
            "additionalProperties": false
        })
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<String, ToolError> {
        let item_name = arguments["item_name"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("missing 'item_name'".into()))?;

        let mut entry = arguments.clone();
        entry["recorded_at"] = serde_json::json!(Utc::now().to_rfc3339());

        let mut items = read_list(&self.path);
        items.push(entry);
        write_list(&self.path, &items)?;

        Ok(format!(
            "success: '{item_name}' recorded, list now holds {} item(s)",
            items.len()
        ))
    }
}

/// Reads back the remember list, optionally limited and filtered.
pub struct ReadRememberListTool {
    path: PathBuf,
}

impl ReadRememberListTool {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl Tool for ReadRememberListTool {
    fn name(&self) -> &str {
        "read_remember_list"
    }

    fn description(&self) -> &str {
        "Recall items from the list of recently stored memories. Returns a list."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "limit": {
                    "type": "integer",
                    "description": "Maximum number of items to recall (most recent first)"
                },
                "filter": {
                    "type": "string",
                    "description": "Substring to filter items by"
                }
            },
            "additionalProperties": false
        })
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<String, ToolError> {
        let limit = arguments["limit"].as_u64().unwrap_or(u64::MAX) as usize;
        let filter = arguments["filter"].as_str().unwrap_or("").to_lowercase();

        let mut items = read_list(&self.path);
        if !filter.is_empty() {
            items.retain(|item| item.to_string().to_lowercase().contains(&filter));
        }
        // Most recent first
        items.reverse();
        items.truncate(limit);

        serde_json::to_string(&serde_json::json!({ "remember_list": items })).map_err(|e| {
            ToolError::ExecutionFailed {
                tool_name: "read_remember_list".into(),
                reason: e.to_string(),
            }
        })
    }
}
