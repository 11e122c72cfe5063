//! Tool registry for MCP tools.
//!
//! This module holds the definitions of the tools the server exposes and a
//! simple registry for looking them up. Execution lives in `executor`.

use crate::protocol::{ToolAnnotations, ToolDefinition};
use serde_json::json;
use std::collections::HashMap;

/// Counts the users in the database.
pub const GET_USER_TOOL: &str = "getUser";

/// Asks the completion endpoint for a fake user and stores it.
pub const CREATE_RANDOM_USERS_TOOL: &str = "create-random-users";

/// Definition of the `getUser` tool.
pub fn get_user_tool() -> ToolDefinition {
    ToolDefinition {
        name: GET_USER_TOOL.to_string(),
        description: Some("Get a user".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {}
        }),
        annotations: Some(ToolAnnotations {
            read_only_hint: Some(true),
            ..Default::default()
        }),
    }
}

/// Definition of the `create-random-users` tool.
pub fn create_random_users_tool() -> ToolDefinition {
    ToolDefinition {
        name: CREATE_RANDOM_USERS_TOOL.to_string(),
        description: Some("Create random users in the database".to_string()),
        input_schema: json!({
            "type": "object",
            "properties": {
                "model": {
                    "type": "string",
                    "description": "Model identifier for the completion endpoint. \
                                    Defaults to the server's configured model."
                }
            }
        }),
        annotations: Some(ToolAnnotations {
            title: Some("Create User".to_string()),
            read_only_hint: Some(false),
            destructive_hint: Some(false),
            idempotent_hint: Some(false),
            open_world_hint: Some(false),
        }),
    }
}

/// Registry of available MCP tools.
#[derive(Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, ToolDefinition>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    /// Create a new empty tool registry.
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Registry holding `getUser` and `create-random-users`.
    pub fn with_builtin_tools() -> Self {
        let mut registry = Self::new();
        registry.register(get_user_tool());
        registry.register(create_random_users_tool());
        registry
    }

    /// Register a tool.
    pub fn register(&mut self, tool: ToolDefinition) {
        self.tools.insert(tool.name.clone(), tool);
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name)
    }

    /// Check if a tool exists.
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// List all tools, ordered by name.
    pub fn list(&self) -> Vec<&ToolDefinition> {
        let mut tools: Vec<_> = self.tools.values().collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    /// Get the number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
