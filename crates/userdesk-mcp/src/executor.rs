//! Tool execution engine.
//!
//! This module runs the two tools against the injected store and completion
//! client:
//! - `getUser` counts the users in the database
//! - `create-random-users` asks a model for a fake user, parses it, and stores it

use crate::error::GenerationError;
use crate::protocol::{CallToolResponse, ToolContent, ToolDefinition};
use crate::tools::{CREATE_RANDOM_USERS_TOOL, GET_USER_TOOL};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use userdesk_core::config::DEFAULT_MODEL;
use userdesk_core::{NewUser, UserStore};
use userdesk_llm::CompletionClient;

/// Prompt sent to the completion endpoint by `create-random-users`.
pub const RANDOM_USER_PROMPT: &str = "Generate a fake user data. The user should have a \
    realistic name, email, and address. Return the data in JSON format with keys: name, \
    email, address or formatter so it can be used with JSON.parse.";

/// The only failure message `create-random-users` reports to callers.
pub const GENERATION_FAILED_MESSAGE: &str = "Failed to generate user data";

/// What `getUser` reports when the store cannot be read.
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch users from the database";

/// Result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Whether the execution was successful.
    pub success: bool,
    /// The result content.
    pub content: Vec<ToolContent>,
    /// Error message if failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionResult {
    /// Create a successful result with text content.
    pub fn success_text(text: impl Into<String>) -> Self {
        Self {
            success: true,
            content: vec![ToolContent::text(text)],
            error: None,
        }
    }

    /// Create an error result.
    pub fn error(message: impl Into<String>) -> Self {
        let msg = message.into();
        Self {
            success: false,
            content: vec![ToolContent::text(msg.clone())],
            error: Some(msg),
        }
    }

    /// First text block, if any.
    pub fn text(&self) -> Option<&str> {
        self.content.first().map(ToolContent::as_text)
    }
}

impl From<ExecutionResult> for CallToolResponse {
    fn from(result: ExecutionResult) -> Self {
        CallToolResponse {
            content: result.content,
            is_error: !result.success,
        }
    }
}

/// Runs tools against the user store and the completion endpoint.
#[derive(Clone)]
pub struct ToolExecutor {
    store: Arc<dyn UserStore>,
    completion: Arc<dyn CompletionClient>,
    default_model: String,
}

impl ToolExecutor {
    /// Create a new tool executor.
    pub fn new(store: Arc<dyn UserStore>, completion: Arc<dyn CompletionClient>) -> Self {
        Self {
            store,
            completion,
            default_model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Set the model used when a call does not name one.
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Execute a tool call.
    pub async fn execute(&self, tool: &ToolDefinition, arguments: Value) -> ExecutionResult {
        // Absent arguments are the same as an empty object
        let arguments = if arguments.is_null() {
            Value::Object(Default::default())
        } else {
            arguments
        };

        if let Err(e) = self.validate_arguments(tool, &arguments) {
            return ExecutionResult::error(e);
        }

        match tool.name.as_str() {
            GET_USER_TOOL => self.execute_get_user().await,
            CREATE_RANDOM_USERS_TOOL => self.execute_create_random_user(&arguments).await,
            other => ExecutionResult::error(format!("No handler for tool: {}", other)),
        }
    }

    /// Validate arguments against the tool's input schema.
    fn validate_arguments(&self, tool: &ToolDefinition, arguments: &Value) -> Result<(), String> {
        if !arguments.is_object() {
            return Err("Arguments must be a JSON object".to_string());
        }
        let schema = &tool.input_schema;

        // Check required fields
        if let Some(required) = schema["required"].as_array() {
            for field in required.iter().filter_map(Value::as_str) {
                if arguments.get(field).is_none() {
                    return Err(format!("Missing required field: {}", field));
                }
            }
        }

        // Check declared property types
        if let Some(props) = schema["properties"].as_object() {
            for (field, prop_schema) in props {
                let (Some(value), Some(expected)) =
                    (arguments.get(field), prop_schema["type"].as_str())
                else {
                    continue;
                };
                if !check_type(value, expected) {
                    return Err(format!(
                        "Invalid type for '{}': expected {}, got {}",
                        field, expected, value
                    ));
                }
            }
        }

        Ok(())
    }

    async fn execute_get_user(&self) -> ExecutionResult {
        tracing::info!("Fetching user list from database");
        match self.store.list_users().await {
            Ok(users) => ExecutionResult::success_text(format!(
                "Fetched {} users from the database.",
                users.len()
            )),
            Err(e) => {
                tracing::error!(kind = e.kind(), error = %e, "Failed to list users");
                ExecutionResult::error(FETCH_FAILED_MESSAGE)
            }
        }
    }

    async fn execute_create_random_user(&self, arguments: &Value) -> ExecutionResult {
        let model = arguments
            .get("model")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(self.default_model.as_str());

        match self.generate_user(model).await {
            Ok(id) => {
                tracing::info!(id, model, "Created random user");
                let text = format!("Successfully created user with ID: {}", id);
                ExecutionResult::success_text(text)
            }
            Err(e) => {
                tracing::warn!(
                    kind = e.kind(),
                    model,
                    error = %e,
                    "Random user generation failed"
                );
                ExecutionResult::error(GENERATION_FAILED_MESSAGE)
            }
        }
    }

    /// Generate one user with `model`, store it, and return its id.
    pub async fn generate_user(&self, model: &str) -> Result<i32, GenerationError> {
        let reply = self.completion.complete(model, RANDOM_USER_PROMPT).await?;
        let new_user = parse_generated_user(&reply)?;
        let id = self.store.insert_user(&new_user).await?;
        Ok(id)
    }
}

/// Check if a value matches an expected JSON schema type.
fn check_type(value: &Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

/// Remove every "```json" and "```" marker and trim.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// Parse model output into a user record.
pub fn parse_generated_user(text: &str) -> Result<NewUser, serde_json::Error> {
    serde_json::from_str(&strip_code_fences(text))
}
