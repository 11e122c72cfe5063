//! # userdesk-mcp
//!
//! MCP (Model Context Protocol) server exposing a `users` table to AI agents.
//!
//! ## Architecture
//!
//! ```text
//! AI Agent (Claude, GPT, etc.)
//!       │
//!       │ MCP protocol (stdio or HTTP)
//!       ▼
//! ┌──────────────────────┐
//! │  userdesk MCP Server │
//! │  resources/*  ───────┼──► ResourceProvider ──┐
//! │  tools/*      ───────┼──► ToolExecutor ──────┤
//! └──────────────────────┘         │             ▼
//!                                  │        UserStore (Postgres)
//!                                  ▼
//!                         CompletionClient (OpenRouter)
//! ```
//!
//! ## Resources
//!
//! | URI | Description |
//! |-----|-------------|
//! | `user://list` | All users as a JSON array |
//! | `user://{userId}/profile` | One user as a JSON object |
//!
//! ## Tools
//!
//! | Tool | Description |
//! |------|-------------|
//! | `getUser` | Report how many users are stored |
//! | `create-random-users` | Have a model invent a user and store it |
//!
//! ## Example Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use userdesk_core::McpConfig;
//! use userdesk_mcp::McpServer;
//!
//! let server = McpServer::new(McpConfig::default(), store, completion)
//!     .with_default_model("openai/gpt-4o-mini");
//!
//! server.run().await?;
//! ```

pub mod error;
pub mod executor;
pub mod http_transport;
pub mod protocol;
pub mod resources;
pub mod server;
pub mod tools;

#[cfg(test)]
mod test_support;

// Re-export main types
pub use error::{GenerationError, McpError, ResourceError};
pub use executor::{ExecutionResult, ToolExecutor};
pub use protocol::{
    CallToolParams, JsonRpcRequest, JsonRpcResponse, ResourceContents, ResourceDefinition,
    ToolAnnotations, ToolContent, ToolDefinition,
};
pub use resources::ResourceProvider;
pub use server::McpServer;
pub use tools::ToolRegistry;
