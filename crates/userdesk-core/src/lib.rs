//! # userdesk-core
//!
//! Shared types for the userdesk workspace: the `User` data model, the
//! [`UserStore`] abstraction that the MCP layer talks to, and the configuration
//! types loaded by the CLI.

// Configuration types shared across all userdesk crates
pub mod config;
pub mod store;
pub mod user;

pub use config::{AppConfig, CompletionConfig, ConfigError, DatabaseConfig, McpConfig, Transport};
pub use store::{StoreError, UserStore};
pub use user::{NewUser, User, UserSummary};
