//! Error types for the MCP crate.

use crate::protocol::{INTERNAL_ERROR, INVALID_PARAMS, RESOURCE_NOT_FOUND};
use thiserror::Error;
use userdesk_core::StoreError;
use userdesk_llm::CompletionError;

/// Errors that can occur in the MCP server.
#[derive(Debug, Error)]
pub enum McpError {
    /// Failed to start the server.
    #[error("failed to start MCP server: {0}")]
    StartupFailed(String),

    /// Transport error.
    #[error("transport error: {0}")]
    TransportError(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors from reading a resource.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The URI does not name any resource this server exposes.
    #[error("Resource not found: {0}")]
    UnknownResource(String),

    /// The `{userId}` segment is not an integer.
    #[error("Invalid user id: {0}")]
    InvalidUserId(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to encode resource: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ResourceError {
    /// JSON-RPC error code reported to the client.
    pub fn code(&self) -> i32 {
        match self {
            ResourceError::UnknownResource(_) => RESOURCE_NOT_FOUND,
            ResourceError::InvalidUserId(_) => INVALID_PARAMS,
            ResourceError::Store(StoreError::NotFound { .. }) => RESOURCE_NOT_FOUND,
            ResourceError::Store(StoreError::Persistence(_)) => INTERNAL_ERROR,
            ResourceError::Serialization(_) => INTERNAL_ERROR,
        }
    }
}

/// Why `create-random-users` failed.
///
/// Only the kind is logged; callers always see the same message.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("completion failed: {0}")]
    Completion(#[from] CompletionError),

    #[error("generated text is not a user record: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to store generated user: {0}")]
    Store(#[from] StoreError),
}

impl GenerationError {
    /// Short machine-readable kind, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            GenerationError::Completion(_) => "completion",
            GenerationError::Parse(_) => "parse",
            GenerationError::Store(_) => "store",
        }
    }
}
