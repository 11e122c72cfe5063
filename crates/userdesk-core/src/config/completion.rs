//! Chat-completion endpoint configuration.

use serde::{Deserialize, Serialize};

/// Model used by `create-random-users` when the caller does not pick one.
pub const DEFAULT_MODEL: &str = "nvidia/nemotron-3-nano-30b-a3b:free";

/// Configuration for the remote completion endpoint (OpenRouter or compatible).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Full URL of the chat-completions endpoint. Overridden by `OPENROUTER_DOMAIN`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Bearer token. Overridden by `OPENROUTER_API_KEY`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model identifier used when a tool call does not name one.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            default_model: default_model(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_timeout() -> u64 {
    60
}
