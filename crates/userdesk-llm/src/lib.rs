//! Chat-completion client for userdesk.
//!
//! [`CompletionClient`] is the seam the MCP tools depend on;
//! [`OpenRouterClient`] implements it against an OpenRouter-compatible
//! `chat/completions` endpoint.

pub mod client;
pub mod openrouter;

pub use client::{
    ChatMessage, ChatRequest, ChatResponse, CompletionClient, CompletionError, Role,
    SYSTEM_INSTRUCTION,
};
pub use openrouter::OpenRouterClient;
