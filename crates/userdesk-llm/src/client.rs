use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// System message sent with every completion request.
pub const SYSTEM_INSTRUCTION: &str =
    "You are a database assistant. Always return ONLY valid JSON, no explanation, no markdown.";

/// A chat message sent to the endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// Request body for `POST chat/completions`.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

impl ChatRequest {
    /// The fixed system instruction followed by one user message.
    pub fn single_prompt(model: &str, prompt: &str) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![
                ChatMessage {
                    role: Role::System,
                    content: SYSTEM_INSTRUCTION.to_string(),
                },
                ChatMessage {
                    role: Role::User,
                    content: prompt.to_string(),
                },
            ],
        }
    }
}

/// The subset of the completion response we rely on.
///
/// Every field along `choices[0].message.content` is optional here so that a
/// missing piece is reported as [`CompletionError::MalformedResponse`] instead
/// of a generic decode failure.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatResponse {
    /// Extract `choices[0].message.content`.
    pub fn into_content(self) -> Result<String, CompletionError> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CompletionError::MalformedResponse("empty choices array".into()))?;
        let message = choice.message.ok_or_else(|| {
            CompletionError::MalformedResponse("missing choices[0].message".into())
        })?;
        message.content.ok_or_else(|| {
            CompletionError::MalformedResponse("missing choices[0].message.content".into())
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("completion endpoint returned {status}: {body}")]
    Upstream { status: u16, body: String },
    #[error("malformed completion response: {0}")]
    MalformedResponse(String),
    #[error("completion client not configured: {0}")]
    NotConfigured(String),
}

impl CompletionError {
    /// Short machine-readable kind, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            CompletionError::Http(_) => "http",
            CompletionError::Upstream { .. } => "upstream",
            CompletionError::MalformedResponse(_) => "malformed_response",
            CompletionError::NotConfigured(_) => "not_configured",
        }
    }
}

/// Sends one prompt to a model and returns the raw reply text.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, model: &str, prompt: &str) -> Result<String, CompletionError>;
}
