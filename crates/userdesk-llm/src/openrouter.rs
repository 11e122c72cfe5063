use crate::client::{ChatRequest, ChatResponse, CompletionClient, CompletionError};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use userdesk_core::CompletionConfig;

/// Client for an OpenRouter-compatible `chat/completions` endpoint.
pub struct OpenRouterClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl OpenRouterClient {
    pub fn new(
        endpoint: String,
        api_key: String,
        timeout: Duration,
    ) -> Result<Self, CompletionError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }

    /// Build a client from configuration. The endpoint must be set.
    pub fn from_config(config: &CompletionConfig) -> Result<Self, CompletionError> {
        let endpoint = config.endpoint.clone().ok_or_else(|| {
            CompletionError::NotConfigured("completion endpoint is not set".into())
        })?;
        Self::new(
            endpoint,
            config.api_key.clone().unwrap_or_default(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionClient for OpenRouterClient {
    async fn complete(&self, model: &str, prompt: &str) -> Result<String, CompletionError> {
        let body = ChatRequest::single_prompt(model, prompt);

        debug!(endpoint = %self.endpoint, model, "Completion request");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    debug!(status = status.as_u16(), error = %e, "Failed to read error body");
                    String::new()
                }
            };
            return Err(CompletionError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| CompletionError::MalformedResponse(format!("invalid JSON body: {}", e)))?;
        let content = parsed.into_content()?;

        debug!(model, chars = content.len(), "Completion received");
        Ok(content)
    }
}
