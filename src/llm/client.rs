use crate::config::LlmConfig;
use crate::error::{AssistantError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// OpenAI-compatible response structures
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Client for a single-turn, non-streamed chat completion endpoint
#[derive(Clone, Debug)]
pub struct ChatClient {
    client: Client,
    config: LlmConfig,
}

impl ChatClient {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Send one system + user message pair and return the trimmed reply
    ///
    /// # Errors
    ///
    /// * `AssistantError::RequestError` - If the HTTP request fails
    /// * `AssistantError::ApiError` - If the endpoint answers with a non-success status
    /// * `AssistantError::EmptyCompletion` - If the reply has no choices or only whitespace
    #[instrument(skip_all, fields(model = %self.config.model, prompt_chars = user_prompt.len()))]
    pub async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
        };

        debug!("Sending chat completion request");
        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "Chat completion request failed");
            return Err(AssistantError::ApiError {
                message: format!("Chat completion error: {status} - {body}"),
            });
        }

        let completion: ChatCompletionResponse = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(AssistantError::EmptyCompletion)?;

        debug!(reply_chars = content.len(), "Chat completion received");
        Ok(content)
    }
}
