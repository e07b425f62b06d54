//! Client configuration for the NCBI E-utilities and the chat-completion API

use crate::error::{AssistantError, Result};
use std::time::Duration;

/// Default NCBI E-utilities base URL
pub const DEFAULT_EUTILS_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

/// Default OpenAI-compatible API base URL
pub const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";

/// Default chat model
pub const DEFAULT_LLM_MODEL: &str = "gpt-3.5-turbo";

/// Timeout applied to every PubMed request
pub const PUBMED_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the PubMed client
///
/// # Example
///
/// ```
/// use pubmed_assistant::ClientConfig;
///
/// let config = ClientConfig::new()
///     .with_api_key("your_api_key_here")
///     .with_email("researcher@university.edu");
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: Option<String>,
    pub email: Option<String>,
    pub tool: Option<String>,
    pub base_url: Option<String>,
    pub user_agent: Option<String>,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new() -> Self {
        Self {
            api_key: None,
            email: None,
            tool: None,
            base_url: None,
            user_agent: None,
            timeout: PUBMED_TIMEOUT,
        }
    }

    /// Set the NCBI API key
    pub fn with_api_key<S: Into<String>>(mut self, api_key: S) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the contact email sent with every request
    pub fn with_email<S: Into<String>>(mut self, email: S) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set the tool name sent with every request
    pub fn with_tool<S: Into<String>>(mut self, tool: S) -> Self {
        self.tool = Some(tool.into());
        self
    }

    /// Override the E-utilities base URL (used by tests against a mock server)
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn effective_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(DEFAULT_EUTILS_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn effective_user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("pubmed-assistant/{}", env!("CARGO_PKG_VERSION")))
    }

    pub fn effective_tool(&self) -> &str {
        self.tool.as_deref().unwrap_or("pubmed-assistant")
    }

    /// Build the `api_key`/`email`/`tool` parameters appended to E-utilities URLs
    pub fn build_api_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();

        if let Some(ref api_key) = self.api_key {
            params.push(("api_key".to_string(), api_key.clone()));
        }
        if let Some(ref email) = self.email {
            params.push(("email".to_string(), email.clone()));
        }
        if self.tool.is_some() || self.email.is_some() {
            params.push(("tool".to_string(), self.effective_tool().to_string()));
        }

        params
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for the chat-completion API
#[derive(Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    /// `None` leaves completions unbounded
    pub timeout: Option<Duration>,
}

impl LlmConfig {
    /// Create a configuration with the default endpoint and model
    ///
    /// # Errors
    ///
    /// * `AssistantError::ConfigError` - If the API key is blank
    pub fn new<S: Into<String>>(api_key: S) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(AssistantError::ConfigError(
                "LLM API key must not be empty".to_string(),
            ));
        }

        Ok(Self {
            base_url: DEFAULT_LLM_BASE_URL.to_string(),
            api_key,
            model: DEFAULT_LLM_MODEL.to_string(),
            timeout: None,
        })
    }

    /// Read `OPENAI_API_KEY`, `OPENAI_BASE_URL` and `OPENAI_MODEL` from the environment
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            AssistantError::ConfigError("OPENAI_API_KEY is not set".to_string())
        })?;

        let mut config = Self::new(api_key)?;
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            config = config.with_base_url(base_url);
        }
        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            config = config.with_model(model);
        }
        Ok(config)
    }

    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

// Keeps the key out of debug output
impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}
