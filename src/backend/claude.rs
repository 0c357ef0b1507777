//! Live backend against the Anthropic messages API.

use crate::backend::LlmBackend;
use crate::config::KeyFromEnv;
use crate::error::BackendError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";

#[derive(Debug, Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<ClaudeMessage>,
}

#[derive(Debug, Serialize)]
struct ClaudeMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeContent>,
}

#[derive(Debug, Deserialize)]
struct ClaudeContent {
    text: String,
}

#[derive(Debug, Clone)]
pub struct ClaudeBackend {
    api_key: String,
    client: Client,
    model: String,
}

impl KeyFromEnv for ClaudeBackend {
    const KEY_NAME: &'static str = "ANTHROPIC_API_KEY";
}

impl ClaudeBackend {
    /// Create a backend by reading ANTHROPIC_API_KEY from environment/.env.
    pub fn new() -> Result<Self, BackendError> {
        let api_key = Self::find_key().ok_or(BackendError::Authentication)?;
        info!(model = DEFAULT_MODEL, "Creating new Claude backend");
        Ok(Self {
            api_key,
            client: Client::new(),
            model: DEFAULT_MODEL.to_string(),
        })
    }

    /// Create a backend with an explicit API key
    pub fn with_api_key(api_key: String) -> Self {
        info!(model = DEFAULT_MODEL, "Creating Claude backend with explicit API key");
        Self {
            api_key,
            client: Client::new(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: String) -> Self {
        info!(model = %model, "Setting Claude model");
        self.model = model;
        self
    }
}

#[async_trait]
impl LlmBackend for ClaudeBackend {
    #[instrument(skip(self, prompt), fields(prompt_len = prompt.len(), model = %self.model))]
    async fn generate(&self, prompt: String) -> Result<String, BackendError> {
        debug!(model = %self.model, prompt_len = prompt.len(), "Preparing Claude API request");

        let request = ClaudeRequest {
            model: self.model.clone(),
            max_tokens: 1024,
            messages: vec![ClaudeMessage {
                role: "user".to_string(),
                content: prompt,
            }],
        };

        let response = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP request failed");
                BackendError::Http(e.to_string())
            })?;

        debug!(status = %response.status(), "Received response from Claude API");

        if response.status() == 429 {
            warn!("Claude API rate limit exceeded");
            return Err(BackendError::RateLimit);
        }
        if response.status() == 401 {
            error!("Claude API authentication failed");
            return Err(BackendError::Authentication);
        }
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %error_text, "Claude API error");
            return Err(BackendError::Api(error_text));
        }

        let claude_response: ClaudeResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse Claude response JSON");
            BackendError::Http(e.to_string())
        })?;

        let result = claude_response
            .content
            .first()
            .map(|content| content.text.clone())
            .ok_or_else(|| {
                error!("No content in Claude response");
                BackendError::Api("No content in response".to_string())
            });

        match &result {
            Ok(text) => info!(response_len = text.len(), "Successfully received Claude response"),
            Err(e) => error!(error = %e, "Failed to extract content from Claude response"),
        }

        result
    }

    fn clone_box(&self) -> Box<dyn LlmBackend> {
        Box::new(self.clone())
    }
}
