//! Locally hosted OpenAI-style client (llama.cpp server)
//!
//! Talks to `/v1/chat/completions` or `/v1/completions` depending on
//! configuration.

use std::time::Duration;

use async_trait::async_trait;
use lexgraph_core::{LexError, LlmClient, LlmConfig, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Client for a llama.cpp (or any OpenAI-compatible) server
pub struct LocalLlmClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
    temperature: f32,
    chat: bool,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
    stop: Vec<String>,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
    stop: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct LocalResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    /// llama.cpp native endpoints answer with a bare `content` field
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<Message>,
    text: Option<String>,
}

impl LocalResponse {
    fn into_text(self) -> Option<String> {
        let from_choice = self.choices.into_iter().next().and_then(|c| match c.message {
            Some(message) => Some(message.content),
            None => c.text,
        });

        from_choice
            .or(self.content)
            .map(|text| text.trim().to_string())
    }
}

impl LocalLlmClient {
    /// Create a chat-mode client with default generation settings
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        let defaults = LlmConfig::default();
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            model: model.into(),
            max_tokens: defaults.max_tokens,
            temperature: defaults.temperature,
            chat: true,
        }
    }

    /// Create from config
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LexError::ConfigError(format!("HTTP client setup failed: {e}")))?;

        Ok(Self {
            client,
            base_url: config.local_url.trim_end_matches('/').to_string(),
            api_key: config.local_api_key.clone(),
            model: config.local_model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            chat: config.local_chat,
        })
    }

    /// Set a bearer token
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Use the plain completion endpoint
    pub fn with_completion_mode(mut self) -> Self {
        self.chat = false;
        self
    }

    fn endpoint(&self) -> String {
        if self.chat {
            format!("{}/v1/chat/completions", self.base_url)
        } else {
            format!("{}/v1/completions", self.base_url)
        }
    }

    fn request_body(&self, prompt: &str) -> serde_json::Result<serde_json::Value> {
        if self.chat {
            serde_json::to_value(ChatRequest {
                model: &self.model,
                messages: vec![Message {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                }],
                max_tokens: self.max_tokens,
                temperature: self.temperature,
                stop: Vec::new(),
            })
        } else {
            serde_json::to_value(CompletionRequest {
                model: &self.model,
                prompt,
                max_tokens: self.max_tokens,
                temperature: self.temperature,
                stop: Vec::new(),
            })
        }
    }
}

#[async_trait]
impl LlmClient for LocalLlmClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = self
            .request_body(prompt)
            .map_err(|e| LexError::LlmError(format!("Failed to encode request: {e}")))?;

        let mut request = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .json(&body);

        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| LexError::LlmError(format!("llama-cpp request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(LexError::LlmError(format!(
                "llama-cpp error ({status}): {error_text}"
            )));
        }

        let result: LocalResponse = response
            .json()
            .await
            .map_err(|e| LexError::LlmError(format!("Failed to parse llama-cpp response: {e}")))?;

        result
            .into_text()
            .ok_or_else(|| LexError::LlmError("No response generated".to_string()))
    }

    fn name(&self) -> &str {
        if self.chat {
            "llama-cpp-chat"
        } else {
            "llama-cpp"
        }
    }
}
