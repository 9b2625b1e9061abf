//! LexGraph LLM - Language model backends
//!
//! Two interchangeable implementations of [`LlmClient`]:
//! - [`GeminiClient`]: hosted Google Gemini
//! - [`LocalLlmClient`]: locally hosted OpenAI-style server (llama.cpp)
//!
//! The backend is picked once, from configuration, by [`create_llm_client`].
//!
//! Author: hephaex@gmail.com

use std::sync::Arc;

use lexgraph_core::{LlmClient, LlmConfig, LlmProvider, Result};

pub mod gemini;
pub mod local;

pub use gemini::GeminiClient;
pub use local::LocalLlmClient;

/// Create an LLM client from config
pub fn create_llm_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>> {
    let client: Arc<dyn LlmClient> = match config.provider {
        LlmProvider::Gemini => Arc::new(GeminiClient::from_config(config)?),
        LlmProvider::Local => Arc::new(LocalLlmClient::from_config(config)?),
    };

    tracing::debug!(backend = client.name(), "LLM client created");
    Ok(client)
}
