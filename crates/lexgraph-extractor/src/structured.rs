//! Structured extraction on top of a text-generating LLM
//!
//! Appends schema format instructions to a prompt, calls the backend and
//! pulls a JSON value out of the reply. Models wrap JSON in code fences or
//! prose often enough that the reply is searched rather than parsed as-is.

use std::sync::Arc;

use lexgraph_core::{LexError, LlmClient, OutputSchema};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Ways a structured submission can fail
#[derive(Debug, Error)]
pub enum StructuredError {
    /// The backend call itself failed
    #[error("capability call failed: {0}")]
    Capability(#[from] LexError),

    /// The reply contained nothing parseable as JSON
    #[error("no JSON found in model output: {}", preview(.raw))]
    NoJson { raw: String },

    /// A single object was required but the model returned a list
    #[error("expected a single {schema} object, got a list of {} candidates", .candidates.len())]
    CandidateList {
        schema: &'static str,
        candidates: Vec<Value>,
    },

    /// JSON parsed but does not fit the target shape
    #[error("output does not match {schema}: {message}")]
    Schema {
        schema: &'static str,
        message: String,
    },
}

fn preview(raw: &str) -> String {
    const MAX_CHARS: usize = 80;
    let mut shown: String = raw.chars().take(MAX_CHARS).collect();
    if raw.chars().count() > MAX_CHARS {
        shown.push_str("...");
    }
    shown
}

/// Pull the first JSON document out of a model reply
pub fn extract_json(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }

    if let Some(fenced) = fenced_block(trimmed) {
        if let Ok(value) = serde_json::from_str(fenced) {
            return Some(value);
        }
    }

    // Outermost bracketed span, trying whichever bracket opens first
    let mut spans: Vec<(usize, char)> = ['[', '{']
        .into_iter()
        .filter_map(|open| trimmed.find(open).map(|i| (i, open)))
        .collect();
    spans.sort_unstable();

    spans.into_iter().find_map(|(start, open)| {
        let close = if open == '[' { ']' } else { '}' };
        let end = trimmed.rfind(close)?;
        if end <= start {
            return None;
        }
        serde_json::from_str(&trimmed[start..=end]).ok()
    })
}

fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after_fence = &text[start + 3..];
    // Skip a language tag such as ```json
    let body_start = after_fence.find('\n').map_or(0, |i| i + 1);
    let body = &after_fence[body_start..];
    let end = body.find("```")?;
    Some(body[..end].trim())
}

/// Deserialize one candidate into the model type for `schema`
pub fn parse_candidate<T: DeserializeOwned>(
    value: Value,
    schema: &OutputSchema,
) -> Result<T, StructuredError> {
    serde_json::from_value(value).map_err(|e| StructuredError::Schema {
        schema: schema.name,
        message: e.to_string(),
    })
}

/// Schema-driven submission to a language model
#[derive(Clone)]
pub struct StructuredLlm {
    client: Arc<dyn LlmClient>,
}

impl StructuredLlm {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    /// Backend name for logging
    pub fn backend(&self) -> &str {
        self.client.name()
    }

    /// Submit a prompt with the schema's format instructions
    pub async fn submit(
        &self,
        prompt: &str,
        schema: &OutputSchema,
        as_list: bool,
    ) -> Result<Value, StructuredError> {
        let full_prompt = format!("{prompt}\n\n{}", schema.format_instructions(as_list));

        tracing::debug!(
            backend = self.backend(),
            schema = schema.name,
            prompt_chars = full_prompt.chars().count(),
            "Submitting structured extraction"
        );

        let raw = self.client.generate(&full_prompt).await?;
        extract_json(&raw).ok_or(StructuredError::NoJson { raw })
    }

    /// Submit and require a single object of type `T`
    pub async fn submit_object<T: DeserializeOwned>(
        &self,
        prompt: &str,
        schema: &OutputSchema,
    ) -> Result<T, StructuredError> {
        match self.submit(prompt, schema, false).await? {
            Value::Array(candidates) => Err(StructuredError::CandidateList {
                schema: schema.name,
                candidates,
            }),
            value => parse_candidate(value, schema),
        }
    }

    /// Submit and return the raw candidate list
    ///
    /// A single object is treated as a one-element list.
    pub async fn submit_many(
        &self,
        prompt: &str,
        schema: &OutputSchema,
    ) -> Result<Vec<Value>, StructuredError> {
        match self.submit(prompt, schema, true).await? {
            Value::Array(items) => Ok(items),
            value @ Value::Object(_) => Ok(vec![value]),
            other => Err(StructuredError::Schema {
                schema: schema.name,
                message: format!("expected an array or object, got {other}"),
            }),
        }
    }
}
