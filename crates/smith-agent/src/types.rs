//! Type definitions for chat-completion interactions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Token usage information
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: usize,
    #[serde(default)]
    pub completion_tokens: usize,
}

/// Chat message in OpenAI-compatible format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Chat-completion request body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Chat-completion response body
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

/// One choice in a chat-completion response
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChoiceMessage,
}

/// Message carried by a choice
#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Text returned by a successful completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    /// The model's reply
    pub text: String,
    /// Model that answered, as reported by the API
    pub model: String,
    /// When the reply was received
    pub timestamp: DateTime<Utc>,
    /// Token usage if available
    pub usage: Option<Usage>,
}

impl Completion {
    /// Extract the first choice's text from a decoded response body
    pub fn from_response(
        response: ChatResponse,
        requested_model: &str,
    ) -> Result<Self, CompletionError> {
        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| CompletionError::Malformed("No content in response".to_string()))?;

        if text.trim().is_empty() {
            return Err(CompletionError::Malformed(
                "Response content is empty".to_string(),
            ));
        }

        Ok(Self {
            text,
            model: response
                .model
                .unwrap_or_else(|| requested_model.to_string()),
            timestamp: Utc::now(),
            usage: response.usage,
        })
    }
}

/// A file to write: path relative to the working directory plus content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFile {
    pub path: String,
    pub content: String,
}

impl GeneratedFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Why a completion request did not produce text
///
/// Every variant routes the implementer to its offline fallback.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompletionError {
    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("API error {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Rate limit exceeded after {retries} retries: {body}")]
    RateLimited { retries: u32, body: String },

    #[error("Malformed response: {0}")]
    Malformed(String),
}
