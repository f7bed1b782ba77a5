//! Text-generation trait and supporting types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by a generation backend.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response format: {0}")]
    Malformed(String),

    #[error("Rate limited, retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Authentication failed: {0}")]
    Unauthorized(String),
}

/// Result type for generation calls.
pub type GenerationResult<T> = Result<T, GenerationError>;

/// A single-turn prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// The user message.
    pub prompt: String,

    /// Sampling temperature (0.0 to 2.0, lower is more deterministic).
    pub temperature: f32,

    /// Upper bound on generated tokens, backend default when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            temperature: 0.7,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Token accounting reported by the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl Usage {
    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Text produced for a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    pub text: String,
    pub usage: Usage,
    /// The backend stopped because it hit the token limit.
    pub truncated: bool,
}

impl Generation {
    /// A complete answer with no usage data.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: Usage::default(),
            truncated: false,
        }
    }
}

/// A backend that turns a prompt into text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Short backend label for logs.
    fn backend(&self) -> &str;

    /// Model identifier requests are sent to.
    fn model(&self) -> &str;

    async fn generate(&self, request: &GenerationRequest) -> GenerationResult<Generation>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_builder() {
        let request = GenerationRequest::new("Rate this")
            .with_temperature(0.6)
            .with_max_tokens(200);

        assert_eq!(request.prompt, "Rate this");
        assert_eq!(request.temperature, 0.6);
        assert_eq!(request.max_tokens, Some(200));
    }

    #[test]
    fn usage_total() {
        let usage = Usage {
            prompt_tokens: 60,
            completion_tokens: 20,
        };
        assert_eq!(usage.total(), 80);
    }

    #[test]
    fn error_display() {
        let err = GenerationError::Unauthorized("invalid key".to_string());
        assert_eq!(err.to_string(), "Authentication failed: invalid key");

        let err = GenerationError::RateLimited {
            retry_after_secs: Some(5),
        };
        assert!(err.to_string().contains("Some(5)"));
    }
}
