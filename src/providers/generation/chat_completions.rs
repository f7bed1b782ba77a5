//! Chat completions backend.
//!
//! Speaks the OpenAI `POST /chat/completions` wire format, which most hosted
//! and local model servers also accept. Each [`GenerationRequest`] becomes a
//! conversation with a single user message.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use super::traits::{
    Generation, GenerationError, GenerationRequest, GenerationResult, TextGenerator, Usage,
};

/// Default base URL for the OpenAI API.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
    code: Option<String>,
}

/// Client for a chat completions endpoint.
pub struct ChatCompletionsClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl ChatCompletionsClient {
    /// Client for any compatible endpoint. Local servers often need no key.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
        }
    }

    /// Overrides the HTTP client (useful for custom timeouts or proxies).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(value) = self
            .api_key
            .as_deref()
            .and_then(|key| HeaderValue::from_str(&format!("Bearer {}", key)).ok())
        {
            headers.insert(AUTHORIZATION, value);
        }

        headers
    }

    fn build_body<'a>(&'a self, request: &'a GenerationRequest) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }

    /// Maps a non-success status and its body onto a [`GenerationError`].
    fn classify_error(status: u16, retry_after_secs: Option<u64>, body: &str) -> GenerationError {
        if status == 429 {
            return GenerationError::RateLimited { retry_after_secs };
        }

        match serde_json::from_str::<ErrorBody>(body) {
            Ok(ErrorBody { error }) => {
                if status == 401 || error.code.as_deref() == Some("invalid_api_key") {
                    GenerationError::Unauthorized(error.message)
                } else {
                    GenerationError::Api {
                        status,
                        message: error.message,
                    }
                }
            }
            Err(_) if status == 401 => GenerationError::Unauthorized(format!("HTTP {}", status)),
            Err(_) => GenerationError::Api {
                status,
                message: format!("HTTP {}", status),
            },
        }
    }

    fn into_generation(response: ChatResponse) -> GenerationResult<Generation> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GenerationError::Malformed("no choices in response".to_string()))?;

        let usage = response
            .usage
            .map(|u| Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        let text = choice
            .message
            .content
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| GenerationError::Malformed("empty completion".to_string()))?;

        Ok(Generation {
            text,
            usage,
            truncated: choice.finish_reason.as_deref() == Some("length"),
        })
    }
}

#[async_trait]
impl TextGenerator for ChatCompletionsClient {
    fn backend(&self) -> &str {
        "chat-completions"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &GenerationRequest) -> GenerationResult<Generation> {
        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!(model = %self.model, "Requesting completion");

        let response = self
            .client
            .post(&url)
            .headers(self.build_headers())
            .json(&self.build_body(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_error(status.as_u16(), retry_after, &body));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Malformed(format!("parse response: {}", e)))?;

        Self::into_generation(parsed)
    }
}
