use std::time::Duration;
use async_trait::async_trait;
use serde::{Serialize, Deserialize};
use reqwest::{Client, StatusCode};
use log::error;

use crate::errors::ProviderError;
use super::{ChatRequest, ChatResponse, Provider};

/// Default public endpoint
const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

/// Client for OpenAI-compatible chat completion APIs
#[derive(Debug)]
pub struct OpenAI {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication (may be empty for local servers)
    api_key: String,
    /// Base URL of the API, e.g. `https://api.openai.com/v1`
    endpoint: String,
    /// Model identifier
    model: String,
}

/// Chat completion request body
#[derive(Debug, Serialize)]
pub struct OpenAIRequest {
    /// The model to use
    model: String,

    /// The messages for the conversation
    messages: Vec<OpenAIMessage>,

    /// Temperature for generation
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,

    /// Top probability mass to consider (nucleus sampling)
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,

    /// Maximum number of tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// Chat message format
#[derive(Debug, Serialize, Deserialize)]
pub struct OpenAIMessage {
    /// Role of the message sender (system, user, assistant)
    pub role: String,

    /// Content of the message
    pub content: String,
}

/// Token usage information
#[derive(Debug, Deserialize)]
pub struct OpenAIUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

/// One generated alternative
#[derive(Debug, Deserialize)]
pub struct OpenAIChoice {
    pub message: OpenAIMessage,
}

/// Chat completion response body
#[derive(Debug, Deserialize)]
pub struct OpenAIResponse {
    pub choices: Vec<OpenAIChoice>,
    #[serde(default)]
    pub usage: Option<OpenAIUsage>,
}

impl OpenAIRequest {
    /// Build the wire request for a chat exchange
    pub fn from_chat(model: impl Into<String>, request: ChatRequest) -> Self {
        Self {
            model: model.into(),
            messages: vec![
                OpenAIMessage { role: "system".to_string(), content: request.system },
                OpenAIMessage { role: "user".to_string(), content: request.user },
            ],
            temperature: request.temperature,
            top_p: request.top_p,
            max_tokens: request.max_tokens,
        }
    }
}

impl OpenAI {
    /// Create a new client; an empty endpoint selects the public API
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        let endpoint = endpoint.into();
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: if endpoint.is_empty() { DEFAULT_ENDPOINT.to_string() } else { endpoint },
            model: model.into(),
        }
    }

    /// Model identifier used for requests
    pub fn model(&self) -> &str {
        &self.model
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
    }

    /// Extract text from a completion response
    pub fn extract_text_from_response(response: &OpenAIResponse) -> String {
        response.choices
            .first()
            .map(|choice| choice.message.content.clone())
            .unwrap_or_default()
    }
}

fn status_error(status: StatusCode, message: String) -> ProviderError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::AuthenticationError(message),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimitExceeded(message),
        _ => ProviderError::ApiError { status_code: status.as_u16(), message },
    }
}

#[async_trait]
impl Provider for OpenAI {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        let body = OpenAIRequest::from_chat(&self.model, request);

        let mut builder = self.client.post(self.completions_url())
            .header("Content-Type", "application/json")
            .json(&body);
        if !self.api_key.is_empty() {
            builder = builder.bearer_auth(&self.api_key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() {
                ProviderError::ConnectionError(e.to_string())
            } else {
                ProviderError::RequestFailed(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("OpenAI API error ({}): {}", status, error_text);
            return Err(status_error(status, error_text));
        }

        let parsed = response.json::<OpenAIResponse>().await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        if parsed.choices.is_empty() {
            return Err(ProviderError::ParseError("response contains no choices".to_string()));
        }

        Ok(ChatResponse {
            text: Self::extract_text_from_response(&parsed),
            prompt_tokens: parsed.usage.as_ref().map(|u| u.prompt_tokens),
            completion_tokens: parsed.usage.as_ref().map(|u| u.completion_tokens),
        })
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        let request = ChatRequest {
            system: String::new(),
            user: "Hello".to_string(),
            max_tokens: Some(10),
            ..Default::default()
        };
        self.complete(request).await.map(|_| ())
    }
}
