/*!
 * Provider implementations for chat-completion services.
 *
 * This module contains client implementations for the model backends:
 * - OpenAI: OpenAI-compatible chat completion APIs (OpenAI, LM Studio, Ollama, vLLM...)
 * - Mock: scripted provider for tests and benchmarks
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// A single system + user exchange sent to a model
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatRequest {
    /// Rendered system prompt
    pub system: String,

    /// User data
    pub user: String,

    /// Cap on generated tokens
    pub max_tokens: Option<u32>,

    /// Sampling temperature
    pub temperature: Option<f32>,

    /// Nucleus sampling mass
    pub top_p: Option<f32>,
}

/// Text reply of a model
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatResponse {
    /// Generated text
    pub text: String,

    /// Prompt tokens reported by the backend
    pub prompt_tokens: Option<u64>,

    /// Completion tokens reported by the backend
    pub completion_tokens: Option<u64>,
}

/// Common trait for all LLM providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably by the translation service.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Complete a chat request
    ///
    /// # Arguments
    /// * `request` - The request to complete
    ///
    /// # Returns
    /// * `Result<ChatResponse, ProviderError>` - The response from the provider or an error
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError>;

    /// Test the connection to the provider
    ///
    /// # Returns
    /// * `Result<(), ProviderError>` - Ok if the connection is successful, or an error
    async fn test_connection(&self) -> Result<(), ProviderError>;
}

pub mod mock;
pub mod openai;
