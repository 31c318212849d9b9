/*!
 * Mock provider implementations for testing.
 *
 * This module provides a mock provider that simulates different behaviors:
 * - `MockProvider::working()` - Answers both translation requests with well-formed replies
 * - `MockProvider::intermittent(n)` - Fails every nth request
 * - `MockProvider::failing()` - Always fails with an error
 * - `MockProvider::empty()` - Answers with empty text
 */

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::errors::ProviderError;
use crate::providers::{ChatRequest, ChatResponse, Provider};

static FRAGMENT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)<fragment id="(\d+)">(.*?)</fragment>"#).expect("valid fragment pattern"));

/// Custom reply generator: receives the request and its 0-based sequence number
pub type MockHandler = Arc<dyn Fn(&ChatRequest, usize) -> Result<String, ProviderError> + Send + Sync>;

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds with a proper reply
    Working,
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Always fails with an error
    Failing,
    /// Returns empty response
    Empty,
    /// Simulates slow response
    Slow { delay_ms: u64 },
}

/// Mock provider for testing translation behavior
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter, shared between clones
    request_count: Arc<AtomicUsize>,
    /// Custom response generator (optional)
    handler: Option<MockHandler>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            handler: None,
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create an intermittently failing mock provider
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent { fail_every: fail_every.max(1) })
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that returns empty responses
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Create a mock that waits before answering like `working()`
    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Set a custom response generator used instead of the default replies
    pub fn with_handler<H>(mut self, handler: H) -> Self
    where
        H: Fn(&ChatRequest, usize) -> Result<String, ProviderError> + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Default reply: a fenced TXT block for free-text requests, and a
    /// `<response>` document echoing every fragment for structured requests
    pub fn default_reply(request: &ChatRequest) -> String {
        if request.user.trim_start().starts_with("```XML") {
            let mut reply = String::from("<response>\n");
            for captures in FRAGMENT_PATTERN.captures_iter(&request.user) {
                reply.push_str(&format!(
                    "  <fragment id=\"{}\">[TRANSLATED] {}</fragment>\n",
                    &captures[1], &captures[2]
                ));
            }
            reply.push_str("</response>");
            reply
        } else {
            format!("```TXT\n[TRANSLATED] {}\n```", request.user)
        }
    }

    fn reply(&self, request: &ChatRequest, count: usize) -> Result<ChatResponse, ProviderError> {
        let text = match &self.handler {
            Some(handler) => handler(request, count)?,
            None => Self::default_reply(request),
        };
        Ok(ChatResponse {
            prompt_tokens: Some(request.user.len() as u64),
            completion_tokens: Some(text.len() as u64),
            text,
        })
    }
}

impl Clone for MockProvider {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior,
            request_count: Arc::clone(&self.request_count),
            handler: self.handler.clone(),
        }
    }
}

impl fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockProvider")
            .field("behavior", &self.behavior)
            .field("request_count", &self.request_count())
            .field("custom_handler", &self.handler.is_some())
            .finish()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);

        match self.behavior {
            MockBehavior::Working => self.reply(&request, count),

            MockBehavior::Intermittent { fail_every } => {
                if count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                        status_code: 503,
                    })
                } else {
                    self.reply(&request, count)
                }
            }

            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),

            MockBehavior::Empty => Ok(ChatResponse {
                text: String::new(),
                prompt_tokens: Some(0),
                completion_tokens: Some(0),
            }),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                self.reply(&request, count)
            }
        }
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        match self.behavior {
            MockBehavior::Failing => Err(ProviderError::ConnectionError("Simulated connection failure".to_string())),
            _ => Ok(()),
        }
    }
}
