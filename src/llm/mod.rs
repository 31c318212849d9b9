/*!
 * Model client used by the translation protocol.
 *
 * `Llm` wraps a chat provider and a token codec. It sends prompts with
 * retries and extracts the structured part of each reply:
 *
 * - `request_text`: the first fenced block carrying a tag, e.g. `TXT`
 * - `request_xml`: the first `<response>` element
 */

use std::path::PathBuf;
use std::sync::Arc;

use log::debug;
use parking_lot::Mutex;

use crate::errors::{ProviderError, TranslationError};
use crate::providers::Provider;
use crate::translation::tokens::TokenCodec;

pub mod executor;
pub mod response;
pub mod templates;
pub mod usage;

pub use self::executor::{Increasable, RetryPolicy};
pub use self::response::XmlElement;
pub use self::templates::PromptTemplate;
pub use self::usage::TokenUsageStats;

use self::executor::Executor;

/// Root element expected in structured replies
const RESPONSE_TAG: &str = "response";

/// Chat model client with reply extraction
pub struct Llm {
    executor: Executor,
    codec: Arc<dyn TokenCodec>,
}

impl Llm {
    /// Create a client with the default retry policy and provider-chosen sampling
    pub fn new(provider: Arc<dyn Provider>, codec: Arc<dyn TokenCodec>) -> Self {
        Self {
            executor: Executor {
                provider,
                retry: RetryPolicy::default(),
                temperature: None,
                top_p: None,
                log_dir: None,
                usage: Mutex::new(TokenUsageStats::new()),
            },
            codec,
        }
    }

    /// Set the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.executor.retry = retry;
        self
    }

    /// Set the temperature, raised across retries when given as a range
    pub fn with_temperature(mut self, temperature: Increasable) -> Self {
        self.executor.temperature = Some(temperature);
        self
    }

    /// Set nucleus sampling, raised across retries when given as a range
    pub fn with_top_p(mut self, top_p: Increasable) -> Self {
        self.executor.top_p = Some(top_p);
        self
    }

    /// Write a transcript of every request into `dir`
    pub fn with_request_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.executor.log_dir = Some(dir.into());
        self
    }

    /// Snapshot of the tokens consumed so far
    pub fn usage(&self) -> TokenUsageStats {
        self.executor.usage.lock().clone()
    }

    /// Token codec matching the model
    pub fn codec(&self) -> &Arc<dyn TokenCodec> {
        &self.codec
    }

    /// Single cheap request against the provider, no retries
    pub async fn test_connection(&self) -> Result<(), ProviderError> {
        self.executor.provider.test_connection().await
    }

    /// Send a request and hand the first fenced `text_tag` block to `parser`
    pub async fn request_text<R, P>(
        &self,
        prompt: &str,
        text_tag: &str,
        user_data: &str,
        max_tokens: usize,
        parser: P,
    ) -> Result<R, TranslationError>
    where
        P: FnOnce(&str) -> Result<R, TranslationError>,
    {
        let reply = self.executor.request(prompt, user_data, max_tokens).await?;
        match response::fenced_blocks(&reply, text_tag).first() {
            Some(block) => parser(block),
            None => {
                debug!("No fenced {} block in reply: {}", text_tag, reply);
                Err(TranslationError::NoValidText {
                    tag: text_tag.to_string(),
                })
            }
        }
    }

    /// Send a request and hand the first `<response>` element to `parser`
    pub async fn request_xml<R, P>(
        &self,
        prompt: &str,
        user_data: &str,
        max_tokens: usize,
        parser: P,
    ) -> Result<R, TranslationError>
    where
        P: FnOnce(&XmlElement) -> Result<R, TranslationError>,
    {
        let reply = self.executor.request(prompt, user_data, max_tokens).await?;
        match response::find_element(&reply, RESPONSE_TAG) {
            Some(element) => parser(&element),
            None => {
                debug!("No <{}> element in reply: {}", RESPONSE_TAG, reply);
                Err(TranslationError::NoValidXml)
            }
        }
    }
}
