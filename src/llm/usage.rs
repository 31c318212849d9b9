/*!
 * Token consumption bookkeeping across all requests of a client.
 */

use std::time::{Duration, Instant};

/// Token usage statistics for tracking API consumption
#[derive(Debug, Clone)]
pub struct TokenUsageStats {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    /// Successful requests
    pub requests: u64,
    /// Failed attempts, retried or not
    pub failures: u64,
    pub start_time: Instant,
    /// Total time spent waiting on the provider
    pub api_duration: Duration,
}

impl Default for TokenUsageStats {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenUsageStats {
    pub fn new() -> Self {
        Self {
            prompt_tokens: 0,
            completion_tokens: 0,
            total_tokens: 0,
            requests: 0,
            failures: 0,
            start_time: Instant::now(),
            api_duration: Duration::ZERO,
        }
    }

    /// Record a successful request
    pub fn add_token_usage(&mut self, prompt_tokens: Option<u64>, completion_tokens: Option<u64>, elapsed: Duration) {
        let prompt_tokens = prompt_tokens.unwrap_or(0);
        let completion_tokens = completion_tokens.unwrap_or(0);
        self.prompt_tokens += prompt_tokens;
        self.completion_tokens += completion_tokens;
        self.total_tokens += prompt_tokens + completion_tokens;
        self.requests += 1;
        self.api_duration += elapsed;
    }

    /// Record a failed attempt
    pub fn add_failure(&mut self, elapsed: Duration) {
        self.failures += 1;
        self.api_duration += elapsed;
    }

    /// Calculate tokens per minute rate
    pub fn tokens_per_minute(&self) -> f64 {
        // API time when known, wall time otherwise
        let duration_minutes = if self.api_duration.as_secs_f64() > 0.0 {
            self.api_duration.as_secs_f64() / 60.0
        } else {
            self.start_time.elapsed().as_secs_f64() / 60.0
        };

        if duration_minutes > 0.0 {
            self.total_tokens as f64 / duration_minutes
        } else {
            0.0
        }
    }

    /// Generate a summary of token usage
    pub fn summary(&self) -> String {
        format!(
            "Token Usage Summary:\n\
             Requests: {} ({} failed attempts)\n\
             Prompt tokens: {}\n\
             Completion tokens: {}\n\
             Total tokens: {}\n\
             Elapsed time: {:.2} minutes\n\
             API request time: {:.2} minutes\n\
             Tokens per minute: {:.2}",
            self.requests,
            self.failures,
            self.prompt_tokens,
            self.completion_tokens,
            self.total_tokens,
            self.start_time.elapsed().as_secs_f64() / 60.0,
            self.api_duration.as_secs_f64() / 60.0,
            self.tokens_per_minute()
        )
    }
}
