/*!
 * Request execution with retries and per-request logs.
 */

use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Local;
use log::{debug, warn};
use parking_lot::Mutex;

use crate::errors::ProviderError;
use crate::providers::{ChatRequest, Provider};

use super::usage::TokenUsageStats;

/// Sampling parameter raised linearly from `start` to `end` across attempts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Increasable {
    start: f32,
    end: f32,
}

impl Increasable {
    /// The same value on every attempt
    pub fn fixed(value: f32) -> Self {
        Self { start: value, end: value }
    }

    /// `start` on the first attempt, `end` on the last one
    pub fn range(start: f32, end: f32) -> Self {
        Self { start, end }
    }

    /// Value for `attempt` (0-based) out of `attempts`
    pub fn value_at(&self, attempt: usize, attempts: usize) -> f32 {
        if attempts <= 1 {
            return self.start;
        }
        let progress = attempt.min(attempts - 1) as f32 / (attempts - 1) as f32;
        self.start + (self.end - self.start) * progress
    }
}

/// How often and how patiently failed requests are sent again
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one
    pub retry_times: usize,
    /// Pause between attempts
    pub retry_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retry_times: 5,
            retry_interval: Duration::from_secs(6),
        }
    }
}

/// Sends one logical request to a provider, retrying transient failures
pub(crate) struct Executor {
    pub(crate) provider: Arc<dyn Provider>,
    pub(crate) retry: RetryPolicy,
    pub(crate) temperature: Option<Increasable>,
    pub(crate) top_p: Option<Increasable>,
    pub(crate) log_dir: Option<PathBuf>,
    pub(crate) usage: Mutex<TokenUsageStats>,
}

impl Executor {
    /// Reply text of the first successful attempt
    pub(crate) async fn request(&self, system: &str, user: &str, max_tokens: usize) -> Result<String, ProviderError> {
        let attempts = self.retry.retry_times + 1;
        let mut log = RequestLog::new(system, user);
        let mut attempt = 0;

        loop {
            let request = ChatRequest {
                system: system.to_string(),
                user: user.to_string(),
                max_tokens: Some(u32::try_from(max_tokens).unwrap_or(u32::MAX)),
                temperature: self.temperature.map(|t| t.value_at(attempt, attempts)),
                top_p: self.top_p.map(|p| p.value_at(attempt, attempts)),
            };

            let started = Instant::now();
            let outcome = self.provider.complete(request).await;
            match &outcome {
                Ok(response) => self.usage.lock().add_token_usage(
                    response.prompt_tokens,
                    response.completion_tokens,
                    started.elapsed(),
                ),
                Err(_) => self.usage.lock().add_failure(started.elapsed()),
            }

            match outcome {
                Ok(response) => {
                    debug!(
                        "Model replied with {} chars (prompt tokens: {:?}, completion tokens: {:?})",
                        response.text.len(),
                        response.prompt_tokens,
                        response.completion_tokens
                    );
                    log.reply(&response.text);
                    self.write_log(&log).await;
                    return Ok(response.text);
                }
                Err(error) if error.is_retryable() && attempt + 1 < attempts => {
                    warn!(
                        "Request failed (attempt {}/{}): {}. Retrying in {:?}",
                        attempt + 1,
                        attempts,
                        error,
                        self.retry.retry_interval
                    );
                    log.failure(attempt, &error);
                    tokio::time::sleep(self.retry.retry_interval).await;
                    attempt += 1;
                }
                Err(error) => {
                    log.failure(attempt, &error);
                    self.write_log(&log).await;
                    return Err(error);
                }
            }
        }
    }

    async fn write_log(&self, log: &RequestLog) {
        let Some(dir) = &self.log_dir else {
            return;
        };
        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            warn!("Cannot create request log directory {}: {}", dir.display(), e);
            return;
        }
        let path = dir.join(format!("request {}.log", log.started.format("%Y-%m-%d %H-%M-%S%.6f")));
        if let Err(e) = tokio::fs::write(&path, &log.body).await {
            warn!("Cannot write request log {}: {}", path.display(), e);
        }
    }
}

/// Transcript of one logical request
struct RequestLog {
    started: chrono::DateTime<Local>,
    body: String,
}

impl RequestLog {
    fn new(system: &str, user: &str) -> Self {
        let started = Local::now();
        let body = format!(
            "Started: {}\n\n[[System]]:\n{}\n\n[[User]]:\n{}\n",
            started.format("%Y-%m-%d %H:%M:%S"),
            system,
            user
        );
        Self { started, body }
    }

    fn reply(&mut self, text: &str) {
        let _ = write!(self.body, "\n[[Answer]]:\n{}\n", text);
    }

    fn failure(&mut self, attempt: usize, error: &ProviderError) {
        let _ = write!(self.body, "\n[[Error, attempt {}]]:\n{}\n", attempt + 1, error);
    }
}
