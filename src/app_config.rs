use anyhow::{anyhow, Context, Result};
use log::{warn, LevelFilter};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::document::WriteMode;
use crate::errors::AppError;
use crate::llm::{Increasable, RetryPolicy};
use crate::translation::TranslationOptions;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Target language code (ISO)
    pub target_language: String,

    /// Chunking and pipeline settings
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Model service settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Chunking and pipeline settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TranslationConfig {
    /// Token budget of a chunk, context included
    #[serde(default = "default_max_chunk_tokens")]
    pub max_chunk_tokens: usize,

    /// Share of the chunk budget spent on surrounding context (0.0 to 1.0)
    #[serde(default = "default_gap_rate")]
    pub gap_rate: f64,

    /// Maximum number of chunks translated at once
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    /// Extra rules for the model, e.g. a glossary or a tone
    #[serde(default)]
    pub user_prompt: Option<String>,

    /// Whether chunk translations are cached on disk
    #[serde(default = "default_true")]
    pub cache_enabled: bool,

    /// Cache database file; the user cache directory when unset
    #[serde(default)]
    pub cache_path: Option<PathBuf>,

    /// How translations are written into the output document
    #[serde(default)]
    pub write_mode: WriteMode,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            max_chunk_tokens: default_max_chunk_tokens(),
            gap_rate: default_gap_rate(),
            concurrent_requests: default_concurrent_requests(),
            user_prompt: None,
            cache_enabled: true,
            cache_path: None,
            write_mode: WriteMode::default(),
        }
    }
}

/// A sampling parameter: one value, or `[first, last]` raised across retries
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(untagged)]
pub enum SamplingValue {
    Fixed(f32),
    Range(f32, f32),
}

impl SamplingValue {
    fn bounds(&self) -> (f32, f32) {
        match *self {
            Self::Fixed(value) => (value, value),
            Self::Range(start, end) => (start, end),
        }
    }
}

impl From<SamplingValue> for Increasable {
    fn from(value: SamplingValue) -> Self {
        match value {
            SamplingValue::Fixed(value) => Increasable::fixed(value),
            SamplingValue::Range(start, end) => Increasable::range(start, end),
        }
    }
}

/// OpenAI-compatible chat service configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProviderConfig {
    /// Base URL of the API
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model name (e.g., "gpt-4o-mini")
    #[serde(default = "default_model")]
    pub model: String,

    /// API key for the service; may stay empty for local servers
    #[serde(default)]
    pub api_key: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Extra attempts after a transient failure
    #[serde(default = "default_retry_times")]
    pub retry_times: usize,

    /// Pause between attempts in seconds
    #[serde(default = "default_retry_interval_secs")]
    pub retry_interval_secs: f64,

    /// Temperature for generation
    #[serde(default)]
    pub temperature: Option<SamplingValue>,

    /// Nucleus sampling
    #[serde(default)]
    pub top_p: Option<SamplingValue>,

    /// Directory receiving one transcript per model request
    #[serde(default)]
    pub request_log_dir: Option<PathBuf>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
            retry_times: default_retry_times(),
            retry_interval_secs: default_retry_interval_secs(),
            temperature: None,
            top_p: None,
            request_log_dir: None,
        }
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retry_times: self.retry_times,
            retry_interval: Duration::from_secs_f64(self.retry_interval_secs.max(0.0)),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn default_max_chunk_tokens() -> usize {
    3000
}

fn default_gap_rate() -> f64 {
    0.15
}

fn default_concurrent_requests() -> usize {
    1
}

fn default_true() -> bool {
    true
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_retry_times() -> usize {
    5
}

fn default_retry_interval_secs() -> f64 {
    6.0
}

impl Config {
    /// Load the configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        serde_json::from_str(&content)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))
            .context("Failed to parse config file")
    }

    /// Write the configuration as pretty-printed JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        std::fs::write(path, json).with_context(|| format!("Failed to write config to file: {}", path.display()))
    }

    /// Load the configuration, creating a default file when none exists
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::from_file(path);
        }
        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Self::default();
        config.save(path)?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        crate::language_utils::validate_language_code(&self.target_language)?;

        let translation = &self.translation;
        if translation.max_chunk_tokens == 0 {
            return Err(anyhow!("max_chunk_tokens must be greater than 0"));
        }
        if !(0.0..1.0).contains(&translation.gap_rate) {
            return Err(anyhow!("gap_rate must be in [0.0, 1.0), got {}", translation.gap_rate));
        }
        if translation.concurrent_requests == 0 {
            return Err(anyhow!("concurrent_requests must be at least 1"));
        }

        let provider = &self.provider;
        let endpoint = Url::parse(&provider.endpoint)
            .with_context(|| format!("Invalid provider endpoint: {}", provider.endpoint))?;
        if provider.model.trim().is_empty() {
            return Err(anyhow!("Provider model cannot be empty"));
        }
        if endpoint.host_str() == Some("api.openai.com") && provider.api_key.is_empty() {
            return Err(anyhow!("Translation API key is required for the OpenAI API"));
        }
        if !provider.retry_interval_secs.is_finite() || provider.retry_interval_secs < 0.0 {
            return Err(anyhow!("retry_interval_secs must be a non-negative number"));
        }
        if let Some(temperature) = provider.temperature {
            check_sampling("temperature", temperature, 2.0)?;
        }
        if let Some(top_p) = provider.top_p {
            check_sampling("top_p", top_p, 1.0)?;
        }

        Ok(())
    }

    /// Pipeline options for this configuration
    pub fn translation_options(&self) -> Result<TranslationOptions> {
        Ok(TranslationOptions {
            target_language: crate::language_utils::normalize_language_code(&self.target_language)?,
            user_prompt: self.translation.user_prompt.clone(),
            max_chunk_tokens: self.translation.max_chunk_tokens,
            gap_rate: self.translation.gap_rate,
            max_concurrent_requests: self.translation.concurrent_requests,
        })
    }
}

fn check_sampling(name: &str, value: SamplingValue, max: f32) -> Result<()> {
    let (start, end) = value.bounds();
    if [start, end].iter().any(|v| !(0.0..=max).contains(v)) {
        return Err(anyhow!("{} must be within [0.0, {}]", name, max));
    }
    Ok(())
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            target_language: "fr".to_string(),
            translation: TranslationConfig::default(),
            provider: ProviderConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}
