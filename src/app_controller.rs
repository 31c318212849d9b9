use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::app_config::Config;
use crate::document::{self, TextDocument};
use crate::errors::AppError;
use crate::llm::Llm;
use crate::providers::openai::OpenAI;
use crate::providers::Provider;
use crate::translation::cache::{SqliteStore, TranslationStore};
use crate::translation::tokens::WordPieceCodec;
use crate::translation::TranslationService;

// @module: Application controller for document translation

/// Steps of the progress bar; progress arrives as a fraction
const PROGRESS_STEPS: u64 = 1000;

/// Main application controller for document translation
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build the pipeline against the configured OpenAI-compatible service
    pub fn build_service(&self) -> Result<TranslationService> {
        let provider_config = &self.config.provider;
        let provider = OpenAI::new(
            provider_config.api_key.clone(),
            provider_config.endpoint.clone(),
            provider_config.model.clone(),
            provider_config.timeout(),
        );
        info!("Using model {} at {}", provider.model(), provider_config.endpoint);
        self.build_service_with_provider(Arc::new(provider))
    }

    /// Build the pipeline on top of any provider
    pub fn build_service_with_provider(&self, provider: Arc<dyn Provider>) -> Result<TranslationService> {
        let provider_config = &self.config.provider;
        let mut llm = Llm::new(provider, Arc::new(WordPieceCodec::new())).with_retry(provider_config.retry_policy());
        if let Some(temperature) = provider_config.temperature {
            llm = llm.with_temperature(temperature.into());
        }
        if let Some(top_p) = provider_config.top_p {
            llm = llm.with_top_p(top_p.into());
        }
        if let Some(dir) = &provider_config.request_log_dir {
            llm = llm.with_request_log_dir(dir);
        }

        Ok(TranslationService::new(
            Arc::new(llm),
            self.open_store()?,
            self.config.translation_options()?,
        ))
    }

    fn open_store(&self) -> Result<Option<Arc<dyn TranslationStore>>> {
        let translation = &self.config.translation;
        if !translation.cache_enabled {
            debug!("Translation cache disabled");
            return Ok(None);
        }
        let store = match &translation.cache_path {
            Some(path) => SqliteStore::open(path),
            None => SqliteStore::open_default(),
        }
        .context("Failed to open translation cache")?;
        Ok(Some(Arc::new(store)))
    }

    /// Output path used when none is given
    pub fn output_path_for(&self, input_file: &Path) -> PathBuf {
        document::generate_output_path(input_file, &self.config.target_language)
    }

    /// Translate `input_file` with the configured service.
    /// Returns the written path, or `None` when an existing output was kept.
    pub async fn run(&self, input_file: PathBuf, output_file: Option<PathBuf>, force_overwrite: bool) -> Result<Option<PathBuf>> {
        let output_path = output_file.unwrap_or_else(|| self.output_path_for(&input_file));
        if output_path.exists() && !force_overwrite {
            warn!("Skipping file, translation already exists (use -f to force overwrite)");
            return Ok(None);
        }

        let service = self.build_service()?;
        self.check_connection(&service).await?;
        self.translate_file(&service, &input_file, &output_path).await.map(Some)
    }

    /// Fail early when the model endpoint cannot be reached
    pub async fn check_connection(&self, service: &TranslationService) -> Result<()> {
        debug!("Checking connection to {}", self.config.provider.endpoint);
        service
            .test_connection()
            .await
            .with_context(|| format!("Could not reach the model at {}", self.config.provider.endpoint))
    }

    /// Translate one document and write the result
    pub async fn translate_file(&self, service: &TranslationService, input_file: &Path, output_path: &Path) -> Result<PathBuf> {
        if !input_file.exists() {
            return Err(AppError::File(format!("Input file does not exist: {}", input_file.display())).into());
        }
        let start_time = Instant::now();

        let source = TextDocument::read(input_file)?;
        let fragments = source.fragments();
        info!(
            "Translating {} paragraphs from {} into {}",
            fragments.len(),
            input_file.display(),
            self.config.target_language
        );

        let progress_bar = Self::progress_bar();
        let result = service
            .translate_all(
                || fragments.clone(),
                |progress| progress_bar.set_position((progress * PROGRESS_STEPS as f64).round() as u64),
            )
            .await;

        let translated = match result {
            Ok(translated) => {
                progress_bar.finish_with_message("done");
                translated
            }
            Err(e) => {
                progress_bar.abandon_with_message("failed");
                error!("Translation of {} failed: {}", input_file.display(), e);
                return Err(e).context("Translation failed, no output written");
            }
        };

        let rendered = source.render(&translated, self.config.translation.write_mode);
        document::write_to_file(output_path, &rendered)?;

        info!(
            "Success: {} ({})",
            output_path.display(),
            Self::format_duration(start_time.elapsed())
        );
        debug!("{}", service.usage().summary());
        Ok(output_path.to_path_buf())
    }

    fn progress_bar() -> ProgressBar {
        let progress_bar = ProgressBar::new(PROGRESS_STEPS);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent}% {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {percent}% {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar
    }

    // Format duration in a human-readable format
    fn format_duration(duration: std::time::Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
