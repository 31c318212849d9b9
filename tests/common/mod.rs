/*!
 * Common test utilities for the chunkwise test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use chunkwise::llm::{Llm, RetryPolicy};
use chunkwise::providers::Provider;
use chunkwise::translation::{Fragment, TranslationOptions, TranslationService, TranslationStore, WordPieceCodec};

// Re-export the mock providers module
pub mod mock_providers;

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Owned strings from literals
pub fn texts(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// One fragment per text, no incision hints
pub fn fragments(items: &[&str]) -> Vec<Fragment> {
    items.iter().map(|text| Fragment::new(*text)).collect()
}

/// Retries without pauses
pub fn quick_retry() -> RetryPolicy {
    RetryPolicy {
        retry_times: 2,
        retry_interval: Duration::ZERO,
    }
}

/// Llm over `provider` with the word-piece codec
pub fn llm_for<P: Provider + 'static>(provider: P) -> Llm {
    Llm::new(Arc::new(provider), Arc::new(WordPieceCodec::new())).with_retry(quick_retry())
}

/// Translation service over `provider`
pub fn service_for<P: Provider + 'static>(
    provider: P,
    store: Option<Arc<dyn TranslationStore>>,
    options: TranslationOptions,
) -> TranslationService {
    TranslationService::new(Arc::new(llm_for(provider)), store, options)
}

/// French run where every three-token fragment gets a chunk of its own
pub fn one_fragment_per_chunk(concurrency: usize) -> TranslationOptions {
    TranslationOptions {
        target_language: "fr".to_string(),
        max_chunk_tokens: 3,
        gap_rate: 0.0,
        max_concurrent_requests: concurrency,
        ..Default::default()
    }
}
