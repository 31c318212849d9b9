/*!
 * Core translation service implementation.
 *
 * `TranslationService` runs the whole pipeline over a fragment source:
 * split into chunk ranges, match ranges with fragments, translate chunks
 * concurrently through the cache and the model, and emit the translated
 * texts back in document order.
 */

use std::sync::Arc;

use futures::stream::{Stream, TryStreamExt};
use log::info;

use crate::errors::TranslationError;
use crate::language_utils;
use crate::llm::{Llm, TokenUsageStats};

use super::cache::TranslationStore;
use super::chunk::{ChunkMatcher, ChunkRange};
use super::dispatcher::Dispatcher;
use super::emitter::reorder;
use super::fragment::Fragment;
use super::protocol::TranslationProtocol;
use super::segmentation::{GreedySegmenter, Segmenter};
use super::splitter::split_into_chunks;

/// Settings of one translation run
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationOptions {
    /// Target language code, mixed into every cache key
    pub target_language: String,
    /// Extra instructions sent along with every chunk
    pub user_prompt: Option<String>,
    /// Token budget of a chunk body plus its context
    pub max_chunk_tokens: usize,
    /// Share of the budget reserved for head and tail context
    pub gap_rate: f64,
    /// Chunks translated at the same time
    pub max_concurrent_requests: usize,
}

impl Default for TranslationOptions {
    fn default() -> Self {
        Self {
            target_language: "en".to_string(),
            user_prompt: None,
            max_chunk_tokens: 3000,
            gap_rate: 0.15,
            max_concurrent_requests: 1,
        }
    }
}

/// Translation service for chunked documents
pub struct TranslationService {
    llm: Arc<Llm>,
    segmenter: Arc<dyn Segmenter>,
    dispatcher: Dispatcher,
    options: TranslationOptions,
}

impl TranslationService {
    /// Create a service; without a store every chunk is sent to the model
    pub fn new(llm: Arc<Llm>, store: Option<Arc<dyn TranslationStore>>, options: TranslationOptions) -> Self {
        let language_name = language_utils::get_language_name(&options.target_language)
            .unwrap_or_else(|_| options.target_language.clone());
        let protocol = TranslationProtocol::new(&language_name, options.user_prompt.as_deref());

        Self {
            dispatcher: Dispatcher::new(Arc::clone(&llm), store, protocol),
            segmenter: Arc::new(GreedySegmenter),
            llm,
            options,
        }
    }

    /// Replace the segmentation strategy
    pub fn with_segmenter(mut self, segmenter: Arc<dyn Segmenter>) -> Self {
        self.segmenter = segmenter;
        self
    }

    /// Check that the model answers before any chunk is sent
    pub async fn test_connection(&self) -> Result<(), TranslationError> {
        self.llm.test_connection().await.map_err(TranslationError::from)
    }

    /// Tokens consumed by the model so far
    pub fn usage(&self) -> TokenUsageStats {
        self.llm.usage()
    }

    /// Chunk ranges covering the fragments
    pub fn plan<I>(&self, fragments: I) -> Result<Vec<ChunkRange>, TranslationError>
    where
        I: IntoIterator<Item = Fragment>,
    {
        split_into_chunks(
            self.llm.codec().as_ref(),
            self.segmenter.as_ref(),
            fragments,
            self.options.max_chunk_tokens,
            self.options.gap_rate,
        )
        .collect()
    }

    /// Translate the fragments produced by `source`, one text per fragment in
    /// document order.
    ///
    /// `source` is called twice and must yield the same fragments each time.
    /// Chunk planning happens up front; translation runs while the returned
    /// stream is polled. `on_progress` receives the translated share of the
    /// document after every chunk.
    pub fn translate<'a, F, I, P>(
        &'a self,
        source: F,
        on_progress: P,
    ) -> Result<impl Stream<Item = Result<String, TranslationError>> + 'a, TranslationError>
    where
        F: Fn() -> I,
        I: IntoIterator<Item = Fragment>,
        I::IntoIter: 'a,
        P: FnMut(f64) + 'a,
    {
        let ranges = self.plan(source())?;
        let total_tokens: usize = ranges.iter().map(|range| range.tokens_count).sum();
        info!(
            "Translating {} chunks ({} tokens) into {} with {} concurrent requests",
            ranges.len(),
            total_tokens,
            self.options.target_language,
            self.options.max_concurrent_requests
        );

        let chunks = ChunkMatcher::new(
            Arc::clone(self.llm.codec()),
            self.options.target_language.clone(),
            ranges,
            source(),
        );
        let completions = self.dispatcher.dispatch(chunks, self.options.max_concurrent_requests);
        Ok(reorder(completions, total_tokens, on_progress))
    }

    /// Translate everything and collect the texts; fails if any chunk fails
    pub async fn translate_all<'a, F, I, P>(&'a self, source: F, on_progress: P) -> Result<Vec<String>, TranslationError>
    where
        F: Fn() -> I,
        I: IntoIterator<Item = Fragment>,
        I::IntoIter: 'a,
        P: FnMut(f64) + 'a,
    {
        self.translate(source, on_progress)?.try_collect().await
    }
}
