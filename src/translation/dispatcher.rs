/*!
 * Concurrent translation of chunks.
 *
 * Chunks are pulled lazily from their iterator and translated with at most
 * `workers` requests in flight. Results come back in completion order.
 *
 * The first failure stops the run: no further chunk is pulled or started,
 * requests already running are awaited and their results dropped, and the
 * error is yielded once all of them have settled.
 */

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future;
use futures::stream::{self, Stream, StreamExt};
use log::{debug, error, warn};

use crate::errors::TranslationError;
use crate::llm::Llm;

use super::cache::TranslationStore;
use super::chunk::Chunk;
use super::protocol::TranslationProtocol;
use super::text::clean_spaces;

/// A translated chunk with the translations of its body texts
pub type Completion = Result<(Chunk, Vec<String>), TranslationError>;

/// Translates chunks through the cache and the model
pub struct Dispatcher {
    llm: Arc<Llm>,
    store: Option<Arc<dyn TranslationStore>>,
    protocol: TranslationProtocol,
}

impl Dispatcher {
    /// Create a dispatcher; without a store every chunk goes to the model
    pub fn new(llm: Arc<Llm>, store: Option<Arc<dyn TranslationStore>>, protocol: TranslationProtocol) -> Self {
        Self { llm, store, protocol }
    }

    /// Translate one chunk and return the translations of its body texts
    pub async fn translate_chunk(&self, chunk: &Chunk) -> Result<Vec<String>, TranslationError> {
        let source_texts = chunk.source_texts();

        let translated = match self.cached(chunk, source_texts.len()).await {
            Some(texts) => texts,
            None => {
                debug!(
                    "Translating chunk {} ({} texts, {} body tokens)",
                    chunk.index,
                    source_texts.len(),
                    chunk.tokens_count
                );
                let texts: Vec<String> = self
                    .protocol
                    .translate_texts(&self.llm, &source_texts, chunk.tokens_count)
                    .await?
                    .iter()
                    .map(|text| clean_spaces(text))
                    .collect();
                self.store_translation(chunk, &texts).await;
                texts
            }
        };

        let body_start = chunk.head.len();
        let body_end = body_start + chunk.body.len();
        Ok(translated[body_start..body_end].to_vec())
    }

    async fn cached(&self, chunk: &Chunk, expected_len: usize) -> Option<Vec<String>> {
        let store = self.store.as_ref()?;
        match store.get_async(&chunk.hash).await {
            Ok(Some(texts)) if texts.len() == expected_len => Some(texts),
            Ok(Some(texts)) => {
                warn!(
                    "Cached translation of chunk {} has {} texts, expected {}; translating again",
                    chunk.index,
                    texts.len(),
                    expected_len
                );
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Cache lookup failed for chunk {}: {:#}", chunk.index, e);
                None
            }
        }
    }

    async fn store_translation(&self, chunk: &Chunk, texts: &[String]) {
        if let Some(store) = &self.store {
            if let Err(e) = store.put_async(&chunk.hash, texts).await {
                warn!("Failed to cache translation of chunk {}: {:#}", chunk.index, e);
            }
        }
    }

    /// Translate `chunks` with at most `workers` chunks in flight
    pub fn dispatch<'a, I>(&'a self, chunks: I, workers: usize) -> impl Stream<Item = Completion> + 'a
    where
        I: IntoIterator<Item = Chunk>,
        I::IntoIter: 'a,
    {
        let cancelled = Arc::new(AtomicBool::new(false));
        let gate = Arc::clone(&cancelled);

        let completions = stream::iter(chunks)
            .take_while(move |_| future::ready(!gate.load(Ordering::SeqCst)))
            .map(move |chunk| {
                let cancelled = Arc::clone(&cancelled);
                async move {
                    if cancelled.load(Ordering::SeqCst) {
                        debug!("Skipping chunk {} after an earlier failure", chunk.index);
                        return None;
                    }
                    let result = self.translate_chunk(&chunk).await;
                    if result.is_err() {
                        cancelled.store(true, Ordering::SeqCst);
                    }
                    Some(result.map(|texts| (chunk, texts)))
                }
            })
            .buffer_unordered(workers.max(1));

        settle(completions)
    }
}

/// Pass completions through until the first error, then drain the rest and
/// yield that error last
fn settle<S>(completions: S) -> impl Stream<Item = Completion>
where
    S: Stream<Item = Option<Completion>>,
{
    let state = (Box::pin(completions), None::<TranslationError>, false);

    stream::unfold(state, |(mut inner, mut failure, finished)| async move {
        if finished {
            return None;
        }
        loop {
            match inner.next().await {
                Some(Some(Ok(completion))) => {
                    if failure.is_none() {
                        return Some((Ok(completion), (inner, failure, false)));
                    }
                    debug!("Discarding chunk {} translated after a failure", completion.0.index);
                }
                Some(Some(Err(e))) => match failure {
                    None => {
                        error!("Chunk translation failed, cancelling remaining chunks: {}", e);
                        failure = Some(e);
                    }
                    Some(_) => warn!("Another in-flight chunk failed: {}", e),
                },
                Some(None) => {}
                None => return failure.map(|e| (Err(e), (inner, None, true))),
            }
        }
    })
}
