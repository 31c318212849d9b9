/*!
 * Restores document order over chunks that complete in any order.
 */

use std::collections::BTreeMap;

use futures::stream::{self, Stream, StreamExt};

use crate::errors::TranslationError;

use super::dispatcher::Completion;

/// Buffers completed chunks until every earlier chunk has arrived
#[derive(Debug, Default)]
pub struct OrderedEmitter {
    /// Completed chunks waiting for a predecessor
    buffer: BTreeMap<usize, Vec<String>>,
    /// Index of the next chunk to release
    next_index: usize,
    translated_tokens: usize,
    total_tokens: usize,
}

impl OrderedEmitter {
    /// Create an emitter for a run whose chunk bodies weigh `total_tokens`
    pub fn new(total_tokens: usize) -> Self {
        Self {
            total_tokens,
            ..Default::default()
        }
    }

    /// Record a completed chunk and return the texts that are now in order
    pub fn accept(&mut self, chunk_index: usize, tokens: usize, texts: Vec<String>) -> Vec<String> {
        self.buffer.insert(chunk_index, texts);
        self.translated_tokens += tokens;

        let mut released = Vec::new();
        while let Some(texts) = self.buffer.remove(&self.next_index) {
            released.extend(texts);
            self.next_index += 1;
        }
        released
    }

    /// Share of body tokens translated so far, in `[0.0, 1.0]`
    pub fn progress(&self) -> f64 {
        if self.total_tokens == 0 {
            return 1.0;
        }
        (self.translated_tokens as f64 / self.total_tokens as f64).min(1.0)
    }

    /// Index of the next chunk to release
    pub fn next_index(&self) -> usize {
        self.next_index
    }

    /// Number of chunks waiting for a predecessor
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

/// Turn completions in any order into translated texts in document order.
/// `on_progress` runs after every completion; an error ends the stream.
pub fn reorder<S, P>(completions: S, total_tokens: usize, on_progress: P) -> impl Stream<Item = Result<String, TranslationError>>
where
    S: Stream<Item = Completion>,
    P: FnMut(f64),
{
    let state = (Box::pin(completions), OrderedEmitter::new(total_tokens), on_progress, false);

    stream::unfold(state, |(mut completions, mut emitter, mut on_progress, failed)| async move {
        if failed {
            return None;
        }
        let (items, failed) = match completions.next().await? {
            Ok((chunk, texts)) => {
                let released = emitter.accept(chunk.index, chunk.tokens_count, texts);
                on_progress(emitter.progress());
                (released.into_iter().map(Ok).collect::<Vec<_>>(), false)
            }
            Err(e) => (vec![Err(e)], true),
        };
        Some((stream::iter(items), (completions, emitter, on_progress, failed)))
    })
    .flatten()
}
