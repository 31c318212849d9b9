/*!
 * Chunk ranges and the matcher that turns them into translation units.
 *
 * `ChunkMatcher` walks the fragment stream once, collecting the texts of
 * every range that covers the current position. When the stream moves past
 * a range, its texts are split into head/body/tail, hashed, and the context
 * parts are cropped to their token budgets.
 */

use std::collections::VecDeque;
use std::iter::Enumerate;
use std::sync::Arc;

use sha2::{Digest, Sha512};

use super::fragment::Fragment;
use super::tokens::TokenCodec;

/// Fragment index bounds of one chunk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkRange {
    /// Position of the chunk in the document
    pub index: usize,
    /// First fragment of the head context
    pub head_index: usize,
    /// First fragment of the body
    pub body_index: usize,
    /// First fragment of the tail context
    pub tail_index: usize,
    /// Fragments covered by head, body and tail
    pub fragments_count: usize,
    /// Token budget of the head context
    pub head_remain_tokens: usize,
    /// Token budget of the tail context
    pub tail_remain_tokens: usize,
    /// Tokens of the body
    pub tokens_count: usize,
}

impl ChunkRange {
    /// Whether the fragment at `position` belongs to this range
    pub fn matches(&self, position: usize) -> bool {
        self.head_index <= position && position < self.head_index + self.fragments_count
    }
}

/// A unit of translation work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub index: usize,
    /// SHA-512 over the target language and every head/body/tail text
    pub hash: Vec<u8>,
    pub head: Vec<String>,
    pub body: Vec<String>,
    pub tail: Vec<String>,
    /// Tokens of the body
    pub tokens_count: usize,
}

impl Chunk {
    /// Head, body and tail texts in document order
    pub fn source_texts(&self) -> Vec<String> {
        self.head
            .iter()
            .chain(&self.body)
            .chain(&self.tail)
            .cloned()
            .collect()
    }

    /// Hex form of the hash, for logging
    pub fn hash_hex(&self) -> String {
        hex::encode(&self.hash)
    }
}

/// Which end of a context list survives cropping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropSide {
    /// Head context: keep the end, drop the beginning
    Head,
    /// Tail context: keep the beginning, drop the end
    Tail,
}

/// Pairs chunk ranges with a fragment stream, yielding chunks in range order
pub struct ChunkMatcher<R, F>
where
    R: Iterator<Item = ChunkRange>,
    F: Iterator<Item = Fragment>,
{
    codec: Arc<dyn TokenCodec>,
    language: String,
    ranges: R,
    fragments: Enumerate<F>,
    next_range: Option<ChunkRange>,
    in_flight: VecDeque<(ChunkRange, Vec<String>)>,
    finished: VecDeque<(ChunkRange, Vec<String>)>,
    exhausted: bool,
}

impl<R, F> ChunkMatcher<R, F>
where
    R: Iterator<Item = ChunkRange>,
    F: Iterator<Item = Fragment>,
{
    /// Create a matcher; `language` is the target language code mixed into hashes
    pub fn new<IR, IF>(codec: Arc<dyn TokenCodec>, language: impl Into<String>, ranges: IR, fragments: IF) -> Self
    where
        IR: IntoIterator<IntoIter = R>,
        IF: IntoIterator<IntoIter = F>,
    {
        Self {
            codec,
            language: language.into(),
            ranges: ranges.into_iter(),
            fragments: fragments.into_iter().enumerate(),
            next_range: None,
            in_flight: VecDeque::new(),
            finished: VecDeque::new(),
            exhausted: false,
        }
    }

    fn feed(&mut self, position: usize, fragment: Fragment) {
        loop {
            if self.next_range.is_none() {
                self.next_range = self.ranges.next();
            }
            match self.next_range.take() {
                Some(range) if range.matches(position) => self.in_flight.push_back((range, Vec::new())),
                pending => {
                    self.next_range = pending;
                    break;
                }
            }
        }

        let mut still_open = VecDeque::with_capacity(self.in_flight.len());
        for (range, mut texts) in self.in_flight.drain(..) {
            if range.matches(position) {
                texts.push(fragment.text.clone());
                still_open.push_back((range, texts));
            } else {
                self.finished.push_back((range, texts));
            }
        }
        self.in_flight = still_open;
    }

    fn build(&self, range: ChunkRange, mut texts: Vec<String>) -> Chunk {
        let head_length = range.body_index - range.head_index;
        let body_length = range.tail_index - range.body_index;

        let tail = texts.split_off((head_length + body_length).min(texts.len()));
        let body = texts.split_off(head_length.min(texts.len()));
        let head = texts;

        let hash = hash_texts(&self.language, [&head, &body, &tail]);
        let head = crop_texts(self.codec.as_ref(), &head, CropSide::Head, range.head_remain_tokens);
        let tail = crop_texts(self.codec.as_ref(), &tail, CropSide::Tail, range.tail_remain_tokens);

        Chunk {
            index: range.index,
            hash,
            head,
            body,
            tail,
            tokens_count: range.tokens_count,
        }
    }
}

impl<R, F> Iterator for ChunkMatcher<R, F>
where
    R: Iterator<Item = ChunkRange>,
    F: Iterator<Item = Fragment>,
{
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        loop {
            if let Some((range, texts)) = self.finished.pop_front() {
                return Some(self.build(range, texts));
            }
            if self.exhausted {
                return None;
            }
            match self.fragments.next() {
                Some((position, fragment)) => self.feed(position, fragment),
                None => {
                    self.exhausted = true;
                    let open: Vec<_> = self.in_flight.drain(..).collect();
                    self.finished.extend(open);
                }
            }
        }
    }
}

/// Digest over the language code and every text, each preceded by a null byte
pub fn hash_texts<'a>(language: &str, parts: impl IntoIterator<Item = &'a Vec<String>>) -> Vec<u8> {
    let mut hasher = Sha512::new();
    hasher.update(language.as_bytes());
    for texts in parts {
        for text in texts {
            hasher.update([0u8]);
            hasher.update(text.as_bytes());
        }
    }
    hasher.finalize().to_vec()
}

/// Keep at most `budget` tokens of `texts`, slicing the boundary text at token level
pub fn crop_texts(codec: &dyn TokenCodec, texts: &[String], side: CropSide, budget: usize) -> Vec<String> {
    let mut remain = budget;
    let mut kept = Vec::new();

    let order: Box<dyn Iterator<Item = &String>> = match side {
        CropSide::Head => Box::new(texts.iter().rev()),
        CropSide::Tail => Box::new(texts.iter()),
    };

    for text in order {
        if remain == 0 {
            break;
        }
        let tokens = codec.encode(text);
        if tokens.len() <= remain {
            remain -= tokens.len();
            kept.push(text.clone());
        } else {
            let partial = match side {
                CropSide::Head => &tokens[tokens.len() - remain..],
                CropSide::Tail => &tokens[..remain],
            };
            kept.push(codec.decode(partial));
            break;
        }
    }

    if side == CropSide::Head {
        kept.reverse();
    }
    kept
}
