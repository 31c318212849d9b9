/*!
 * Token codec used for chunk budgets and context cropping.
 *
 * The pipeline never needs the exact tokenizer of the remote model: token
 * counts only size chunks and crop context. Any codec whose decode is the
 * inverse of encode on slices works.
 */

use std::collections::HashMap;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;

/// Converts text to and from token ids
pub trait TokenCodec: Send + Sync {
    /// Encode text into token ids
    fn encode(&self, text: &str) -> Vec<u32>;

    /// Decode a (possibly partial) token sequence back into text
    fn decode(&self, tokens: &[u32]) -> String;

    /// Count the tokens of a text
    fn count(&self, text: &str) -> usize {
        self.encode(text).len()
    }
}

// Leading whitespace, a single CJK character, a word, or a single symbol.
// Each piece swallows the whitespace that follows it, so pieces tile the text.
static PIECE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s+|[\p{Han}\p{Hiragana}\p{Katakana}\p{Hangul}]\s*|[\p{L}\p{N}\p{M}]+\s*|[^\s\p{L}\p{N}\p{M}]\s*",
    )
    .expect("valid piece pattern")
});

#[derive(Debug, Default)]
struct Vocabulary {
    ids: HashMap<String, u32>,
    pieces: Vec<String>,
}

/// Lossless word-level codec with a vocabulary that grows on demand
#[derive(Debug, Default)]
pub struct WordPieceCodec {
    vocabulary: RwLock<Vocabulary>,
}

impl WordPieceCodec {
    /// Create a codec with an empty vocabulary
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct pieces seen so far
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.read().pieces.len()
    }

    fn intern(&self, piece: &str) -> u32 {
        if let Some(id) = self.vocabulary.read().ids.get(piece) {
            return *id;
        }
        let mut vocabulary = self.vocabulary.write();
        if let Some(id) = vocabulary.ids.get(piece) {
            return *id;
        }
        let id = vocabulary.pieces.len() as u32;
        vocabulary.pieces.push(piece.to_string());
        vocabulary.ids.insert(piece.to_string(), id);
        id
    }
}

impl TokenCodec for WordPieceCodec {
    fn encode(&self, text: &str) -> Vec<u32> {
        PIECE_PATTERN
            .find_iter(text)
            .map(|piece| self.intern(piece.as_str()))
            .collect()
    }

    fn decode(&self, tokens: &[u32]) -> String {
        let vocabulary = self.vocabulary.read();
        tokens
            .iter()
            .filter_map(|id| vocabulary.pieces.get(*id as usize))
            .map(String::as_str)
            .collect()
    }

    fn count(&self, text: &str) -> usize {
        PIECE_PATTERN.find_iter(text).count()
    }
}
