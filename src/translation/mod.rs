/*!
 * Chunked translation pipeline.
 *
 * A document is a sequence of fragments. The pipeline splits it into
 * token-bounded chunks with surrounding context, translates chunks
 * concurrently and hands the translated texts back in document order:
 *
 * - `splitter` and `segmentation`: chunk ranges under a token budget
 * - `chunk`: joins ranges with fragment texts, crops context, hashes chunks
 * - `cache`: translations keyed by chunk hash
 * - `protocol`: the two-step text then XML request sent to the model
 * - `dispatcher`: bounded concurrent translation with fail-fast cancellation
 * - `emitter`: reorders completions and reports progress
 * - `core`: the service tying everything together
 */

pub use self::cache::{MemoryStore, SqliteStore, TranslationStore};
pub use self::chunk::{Chunk, ChunkMatcher, ChunkRange};
pub use self::core::{TranslationOptions, TranslationService};
pub use self::dispatcher::{Completion, Dispatcher};
pub use self::emitter::{reorder, OrderedEmitter};
pub use self::fragment::{Fragment, Incision};
pub use self::protocol::TranslationProtocol;
pub use self::segmentation::{GreedySegmenter, Segmenter};
pub use self::splitter::split_into_chunks;
pub use self::tokens::{TokenCodec, WordPieceCodec};

pub mod cache;
pub mod chunk;
pub mod core;
pub mod dispatcher;
pub mod emitter;
pub mod fragment;
pub mod protocol;
pub mod segmentation;
pub mod splitter;
pub mod text;
pub mod tokens;
