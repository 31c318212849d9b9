/*!
 * SQLite persistence behind the translation cache.
 *
 * Chunk translations are shared across runs and documents, keyed by the
 * chunk content hash.
 */

pub mod connection;
pub mod schema;

pub use connection::CacheDatabase;
