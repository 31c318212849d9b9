/*!
 * Translation caching functionality.
 *
 * Chunk translations are stored under the chunk's content hash. Entries are
 * never evicted: the same language and text window always maps to the same
 * translation, so concurrent writers of one hash store equal content.
 */

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use parking_lot::RwLock;

use crate::database::CacheDatabase;

/// Content-addressed store of chunk translations
#[async_trait]
pub trait TranslationStore: Send + Sync {
    /// Look up the translated texts stored for a hash
    fn get(&self, hash: &[u8]) -> Result<Option<Vec<String>>>;

    /// Store translated texts for a hash, replacing any previous entry
    fn put(&self, hash: &[u8], texts: &[String]) -> Result<()>;

    /// [`get`](Self::get) for async callers. Stores doing blocking I/O
    /// override this to move the work off the runtime.
    async fn get_async(&self, hash: &[u8]) -> Result<Option<Vec<String>>> {
        self.get(hash)
    }

    /// [`put`](Self::put) for async callers
    async fn put_async(&self, hash: &[u8], texts: &[String]) -> Result<()> {
        self.put(hash, texts)
    }
}

/// In-memory translation store
pub struct MemoryStore {
    /// Internal cache storage
    entries: Arc<RwLock<HashMap<Vec<u8>, Vec<String>>>>,

    /// Cache hit counter
    hits: Arc<RwLock<usize>>,

    /// Cache miss counter
    misses: Arc<RwLock<usize>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            hits: Arc::new(RwLock::new(0)),
            misses: Arc::new(RwLock::new(0)),
        }
    }

    /// Get cache statistics as (hits, misses, hit rate)
    pub fn stats(&self) -> (usize, usize, f64) {
        let hits = *self.hits.read();
        let misses = *self.misses.read();
        let total = hits + misses;

        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        (hits, misses, hit_rate)
    }

    /// Get the number of entries in the cache
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MemoryStore {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            hits: self.hits.clone(),
            misses: self.misses.clone(),
        }
    }
}

#[async_trait]
impl TranslationStore for MemoryStore {
    fn get(&self, hash: &[u8]) -> Result<Option<Vec<String>>> {
        let entries = self.entries.read();
        match entries.get(hash) {
            Some(texts) => {
                *self.hits.write() += 1;
                debug!("Cache hit for chunk {}", short_hex(hash));
                Ok(Some(texts.clone()))
            }
            None => {
                *self.misses.write() += 1;
                debug!("Cache miss for chunk {}", short_hex(hash));
                Ok(None)
            }
        }
    }

    fn put(&self, hash: &[u8], texts: &[String]) -> Result<()> {
        self.entries.write().insert(hash.to_vec(), texts.to_vec());
        debug!("Cached {} texts for chunk {}", texts.len(), short_hex(hash));
        Ok(())
    }
}

/// SQLite-backed translation store that survives restarts
#[derive(Clone)]
pub struct SqliteStore {
    database: CacheDatabase,
}

impl SqliteStore {
    /// Open (or create) a cache database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            database: CacheDatabase::open(path)?,
        })
    }

    /// Open the cache database in the user's cache directory
    pub fn open_default() -> Result<Self> {
        Ok(Self {
            database: CacheDatabase::open_default()?,
        })
    }

    /// Create a throwaway in-memory store
    pub fn in_memory() -> Result<Self> {
        Ok(Self {
            database: CacheDatabase::in_memory()?,
        })
    }

    /// Number of stored chunk translations
    pub fn len(&self) -> Result<usize> {
        self.database.entry_count()
    }
}

#[async_trait]
impl TranslationStore for SqliteStore {
    fn get(&self, hash: &[u8]) -> Result<Option<Vec<String>>> {
        decode_entry(hash, self.database.lookup(hash)?)
    }

    fn put(&self, hash: &[u8], texts: &[String]) -> Result<()> {
        self.database.store(hash, &serde_json::to_string(texts)?)?;
        debug!("Cached {} texts for chunk {}", texts.len(), short_hex(hash));
        Ok(())
    }

    async fn get_async(&self, hash: &[u8]) -> Result<Option<Vec<String>>> {
        decode_entry(hash, self.database.lookup_async(hash.to_vec()).await?)
    }

    async fn put_async(&self, hash: &[u8], texts: &[String]) -> Result<()> {
        let payload = serde_json::to_string(texts)?;
        self.database.store_async(hash.to_vec(), payload).await?;
        debug!("Cached {} texts for chunk {}", texts.len(), short_hex(hash));
        Ok(())
    }
}

fn decode_entry(hash: &[u8], payload: Option<String>) -> Result<Option<Vec<String>>> {
    match payload {
        Some(json) => {
            let texts = serde_json::from_str(&json)
                .with_context(|| format!("Corrupted cache entry for chunk {}", short_hex(hash)))?;
            debug!("Cache hit for chunk {}", short_hex(hash));
            Ok(Some(texts))
        }
        None => {
            debug!("Cache miss for chunk {}", short_hex(hash));
            Ok(None)
        }
    }
}

/// First bytes of a hash in hex, enough to tell entries apart in logs
fn short_hex(hash: &[u8]) -> String {
    hex::encode(&hash[..hash.len().min(8)])
}
