/*!
 * SQLite handle of the translation cache.
 *
 * One connection per opened file, shared by every worker behind a mutex.
 * Rows map a chunk hash to the JSON-encoded translations of that chunk.
 */

use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::schema;

/// Cache file name inside the cache directory
const DEFAULT_DB_FILENAME: &str = "translations.db";

/// Application directory under the user's cache directory
const DEFAULT_DB_DIRNAME: &str = "chunkwise";

/// How long a writer waits for another process holding the file
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared connection to a cache database
#[derive(Clone)]
pub struct CacheDatabase {
    path: PathBuf,
    connection: Arc<Mutex<Connection>>,
}

impl CacheDatabase {
    /// Open the cache in the user's cache directory
    pub fn open_default() -> Result<Self> {
        Self::open(Self::default_path()?)
    }

    /// Open (or create) the cache file at `path`, creating parent directories
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create cache directory: {}", parent.display()))?;
        }

        info!("Opening translation cache at {}", path.display());
        let connection = Connection::open(&path)
            .with_context(|| format!("Failed to open cache database: {}", path.display()))?;
        connection.busy_timeout(BUSY_TIMEOUT)?;
        Self::from_connection(path, connection)
    }

    /// Throwaway cache living in memory
    pub fn in_memory() -> Result<Self> {
        debug!("Creating in-memory cache database");
        let connection = Connection::open_in_memory().context("Failed to create in-memory database")?;
        Self::from_connection(PathBuf::from(":memory:"), connection)
    }

    fn from_connection(path: PathBuf, connection: Connection) -> Result<Self> {
        schema::initialize_schema(&connection)?;
        Ok(Self {
            path,
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// `<user cache dir>/chunkwise/translations.db`
    pub fn default_path() -> Result<PathBuf> {
        let base_dir = dirs::cache_dir()
            .or_else(dirs::data_local_dir)
            .or_else(|| dirs::home_dir().map(|home| home.join(".cache")))
            .ok_or_else(|| anyhow!("Could not determine cache directory"))?;
        Ok(base_dir.join(DEFAULT_DB_DIRNAME).join(DEFAULT_DB_FILENAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored payload for `hash`
    pub fn lookup(&self, hash: &[u8]) -> Result<Option<String>> {
        select_payload(&self.connection.lock(), hash)
    }

    /// Store `payload` under `hash`, replacing any previous row
    pub fn store(&self, hash: &[u8], payload: &str) -> Result<()> {
        upsert_payload(&self.connection.lock(), hash, payload)
    }

    /// Run `f` against the connection on the blocking thread pool, keeping
    /// lock waits and disk I/O off the async workers
    pub async fn execute_async<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let connection = Arc::clone(&self.connection);
        tokio::task::spawn_blocking(move || f(&*connection.lock()))
            .await
            .context("Cache database task panicked")?
    }

    /// [`lookup`](Self::lookup) for async callers
    pub async fn lookup_async(&self, hash: Vec<u8>) -> Result<Option<String>> {
        self.execute_async(move |connection| select_payload(connection, &hash)).await
    }

    /// [`store`](Self::store) for async callers
    pub async fn store_async(&self, hash: Vec<u8>, payload: String) -> Result<()> {
        self.execute_async(move |connection| upsert_payload(connection, &hash, &payload)).await
    }

    /// Number of cached chunks
    pub fn entry_count(&self) -> Result<usize> {
        let connection = self.connection.lock();
        let count: i64 = connection.query_row("SELECT COUNT(*) FROM translations", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

fn select_payload(connection: &Connection, hash: &[u8]) -> Result<Option<String>> {
    connection
        .query_row("SELECT texts FROM translations WHERE hash = ?1", params![hash], |row| row.get(0))
        .optional()
        .context("Failed to read cache entry")
}

fn upsert_payload(connection: &Connection, hash: &[u8], payload: &str) -> Result<()> {
    connection
        .execute(
            "INSERT OR REPLACE INTO translations (hash, texts, created_at) VALUES (?1, ?2, datetime('now'))",
            params![hash, payload],
        )
        .context("Failed to store cache entry")?;
    Ok(())
}
