/*!
 * Cache schema and its migrations.
 *
 * The schema version lives in SQLite's `user_version` pragma. Migration `n`
 * brings a database from version `n` to `n + 1`.
 */

use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use rusqlite::Connection;

/// Migrations in order; the schema version is their count
const MIGRATIONS: &[&str] = &[r#"
    CREATE TABLE IF NOT EXISTS translations (
        hash BLOB PRIMARY KEY,
        texts TEXT NOT NULL,
        created_at TEXT NOT NULL
    );
"#];

/// Current schema version
pub const SCHEMA_VERSION: usize = MIGRATIONS.len();

/// Bring the schema of `conn` up to date
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    let version = schema_version(conn)?;
    if version > SCHEMA_VERSION {
        return Err(anyhow!(
            "Cache schema v{} is newer than supported v{}",
            version,
            SCHEMA_VERSION
        ));
    }
    if version == SCHEMA_VERSION {
        debug!("Cache schema is up to date (v{})", version);
        return Ok(());
    }

    // WAL lets readers proceed while a worker writes
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    for (index, migration) in MIGRATIONS.iter().enumerate().skip(version) {
        info!("Migrating cache schema to v{}", index + 1);
        conn.execute_batch(migration)
            .with_context(|| format!("Cache migration to v{} failed", index + 1))?;
        conn.pragma_update(None, "user_version", (index + 1) as i64)?;
    }
    Ok(())
}

fn schema_version(conn: &Connection) -> Result<usize> {
    let version: i64 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("Failed to read cache schema version")?;
    Ok(usize::try_from(version).unwrap_or_default())
}
