/*!
 * Store schema.
 *
 * The durable store is a single key-value table whose values are JSON
 * documents stamped with their creation time and time to live. The
 * `schema_version` table guards against opening a file written by a newer
 * client.
 */

use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use rusqlite::{Connection, OptionalExtension};

/// Version written by this client
pub const SCHEMA_VERSION: i32 = 1;

const CREATE_TABLES: &str = r#"
    CREATE TABLE IF NOT EXISTS schema_version (
        id INTEGER PRIMARY KEY CHECK (id = 1),
        version INTEGER NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS kv_store (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        ttl_secs INTEGER NOT NULL,
        size_bytes INTEGER NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_kv_store_created ON kv_store(created_at);
"#;

/// Create the tables of a fresh store, or check the version of an existing one
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    match stored_version(conn)? {
        None => {
            // WAL keeps readers from blocking the flush writer
            conn.execute_batch("PRAGMA journal_mode=WAL;")?;
            conn.execute_batch(CREATE_TABLES)
                .context("Failed to create translation cache tables")?;
            conn.execute(
                "INSERT OR REPLACE INTO schema_version (id, version, updated_at) VALUES (1, ?1, datetime('now'))",
                [SCHEMA_VERSION],
            )?;
            info!("Created translation cache schema v{}", SCHEMA_VERSION);
        }
        Some(version) if version > SCHEMA_VERSION => {
            return Err(anyhow!(
                "Translation cache schema v{} is newer than the supported v{}",
                version,
                SCHEMA_VERSION
            ));
        }
        Some(version) => debug!("Translation cache schema v{}", version),
    }

    Ok(())
}

/// Version recorded in the store, `None` for a fresh database
fn stored_version(conn: &Connection) -> Result<Option<i32>> {
    let has_table: bool = conn
        .query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='schema_version'",
            [],
            |row| row.get(0),
        )
        .context("Failed to inspect translation cache schema")?;

    if !has_table {
        return Ok(None);
    }

    let version = conn
        .query_row("SELECT version FROM schema_version WHERE id = 1", [], |row| row.get(0))
        .optional()?;
    Ok(version)
}
