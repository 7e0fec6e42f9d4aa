/*!
 * Repository layer for the durable key-value store.
 *
 * Values are JSON documents stamped with a creation time and a time to
 * live. Every write purges expired rows and then evicts the oldest rows
 * until the store fits its item and size quotas again.
 */

use anyhow::{anyhow, Context, Result};
use log::{debug, warn};
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::connection::DatabaseConnection;
use super::models::{StoreLimits, StoreStats, StoredItem, KEY_PREFIX};

/// Repository for key-value operations
#[derive(Debug, Clone)]
pub struct Repository {
    /// Database connection
    db: DatabaseConnection,
    /// Quotas applied on write
    limits: StoreLimits,
}

impl Repository {
    /// Create a new repository with the given database connection
    pub fn new(db: DatabaseConnection, limits: StoreLimits) -> Self {
        Self { db, limits }
    }

    /// Create a repository with the default database location
    pub fn new_default(limits: StoreLimits) -> Result<Self> {
        let db = DatabaseConnection::new_default()?;
        Ok(Self::new(db, limits))
    }

    /// Create a repository with an in-memory database (for testing)
    pub fn new_in_memory() -> Result<Self> {
        let db = DatabaseConnection::new_in_memory()?;
        Ok(Self::new(db, StoreLimits::default()))
    }

    /// Quotas applied on write
    pub fn limits(&self) -> StoreLimits {
        self.limits
    }

    /// Store `value` under `key`, using the default TTL when `ttl_secs` is `None`
    pub fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl_secs: Option<u64>) -> Result<()> {
        self.set_json_at(key, value, ttl_secs, now())
    }

    /// Store `value` under `key` as if written at `created_at`
    pub fn set_json_at<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl_secs: Option<u64>,
        created_at: i64,
    ) -> Result<()> {
        let json = serde_json::to_string(value).context("Failed to serialize store value")?;
        let ttl = ttl_secs.unwrap_or(self.limits.default_ttl_secs);
        let limits = self.limits;

        self.db
            .execute(|conn| put(conn, key, &json, ttl, created_at, &limits))
    }

    /// Store `value` under `key` without blocking the async runtime
    pub async fn set_json_async<T: Serialize>(&self, key: &str, value: &T, ttl_secs: Option<u64>) -> Result<()> {
        let json = serde_json::to_string(value).context("Failed to serialize store value")?;
        let key = key.to_string();
        let ttl = ttl_secs.unwrap_or(self.limits.default_ttl_secs);
        let limits = self.limits;

        self.db
            .execute_async(move |conn| put(conn, &key, &json, ttl, now(), &limits))
            .await
    }

    /// Read the value under `key`
    ///
    /// Expired and undecodable rows are deleted and read as absent.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.get_json_at(key, now())
    }

    /// Read the value under `key` as of `at`
    pub fn get_json_at<T: DeserializeOwned>(&self, key: &str, at: i64) -> Result<Option<T>> {
        self.db.execute(|conn| read(conn, key, at))
    }

    /// Read the value under `key` without blocking the async runtime
    pub async fn get_json_async<T: DeserializeOwned + Send + 'static>(&self, key: &str) -> Result<Option<T>> {
        let key = key.to_string();
        self.db.execute_async(move |conn| read(conn, &key, now())).await
    }

    /// Delete the value under `key`
    pub fn remove(&self, key: &str) -> Result<bool> {
        self.db.execute(|conn| delete(conn, key))
    }

    /// Delete every key containing `pattern`, or every client-owned key when `pattern` is `None`
    pub fn clear(&self, pattern: Option<&str>) -> Result<usize> {
        self.db.execute(|conn| {
            let removed = match pattern {
                Some(pattern) => conn.execute("DELETE FROM kv_store WHERE instr(key, ?1) > 0", [pattern])?,
                None => conn.execute("DELETE FROM kv_store WHERE instr(key, ?1) = 1", [KEY_PREFIX])?,
            };
            debug!("Cleared {} store items", removed);
            Ok(removed)
        })
    }

    /// Item count and total size
    pub fn stats(&self) -> Result<StoreStats> {
        let limits = self.limits;
        self.db.execute(|conn| {
            let (items, size_bytes) = totals(conn)?;
            Ok(StoreStats {
                items,
                size_bytes,
                max_size_bytes: limits.max_size_bytes,
                max_items: limits.max_items,
            })
        })
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn read<T: DeserializeOwned>(conn: &Connection, key: &str, at: i64) -> Result<Option<T>> {
    let Some(item) = fetch(conn, key)? else {
        return Ok(None);
    };

    if item.is_expired(at) {
        debug!("Store item '{}' expired", key);
        delete(conn, key)?;
        return Ok(None);
    }

    match serde_json::from_str::<T>(&item.value) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!("Dropping corrupt store item '{}': {}", key, e);
            delete(conn, key)?;
            Ok(None)
        }
    }
}

fn put(conn: &Connection, key: &str, json: &str, ttl_secs: u64, created_at: i64, limits: &StoreLimits) -> Result<()> {
    let size = key.len() + json.len();
    if size > limits.max_size_bytes {
        return Err(anyhow!(
            "Store item '{}' is {} bytes, above the {} byte quota",
            key,
            size,
            limits.max_size_bytes
        ));
    }

    let tx = conn.unchecked_transaction()?;

    let purged = tx.execute(
        "DELETE FROM kv_store WHERE ?1 - created_at > ttl_secs",
        [created_at],
    )?;
    if purged > 0 {
        debug!("Purged {} expired store items", purged);
    }

    tx.execute(
        "INSERT OR REPLACE INTO kv_store (key, value, created_at, ttl_secs, size_bytes) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![key, json, created_at, ttl_secs as i64, size as i64],
    )?;

    evict(&tx, key, limits)?;
    tx.commit()?;
    Ok(())
}

/// Drop the oldest rows other than `keep` until both quotas hold
fn evict(conn: &Connection, keep: &str, limits: &StoreLimits) -> Result<usize> {
    let mut evicted = 0;

    loop {
        let (items, size) = totals(conn)?;
        if items as usize <= limits.max_items && size as usize <= limits.max_size_bytes {
            break;
        }

        let oldest: Option<String> = conn
            .query_row(
                "SELECT key FROM kv_store WHERE key != ?1 ORDER BY created_at ASC, rowid ASC LIMIT 1",
                [keep],
                |row| row.get(0),
            )
            .optional()?;

        match oldest {
            Some(victim) => {
                delete(conn, &victim)?;
                evicted += 1;
            }
            None => break,
        }
    }

    if evicted > 0 {
        debug!("Evicted {} store items to stay within quota", evicted);
    }
    Ok(evicted)
}

fn fetch(conn: &Connection, key: &str) -> Result<Option<StoredItem>> {
    let item = conn
        .query_row(
            "SELECT key, value, created_at, ttl_secs, size_bytes FROM kv_store WHERE key = ?1",
            [key],
            |row| {
                Ok(StoredItem {
                    key: row.get(0)?,
                    value: row.get(1)?,
                    created_at: row.get(2)?,
                    ttl_secs: row.get(3)?,
                    size_bytes: row.get(4)?,
                })
            },
        )
        .optional()?;
    Ok(item)
}

fn delete(conn: &Connection, key: &str) -> Result<bool> {
    Ok(conn.execute("DELETE FROM kv_store WHERE key = ?1", [key])? > 0)
}

fn totals(conn: &Connection) -> Result<(i64, i64)> {
    Ok(conn.query_row(
        "SELECT COUNT(*), COALESCE(SUM(size_bytes), 0) FROM kv_store",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?)
}
