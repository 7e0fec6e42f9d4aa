/*!
 * Database entity models.
 *
 * These structures map directly onto the `kv_store` table.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix shared by every key the client owns
pub const KEY_PREFIX: &str = "langie_";

/// Persisted interface language
pub const INTERFACE_LANGUAGE_KEY: &str = "interface_language";

/// Persisted language list
pub const LANGUAGES_KEY: &str = "langie_languages";

/// Key of the persisted general-context translations for `language`
pub fn translations_key(language: &str) -> String {
    format!("{}translations_{}", KEY_PREFIX, language)
}

/// Key of the persisted UI-context translations for `language`
pub fn ui_translations_key(language: &str) -> String {
    format!("{}ui_translations_{}", KEY_PREFIX, language)
}

/// A row of the key-value store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredItem {
    /// Item key
    pub key: String,
    /// JSON document
    pub value: String,
    /// Unix timestamp (seconds) of the last write
    pub created_at: i64,
    /// Time to live in seconds
    pub ttl_secs: i64,
    /// Serialized size used for quota accounting
    pub size_bytes: i64,
}

impl StoredItem {
    /// Whether the item outlived its TTL at `now`
    pub fn is_expired(&self, now: i64) -> bool {
        now - self.created_at > self.ttl_secs
    }
}

/// Limits applied on every write
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoreLimits {
    /// TTL used when a write does not pass one
    pub default_ttl_secs: u64,
    /// Maximum number of rows
    pub max_items: usize,
    /// Maximum total serialized size
    pub max_size_bytes: usize,
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self {
            default_ttl_secs: 7 * 24 * 60 * 60,
            max_items: 1000,
            max_size_bytes: 2 * 1024 * 1024,
        }
    }
}

/// Store statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreStats {
    /// Number of rows
    pub items: i64,
    /// Total serialized size
    pub size_bytes: i64,
    /// Configured maximum size
    pub max_size_bytes: usize,
    /// Configured maximum rows
    pub max_items: usize,
}

impl fmt::Display for StoreStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Items: {}/{}, Size: {}/{} KB",
            self.items,
            self.max_items,
            self.size_bytes / 1024,
            self.max_size_bytes / 1024
        )
    }
}
