/*!
 * Translation caching functionality.
 *
 * This module holds translated strings per target language, split into an
 * interface (`ui` context) store and a general store, together with the
 * records of translations the service refused. Newly cached entries are
 * announced on a broadcast channel so views can re-render.
 */

use log::debug;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

use super::queue::truncate_text;
use super::request::{CacheKey, LanguagePair};
use crate::providers::UI_CONTEXT;

/// Capacity of the change notification channel
const UPDATE_CHANNEL_CAPACITY: usize = 256;

/// Change notification
#[derive(Debug, Clone, PartialEq)]
pub enum CacheUpdate {
    /// A translation became available
    Entry {
        language: String,
        context: String,
        cache_key: CacheKey,
        text: String,
        translated: String,
    },
    /// Every entry was dropped, `language` is the newly selected language if any
    Cleared { language: Option<String> },
}

/// Cached translations of one target language
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LanguageEntries {
    /// `ui` context translations
    pub ui: HashMap<CacheKey, String>,
    /// Translations of every other context
    pub general: HashMap<CacheKey, String>,
}

impl LanguageEntries {
    fn store_for(&self, context: &str) -> &HashMap<CacheKey, String> {
        if context == UI_CONTEXT { &self.ui } else { &self.general }
    }

    fn store_for_mut(&mut self, context: &str) -> &mut HashMap<CacheKey, String> {
        if context == UI_CONTEXT { &mut self.ui } else { &mut self.general }
    }

    pub fn len(&self) -> usize {
        self.ui.len() + self.general.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ui.is_empty() && self.general.is_empty()
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub hit_rate: f64,
    pub entries: usize,
}

/// Translation cache for storing and retrieving translations
#[derive(Clone)]
pub struct TranslationCache {
    /// Entries per target language
    languages: Arc<RwLock<HashMap<String, LanguageEntries>>>,

    /// Cache hit counter
    hits: Arc<RwLock<usize>>,

    /// Cache miss counter
    misses: Arc<RwLock<usize>>,

    /// Change notifications
    updates: broadcast::Sender<CacheUpdate>,
}

impl std::fmt::Debug for TranslationCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationCache")
            .field("entries", &self.len())
            .field("subscribers", &self.updates.receiver_count())
            .finish()
    }
}

impl TranslationCache {
    /// Create a new translation cache
    pub fn new() -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            languages: Arc::new(RwLock::new(HashMap::new())),
            hits: Arc::new(RwLock::new(0)),
            misses: Arc::new(RwLock::new(0)),
            updates,
        }
    }

    /// Get a translation from the cache
    pub fn get(&self, language: &str, context: &str, key: &CacheKey) -> Option<String> {
        let found = self.peek(language, context, key);

        if found.is_some() {
            *self.hits.write() += 1;
        } else {
            *self.misses.write() += 1;
        }

        found
    }

    /// Get a translation without touching the statistics
    pub fn peek(&self, language: &str, context: &str, key: &CacheKey) -> Option<String> {
        self.languages
            .read()
            .get(language)
            .and_then(|entries| entries.store_for(context).get(key))
            .cloned()
    }

    /// Store a translation, announcing it when it is new or changed
    pub fn store(&self, language: &str, context: &str, key: &CacheKey, text: &str, translated: &str) -> bool {
        let previous = {
            let mut languages = self.languages.write();
            languages
                .entry(language.to_string())
                .or_default()
                .store_for_mut(context)
                .insert(key.clone(), translated.to_string())
        };

        if previous.as_deref() == Some(translated) {
            return false;
        }

        debug!(
            "Cached translation for '{}' [{}] ({})",
            truncate_text(text, 30),
            context,
            language
        );

        // No subscribers is not an error
        let _ = self.updates.send(CacheUpdate::Entry {
            language: language.to_string(),
            context: context.to_string(),
            cache_key: key.clone(),
            text: text.to_string(),
            translated: translated.to_string(),
        });

        true
    }

    /// Merge persisted entries for `language`, keeping entries already in memory
    pub fn load(&self, language: &str, entries: LanguageEntries) -> usize {
        let mut languages = self.languages.write();
        let current = languages.entry(language.to_string()).or_default();
        let before = current.len();

        for (key, value) in entries.ui {
            current.ui.entry(key).or_insert(value);
        }
        for (key, value) in entries.general {
            current.general.entry(key).or_insert(value);
        }

        current.len() - before
    }

    /// Copy of the entries of `language`
    pub fn snapshot(&self, language: &str) -> LanguageEntries {
        self.languages.read().get(language).cloned().unwrap_or_default()
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let hits = *self.hits.read();
        let misses = *self.misses.read();
        let total = hits + misses;

        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        CacheStats {
            hits,
            misses,
            hit_rate,
            entries: self.len(),
        }
    }

    /// Drop every entry and reset the statistics
    pub fn clear(&self, next_language: Option<&str>) {
        self.languages.write().clear();
        *self.hits.write() = 0;
        *self.misses.write() = 0;

        debug!("Translation cache cleared");
        let _ = self.updates.send(CacheUpdate::Cleared {
            language: next_language.map(str::to_string),
        });
    }

    /// Get the number of entries in the cache
    pub fn len(&self) -> usize {
        self.languages.read().values().map(LanguageEntries::len).sum()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Receive a notification for every newly cached entry
    pub fn subscribe(&self) -> broadcast::Receiver<CacheUpdate> {
        self.updates.subscribe()
    }
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifies a refused translation
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ErrorKey {
    pub text: String,
    pub context: String,
    pub pair: LanguagePair,
}

impl ErrorKey {
    pub fn new(text: &str, context: &str, pair: &LanguagePair) -> Self {
        Self {
            text: text.to_string(),
            context: context.to_string(),
            pair: pair.clone(),
        }
    }
}

/// Translations the service refused, with its message
///
/// A recorded translation is not queued again until the records are cleared.
#[derive(Debug, Clone, Default)]
pub struct ErrorRecords {
    records: Arc<RwLock<HashMap<ErrorKey, String>>>,
}

impl ErrorRecords {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, key: ErrorKey, message: impl Into<String>) {
        let message = message.into();
        debug!(
            "Recording translation error for '{}' ({}): {}",
            truncate_text(&key.text, 30),
            key.pair,
            message
        );
        self.records.write().insert(key, message);
    }

    pub fn get(&self, key: &ErrorKey) -> Option<String> {
        self.records.read().get(key).cloned()
    }

    pub fn contains(&self, key: &ErrorKey) -> bool {
        self.records.read().contains_key(key)
    }

    pub fn clear(&self) {
        self.records.write().clear();
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}
