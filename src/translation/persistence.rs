/*!
 * Durable views of the translation cache.
 *
 * Each target language is persisted as two documents, one per context
 * store, next to the available language list and the selected interface
 * language.
 */

use anyhow::Result;
use log::debug;
use std::collections::HashMap;
use std::sync::Arc;

use super::cache::LanguageEntries;
use super::request::CacheKey;
use crate::app_config::CacheConfig;
use crate::database::models::{translations_key, ui_translations_key, INTERFACE_LANGUAGE_KEY, LANGUAGES_KEY};
use crate::database::{Repository, StoreLimits};
use crate::languages::LanguageDescriptor;

/// Persistence of cache contents, the language list and the interface language
#[derive(Debug, Clone)]
pub struct CacheStore {
    repository: Repository,
    ttl_secs: u64,
    languages_ttl_secs: u64,
    /// Serializes read-merge-write cycles on translation documents
    merge_lock: Arc<tokio::sync::Mutex<()>>,
}

impl CacheStore {
    pub fn new(repository: Repository, ttl_secs: u64, languages_ttl_secs: u64) -> Self {
        Self {
            repository,
            ttl_secs,
            languages_ttl_secs,
            merge_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Open the database named by `config`, or the default one
    pub fn open(config: &CacheConfig) -> Result<Self> {
        let limits = StoreLimits {
            default_ttl_secs: config.ttl_secs,
            max_items: config.max_items,
            max_size_bytes: config.max_size_bytes,
        };

        let repository = match &config.database_path {
            Some(path) => Repository::new(crate::database::DatabaseConnection::new(path)?, limits),
            None => Repository::new_default(limits)?,
        };

        Ok(Self::new(repository, config.ttl_secs, config.languages_ttl_secs))
    }

    /// Store over a fresh in-memory database
    pub fn in_memory() -> Result<Self> {
        let limits = StoreLimits::default();
        Ok(Self::new(
            Repository::new_in_memory()?,
            limits.default_ttl_secs,
            30 * 24 * 60 * 60,
        ))
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    /// Persisted translations of `language`
    pub fn load_translations(&self, language: &str) -> Result<LanguageEntries> {
        let ui: Option<HashMap<CacheKey, String>> = self.repository.get_json(&ui_translations_key(language))?;
        let general: Option<HashMap<CacheKey, String>> = self.repository.get_json(&translations_key(language))?;

        let entries = LanguageEntries {
            ui: ui.unwrap_or_default(),
            general: general.unwrap_or_default(),
        };
        debug!("Loaded {} persisted translations for {}", entries.len(), language);
        Ok(entries)
    }

    /// Merge `entries` into the persisted translations of `language`
    ///
    /// Stored entries missing from `entries` are kept, so a partial view such
    /// as a pinned target never shrinks what an earlier session saved.
    pub async fn save_translations(&self, language: &str, entries: &LanguageEntries) -> Result<()> {
        let _guard = self.merge_lock.lock().await;
        self.merge_into(&ui_translations_key(language), &entries.ui).await?;
        self.merge_into(&translations_key(language), &entries.general).await
    }

    async fn merge_into(&self, key: &str, entries: &HashMap<CacheKey, String>) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut stored: HashMap<CacheKey, String> = self.repository.get_json_async(key).await?.unwrap_or_default();
        let before = stored.len();
        stored.extend(entries.iter().map(|(k, v)| (k.clone(), v.clone())));
        debug!("Persisting {} translations under {} ({} kept)", stored.len(), key, before);

        self.repository.set_json_async(key, &stored, Some(self.ttl_secs)).await
    }

    pub fn load_languages(&self) -> Result<Option<Vec<LanguageDescriptor>>> {
        self.repository.get_json(LANGUAGES_KEY)
    }

    pub async fn save_languages(&self, languages: &[LanguageDescriptor]) -> Result<()> {
        self.repository
            .set_json_async(LANGUAGES_KEY, &languages, Some(self.languages_ttl_secs))
            .await
    }

    pub fn load_interface_language(&self) -> Result<Option<String>> {
        self.repository.get_json(INTERFACE_LANGUAGE_KEY)
    }

    pub fn save_interface_language(&self, language: &str) -> Result<()> {
        // The selection outlives cached data
        self.repository
            .set_json(INTERFACE_LANGUAGE_KEY, &language, Some(self.languages_ttl_secs))
    }

    /// Drop persisted translations and the language list
    pub fn clear(&self) -> Result<usize> {
        self.repository.clear(None)
    }
}
