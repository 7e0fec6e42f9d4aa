/*!
 * The translation engine.
 *
 * One engine is created per configured service host and shared (it is a
 * cheap handle) by every caller, so identical strings requested from
 * anywhere in a process are coalesced into a single request.
 *
 * Reads are synchronous: [`TranslationEngine::lookup`] answers from the
 * cache or returns the source text while queueing a translation. Queued
 * requests are flushed by a timer on the current tokio runtime.
 */

use anyhow::Result;
use log::{debug, error, info, warn};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::cache::{CacheStats, CacheUpdate, ErrorKey, ErrorRecords, TranslationCache};
use super::persistence::CacheStore;
use super::queue::{QueueOutcome, RequestQueue};
use super::reconciler::{FlushContext, FlushReport, ItemOutcome, Reconciler};
use super::request::{CacheKey, LanguagePair, TranslationRequest};
use super::scheduler::{FlushScheduler, FlushTicket, ScheduleDecision};
use crate::app_config::Config;
use crate::errors::{ProviderError, TranslationError};
use crate::language_utils::{normalize_language_tag, same_language};
use crate::languages::{self, LanguageDescriptor};
use crate::providers::{HttpProvider, LanguageQuery, Provider, TranslateRequest, TranslatedItem};

/// Defaults applied when a caller leaves context or source language out
#[derive(Debug, Clone, PartialEq)]
pub struct EngineDefaults {
    /// Context of requests that do not name one
    pub context: String,
    /// Source language of requests that do not name one, `None` to auto-detect
    pub source_language: Option<String>,
}

/// Hints for the language list request
#[derive(Debug, Clone, Default)]
pub struct LanguageOptions {
    /// Bypass the in-memory and persisted lists
    pub force: bool,
    pub country: Option<String>,
    pub language: Option<String>,
    pub timezone: Option<String>,
}

/// One item of [`TranslationEngine::translate_batch`]
#[derive(Debug, Clone, PartialEq)]
pub struct BatchItem {
    pub text: String,
    pub context: Option<String>,
    pub from: String,
    pub to: String,
}

impl BatchItem {
    pub fn new(text: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            context: None,
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Result of one [`BatchItem`]
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult {
    pub text: String,
    pub translated: String,
    pub error: Option<String>,
}

/// Engine statistics
#[derive(Debug, Clone, PartialEq)]
pub struct EngineStats {
    pub current_language: String,
    pub cache: CacheStats,
    /// Keys queued or awaiting a response
    pub pending: usize,
    /// Requests waiting for the next flush
    pub queued: usize,
    /// Translations the service refused
    pub error_records: usize,
}

struct EngineState {
    queue: RequestQueue,
    scheduler: FlushScheduler,
    timer: Option<JoinHandle<()>>,
    /// Bumped whenever the queue is wiped, so late flushes leave it alone
    epoch: u64,
}

struct EngineInner {
    config: Config,
    defaults: RwLock<EngineDefaults>,
    current_language: RwLock<String>,
    cache: TranslationCache,
    errors: ErrorRecords,
    store: Option<CacheStore>,
    reconciler: Reconciler,
    state: Mutex<EngineState>,
    languages: RwLock<Option<Vec<LanguageDescriptor>>>,
    languages_fetch: tokio::sync::Mutex<()>,
    auto_selected: AtomicBool,
}

impl FlushContext for EngineInner {
    fn current_language(&self) -> String {
        self.current_language.read().clone()
    }

    fn release(&self, epoch: u64, keys: &[CacheKey]) {
        let mut state = self.state.lock();
        if state.epoch != epoch {
            return;
        }
        for key in keys {
            state.queue.release(key);
        }
    }
}

/// Batching, caching translation client
#[derive(Clone)]
pub struct TranslationEngine {
    inner: Arc<EngineInner>,
}

impl std::fmt::Debug for TranslationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationEngine")
            .field("host", &self.inner.reconciler.provider().host())
            .field("current_language", &*self.inner.current_language.read())
            .field("cache", &self.inner.cache)
            .finish()
    }
}

impl TranslationEngine {
    /// Create an engine talking to `provider`, without durable caching
    pub fn new(config: Config, provider: Arc<dyn Provider>) -> Self {
        Self::with_store(config, provider, None)
    }

    /// Create an engine with an optional durable store
    pub fn with_store(config: Config, provider: Arc<dyn Provider>, store: Option<CacheStore>) -> Self {
        let cache = TranslationCache::new();
        let errors = ErrorRecords::new();
        let reconciler = Reconciler::new(
            provider,
            cache.clone(),
            errors.clone(),
            store.clone(),
            config.batching.max_batch_size,
        );

        let language = normalize_language_tag(&config.default_language);
        let defaults = EngineDefaults {
            context: config.default_context.clone(),
            source_language: config.source_language.as_deref().map(normalize_language_tag),
        };
        let state = EngineState {
            queue: RequestQueue::new(config.batching.recently_queued_window()),
            scheduler: FlushScheduler::new(&config.batching),
            timer: None,
            epoch: 0,
        };

        let engine = Self {
            inner: Arc::new(EngineInner {
                config,
                defaults: RwLock::new(defaults),
                current_language: RwLock::new(language.clone()),
                cache,
                errors,
                store,
                reconciler,
                state: Mutex::new(state),
                languages: RwLock::new(None),
                languages_fetch: tokio::sync::Mutex::new(()),
                auto_selected: AtomicBool::new(false),
            }),
        };

        engine.load_persisted(&language);
        engine
    }

    /// Create an engine for the configured host, opening the durable store when enabled
    pub fn from_config(config: Config) -> Result<Self> {
        let provider: Arc<dyn Provider> = Arc::new(HttpProvider::from_config(&config));
        let store = if config.cache.persist {
            Some(CacheStore::open(&config.cache)?)
        } else {
            None
        };

        Ok(Self::with_store(config, provider, store))
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    // =========================================================================
    // Read path
    // =========================================================================

    /// Translate `text`, never blocking and never failing
    ///
    /// Returns the cached translation when there is one. Otherwise the source
    /// text is returned and, unless the pair is a pass-through or the service
    /// already refused it, a translation is queued; a later call observes it.
    ///
    /// # Arguments
    /// * `context` - Grouping tag, the engine default when `None`
    /// * `from` - Source language, the engine default when `None`
    /// * `to` - Target language, pinned; the current language when `None`
    pub fn lookup(&self, text: &str, context: Option<&str>, from: Option<&str>, to: Option<&str>) -> String {
        let Some(request) = self.resolve(text, context, from, to) else {
            return text.to_string();
        };

        if self.inner.errors.contains(&ErrorKey::new(&request.text, &request.context, &request.pair)) {
            return text.to_string();
        }

        if let Some(translated) = self
            .inner
            .cache
            .get(&request.pair.to, &request.context, &request.cache_key)
        {
            return translated;
        }

        self.queue_translation(request);
        text.to_string()
    }

    /// Shorthand for [`lookup`](Self::lookup) into the current language
    pub fn l(&self, text: &str, context: Option<&str>) -> String {
        self.lookup(text, context, None, None)
    }

    /// Read-only lookup into the current language that never queues
    pub fn lr(&self, text: &str, context: Option<&str>) -> String {
        match self.resolve(text, context, None, None) {
            Some(request) => self
                .inner
                .cache
                .peek(&request.pair.to, &request.context, &request.cache_key)
                .unwrap_or_else(|| text.to_string()),
            None => text.to_string(),
        }
    }

    /// Build the request for a lookup, `None` when the text passes through
    fn resolve(&self, text: &str, context: Option<&str>, from: Option<&str>, to: Option<&str>) -> Option<TranslationRequest> {
        if text.trim().is_empty() {
            return None;
        }

        let defaults = self.inner.defaults.read().clone();
        let context = context.filter(|c| !c.is_empty()).unwrap_or(defaults.context.as_str());
        let explicit_to_lang = to.is_some();
        let to = match to {
            Some(to) => normalize_language_tag(to),
            None => self.current_language(),
        };
        let from = from
            .map(normalize_language_tag)
            .filter(|f| !f.is_empty())
            .or(defaults.source_language);

        let effective_from = from
            .clone()
            .unwrap_or_else(|| normalize_language_tag(&self.inner.config.default_language));
        if same_language(&effective_from, &to) {
            return None;
        }

        Some(TranslationRequest::new(
            text,
            context,
            LanguagePair::new(from.unwrap_or_default(), to),
            explicit_to_lang,
        ))
    }

    // =========================================================================
    // Queue and flush
    // =========================================================================

    /// Queue `request` for the next flush
    ///
    /// Returns `false` when the key is already pending or was just queued.
    pub fn queue_translation(&self, request: TranslationRequest) -> bool {
        let now = Instant::now();
        let mut state = self.inner.state.lock();

        let group_count = match state.queue.push(request, now) {
            QueueOutcome::Queued { group_count } => group_count,
            QueueOutcome::Duplicate => return false,
        };

        let first_queued_at = state.queue.first_queued_at();
        let decision = state.scheduler.request_flush(group_count, first_queued_at, now);
        self.apply_decision(&mut state, decision);
        true
    }

    fn apply_decision(&self, state: &mut EngineState, decision: ScheduleDecision) {
        let (generation, delay) = match decision {
            ScheduleDecision::Arm { generation, delay } => (generation, delay),
            ScheduleDecision::FireNow { generation } => (generation, Duration::ZERO),
            ScheduleDecision::Deferred => return,
        };

        if let Some(timer) = state.timer.take() {
            timer.abort();
        }

        let Ok(runtime) = Handle::try_current() else {
            warn!("No async runtime available, queued translations wait for flush_now");
            return;
        };

        let engine = self.clone();
        state.timer = Some(runtime.spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            engine.on_timer(generation).await;
        }));
    }

    async fn on_timer(&self, generation: u64) {
        let (groups, epoch, ticket) = {
            let mut state = self.inner.state.lock();
            let Some(ticket) = state.scheduler.begin_flush(generation) else {
                return;
            };
            // From here on the flush must not be aborted
            state.timer = None;
            (state.queue.drain(), state.epoch, ticket)
        };

        let report = self.inner.reconciler.dispatch(groups, epoch, self.inner.as_ref()).await;
        if let Err(e) = report.into_result() {
            error!("Scheduled flush finished with errors: {}", e);
        }

        self.finish_flush(ticket);
    }

    fn finish_flush(&self, ticket: FlushTicket) {
        let mut state = self.inner.state.lock();
        let has_queued = !state.queue.is_empty();
        if let Some(decision) = state.scheduler.finish_flush(ticket, has_queued, Instant::now()) {
            self.apply_decision(&mut state, decision);
        }
    }

    /// Dispatch everything queued right now
    ///
    /// # Returns
    /// * `Ok` with the flush summary when every call succeeded
    /// * `Err(TranslationError::PartialFailure)` when some calls failed
    pub async fn flush_now(&self) -> Result<FlushReport, TranslationError> {
        let (groups, epoch, ticket) = {
            let mut state = self.inner.state.lock();
            let ticket = state.scheduler.begin_immediate();
            if ticket.is_some() {
                if let Some(timer) = state.timer.take() {
                    timer.abort();
                }
            }
            (state.queue.drain(), state.epoch, ticket)
        };

        let report = self.inner.reconciler.dispatch(groups, epoch, self.inner.as_ref()).await;

        if let Some(ticket) = ticket {
            self.finish_flush(ticket);
        }

        report.into_result()
    }

    /// Cancel any scheduled flush and drop queue, pending keys and cache
    pub fn cleanup(&self) {
        self.reset_state(None);
    }

    fn reset_state(&self, next_language: Option<&str>) {
        {
            let mut state = self.inner.state.lock();
            if let Some(timer) = state.timer.take() {
                timer.abort();
            }
            state.scheduler.reset();
            state.queue.clear();
            state.epoch += 1;
        }
        self.inner.cache.clear(next_language);
    }

    // =========================================================================
    // Languages
    // =========================================================================

    pub fn current_language(&self) -> String {
        self.inner.current_language.read().clone()
    }

    /// Switch the interface language
    ///
    /// Everything queued or cached for the previous language is dropped and
    /// the persisted translations of `language` are loaded.
    ///
    /// With a durable store this blocks the calling thread on two SQLite
    /// calls: the load of `language` and the write of the selection. Both
    /// are done before returning, so lookups made right after the switch
    /// already hit and a restarted engine restores the selection. Callers
    /// on a busy tokio worker can wrap the call in `spawn_blocking`.
    pub fn set_language(&self, language: &str) {
        let language = normalize_language_tag(language);
        if language.is_empty() {
            return;
        }

        let previous = self.current_language();
        if previous == language {
            return;
        }

        self.reset_state(Some(&language));
        *self.inner.current_language.write() = language.clone();
        self.load_persisted(&language);

        if let Some(store) = &self.inner.store {
            if let Err(e) = store.save_interface_language(&language) {
                warn!("Failed to persist interface language: {}", e);
            }
        }

        info!("Interface language changed: {} -> {}", previous, language);
    }

    /// Re-apply the persisted interface language
    pub fn restore_language(&self) -> Option<String> {
        let store = self.inner.store.as_ref()?;
        match store.load_interface_language() {
            Ok(Some(language)) => {
                self.set_language(&language);
                Some(language)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Failed to read persisted interface language: {}", e);
                None
            }
        }
    }

    fn load_persisted(&self, language: &str) {
        let Some(store) = &self.inner.store else {
            return;
        };

        match store.load_translations(language) {
            Ok(entries) => {
                let loaded = self.inner.cache.load(language, entries);
                if loaded > 0 {
                    debug!("Restored {} cached translations for {}", loaded, language);
                }
            }
            Err(e) => warn!("Failed to load persisted translations for {}: {}", language, e),
        }
    }

    /// Languages offered by the service
    ///
    /// Served from memory, then from the durable store, then from the
    /// service; concurrent callers share one request. Failures are logged
    /// and yield an empty list.
    pub async fn fetch_languages(&self, options: LanguageOptions) -> Vec<LanguageDescriptor> {
        if !options.force {
            if let Some(list) = self.inner.languages.read().clone() {
                return list;
            }
        }

        let _guard = self.inner.languages_fetch.lock().await;

        if !options.force {
            if let Some(list) = self.inner.languages.read().clone() {
                return list;
            }
            if let Some(list) = self.persisted_languages() {
                *self.inner.languages.write() = Some(list.clone());
                return list;
            }
        }

        let country = options
            .country
            .or_else(|| self.country_for_language(&self.current_language()));
        let query = LanguageQuery {
            country,
            language: options.language,
            timezone: options.timezone,
            region: None,
        };

        match self.inner.reconciler.provider().languages(&query).await {
            Ok(raw) => {
                let list = languages::normalize_languages(raw, self.inner.config.http.min_popularity);
                info!("Fetched {} available languages", list.len());
                *self.inner.languages.write() = Some(list.clone());

                if let Some(store) = &self.inner.store {
                    if let Err(e) = store.save_languages(&list).await {
                        warn!("Failed to persist language list: {}", e);
                    }
                }
                list
            }
            Err(e) => {
                error!("Language fetch error: {}", e);
                Vec::new()
            }
        }
    }

    fn persisted_languages(&self) -> Option<Vec<LanguageDescriptor>> {
        let store = self.inner.store.as_ref()?;
        match store.load_languages() {
            Ok(list) => list.filter(|l| !l.is_empty()),
            Err(e) => {
                warn!("Failed to read persisted language list: {}", e);
                None
            }
        }
    }

    /// Languages fetched so far, without any request
    pub fn available_languages(&self) -> Vec<LanguageDescriptor> {
        self.inner.languages.read().clone().unwrap_or_default()
    }

    /// Pick the interface language from a browser-style locale
    ///
    /// Runs once per engine and only when no interface language was persisted.
    pub async fn auto_select_language(&self, locale: &str) -> Option<String> {
        if self.inner.auto_selected.swap(true, Ordering::SeqCst) {
            return None;
        }

        if let Some(store) = &self.inner.store {
            if matches!(store.load_interface_language(), Ok(Some(_))) {
                debug!("Interface language already chosen, skipping auto-selection");
                return None;
            }
        }

        let list = self.fetch_languages(LanguageOptions::default()).await;
        let pick = languages::pick_for_locale(&list, locale)?.code.clone();

        info!("Auto-selecting interface language {} for locale {}", pick, locale);
        self.set_language(&pick);
        Some(pick)
    }

    /// Flag country of an available language, upper-cased
    pub fn country_for_language(&self, code: &str) -> Option<String> {
        let languages = self.inner.languages.read();
        languages::country_for_language(languages.as_deref()?, code)
    }

    /// Region subtag of a locale, upper-cased
    pub fn country_hint_from_locale(&self, locale: &str) -> Option<String> {
        languages::country_hint_from_locale(locale)
    }

    // =========================================================================
    // Imperative helpers
    // =========================================================================

    /// Translate `items` as `(text, context)` and cache the results
    ///
    /// Unlike [`lookup`](Self::lookup) this waits for the service and reports
    /// failures. Refused items come back untranslated.
    pub async fn fetch_and_cache_batch(
        &self,
        items: &[(String, String)],
        from: &str,
        to: &str,
    ) -> Result<Vec<String>, TranslationError> {
        if items.is_empty() {
            return Err(TranslationError::EmptyBatch);
        }

        let pair = LanguagePair::new(normalize_language_tag(from), normalize_language_tag(to));
        if !pair.from.is_empty() && same_language(&pair.from, &pair.to) {
            for (text, context) in items {
                self.inner
                    .cache
                    .store(&pair.to, context, &CacheKey::new(text, context), text, text);
            }
            return Ok(items.iter().map(|(text, _)| text.clone()).collect());
        }

        let requests: Vec<TranslationRequest> = items
            .iter()
            .map(|(text, context)| TranslationRequest::new(text.as_str(), context.as_str(), pair.clone(), true))
            .collect();

        let mut results = Vec::with_capacity(requests.len());
        for chunk in requests.chunks(self.inner.reconciler.max_batch_size()) {
            let wire = TranslateRequest::new(
                pair.from.clone(),
                pair.to.clone(),
                chunk.iter().map(|r| (r.text.as_str(), r.context.as_str())),
            );
            let response = self.inner.reconciler.provider().translate(&wire).await?;
            if let Some(message) = response.error_message() {
                return Err(ProviderError::ServiceError(message).into());
            }

            let current = self.current_language();
            let outcomes = self.inner.reconciler.reconcile(chunk, &response, &current);
            results.extend(chunk.iter().zip(outcomes).map(|(request, outcome)| match outcome {
                ItemOutcome::Cached(translated) => translated,
                _ => request.text.clone(),
            }));
        }

        self.inner.reconciler.persist(&pair.to).await;
        Ok(results)
    }

    /// Translate items of any language pairs without touching the cache
    ///
    /// Items whose source and target match (ignoring case) are echoed; the
    /// rest are sent with one call per language pair. Results keep input order.
    pub async fn translate_batch(&self, items: &[BatchItem]) -> Result<Vec<BatchResult>, TranslationError> {
        if items.is_empty() {
            return Err(TranslationError::EmptyBatch);
        }

        let mut results: Vec<BatchResult> = items
            .iter()
            .map(|item| BatchResult {
                text: item.text.clone(),
                translated: item.text.clone(),
                error: None,
            })
            .collect();

        let mut by_pair: Vec<(LanguagePair, Vec<usize>)> = Vec::new();
        for (index, item) in items.iter().enumerate() {
            if item.from.eq_ignore_ascii_case(&item.to) {
                continue;
            }
            let pair = LanguagePair::new(item.from.to_lowercase(), item.to.to_lowercase());
            match by_pair.iter_mut().find(|(p, _)| *p == pair) {
                Some((_, indices)) => indices.push(index),
                None => by_pair.push((pair, vec![index])),
            }
        }

        let default_context = self.inner.defaults.read().context.clone();
        for (pair, indices) in by_pair {
            let wire = TranslateRequest::new(
                pair.from.clone(),
                pair.to.clone(),
                indices.iter().map(|&i| {
                    let item = &items[i];
                    (item.text.as_str(), item.context.as_deref().unwrap_or(default_context.as_str()))
                }),
            );

            let response = self.inner.reconciler.provider().translate(&wire).await?;
            if let Some(message) = response.error_message() {
                return Err(ProviderError::ServiceError(message).into());
            }

            for (position, &index) in indices.iter().enumerate() {
                let item: Option<&TranslatedItem> = response.translations.get(position);
                let result = &mut results[index];
                if let Some(item) = item {
                    result.error = item.error_message();
                    if result.error.is_none() {
                        if let Some(translated) = item.translated_text().filter(|t| !t.is_empty()) {
                            result.translated = translated.to_string();
                        }
                    }
                }
            }
        }

        Ok(results)
    }

    // =========================================================================
    // Administration
    // =========================================================================

    pub fn defaults(&self) -> EngineDefaults {
        self.inner.defaults.read().clone()
    }

    /// Replace the defaults read by later lookups
    pub fn set_defaults(&self, defaults: EngineDefaults) {
        let defaults = EngineDefaults {
            context: defaults.context,
            source_language: defaults
                .source_language
                .map(|s| normalize_language_tag(&s))
                .filter(|s| !s.is_empty()),
        };
        debug!("Engine defaults set to {:?}", defaults);
        *self.inner.defaults.write() = defaults;
    }

    /// Forget refused translations so they are requested again
    pub fn clear_errors(&self) {
        self.inner.errors.clear();
    }

    /// Receive a notification for every newly cached translation
    pub fn subscribe(&self) -> broadcast::Receiver<CacheUpdate> {
        self.inner.cache.subscribe()
    }

    pub fn stats(&self) -> EngineStats {
        let (pending, queued) = {
            let state = self.inner.state.lock();
            (state.queue.pending_len(), state.queue.queued_len())
        };

        EngineStats {
            current_language: self.current_language(),
            cache: self.inner.cache.stats(),
            pending,
            queued,
            error_records: self.inner.errors.len(),
        }
    }

    /// Whether `text` in `context` is queued or awaiting a response
    pub fn is_pending(&self, text: &str, context: &str) -> bool {
        self.inner.state.lock().queue.is_pending(&CacheKey::new(text, context))
    }
}
