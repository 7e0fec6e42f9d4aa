/*!
 * Dispatch of drained batch groups and reconciliation of the responses.
 *
 * A flush flattens its groups, cuts the list into chunks of at most
 * `max_batch_size` requests and sends one call per language pair per chunk.
 * All calls of a flush run concurrently and a failing call never affects its
 * siblings. Response items are matched to requests by position.
 */

use futures::future::join_all;
use log::{debug, error, info, warn};
use std::sync::Arc;

use super::cache::{ErrorKey, ErrorRecords, TranslationCache};
use super::persistence::CacheStore;
use super::queue::BatchGroup;
use super::request::{CacheKey, LanguagePair, TranslationRequest};
use crate::errors::{ProviderError, TranslationError};
use crate::language_utils::same_language;
use crate::providers::{Provider, TranslateRequest, TranslateResponse};

/// Engine state the reconciler reads and releases into
pub trait FlushContext: Send + Sync {
    /// Current target language
    fn current_language(&self) -> String;

    /// Remove `keys` from the pending set, unless the state was reset since `epoch`
    fn release(&self, epoch: u64, keys: &[CacheKey]);
}

/// A language-pair call that failed as a whole
#[derive(Debug, Clone)]
pub struct BatchFailure {
    pub pair: LanguagePair,
    pub items: usize,
    pub error: ProviderError,
}

/// Summary of one flush
#[derive(Debug, Clone, Default)]
pub struct FlushReport {
    /// Requests dispatched
    pub requests: usize,
    /// HTTP calls made
    pub calls: usize,
    /// Translations written to the cache
    pub cached: usize,
    /// Results identical to their source, or carrying no translation
    pub unchanged: usize,
    /// Results discarded because the target language changed meanwhile
    pub stale: usize,
    /// Items the service refused
    pub refused: usize,
    /// Calls that failed as a whole
    pub failures: Vec<BatchFailure>,
}

impl FlushReport {
    pub fn is_empty(&self) -> bool {
        self.requests == 0
    }

    fn absorb(&mut self, outcome: SubBatchOutcome) {
        self.calls += 1;
        self.cached += outcome.cached;
        self.unchanged += outcome.unchanged;
        self.stale += outcome.stale;
        self.refused += outcome.refused;
        if let Some(failure) = outcome.failure {
            self.failures.push(failure);
        }
    }

    /// `Err` when at least one call failed
    pub fn into_result(self) -> Result<Self, TranslationError> {
        match self.failures.first() {
            Some(first) => Err(TranslationError::PartialFailure {
                failed_batches: self.failures.len(),
                total_batches: self.calls,
                first_error: first.error.clone(),
            }),
            None => Ok(self),
        }
    }
}

#[derive(Debug, Default)]
struct SubBatchOutcome {
    cached: usize,
    unchanged: usize,
    stale: usize,
    refused: usize,
    failure: Option<BatchFailure>,
}

/// Outcome of reconciling a single response item
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Cached(String),
    Unchanged,
    Stale,
    Refused(String),
}

/// Sends flushed requests and writes the results back
#[derive(Debug, Clone)]
pub struct Reconciler {
    provider: Arc<dyn Provider>,
    cache: TranslationCache,
    errors: ErrorRecords,
    store: Option<CacheStore>,
    max_batch_size: usize,
}

impl Reconciler {
    pub fn new(
        provider: Arc<dyn Provider>,
        cache: TranslationCache,
        errors: ErrorRecords,
        store: Option<CacheStore>,
        max_batch_size: usize,
    ) -> Self {
        Self {
            provider,
            cache,
            errors,
            store,
            max_batch_size: max_batch_size.max(1),
        }
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    /// Dispatch drained groups and reconcile every response
    pub async fn dispatch(&self, groups: Vec<BatchGroup>, epoch: u64, ctx: &dyn FlushContext) -> FlushReport {
        let sub_batches = self.plan(groups);
        let mut report = FlushReport {
            requests: sub_batches.iter().map(|(_, requests)| requests.len()).sum(),
            ..Default::default()
        };

        if sub_batches.is_empty() {
            return report;
        }

        debug!(
            "Sending {} requests in {} calls",
            report.requests,
            sub_batches.len()
        );

        let outcomes = join_all(
            sub_batches
                .into_iter()
                .map(|(pair, requests)| self.dispatch_sub_batch(pair, requests, epoch, ctx)),
        )
        .await;

        for outcome in outcomes {
            report.absorb(outcome);
        }

        info!(
            "Flushed {} requests in {} calls: {} cached, {} unchanged, {} stale, {} refused, {} failed calls",
            report.requests,
            report.calls,
            report.cached,
            report.unchanged,
            report.stale,
            report.refused,
            report.failures.len()
        );

        report
    }

    /// Flatten, chunk, and split each chunk by language pair
    fn plan(&self, groups: Vec<BatchGroup>) -> Vec<(LanguagePair, Vec<TranslationRequest>)> {
        let flat: Vec<TranslationRequest> = groups.into_iter().flat_map(|g| g.requests).collect();

        let mut sub_batches = Vec::new();
        for chunk in flat.chunks(self.max_batch_size) {
            let mut by_pair: Vec<(LanguagePair, Vec<TranslationRequest>)> = Vec::new();
            for request in chunk {
                match by_pair.iter_mut().find(|(pair, _)| *pair == request.pair) {
                    Some((_, requests)) => requests.push(request.clone()),
                    None => by_pair.push((request.pair.clone(), vec![request.clone()])),
                }
            }
            sub_batches.extend(by_pair);
        }

        sub_batches
    }

    async fn dispatch_sub_batch(
        &self,
        pair: LanguagePair,
        requests: Vec<TranslationRequest>,
        epoch: u64,
        ctx: &dyn FlushContext,
    ) -> SubBatchOutcome {
        let keys: Vec<CacheKey> = requests.iter().map(|r| r.cache_key.clone()).collect();
        let wire = TranslateRequest::new(
            pair.from.clone(),
            pair.to.clone(),
            requests.iter().map(|r| (r.text.as_str(), r.context.as_str())),
        );

        let response = match self.provider.translate(&wire).await {
            Ok(response) => response,
            Err(e) => {
                if e.is_transport() {
                    warn!("Translation service unreachable for {} ({} items): {}", pair, requests.len(), e);
                } else {
                    error!("Translation call for {} ({} items) failed: {}", pair, requests.len(), e);
                }
                ctx.release(epoch, &keys);
                return SubBatchOutcome {
                    failure: Some(BatchFailure {
                        pair,
                        items: requests.len(),
                        error: e,
                    }),
                    ..Default::default()
                };
            }
        };

        let current = ctx.current_language();
        let mut outcome = SubBatchOutcome::default();
        for item in self.reconcile(&requests, &response, &current) {
            match item {
                ItemOutcome::Cached(_) => outcome.cached += 1,
                ItemOutcome::Unchanged => outcome.unchanged += 1,
                ItemOutcome::Stale => outcome.stale += 1,
                ItemOutcome::Refused(_) => outcome.refused += 1,
            }
        }

        if outcome.cached > 0 {
            self.persist(&pair.to).await;
        }
        ctx.release(epoch, &keys);

        outcome
    }

    /// Apply one response to its requests, positionally
    pub fn reconcile(
        &self,
        requests: &[TranslationRequest],
        response: &TranslateResponse,
        current_language: &str,
    ) -> Vec<ItemOutcome> {
        if let Some(message) = response.error_message() {
            warn!("Service refused a batch of {} items: {}", requests.len(), message);
            return requests
                .iter()
                .map(|request| {
                    self.errors
                        .record(ErrorKey::new(&request.text, &request.context, &request.pair), message.clone());
                    ItemOutcome::Refused(message.clone())
                })
                .collect();
        }

        if response.translations.len() != requests.len() {
            warn!(
                "Response carries {} items for {} requests, unmatched requests are released",
                response.translations.len(),
                requests.len()
            );
        }

        requests
            .iter()
            .enumerate()
            .map(|(index, request)| {
                let Some(item) = response.translations.get(index) else {
                    return ItemOutcome::Unchanged;
                };

                if let Some(message) = item.error_message() {
                    self.errors
                        .record(ErrorKey::new(&request.text, &request.context, &request.pair), message.clone());
                    return ItemOutcome::Refused(message);
                }

                // Detection-only items carry `from` and no text
                let translated = match item.translated_text() {
                    Some(t) if !t.is_empty() && t != request.text => t,
                    _ => return ItemOutcome::Unchanged,
                };

                if !request.explicit_to_lang && !same_language(current_language, &request.pair.to) {
                    debug!(
                        "Discarding stale {} result, current language is {}",
                        request.pair, current_language
                    );
                    return ItemOutcome::Stale;
                }

                // Placement follows the requested context, never an echoed one
                self.cache.store(
                    &request.pair.to,
                    &request.context,
                    &request.cache_key,
                    &request.text,
                    translated,
                );
                ItemOutcome::Cached(translated.to_string())
            })
            .collect()
    }

    /// Write the entries of `language` to the durable store, if any
    pub async fn persist(&self, language: &str) {
        let Some(store) = &self.store else {
            return;
        };

        let entries = self.cache.snapshot(language);
        if let Err(e) = store.save_translations(language, &entries).await {
            warn!("Failed to persist {} translations: {}", language, e);
        }
    }
}
