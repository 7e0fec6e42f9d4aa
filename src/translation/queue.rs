/*!
 * Request queue.
 *
 * Holds requests between flushes, grouped by language pair in first-use
 * order. A key stays in the pending set from the moment it is queued until
 * its outcome is known, and a short recently-queued window additionally
 * absorbs bursts of repeated calls for the same key.
 */

use log::debug;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use super::request::{CacheKey, LanguagePair, TranslationRequest};

/// Requests sharing one language pair, in queue order
#[derive(Debug, Clone, PartialEq)]
pub struct BatchGroup {
    pub pair: LanguagePair,
    pub requests: Vec<TranslationRequest>,
}

/// Result of offering a request to the queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueOutcome {
    /// The request was added; `group_count` groups are now waiting
    Queued { group_count: usize },
    /// The key is already pending or was queued moments ago
    Duplicate,
}

/// Pending requests awaiting a flush
#[derive(Debug)]
pub struct RequestQueue {
    groups: Vec<BatchGroup>,
    pending: HashSet<CacheKey>,
    recently_queued: HashMap<CacheKey, Instant>,
    recent_window: Duration,
    first_queued_at: Option<Instant>,
}

impl RequestQueue {
    pub fn new(recent_window: Duration) -> Self {
        Self {
            groups: Vec::new(),
            pending: HashSet::new(),
            recently_queued: HashMap::new(),
            recent_window,
            first_queued_at: None,
        }
    }

    /// Queue `request` unless its key is pending or was queued within the window
    pub fn push(&mut self, request: TranslationRequest, now: Instant) -> QueueOutcome {
        let window = self.recent_window;
        self.recently_queued
            .retain(|_, queued_at| now.saturating_duration_since(*queued_at) < window);

        if self.pending.contains(&request.cache_key) || self.recently_queued.contains_key(&request.cache_key) {
            return QueueOutcome::Duplicate;
        }

        self.pending.insert(request.cache_key.clone());
        self.recently_queued.insert(request.cache_key.clone(), now);
        self.first_queued_at.get_or_insert(now);

        debug!(
            "Queued '{}' [{}] for {} (key {})",
            truncate_text(&request.text, 30),
            request.context,
            request.pair,
            request.cache_key
        );

        match self.groups.iter_mut().find(|g| g.pair == request.pair) {
            Some(group) => group.requests.push(request),
            None => self.groups.push(BatchGroup {
                pair: request.pair.clone(),
                requests: vec![request],
            }),
        }

        QueueOutcome::Queued {
            group_count: self.groups.len(),
        }
    }

    /// Take every group, leaving their keys pending
    pub fn drain(&mut self) -> Vec<BatchGroup> {
        self.first_queued_at = None;
        std::mem::take(&mut self.groups)
    }

    /// Forget that `key` is pending
    pub fn release(&mut self, key: &CacheKey) -> bool {
        self.pending.remove(key)
    }

    /// Drop all groups and forget every pending and recent key
    pub fn clear(&mut self) {
        self.groups.clear();
        self.pending.clear();
        self.recently_queued.clear();
        self.first_queued_at = None;
    }

    pub fn is_pending(&self, key: &CacheKey) -> bool {
        self.pending.contains(key)
    }

    /// When the oldest unflushed request was queued
    pub fn first_queued_at(&self) -> Option<Instant> {
        self.first_queued_at
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Number of queued (not yet dispatched) requests
    pub fn queued_len(&self) -> usize {
        self.groups.iter().map(|g| g.requests.len()).sum()
    }

    /// Number of queued or in-flight keys
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Truncate text to a maximum number of characters with ellipsis
pub(crate) fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        format!("{}...", text.chars().take(max_chars).collect::<String>())
    }
}
