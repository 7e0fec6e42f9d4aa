/*!
 * Translation batching and caching.
 *
 * This module contains the machinery that turns many small, synchronous
 * translation lookups into few service calls. It is split into several
 * submodules:
 *
 * - `request`: Translation requests, cache keys and language pairs
 * - `queue`: Pending requests grouped by language pair
 * - `scheduler`: When queued requests are flushed
 * - `reconciler`: Dispatch of flushed requests and reconciliation of results
 * - `cache`: In-memory translations, refused translations and change notifications
 * - `persistence`: Durable copies of the cache and language state
 * - `engine`: The shared entry point tying everything together
 */

// Re-export main types for easier usage
pub use self::cache::{CacheStats, CacheUpdate, ErrorKey, ErrorRecords, LanguageEntries, TranslationCache};
pub use self::engine::{BatchItem, BatchResult, EngineDefaults, EngineStats, LanguageOptions, TranslationEngine};
pub use self::persistence::CacheStore;
pub use self::queue::{BatchGroup, QueueOutcome, RequestQueue};
pub use self::reconciler::{BatchFailure, FlushContext, FlushReport, ItemOutcome, Reconciler};
pub use self::request::{CacheKey, LanguagePair, TranslationRequest};
pub use self::scheduler::{FlushScheduler, ScheduleDecision, SchedulerState};

// Submodules
pub mod cache;
pub mod engine;
pub mod persistence;
pub mod queue;
pub mod reconciler;
pub mod request;
pub mod scheduler;
