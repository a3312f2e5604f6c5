//! Fuzzy search over candidate collections.
//!
//! The pieces, from the bottom up:
//!
//! - [`normalize`] - canonical text for comparison
//! - [`distance`] - bounded Levenshtein distance
//! - [`fuzzy`] - scoring one query against one string
//! - [`rank`] - scoring, filtering and paging a collection
//! - [`cache`] - bounded FIFO/TTL memoization
//! - [`dispatch`] - debounced multi-category search
//!
//! [`Searcher`] ties normalization and ranking to their caches.

pub mod cache;
pub mod dispatch;
pub mod distance;
pub mod fuzzy;
pub mod normalize;
pub mod rank;

use std::time::Duration;

use tracing::debug;

use crate::corpus::Collection;
use crate::search::cache::{BoundedCache, Clock, SystemClock};
use crate::search::normalize::{DEFAULT_NORMALIZE_CAPACITY, Normalizer};
use crate::search::rank::{RankOptions, RankedResult, rank};

pub use crate::search::fuzzy::{MatchOptions, MatchResult, fuzzy_match};
pub use crate::search::normalize::normalize;

/// Default number of memoized ranked results.
pub const DEFAULT_CACHE_CAPACITY: usize = 100;

/// Default lifetime of a memoized ranked result.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Sizes and lifetimes of the searcher's caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    pub result_capacity: usize,
    pub result_ttl: Duration,
    pub normalize_capacity: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            result_capacity: DEFAULT_CACHE_CAPACITY,
            result_ttl: DEFAULT_CACHE_TTL,
            normalize_capacity: DEFAULT_NORMALIZE_CAPACITY,
        }
    }
}

/// Ranks collections, memoizing both normalized text and ranked pages.
///
/// Construct one per application (or per test) and pass it where ranking is
/// needed; nothing here is global.
#[derive(Debug)]
pub struct Searcher<C = SystemClock> {
    normalizer: Normalizer,
    results: BoundedCache<String, RankedResult>,
    clock: C,
}

impl Searcher<SystemClock> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_settings(CacheSettings::default())
    }

    #[must_use]
    pub fn with_settings(settings: CacheSettings) -> Self {
        Self::with_clock(SystemClock, settings)
    }
}

impl Default for Searcher<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> Searcher<C> {
    #[must_use]
    pub fn with_clock(clock: C, settings: CacheSettings) -> Self {
        Self {
            normalizer: Normalizer::with_capacity(settings.normalize_capacity),
            results: BoundedCache::with_ttl(settings.result_capacity, settings.result_ttl),
            clock,
        }
    }

    /// Rank `collection` against `query`, reusing a live cached page for the
    /// same collection, query and options.
    pub fn rank(
        &mut self,
        collection: &Collection,
        query: &str,
        options: &RankOptions,
    ) -> RankedResult {
        let key = cache_key(collection.name(), query, options);
        let now = self.clock.now();

        if let Some(cached) = self.results.get(&key, now) {
            debug!(collection = collection.name(), query, "Result cache hit");
            return cached.clone();
        }

        let ranked = rank(&mut self.normalizer, query, collection.candidates(), options);
        debug!(
            collection = collection.name(),
            query,
            total = ranked.total,
            "Ranked collection"
        );

        for evicted in self.results.insert(key, ranked.clone(), now) {
            debug!(key = %evicted, "Evicted cached result");
        }
        ranked
    }

    /// Number of memoized ranked pages, expired ones included.
    #[must_use]
    pub fn cached_results(&self) -> usize {
        self.results.len()
    }

    pub fn normalizer_mut(&mut self) -> &mut Normalizer {
        &mut self.normalizer
    }

    pub fn clear_cache(&mut self) {
        self.results.clear();
    }
}

/// Cache key: collection name, query and serialized options.
fn cache_key(collection: &str, query: &str, options: &RankOptions) -> String {
    let options = serde_json::to_string(options).unwrap_or_default();
    format!("{collection}\u{1f}{query}\u{1f}{options}")
}
