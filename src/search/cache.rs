//! Bounded memoization with FIFO eviction and optional time-to-live.
//!
//! Insertion order is tracked explicitly in a queue of keys, so evicting the
//! oldest entry is a `pop_front` plus a map removal. Re-inserting a key that is
//! already present replaces its value and timestamp but keeps its place in the
//! queue.

use std::borrow::Borrow;
use std::cell::Cell;
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Source of the current instant for TTL checks.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same underlying instant, so a test can hold one handle
/// while a searcher or scheduler holds another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<Instant>>,
}

impl ManualClock {
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    #[must_use]
    pub fn starting_at(start: Instant) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    /// Move the clock forward by `by`. An advance past the end of
    /// representable time leaves the clock where it is.
    pub fn advance(&self, by: Duration) {
        if let Some(next) = self.now.get().checked_add(by) {
            self.now.set(next);
        }
    }

    /// Move the clock forward to `instant`. Earlier instants are ignored.
    pub fn advance_to(&self, instant: Instant) {
        if instant > self.now.get() {
            self.now.set(instant);
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
}

/// A capacity-bounded map evicting its oldest-inserted entry on overflow.
#[derive(Debug, Clone)]
pub struct BoundedCache<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    order: VecDeque<K>,
    capacity: usize,
    ttl: Option<Duration>,
}

impl<K, V> BoundedCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Cache whose entries never expire.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity.min(1024)),
            order: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            ttl: None,
        }
    }

    /// Cache whose entries are treated as absent once `ttl` has elapsed.
    #[must_use]
    pub fn with_ttl(capacity: usize, ttl: Duration) -> Self {
        Self {
            ttl: Some(ttl),
            ..Self::new(capacity)
        }
    }

    /// Look up a live entry. Expired entries stay stored but read as misses.
    pub fn get<Q>(&self, key: &Q, now: Instant) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let entry = self.entries.get(key)?;
        if self.is_expired(entry, now) {
            return None;
        }
        Some(&entry.value)
    }

    pub fn contains_key<Q>(&self, key: &Q, now: Instant) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key, now).is_some()
    }

    /// Store `value` under `key`, evicting the oldest entries past capacity.
    ///
    /// Returns the keys that were evicted.
    pub fn insert(&mut self, key: K, value: V, now: Instant) -> Vec<K> {
        if self.capacity == 0 {
            return Vec::new();
        }

        let entry = CacheEntry {
            value,
            inserted_at: now,
        };

        if let Some(existing) = self.entries.get_mut(&key) {
            *existing = entry;
            return Vec::new();
        }

        self.order.push_back(key.clone());
        self.entries.insert(key, entry);

        let mut evicted = Vec::new();
        while self.entries.len() > self.capacity {
            match self.evict_oldest() {
                Some(key) => evicted.push(key),
                None => break,
            }
        }
        evicted
    }

    fn evict_oldest(&mut self) -> Option<K> {
        let key = self.order.pop_front()?;
        self.entries.remove(&key);
        Some(key)
    }

    fn is_expired(&self, entry: &CacheEntry<V>, now: Instant) -> bool {
        self.ttl
            .is_some_and(|ttl| now.saturating_duration_since(entry.inserted_at) >= ttl)
    }

    /// Number of stored entries, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}
