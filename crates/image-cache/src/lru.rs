//! Size-bounded LRU index of cached blobs
//!
//! The index maps cache keys to [`CacheEntry`] metadata and keeps a running
//! total of entry sizes. Inserting a new key evicts least-recently-used
//! entries until the new entry fits within the capacity. Every evicted entry
//! is handed to an [`EvictionListener`].
//!
//! Recency is a strictly increasing access tick per entry, so the order is
//! total: of two entries touched "at the same time", the one whose access
//! took the lock first is older.
//!
//! # Oversized entries
//!
//! An entry at least as large as the capacity evicts everything else and is
//! then inserted anyway, leaving the total above capacity. It stays
//! retrievable until the next insertion of a new key, which evicts it first.

use crate::key::CacheKey;
use crate::types::CacheEntry;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Receives entries evicted from an [`LruIndex`].
///
/// Called while the index lock is held: implementations must return quickly
/// and must not call back into the index.
pub trait EvictionListener: Send + Sync {
    fn on_evict(&self, entry: CacheEntry);
}

impl<F> EvictionListener for F
where
    F: Fn(CacheEntry) + Send + Sync,
{
    fn on_evict(&self, entry: CacheEntry) {
        self(entry)
    }
}

struct Slot {
    entry: CacheEntry,
    tick: u64,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<CacheKey, Slot>,
    /// Access tick -> key, oldest first
    order: BTreeMap<u64, CacheKey>,
    next_tick: u64,
    total_size: u64,
}

impl Inner {
    fn touch(&mut self, key: &CacheKey) -> Option<&mut Slot> {
        let slot = self.entries.get_mut(key)?;
        self.order.remove(&slot.tick);
        slot.tick = self.next_tick;
        self.next_tick += 1;
        self.order.insert(slot.tick, key.clone());
        Some(slot)
    }

    fn pop_lru(&mut self) -> Option<CacheEntry> {
        let (_, key) = self.order.pop_first()?;
        let slot = self.entries.remove(&key)?;
        self.total_size -= slot.entry.size;
        Some(slot.entry)
    }

    fn push_mru(&mut self, entry: CacheEntry) {
        let tick = self.next_tick;
        self.next_tick += 1;
        self.total_size += entry.size;
        self.order.insert(tick, entry.key.clone());
        self.entries.insert(entry.key.clone(), Slot { entry, tick });
    }
}

/// Thread-safe LRU index with a byte capacity
pub struct LruIndex {
    inner: Mutex<Inner>,
    capacity: u64,
    listener: Box<dyn EvictionListener>,
}

impl LruIndex {
    /// Create an empty index holding up to `capacity` bytes
    pub fn new(capacity: u64, listener: impl EvictionListener + 'static) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            capacity,
            listener: Box::new(listener),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Entries are unlinked before the listener runs, so a panicking
        // listener cannot leave the map and order out of step
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert or replace `entry`, making it the most recently used.
    ///
    /// Returns `true` if the key was already present. Replacing never
    /// evicts; the new size simply supersedes the old one in the total.
    pub fn set(&self, entry: CacheEntry) -> bool {
        let mut guard = self.lock();
        let inner = &mut *guard;

        if let Some(slot) = inner.touch(&entry.key) {
            let old_size = slot.entry.size;
            let new_size = entry.size;
            slot.entry = entry;
            inner.total_size = inner.total_size - old_size + new_size;
            return true;
        }

        while !inner.entries.is_empty()
            && inner.total_size.saturating_add(entry.size) > self.capacity
        {
            match inner.pop_lru() {
                Some(evicted) => self.listener.on_evict(evicted),
                None => break,
            }
        }

        inner.push_mru(entry);
        false
    }

    /// Look up `key`, making it the most recently used if present
    pub fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.lock().touch(key).map(|slot| slot.entry.clone())
    }

    /// Look up `key` without affecting recency
    pub fn peek(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.lock().entries.get(key).map(|slot| slot.entry.clone())
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.lock().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sum of the sizes of all indexed entries
    pub fn total_size(&self) -> u64 {
        self.lock().total_size
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Keys from most to least recently used
    pub fn keys(&self) -> Vec<CacheKey> {
        self.lock().order.values().rev().cloned().collect()
    }
}

impl std::fmt::Debug for LruIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("LruIndex")
            .field("entries", &inner.entries.len())
            .field("total_size", &inner.total_size)
            .field("capacity", &self.capacity)
            .finish()
    }
}
