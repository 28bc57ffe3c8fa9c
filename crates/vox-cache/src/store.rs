//! Bounded key→value store with per-entry expiry.
//!
//! Entries expire individually. When the store is full, an expired entry is
//! evicted first; otherwise the entry that was *set* longest ago goes. Reads
//! never change eviction order.
//!
//! The store is not synchronized. Callers wrap it in a
//! [`parking_lot::Mutex`] and keep critical sections short.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use tokio::time::Instant;

struct Slot<V> {
    value: V,
    expires_at: Instant,
    seq: u64,
}

/// Bounded store with per-entry TTL and least-recently-set eviction.
pub struct TtlStore<V> {
    entries: HashMap<String, Slot<V>>,
    /// Set order: sequence number → key. Lowest is the oldest write.
    set_order: BTreeMap<u64, String>,
    next_seq: u64,
    max_entries: usize,
    hits: u64,
    misses: u64,
}

impl<V: Clone> TtlStore<V> {
    /// Create an empty store holding at most `max_entries` (minimum 1).
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            set_order: BTreeMap::new(),
            next_seq: 0,
            max_entries: max_entries.max(1),
            hits: 0,
            misses: 0,
        }
    }

    /// Get a live value, counting a hit or miss. Expired entries are dropped.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let value = self.lookup(key);
        if value.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        value
    }

    /// Get a live value without touching hit/miss counters.
    pub fn peek(&mut self, key: &str) -> Option<V> {
        self.lookup(key)
    }

    /// Insert or replace `key`, expiring after `ttl`.
    pub fn set(&mut self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        if let Some(old) = self.entries.remove(&key) {
            drop(self.set_order.remove(&old.seq));
        }

        while self.entries.len() >= self.max_entries {
            if !self.evict_one() {
                break;
            }
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        drop(self.set_order.insert(seq, key.clone()));
        drop(self.entries.insert(
            key,
            Slot {
                value,
                expires_at: expiry(ttl),
                seq,
            },
        ));
    }

    /// Remove `key`. Returns whether a live or expired entry was present.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(slot) => {
                drop(self.set_order.remove(&slot.seq));
                true
            }
            None => false,
        }
    }

    /// Remove all entries and reset counters.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.set_order.clear();
        self.hits = 0;
        self.misses = 0;
    }

    /// Drop every expired entry.
    pub fn purge_expired(&mut self) {
        let now = Instant::now();
        let expired: Vec<(String, u64)> = self
            .entries
            .iter()
            .filter(|(_, s)| now >= s.expires_at)
            .map(|(k, s)| (k.clone(), s.seq))
            .collect();
        for (key, seq) in expired {
            drop(self.entries.remove(&key));
            drop(self.set_order.remove(&seq));
        }
    }

    /// Number of stored entries, including expired ones not yet dropped.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of size and counters.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            size: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
        }
    }

    fn lookup(&mut self, key: &str) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(slot) if Instant::now() < slot.expires_at => return Some(slot.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            let _ = self.remove(key);
        }
        None
    }

    fn evict_one(&mut self) -> bool {
        let now = Instant::now();
        let victim = self
            .set_order
            .iter()
            .find(|(_, k)| self.entries.get(*k).is_some_and(|s| now >= s.expires_at))
            .or_else(|| self.set_order.iter().next())
            .map(|(_, k)| k.clone());

        match victim {
            Some(key) => self.remove(&key),
            None => false,
        }
    }
}

/// Store statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Entries currently held.
    pub size: usize,
    /// Lookups that found a live entry.
    pub hits: u64,
    /// Lookups that found nothing or an expired entry.
    pub misses: u64,
}

/// Longest expiry actually scheduled; larger TTLs are clamped to it.
pub const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

fn expiry(ttl: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(ttl.min(MAX_TTL))
        .or_else(|| now.checked_add(Duration::from_secs(365 * 24 * 60 * 60)))
        .unwrap_or(now)
}
